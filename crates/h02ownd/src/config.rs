//! YAML configuration for the gateway daemon
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 5013
//! mqtt:
//!   host: broker.local
//!   port: 1883
//!   user: tracker
//!   password: secret
//!   client_id: h02own
//!   topic: owntracks
//! devices:
//!   - h02:
//!       id: 4209917484
//!     owntracks:
//!       tid: CA
//!       name: alice
//!       device: car
//! ```
//!
//! Unknown keys anywhere in the file are rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use h02own_core::{DeviceConfig, DeviceTable, GatewayOptions, IgnitionBit};
use h02own_mqtt::MqttSettings;
use serde::Deserialize;
use thiserror::Error;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "/etc/h02own/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "h02own".to_string()
}

fn default_topic() -> String {
    h02own_core::gateway::DEFAULT_BASE_TOPIC.to_string()
}

/// Top-level daemon configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address the tracker listener binds to
    #[serde(default = "default_host")]
    pub host: String,
    /// Tracker listener port
    pub port: u16,
    #[serde(default)]
    pub ignition_bit: IgnitionBit,
    /// Give up on a single publish after this many milliseconds
    #[serde(default)]
    pub publish_timeout_ms: Option<u64>,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// Broker section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Owntracks base topic
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_mqtt_port(),
            user: None,
            password: None,
            client_id: default_client_id(),
            topic: default_topic(),
        }
    }
}

/// One configured tracker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceEntry {
    pub h02: H02Identity,
    pub owntracks: OwntracksIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct H02Identity {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwntracksIdentity {
    pub tid: String,
    pub name: String,
    pub device: String,
}

impl From<&DeviceEntry> for DeviceConfig {
    fn from(entry: &DeviceEntry) -> Self {
        DeviceConfig::new(
            entry.h02.id,
            entry.owntracks.tid.clone(),
            entry.owntracks.name.clone(),
            entry.owntracks.device.clone(),
        )
    }
}

impl GatewayConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: GatewayConfig = serde_yaml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Empty credentials mean "not set"
    fn normalize(&mut self) {
        if self.mqtt.user.as_deref() == Some("") {
            self.mqtt.user = None;
        }
        if self.mqtt.password.as_deref() == Some("") {
            self.mqtt.password = None;
        }
    }

    /// Check the values serde cannot express, reporting every problem at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.port == 0 {
            problems.push("port must be non-zero".to_string());
        }
        if self.mqtt.port == 0 {
            problems.push("mqtt.port must be non-zero".to_string());
        }
        if self.mqtt.topic.is_empty() {
            problems.push("mqtt.topic must not be empty".to_string());
        }
        if self.mqtt.client_id.is_empty() {
            problems.push("mqtt.client_id must not be empty".to_string());
        }
        if self.publish_timeout_ms == Some(0) {
            problems.push("publish_timeout_ms must be non-zero".to_string());
        }

        for (index, entry) in self.devices.iter().enumerate() {
            let owntracks = &entry.owntracks;
            for (field, value) in [
                ("tid", &owntracks.tid),
                ("name", &owntracks.name),
                ("device", &owntracks.device),
            ] {
                if value.is_empty() {
                    problems.push(format!(
                        "devices[{}] (id {}): owntracks.{} must not be empty",
                        index, entry.h02.id, field
                    ));
                }
            }
        }

        for id in self.device_table().duplicate_ids() {
            problems.push(format!("device id {} is configured more than once", id));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// `host:port` for the tracker listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn device_table(&self) -> DeviceTable {
        self.devices.iter().map(DeviceConfig::from).collect()
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            base_topic: self.mqtt.topic.clone(),
            ignition_bit: self.ignition_bit,
            publish_timeout: self.publish_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings::new(&self.mqtt.host, self.mqtt.port, &self.mqtt.client_id)
            .with_credentials(self.mqtt.user.clone(), self.mqtt.password.clone())
    }
}
