//! h02own-mqtt - MQTT bus client for the h02own gateway
//!
//! Wraps a `rumqttc` client behind the core [`BusClient`](h02own_core::BusClient)
//! trait. The connection is split in two halves:
//!
//! - [`MqttBus`]: cloneable publishing handle, passed to the gateway
//! - [`MqttConnection`]: drives the event loop; returns when the broker
//!   connection is lost
//!
//! # Example
//!
//! ```ignore
//! use h02own_mqtt::{MqttBus, MqttSettings};
//!
//! let settings = MqttSettings::new("localhost", 1883, "h02own");
//! let (bus, connection) = MqttBus::connect(&settings).await?;
//! tokio::spawn(connection.run());
//! ```

mod client;
pub mod error;
mod settings;

pub use client::{MqttBus, MqttConnection};
pub use error::MqttError;
pub use settings::MqttSettings;
