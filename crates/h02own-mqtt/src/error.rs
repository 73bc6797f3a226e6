//! MQTT client errors

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqttError {
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("MQTT broker refused connection: {0}")]
    Refused(String),

    #[error("MQTT broker did not acknowledge connection within {0:?}")]
    ConnectTimeout(Duration),

    #[error("MQTT broker closed the connection")]
    Disconnected,
}
