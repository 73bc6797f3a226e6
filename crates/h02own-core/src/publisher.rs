//! Publishing location reports to the message bus
//!
//! [`BusClient`] is the seam to the broker connection; the MQTT implementation
//! lives in `h02own-mqtt`, tests use [`RecordingBus`](crate::testing::RecordingBus).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::PublishError;
use crate::models::{DeviceConfig, OutboundRecord};

/// Delivery guarantee requested from the bus.
///
/// Location reports are retained and superseded by the next one, so only
/// fire-and-forget delivery is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityOfService {
    AtMostOnce,
}

/// Message bus client interface
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Hand one message to the bus.
    ///
    /// Implementations do not retry; a failure is reported once and the
    /// message is considered lost.
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
        qos: QualityOfService,
    ) -> Result<(), PublishError>;
}

/// Publishes Owntracks records under `{base_topic}/{name}/{device}`.
///
/// Messages are retained so late subscribers get the last known position.
#[derive(Clone)]
pub struct LocationPublisher {
    bus: Arc<dyn BusClient>,
    base_topic: String,
    deadline: Option<Duration>,
}

impl LocationPublisher {
    pub const QOS: QualityOfService = QualityOfService::AtMostOnce;
    pub const RETAIN: bool = true;

    pub fn new(bus: Arc<dyn BusClient>, base_topic: impl Into<String>) -> Self {
        Self {
            bus,
            base_topic: base_topic.into(),
            deadline: None,
        }
    }

    /// Fail publishes that take longer than `deadline`
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn base_topic(&self) -> &str {
        &self.base_topic
    }

    /// Destination topic for a device
    pub fn topic_for(&self, cfg: &DeviceConfig) -> String {
        format!(
            "{}/{}/{}",
            self.base_topic, cfg.logical_name, cfg.logical_device
        )
    }

    /// Serialize `record` and publish it to the device topic.
    ///
    /// Returns the topic the record was published to.
    pub async fn publish(
        &self,
        record: &OutboundRecord,
        cfg: &DeviceConfig,
    ) -> Result<String, PublishError> {
        let topic = self.topic_for(cfg);
        let payload = record.to_json()?;

        debug!(
            topic = %topic,
            payload = %String::from_utf8_lossy(&payload),
            "Publishing location report"
        );

        let publish = self.bus.publish(&topic, payload, Self::RETAIN, Self::QOS);
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, publish)
                .await
                .map_err(|_| PublishError::Timeout(deadline))??,
            None => publish.await?,
        }

        Ok(topic)
    }
}

impl std::fmt::Debug for LocationPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationPublisher")
            .field("base_topic", &self.base_topic)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
