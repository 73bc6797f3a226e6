//! Test doubles for the message bus

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::PublishError;
use crate::publisher::{BusClient, QualityOfService};

/// A message captured by [`RecordingBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
    pub qos: QualityOfService,
}

/// In-memory bus client that records every publish
#[derive(Debug, Default)]
pub struct RecordingBus {
    messages: RwLock<Vec<PublishedMessage>>,
    failure: RwLock<Option<String>>,
    latency: RwLock<Option<Duration>>,
    attempts: AtomicUsize,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following publish fail with a transport error
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    /// Delay every following publish
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = Some(latency);
    }

    /// Messages published successfully so far
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.read().clone()
    }

    /// Number of publish calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BusClient for RecordingBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
        qos: QualityOfService,
    ) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.read().clone();
        if let Some(message) = failure {
            return Err(PublishError::Transport(message));
        }

        self.messages.write().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
            retain,
            qos,
        });
        Ok(())
    }
}
