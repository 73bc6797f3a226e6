//! Gateway driver - runs the pipeline for one inbound frame
//!
//! ```text
//! Received → Parsed → Resolved → Transformed → Published
//!     │         │         │                        │
//!     └─────────┴─────────┴────────────────────────┴──→ Dropped(reason)
//! ```
//!
//! Every frame is handled on its own; a failure at any step drops that frame
//! and nothing else. No step is retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::error::DropReason;
use crate::models::IgnitionBit;
use crate::parser::parse;
use crate::publisher::{BusClient, LocationPublisher};
use crate::resolver::DeviceTable;
use crate::transform::transform;

/// Default Owntracks base topic
pub const DEFAULT_BASE_TOPIC: &str = "owntracks";

/// Settings for the gateway driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    /// First topic level of every published report
    pub base_topic: String,
    /// How the ignition flag is read from the status word
    pub ignition_bit: IgnitionBit,
    /// Give up on a publish after this long
    pub publish_timeout: Option<Duration>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            base_topic: DEFAULT_BASE_TOPIC.to_string(),
            ignition_bit: IgnitionBit::default(),
            publish_timeout: None,
        }
    }
}

/// Result of handling one frame
#[derive(Debug)]
pub enum FrameOutcome {
    Published { device_id: u64, topic: String },
    Dropped(DropReason),
}

impl FrameOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, FrameOutcome::Published { .. })
    }
}

/// Decodes H02 frames and publishes them as Owntracks reports.
///
/// Cheap to clone; clones share the device table and bus client.
#[derive(Debug, Clone)]
pub struct Gateway {
    devices: Arc<DeviceTable>,
    publisher: LocationPublisher,
    ignition_bit: IgnitionBit,
}

impl Gateway {
    pub fn new(devices: Arc<DeviceTable>, bus: Arc<dyn BusClient>, options: GatewayOptions) -> Self {
        let publisher =
            LocationPublisher::new(bus, options.base_topic).with_deadline(options.publish_timeout);

        Self {
            devices,
            publisher,
            ignition_bit: options.ignition_bit,
        }
    }

    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    /// Handle one frame, stamping the report with the current time
    pub async fn handle_frame(&self, raw: &str) -> FrameOutcome {
        self.handle_frame_at(raw, Utc::now()).await
    }

    /// Handle one frame with an explicit publish time
    pub async fn handle_frame_at(&self, raw: &str, now: DateTime<Utc>) -> FrameOutcome {
        match self.process(raw, now).await {
            Ok((device_id, topic)) => FrameOutcome::Published { device_id, topic },
            Err(reason) => {
                match &reason {
                    DropReason::Parse(e) => {
                        debug!(frame = %raw, error = %e, "Received wrong format message");
                    }
                    DropReason::UnknownDevice(e) => {
                        warn!(error = %e, "Dropping report from unknown device");
                    }
                    DropReason::Publish(e) => {
                        error!(error = %e, "Failed to publish location report");
                    }
                }
                FrameOutcome::Dropped(reason)
            }
        }
    }

    async fn process(&self, raw: &str, now: DateTime<Utc>) -> Result<(u64, String), DropReason> {
        let position = parse(raw)?;
        let device = self.devices.resolve(position.device_id)?;

        debug!(
            device_id = position.device_id,
            tid = %device.tracking_id,
            gps_valid = position.gps_valid,
            "Decoded position"
        );

        let record = transform(&position, device, now, self.ignition_bit);
        let topic = self.publisher.publish(&record, device).await?;

        Ok((position.device_id, topic))
    }
}
