//! h02own-core - H02 to Owntracks translation pipeline
//!
//! This crate holds everything with domain logic in the gateway:
//!
//! - [`parser`] decodes one H02 text frame into a [`DecodedPosition`]
//! - [`DeviceTable`] resolves the hardware id to a configured identity
//! - [`transform`] builds the Owntracks [`OutboundRecord`]
//! - [`LocationPublisher`] serializes the record and hands it to a [`BusClient`]
//! - [`Gateway`] runs the four steps for each inbound frame
//!
//! Transport (TCP, MQTT) and configuration loading live in the outer crates.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use h02own_core::{DeviceConfig, DeviceTable, Gateway, GatewayOptions};
//! use h02own_core::testing::RecordingBus;
//!
//! # tokio_test::block_on(async {
//! let bus = Arc::new(RecordingBus::new());
//! let devices = DeviceTable::new(vec![DeviceConfig::new(1234567890, "T1", "alice", "phone")]);
//! let gateway = Gateway::new(Arc::new(devices), bus.clone(), GatewayOptions::default());
//!
//! let frame = "*HQ,1234567890,V1,123456,A,2234.1234,N,11334.4321,E,12.3,45,010124,00000000#";
//! let outcome = gateway.handle_frame(frame).await;
//! assert!(outcome.is_published());
//! assert_eq!(bus.messages()[0].topic, "owntracks/alice/phone");
//! # });
//! ```

pub mod error;
pub mod gateway;
pub mod models;
pub mod parser;
pub mod publisher;
pub mod resolver;
pub mod testing;
pub mod transform;

pub use error::{DropReason, ParseError, PublishError, ResolveError};
pub use gateway::{FrameOutcome, Gateway, GatewayOptions};
pub use models::{
    ConnectionType, DecodedPosition, DeviceConfig, IgnitionBit, OutboundRecord, StatusBytes,
    Trigger,
};
pub use parser::parse;
pub use publisher::{BusClient, LocationPublisher, QualityOfService};
pub use resolver::DeviceTable;
pub use transform::transform;
