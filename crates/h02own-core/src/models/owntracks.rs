//! Owntracks location report
//!
//! Field names follow the Owntracks JSON format; `created_a` is spelled the way
//! existing subscribers of this gateway expect it.

use serde::{Deserialize, Serialize};

/// Connectivity status reported in `conn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Mobile data; trackers report over GPRS only
    #[serde(rename = "m")]
    Mobile,
}

/// Report trigger (`t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Ignition on
    #[serde(rename = "i")]
    IgnitionOn,
    /// Ignition off or unknown
    #[serde(rename = "I")]
    IgnitionOff,
}

/// Location report published for each accepted frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "location")]
pub struct OutboundRecord {
    pub lat: f64,
    pub lon: f64,
    /// Accuracy in meters
    pub acc: u32,
    /// Velocity in km/h
    pub vel: f64,
    /// Fix time, Unix seconds
    pub tst: i64,
    /// Publish time, Unix seconds
    #[serde(rename = "created_a")]
    pub created_at: i64,
    pub conn: ConnectionType,
    pub tid: String,
    pub t: Trigger,
}

impl OutboundRecord {
    /// Compact JSON payload as published on the bus
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
