//! Decoded H02 position report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vehicle status word sent with every H02 location frame.
///
/// Transmitted as 8 hex digits; always exactly 4 bytes once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusBytes(pub [u8; 4]);

impl StatusBytes {
    /// Status byte carrying the ignition/ACC bit
    pub const IGNITION_BYTE: usize = 2;

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }

    pub fn byte(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }
}

impl From<[u8; 4]> for StatusBytes {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

/// Position extracted from one H02 location frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPosition {
    /// Two-letter device family code (e.g. "HQ")
    pub manufacturer: String,
    /// Device serial as transmitted
    pub device_id: u64,
    /// Fix time, always UTC in the 21st century
    pub timestamp: DateTime<Utc>,
    /// Whether the device reports a valid satellite fix
    pub gps_valid: bool,
    /// Degrees, negative south of the equator
    pub latitude: f64,
    /// Degrees, negative west of Greenwich
    pub longitude: f64,
    /// Ground speed in knots
    pub speed_knots: f64,
    /// Course over ground, 0-359
    pub direction: u16,
    pub status: StatusBytes,
}
