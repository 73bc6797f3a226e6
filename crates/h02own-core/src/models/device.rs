//! Device identity and status decoding settings

use serde::{Deserialize, Serialize};

/// Mapping of one H02 tracker to an Owntracks identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device serial as sent in H02 frames
    pub hardware_id: u64,
    /// Owntracks tracker id (`tid`), forwarded verbatim
    pub tracking_id: String,
    /// Owntracks user, second topic level
    pub logical_name: String,
    /// Owntracks device, third topic level
    pub logical_device: String,
}

impl DeviceConfig {
    pub fn new(
        hardware_id: u64,
        tracking_id: impl Into<String>,
        logical_name: impl Into<String>,
        logical_device: impl Into<String>,
    ) -> Self {
        Self {
            hardware_id,
            tracking_id: tracking_id.into(),
            logical_name: logical_name.into(),
            logical_device: logical_device.into(),
        }
    }
}

/// How the ignition flag is read from status byte 2.
///
/// Deployed gateways test `byte & (1 << (32 - 5))`. Evaluated on a single
/// byte that mask is always zero, so ignition is never reported as on.
/// `Legacy` keeps that behaviour; `Bit5` reads bit 5 (LSB = bit 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgnitionBit {
    #[default]
    Legacy,
    Bit5,
}

impl IgnitionBit {
    /// Whether the ignition flag is set in `status_byte`
    pub fn is_set(self, status_byte: u8) -> bool {
        match self {
            IgnitionBit::Legacy => {
                let shift = 32 - 5;
                u32::from(status_byte) & (1u32 << shift) != 0
            }
            IgnitionBit::Bit5 => (status_byte >> 5) & 1 == 1,
        }
    }
}
