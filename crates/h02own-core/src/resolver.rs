//! Device identity resolution

use crate::error::ResolveError;
use crate::models::DeviceConfig;

/// Read-only table of configured devices.
///
/// Built once at startup and shared between connection tasks behind an `Arc`;
/// nothing mutates it afterwards, so lookups need no locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTable {
    devices: Vec<DeviceConfig>,
}

impl DeviceTable {
    pub fn new(devices: Vec<DeviceConfig>) -> Self {
        Self { devices }
    }

    /// Find the configuration for a hardware id.
    ///
    /// Scans in configuration order and returns the first match.
    pub fn resolve(&self, device_id: u64) -> Result<&DeviceConfig, ResolveError> {
        self.devices
            .iter()
            .find(|device| device.hardware_id == device_id)
            .ok_or(ResolveError::NotFound(device_id))
    }

    /// Hardware ids that appear more than once, in first-seen order
    pub fn duplicate_ids(&self) -> Vec<u64> {
        let mut duplicates = Vec::new();
        for (i, device) in self.devices.iter().enumerate() {
            let id = device.hardware_id;
            if self.devices[..i].iter().any(|d| d.hardware_id == id) && !duplicates.contains(&id)
            {
                duplicates.push(id);
            }
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.iter()
    }
}

impl FromIterator<DeviceConfig> for DeviceTable {
    fn from_iter<I: IntoIterator<Item = DeviceConfig>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
