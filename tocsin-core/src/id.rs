//! Device identifiers and simulated time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Indivisible unit of simulated time.
pub type Tick = u64;

/// Opaque identifier of a device taking part in a simulation.
///
/// Devices carry no other attributes and are never created or destroyed
/// while a simulation runs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Creates a device identifier from its raw value.
    #[inline]
    pub fn new(id: u64) -> Self {
        DeviceId(id)
    }
}

impl From<u64> for DeviceId {
    fn from(id: u64) -> Self {
        DeviceId(id)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_display_is_bare_number() {
        let id = DeviceId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "Device(42)");
    }

    #[test]
    fn test_device_id_ordering_follows_raw_value() {
        let mut ids = vec![DeviceId(7), DeviceId(1), DeviceId(3)];
        ids.sort();
        assert_eq!(ids, vec![DeviceId(1), DeviceId(3), DeviceId(7)]);
    }
}
