//! Per-device cancellation bookkeeping.

use std::collections::{HashMap, HashSet};

use tocsin_core::{DeviceId, Tick};

/// Cancellation status of one message at one device.
///
/// Created the first time the device cancels or applies a cancellation of
/// the message; never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationRecord {
    /// Whether the device has canceled the message
    pub canceled: bool,
    /// Tick of the first cancellation, never overwritten
    pub cancel_time: Option<Tick>,
}

/// State held by a single device.
#[derive(Debug, Clone, Default)]
struct DeviceRecord {
    cancellations: HashMap<String, CancellationRecord>,
    /// Sources whose cancellation of a message was already applied, by message
    applied_sources: HashMap<String, HashSet<DeviceId>>,
}

/// Message state of every device touched during a run.
///
/// Lookups on devices or messages never seen fall back to "not canceled",
/// so no query can fail.
#[derive(Debug, Clone, Default)]
pub struct DeviceMessageState {
    devices: HashMap<DeviceId, DeviceRecord>,
}

impl DeviceMessageState {
    /// Creates empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cancellation record of `message` at `device`, if any.
    pub fn record(&self, device: DeviceId, message: &str) -> Option<CancellationRecord> {
        self.devices
            .get(&device)
            .and_then(|d| d.cancellations.get(message))
            .copied()
    }

    /// Returns true once `device` has canceled `message`.
    pub fn is_canceled(&self, device: DeviceId, message: &str) -> bool {
        self.record(device, message).is_some_and(|r| r.canceled)
    }

    /// Returns the tick at which `device` first canceled `message`.
    ///
    /// `None` means never.
    pub fn cancel_time_of(&self, device: DeviceId, message: &str) -> Option<Tick> {
        self.record(device, message).and_then(|r| r.cancel_time)
    }

    /// True when `device` canceled `message` at least one full tick before
    /// `time`, so traffic for it arriving now is stale.
    pub fn is_stale(&self, device: DeviceId, message: &str, time: Tick) -> bool {
        self.is_canceled(device, message)
            && self
                .cancel_time_of(device, message)
                .is_some_and(|canceled_at| time > canceled_at)
    }

    /// Marks `message` canceled at `device` as of `time`.
    ///
    /// Only the first call per device and message has an effect. Returns
    /// whether the state changed.
    pub fn mark_canceled(&mut self, device: DeviceId, message: &str, time: Tick) -> bool {
        let record = self
            .devices
            .entry(device)
            .or_default()
            .cancellations
            .entry(message.to_string())
            .or_insert(CancellationRecord {
                canceled: false,
                cancel_time: None,
            });

        if record.canceled {
            return false;
        }

        record.canceled = true;
        record.cancel_time = Some(time);
        true
    }

    /// Returns true if a cancellation of `message` from `source` was already
    /// applied at `device`.
    pub fn has_applied_edge(&self, device: DeviceId, source: DeviceId, message: &str) -> bool {
        self.devices
            .get(&device)
            .and_then(|d| d.applied_sources.get(message))
            .is_some_and(|sources| sources.contains(&source))
    }

    /// Records that a cancellation of `message` from `source` was applied at
    /// `device`. Returns false if it had been recorded before.
    pub fn record_applied_edge(&mut self, device: DeviceId, source: DeviceId, message: &str) -> bool {
        self.devices
            .entry(device)
            .or_default()
            .applied_sources
            .entry(message.to_string())
            .or_default()
            .insert(source)
    }

    /// Number of devices holding any state.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
