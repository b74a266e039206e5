//! Counters collected while a simulation runs, and the final report.

use std::collections::BTreeMap;

use serde::Serialize;
use tocsin_core::Tick;

/// Metrics collected during simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationMetrics {
    /// Total events processed
    pub events_processed: u64,
    /// Events by kind
    pub events_by_kind: BTreeMap<String, u64>,
    /// Log records handed to the sink, END included
    pub records_emitted: u64,
    /// Deliveries discarded because they would arrive at or after the horizon
    pub deliveries_dropped: u64,
    /// Alerts received but not forwarded because the receiver had canceled them
    pub stale_alerts_suppressed: u64,
    /// Cancellations received after the receiver had already canceled
    pub stale_cancellations_absorbed: u64,
    /// Cancellations dropped silently because their edge was already applied
    pub duplicate_cancellations_ignored: u64,
    /// Largest number of events processed at a single tick
    pub peak_events_per_tick: usize,
}

impl SimulationMetrics {
    /// Creates new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event being processed.
    pub fn record_event(&mut self, kind: &str) {
        self.events_processed += 1;
        *self.events_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Updates the per-tick peak.
    pub fn update_peak_events_per_tick(&mut self, events_at_tick: usize) {
        self.peak_events_per_tick = self.peak_events_per_tick.max(events_at_tick);
    }
}

/// Result of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Horizon the run was bounded by
    pub horizon: Tick,
    /// Devices that canceled or applied a cancellation
    pub devices_with_state: usize,
    /// Collected metrics
    pub metrics: SimulationMetrics,
}

impl SimulationReport {
    /// Generates human-readable summary.
    pub fn summary(&self) -> String {
        let metrics = &self.metrics;
        let mut summary = String::new();

        summary.push_str(&format!("Simulation Report (horizon: {})\n", self.horizon));
        summary.push_str(&format!("Events processed: {}\n", metrics.events_processed));
        summary.push_str(&format!("Records emitted: {}\n", metrics.records_emitted));
        summary.push_str(&format!("Devices with cancellation state: {}\n", self.devices_with_state));

        summary.push_str("\nEvent breakdown:\n");
        for (kind, count) in &metrics.events_by_kind {
            summary.push_str(&format!("  {kind}: {count}\n"));
        }

        summary.push_str(&format!(
            "\nDeliveries dropped at horizon: {}\nStale alerts suppressed: {}\n\
             Stale cancellations absorbed: {}\nDuplicate cancellations ignored: {}\n\
             Peak events per tick: {}\n",
            metrics.deliveries_dropped,
            metrics.stale_alerts_suppressed,
            metrics.stale_cancellations_absorbed,
            metrics.duplicate_cancellations_ignored,
            metrics.peak_events_per_tick
        ));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_event_recording() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_event("SendAlert");
        metrics.record_event("RecvAlert");
        metrics.record_event("RecvAlert");

        assert_eq!(metrics.events_processed, 3);
        assert_eq!(metrics.events_by_kind["RecvAlert"], 2);
        assert_eq!(metrics.events_by_kind["SendAlert"], 1);
    }

    #[test]
    fn test_peak_only_grows() {
        let mut metrics = SimulationMetrics::new();

        metrics.update_peak_events_per_tick(4);
        metrics.update_peak_events_per_tick(2);

        assert_eq!(metrics.peak_events_per_tick, 4);
    }

    #[test]
    fn test_summary_lists_breakdown() {
        let mut metrics = SimulationMetrics::new();
        metrics.record_event("SendCancel");
        metrics.deliveries_dropped = 3;

        let report = SimulationReport {
            horizon: 20,
            devices_with_state: 2,
            metrics,
        };
        let summary = report.summary();

        assert!(summary.contains("horizon: 20"));
        assert!(summary.contains("Devices with cancellation state: 2"));
        assert!(summary.contains("  SendCancel: 1"));
        assert!(summary.contains("Deliveries dropped at horizon: 3"));
    }

    #[test]
    fn test_report_serializes_metrics() {
        let mut metrics = SimulationMetrics::new();
        metrics.record_event("RecvCancel");
        metrics.duplicate_cancellations_ignored = 2;

        let report = SimulationReport {
            horizon: 40,
            devices_with_state: 0,
            metrics,
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["horizon"], 40);
        assert_eq!(value["metrics"]["events_by_kind"]["RecvCancel"], 1);
        assert_eq!(value["metrics"]["duplicate_cancellations_ignored"], 2);
    }
}
