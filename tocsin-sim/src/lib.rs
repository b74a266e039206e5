//! Tocsin Simulation Engine - Discrete-event alert flooding and cancellation.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Devices forward alerts over delayed, directed links. A device that
//! cancels a message floods the cancellation the same way; once a device has
//! canceled a message for at least one full tick it stops forwarding alerts
//! for it. Each (source, message) cancellation edge is applied at most once
//! per device, which keeps cancellation floods finite on cyclic graphs.
//!
//! # Example
//!
//! ```rust
//! use tocsin_core::ScenarioConfig;
//! use tocsin_sim::Simulation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scenario = ScenarioConfig::new(20)
//!     .with_propagation(1, 2, 50)
//!     .with_alert(1, "B", 0);
//!
//! let records = Simulation::from_scenario(&scenario).run_to_records()?;
//! let lines: Vec<String> = records.iter().map(ToString::to_string).collect();
//! assert_eq!(lines, ["@0: #1 SENT ALERT TO #2: B", "@20: END"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Propagation Graph**: static multigraph of links, read-only during a run
//! - **Device Message State**: per-device cancellation records and applied edges
//! - **Timeline**: pending events by tick, receives before sends at each tick
//! - **Simulation**: the driver loop and one handler per event kind

pub mod device_state;
pub mod events;
pub mod graph;
pub mod metrics;
pub mod simulation;
pub mod timeline;

pub use device_state::{CancellationRecord, DeviceMessageState};
pub use events::{EventClass, EventKind, SimulationEvent};
pub use graph::{Link, PropagationGraph};
pub use metrics::{SimulationMetrics, SimulationReport};
pub use simulation::{RecordSink, Simulation, SimulationError};
pub use timeline::Timeline;
