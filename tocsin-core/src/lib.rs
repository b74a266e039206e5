//! Tocsin Core - Shared vocabulary for the alert flooding simulator
//!
//! This crate holds everything that surrounds the simulation engine without
//! being part of it: device identifiers and ticks, the log records a run
//! produces and their text rendering, the scenario file reader, and tracing
//! setup for binaries.

pub mod config;
pub mod id;
pub mod record;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{
    Command, CommandKind, ConfigError, EngineConfig, Propagation, ScenarioConfig,
};
pub use id::{DeviceId, Tick};
pub use record::{Direction, LogRecord, MessageKind};
