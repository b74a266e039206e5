//! Scenario configuration and the line-oriented scenario file reader.
//!
//! A scenario file holds one command per line:
//!
//! ```text
//! # comment
//! LENGTH 900
//! DEVICE 1
//! DEVICE 2
//! PROPAGATE 1 2 100
//! PROPAGATE 2 1 100
//! ALERT 1 Badness 200
//! CANCEL 1 Badness 450
//! ```
//!
//! Blank lines, `#` comments and unknown commands are skipped. Any malformed
//! known command is fatal for the whole file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::{FromStr, SplitWhitespace};

use thiserror::Error;

use crate::{DeviceId, Tick};

/// Errors raised while reading a scenario.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Scenario file could not be read
    #[error("Failed to read scenario file {path}: {source}")]
    Io {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A command ended before all of its fields were given
    #[error("Line {line}: {command} is missing its {field}")]
    MissingField {
        /// 1-based line number
        line: usize,
        /// Command keyword
        command: &'static str,
        /// Name of the absent field
        field: &'static str,
    },

    /// A numeric field did not hold a non-negative integer
    #[error("Line {line}: invalid {field} '{value}' in {command}")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// Command keyword
        command: &'static str,
        /// Name of the offending field
        field: &'static str,
        /// Raw token
        value: String,
    },

    /// A fixed-arity command carried more fields than it takes
    #[error("Line {line}: unexpected field '{value}' after {command}")]
    UnexpectedField {
        /// 1-based line number
        line: usize,
        /// Command keyword
        command: &'static str,
        /// First surplus token
        value: String,
    },
}

/// A directed, delayed link declared with `PROPAGATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    pub from: DeviceId,
    pub to: DeviceId,
    pub delay: Tick,
}

/// Kind of an initial command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Alert,
    Cancel,
}

/// An alert or cancellation a device issues at a given tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub device: DeviceId,
    pub message: String,
    pub time: Tick,
}

/// Parsed scenario: horizon, declared devices, links and initial commands.
///
/// Commands and links keep file order; that order decides which of two
/// events scheduled at the same tick runs first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Exclusive upper bound on simulated time
    pub length: Tick,
    /// Devices declared with `DEVICE`; informational only
    pub devices: BTreeSet<DeviceId>,
    /// Links in declaration order
    pub propagations: Vec<Propagation>,
    /// Initial commands in declaration order
    pub commands: Vec<Command>,
}

impl ScenarioConfig {
    /// Creates an empty scenario with the given horizon.
    pub fn new(length: Tick) -> Self {
        Self {
            length,
            ..Default::default()
        }
    }

    /// Declares a device.
    pub fn with_device(mut self, device: u64) -> Self {
        self.devices.insert(DeviceId(device));
        self
    }

    /// Adds a link from `from` to `to` taking `delay` ticks.
    pub fn with_propagation(mut self, from: u64, to: u64, delay: Tick) -> Self {
        self.propagations.push(Propagation {
            from: DeviceId(from),
            to: DeviceId(to),
            delay,
        });
        self
    }

    /// Schedules an alert issued by `device` at `time`.
    pub fn with_alert(self, device: u64, message: &str, time: Tick) -> Self {
        self.with_command(CommandKind::Alert, device, message, time)
    }

    /// Schedules a cancellation issued by `device` at `time`.
    pub fn with_cancel(self, device: u64, message: &str, time: Tick) -> Self {
        self.with_command(CommandKind::Cancel, device, message, time)
    }

    fn with_command(mut self, kind: CommandKind, device: u64, message: &str, time: Tick) -> Self {
        self.commands.push(Command {
            kind,
            device: DeviceId(device),
            message: message.to_string(),
            time,
        });
        self
    }

    /// Reads and parses a scenario file.
    ///
    /// # Errors
    /// - `ConfigError::Io` - File could not be read
    /// - Any parse error from [`ScenarioConfig::parse`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded scenario file {}", path.display());
        Self::parse(&text)
    }

    /// Parses scenario text.
    ///
    /// # Errors
    /// - `ConfigError::MissingField` - A command lacks a required field
    /// - `ConfigError::InvalidNumber` - A numeric field is not a non-negative integer
    /// - `ConfigError::UnexpectedField` - `PROPAGATE` carries surplus fields
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut length = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let line_number = index + 1;

            match keyword {
                "LENGTH" => {
                    let mut fields = Fields::new(line_number, "LENGTH", tokens);
                    length = Some(fields.number("length")?);
                }
                "DEVICE" => {
                    let mut fields = Fields::new(line_number, "DEVICE", tokens);
                    config.devices.insert(DeviceId(fields.number("device id")?));
                }
                "PROPAGATE" => {
                    let mut fields = Fields::new(line_number, "PROPAGATE", tokens);
                    let from = DeviceId(fields.number("source device")?);
                    let to = DeviceId(fields.number("target device")?);
                    let delay = fields.number("delay")?;
                    fields.finish()?;
                    config.propagations.push(Propagation { from, to, delay });
                }
                "ALERT" | "CANCEL" => {
                    let (command, kind) = if keyword == "ALERT" {
                        ("ALERT", CommandKind::Alert)
                    } else {
                        ("CANCEL", CommandKind::Cancel)
                    };
                    let mut fields = Fields::new(line_number, command, tokens);
                    let device = DeviceId(fields.number("device id")?);
                    let message = fields.text("message")?.to_string();
                    let time = fields.number("time")?;
                    config.commands.push(Command {
                        kind,
                        device,
                        message,
                        time,
                    });
                }
                other => {
                    tracing::debug!("Ignoring unknown command '{other}' on line {line_number}");
                }
            }
        }

        config.length = length.unwrap_or_else(|| {
            tracing::warn!("Scenario declares no LENGTH; horizon defaults to 0");
            0
        });

        Ok(config)
    }
}

impl FromStr for ScenarioConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Default ceiling on events processed at a single tick.
pub const DEFAULT_MAX_EVENTS_PER_TICK: usize = 1_000_000;

/// Environment variable overriding [`EngineConfig::max_events_per_tick`].
pub const MAX_EVENTS_PER_TICK_ENV: &str = "TOCSIN_MAX_EVENTS_PER_TICK";

/// Tunables of the simulation engine.
///
/// Only guards live here; the simulated behavior itself is fully described
/// by the [`ScenarioConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Events allowed at one tick before the run is aborted. Only a
    /// zero-delay alert cycle can reach it.
    pub max_events_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events_per_tick: DEFAULT_MAX_EVENTS_PER_TICK,
        }
    }
}

impl EngineConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparsable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(MAX_EVENTS_PER_TICK_ENV) {
            match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => config.max_events_per_tick = limit,
                _ => tracing::warn!("Ignoring invalid {MAX_EVENTS_PER_TICK_ENV}={raw}"),
            }
        }

        config
    }

    /// Sets the per-tick event ceiling.
    pub fn with_max_events_per_tick(mut self, limit: usize) -> Self {
        self.max_events_per_tick = limit;
        self
    }
}

/// Remaining tokens of one command line.
struct Fields<'a> {
    line: usize,
    command: &'static str,
    tokens: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(line: usize, command: &'static str, tokens: SplitWhitespace<'a>) -> Self {
        Self {
            line,
            command,
            tokens,
        }
    }

    fn text(&mut self, field: &'static str) -> Result<&'a str, ConfigError> {
        self.tokens.next().ok_or(ConfigError::MissingField {
            line: self.line,
            command: self.command,
            field,
        })
    }

    fn number(&mut self, field: &'static str) -> Result<u64, ConfigError> {
        let token = self.text(field)?;
        token.parse().map_err(|_| ConfigError::InvalidNumber {
            line: self.line,
            command: self.command,
            field,
            value: token.to_string(),
        })
    }

    fn finish(mut self) -> Result<(), ConfigError> {
        match self.tokens.next() {
            Some(extra) => Err(ConfigError::UnexpectedField {
                line: self.line,
                command: self.command,
                value: extra.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = "\
LENGTH 900
DEVICE 1
DEVICE 2
PROPAGATE 1 2 100
PROPAGATE 2 1 100
ALERT 1 Badness 200
CANCEL 1 Badness 450
";

    #[test]
    fn test_parse_sample_scenario() {
        let config = ScenarioConfig::parse(SAMPLE).unwrap();

        let expected = ScenarioConfig::new(900)
            .with_device(1)
            .with_device(2)
            .with_propagation(1, 2, 100)
            .with_propagation(2, 1, 100)
            .with_alert(1, "Badness", 200)
            .with_cancel(1, "Badness", 450);

        assert_eq!(config, expected);
    }

    #[test]
    fn test_comments_blank_lines_and_unknown_commands_are_skipped() {
        let text = "# comment line\n\n   \nUNKNOWN whatever\nLENGTH 10\n  PROPAGATE 1 2 5  \n";
        let config = ScenarioConfig::parse(text).unwrap();

        assert_eq!(config.length, 10);
        assert_eq!(config.propagations.len(), 1);
        assert!(config.commands.is_empty());
    }

    #[test]
    fn test_missing_length_defaults_to_zero() {
        let config = ScenarioConfig::parse("ALERT 1 X 0\n").unwrap();
        assert_eq!(config.length, 0);
        assert_eq!(config.commands.len(), 1);
    }

    #[test]
    fn test_last_length_wins() {
        let config = ScenarioConfig::parse("LENGTH 10\nLENGTH 30\n").unwrap();
        assert_eq!(config.length, 30);
    }

    #[test]
    fn test_non_numeric_length_is_fatal() {
        let err = ScenarioConfig::parse("DEVICE 1\nLENGTH soon\n").unwrap_err();
        match err {
            ConfigError::InvalidNumber {
                line, field, value, ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(field, "length");
                assert_eq!(value, "soon");
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_delay_is_fatal() {
        let err = ScenarioConfig::parse("PROPAGATE 1 2 -5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { field: "delay", .. }
        ));
    }

    #[test]
    fn test_short_propagate_is_fatal() {
        let err = ScenarioConfig::parse("LENGTH 5\nPROPAGATE 1 2\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                line: 2,
                command: "PROPAGATE",
                field: "delay"
            }
        ));
    }

    #[test]
    fn test_long_propagate_is_fatal() {
        let err = ScenarioConfig::parse("PROPAGATE 1 2 3 4\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedField { line: 1, .. }));
    }

    #[test]
    fn test_alert_ignores_trailing_tokens() {
        let config = ScenarioConfig::parse("ALERT 3 Fire 12 trailing\n").unwrap();
        assert_eq!(
            config.commands,
            vec![Command {
                kind: CommandKind::Alert,
                device: DeviceId(3),
                message: "Fire".to_string(),
                time: 12,
            }]
        );
    }

    #[test]
    fn test_undeclared_devices_are_accepted() {
        let config = ScenarioConfig::parse("DEVICE 1\nPROPAGATE 1 99 5\nCANCEL 42 M 0\n").unwrap();
        assert!(!config.devices.contains(&DeviceId(99)));
        assert_eq!(config.propagations[0].to, DeviceId(99));
        assert_eq!(config.commands[0].device, DeviceId(42));
    }

    #[test]
    fn test_engine_config_env_override() {
        unsafe {
            std::env::set_var(MAX_EVENTS_PER_TICK_ENV, "250");
        }
        assert_eq!(EngineConfig::from_env().max_events_per_tick, 250);

        unsafe {
            std::env::set_var(MAX_EVENTS_PER_TICK_ENV, "0");
        }
        assert_eq!(
            EngineConfig::from_env().max_events_per_tick,
            DEFAULT_MAX_EVENTS_PER_TICK
        );

        unsafe {
            std::env::remove_var(MAX_EVENTS_PER_TICK_ENV);
        }
        assert_eq!(EngineConfig::from_env(), EngineConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ScenarioConfig::load(file.path()).unwrap();
        assert_eq!(config.length, 900);
        assert_eq!(config.commands.len(), 2);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("this_file_does_not_exist.txt");

        let err = ScenarioConfig::load(&path).unwrap_err();
        match &err {
            ConfigError::Io { path: reported, .. } => assert_eq!(reported, &path),
            other => panic!("Unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("this_file_does_not_exist.txt"));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn comments_and_blank_lines_never_matter(
                length in any::<u64>(),
                comment in "[^\n]*",
                padding in "[ \t]{0,4}",
            ) {
                let text = format!("{padding}\n#{comment}\nLENGTH {length}\n{padding}# trailing\n");
                let scenario = ScenarioConfig::parse(&text).unwrap();

                prop_assert_eq!(scenario.length, length);
                prop_assert!(scenario.commands.is_empty());
            }

            #[test]
            fn negative_numbers_are_rejected(value in 1i64..i64::MAX) {
                let text = format!("LENGTH 10\nPROPAGATE 1 2 -{value}\n");

                let is_invalid_number = matches!(
                    ScenarioConfig::parse(&text),
                    Err(ConfigError::InvalidNumber { line: 2, .. })
                );
                prop_assert!(is_invalid_number);
            }
        }
    }
}
