//! CLI command implementations

use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tocsin_core::{EngineConfig, LogRecord, ScenarioConfig};
use tocsin_sim::{RecordSink, Simulation};

/// Message printed on stdout when the scenario cannot be loaded.
pub const LOAD_FAILURE_MESSAGE: &str = "FILE NOT FOUND";

/// How records are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One `@<t>: ...` line per record
    Text,
    /// One JSON object per line
    Json,
}

/// Record sink that streams each record to a writer as soon as it is emitted.
///
/// The engine cannot observe sink failures, so the first write error is kept
/// and every later record is discarded.
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
    error: Option<io::Error>,
}

impl<W: Write> WriterSink<W> {
    /// Creates a sink writing in `format`.
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            error: None,
        }
    }

    fn write_record(&mut self, record: &LogRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{record}"),
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, record)?;
                writeln!(self.writer)
            }
        }
    }

    /// Flushes the writer and returns it, or the first error seen.
    ///
    /// # Errors
    /// - `io::Error` - A record could not be written or the flush failed
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for WriterSink<W> {
    fn emit(&mut self, record: LogRecord) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_record(&record) {
            tracing::error!("Failed to write record {}: {}", record, e);
            self.error = Some(e);
        }
    }
}

/// Reads the scenario path from one line of stdin.
///
/// # Errors
/// - `anyhow::Error` - stdin could not be read
pub fn read_path_from_stdin() -> anyhow::Result<PathBuf> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read scenario path from stdin")?;
    Ok(parse_path_line(&line))
}

/// Trims a path line and strips one pair of surrounding double quotes.
pub fn parse_path_line(line: &str) -> PathBuf {
    let trimmed = line.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

/// Loads and runs a scenario, streaming records to stdout.
///
/// # Errors
/// - `anyhow::Error` - The run exceeded its per-tick budget or stdout failed
pub fn run_scenario(path: &Path, format: OutputFormat, summary: bool) -> anyhow::Result<()> {
    let stdout = io::stdout();
    run_scenario_to(path, format, summary, BufWriter::new(stdout.lock()))?;
    Ok(())
}

/// Loads and runs a scenario, writing records to `out`.
///
/// A scenario that fails to load is reported with [`LOAD_FAILURE_MESSAGE`]
/// and is not an error.
///
/// # Errors
/// - `anyhow::Error` - The run exceeded its per-tick budget or `out` failed
pub fn run_scenario_to<W: Write>(
    path: &Path,
    format: OutputFormat,
    summary: bool,
    mut out: W,
) -> anyhow::Result<W> {
    let scenario = match ScenarioConfig::load(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!("Failed to load scenario: {}", e);
            writeln!(out, "{LOAD_FAILURE_MESSAGE}")?;
            out.flush()?;
            return Ok(out);
        }
    };

    tracing::debug!(
        "Loaded scenario {}: horizon={}, links={}, commands={}",
        path.display(),
        scenario.length,
        scenario.propagations.len(),
        scenario.commands.len()
    );

    let mut simulation = Simulation::from_scenario(&scenario).with_config(EngineConfig::from_env());
    let mut sink = WriterSink::new(out, format);
    let outcome = simulation.run(&mut sink);

    // Records emitted before a budget failure still reach the output
    let out = sink.finish().context("failed to write simulation records")?;
    let report = outcome.context("simulation aborted")?;

    if summary {
        tracing::info!("{}", report.summary());
    }

    Ok(out)
}
