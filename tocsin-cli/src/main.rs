//! Tocsin CLI - Command-line interface
//!
//! Runs a scenario file and streams the resulting records to stdout.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tocsin_core::tracing_setup::{CliLogLevel, init_tracing};

use crate::commands::OutputFormat;

#[derive(Parser)]
#[command(name = "tocsin")]
#[command(about = "Simulates alert and cancellation flooding across a device network")]
struct Cli {
    /// Scenario file; read from a line on stdin when omitted
    path: Option<PathBuf>,
    /// Console log level (stderr)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,
    /// Directory for a full trace of the run
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Record output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Log a run summary at info level
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.log_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let path = match cli.path {
        Some(path) => path,
        None => commands::read_path_from_stdin()?,
    };

    commands::run_scenario(&path, cli.format, cli.summary)
}
