//! CQT Transform - Command-line Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cqt_cli::settings::{Preset, Settings};
use cqt_cli::{init_logging, inspect, replay, run};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "cqt", version, about = "Constant-Q transform toolkit")]
struct Cli {
    /// Starting configuration before file and environment overrides
    #[arg(long, value_enum, default_value = "music")]
    preset: Preset,

    /// Settings file (toml, yaml or json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the kernel bank and describe it
    Inspect {
        /// Include per-bin frequency, length and measured peak
        #[arg(long)]
        bins: bool,
    },
    /// Train the running range on a synthetic batch, then infer
    Run {
        #[arg(long, default_value_t = 4)]
        passes: usize,
        /// Write the trained engine to this checkpoint
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Load a checkpoint and infer on a synthetic batch
    Replay {
        #[arg(long)]
        checkpoint: PathBuf,
    },
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(report).context("failed to encode report")?;
    println!("{}", text);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    info!("=== CQT Transform v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(cli.preset, cli.config.as_deref())?;

    match cli.cmd {
        Commands::Inspect { bins } => print_json(&inspect(&settings.transform, bins)?),
        Commands::Run { passes, save } => print_json(&run(&settings, passes, save.as_deref())?),
        Commands::Replay { checkpoint } => print_json(&replay(&settings, &checkpoint)?),
    }
}
