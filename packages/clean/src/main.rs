#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for cleaning and integrating the raw collision tables.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use collision_prep_clean::{CleanConfig, STEPS, run};
use collision_prep_cli_utils::{BarKind, IndicatifProgress};

#[derive(Parser)]
#[command(
    name = "collision_prep_clean",
    about = "Clean the raw crash and person tables and write Parquet outputs"
)]
struct Cli {
    /// Directory holding the raw CSVs (default: `data/raw`)
    #[arg(long)]
    raw_dir: Option<PathBuf>,
    /// Directory to write Parquet and `summary.json` into (default: `data/processed`)
    #[arg(long)]
    processed_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = collision_prep_cli_utils::init_logger();
    let cli = Cli::parse();

    let defaults = CleanConfig::default();
    let config = CleanConfig {
        raw_dir: cli.raw_dir.unwrap_or(defaults.raw_dir),
        processed_dir: cli.processed_dir.unwrap_or(defaults.processed_dir),
    };

    let start = Instant::now();
    let progress = IndicatifProgress::add_to(&multi, BarKind::Stages(STEPS), "Cleaning");
    let summary = run(&config, progress.as_ref())?;

    log::info!(
        "Done in {:.1}s: {} crashes, {} persons, {} integrated rows",
        start.elapsed().as_secs_f64(),
        summary.crash_rows,
        summary.person_rows,
        summary.integrated_rows
    );

    Ok(())
}
