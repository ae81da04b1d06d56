#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for sampling the integrated CSV.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use collision_prep_cli_utils::{BarKind, IndicatifProgress};
use collision_prep_sample::{
    DEFAULT_CHUNK_SIZE, DEFAULT_SEED, DEFAULT_SIZE, SampleConfig, sample_csv,
};

#[derive(Parser)]
#[command(
    name = "collision_prep_sample",
    about = "Draw a reproducible random sample from the integrated CSV"
)]
struct Cli {
    /// CSV to sample from (default: `data/raw/integrated.csv`)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output CSV (default: `data/processed/integrated_10k.csv`)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of rows to sample
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,
    /// Records read per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// RNG seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = collision_prep_cli_utils::init_logger();
    let cli = Cli::parse();

    let defaults = SampleConfig::default();
    let config = SampleConfig {
        input: cli.input.unwrap_or(defaults.input),
        output: cli.output.unwrap_or(defaults.output),
        size: cli.size,
        chunk_size: cli.chunk_size,
        seed: cli.seed,
    };

    let start = Instant::now();
    let progress = IndicatifProgress::add_to(&multi, BarKind::Records, "Sampling");
    sample_csv(&config, progress.as_ref())?;

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
