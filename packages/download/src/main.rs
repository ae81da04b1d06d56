#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for downloading the raw collision exports.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use collision_prep_cli_utils::{BarKind, IndicatifProgress};
use collision_prep_download::download_all;
use collision_prep_source::{download::build_client, paths, registry::select_datasets};

#[derive(Parser)]
#[command(
    name = "collision_prep_download",
    about = "Download the raw crash and person CSV exports"
)]
struct Cli {
    /// Directory to write raw CSVs into (default: `data/raw`)
    #[arg(long)]
    raw_dir: Option<PathBuf>,
    /// Comma-separated list of dataset IDs to download (default: all)
    #[arg(long)]
    datasets: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = collision_prep_cli_utils::init_logger();
    let cli = Cli::parse();

    let raw_dir = cli.raw_dir.unwrap_or_else(paths::raw_dir);
    let datasets = select_datasets(cli.datasets.as_deref())?;
    let client = build_client()?;

    log::info!(
        "Downloading {} dataset(s) into {}",
        datasets.len(),
        raw_dir.display()
    );

    let start = Instant::now();
    download_all(&client, &datasets, &raw_dir, |dataset| {
        IndicatifProgress::add_to(&multi, BarKind::Bytes, dataset.name())
    })
    .await?;

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
