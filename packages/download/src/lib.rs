#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw dataset download step.
//!
//! Fetches each registered dataset into the raw data directory and
//! rewrites it in normalized CSV form.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use collision_prep_source::SourceError;
use collision_prep_source::dataset_def::DatasetDefinition;
use collision_prep_source::download::download_file;
use collision_prep_source::normalize::normalize_csv;
use collision_prep_source::progress::ProgressCallback;

/// Result of downloading one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Dataset identifier.
    pub id: String,
    /// Where the normalized file was written.
    pub path: PathBuf,
    /// Data rows in the normalized file.
    pub rows: u64,
}

/// Downloads a single dataset into `raw_dir` and normalizes it.
///
/// # Errors
///
/// Returns any [`SourceError`] from the transfer or the rewrite.
pub async fn download_dataset(
    client: &reqwest::Client,
    dataset: &DatasetDefinition,
    raw_dir: &Path,
    progress: &dyn ProgressCallback,
) -> Result<DownloadOutcome, SourceError> {
    let dest = raw_dir.join(&dataset.filename);

    progress.set_message(format!("Downloading {}", dataset.name()));
    let bytes = download_file(client, &dataset.url, &dest, progress).await?;

    progress.set_message(format!("Normalizing {}", dataset.name()));
    let rows = normalize_csv(&dest)?;
    progress.finish(format!("{} done", dataset.name()));

    log::info!("Saved: {} ({rows} rows, {bytes} bytes)", dest.display());

    Ok(DownloadOutcome {
        id: dataset.id.clone(),
        path: dest,
        rows,
    })
}

/// Downloads every dataset in order. The first failure aborts the run.
///
/// `make_progress` creates the progress reporter for each dataset.
///
/// # Errors
///
/// Returns the first [`SourceError`] encountered.
pub async fn download_all<F>(
    client: &reqwest::Client,
    datasets: &[DatasetDefinition],
    raw_dir: &Path,
    make_progress: F,
) -> Result<Vec<DownloadOutcome>, SourceError>
where
    F: Fn(&DatasetDefinition) -> Arc<dyn ProgressCallback>,
{
    let mut outcomes = Vec::with_capacity(datasets.len());

    for dataset in datasets {
        let progress = make_progress(dataset);
        outcomes.push(download_dataset(client, dataset, raw_dir, progress.as_ref()).await?);
    }

    Ok(outcomes)
}
