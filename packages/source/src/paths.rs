#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the pipeline's data directory.
//!
//! Paths resolve under `<project root>/data/` unless the
//! `COLLISION_PREP_DATA_DIR` environment variable points elsewhere.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "COLLISION_PREP_DATA_DIR";

/// Raw crash export file name.
pub const CRASHES_CSV: &str = "crashes.csv";
/// Raw person export file name.
pub const PERSONS_CSV: &str = "persons.csv";
/// Cleaned crash table file name.
pub const CRASHES_PARQUET: &str = "crashes_clean.parquet";
/// Cleaned person table file name.
pub const PERSONS_PARQUET: &str = "persons_clean.parquet";
/// Integrated table file name.
pub const INTEGRATED_PARQUET: &str = "integrated.parquet";
/// Run summary file name.
pub const SUMMARY_JSON: &str = "summary.json";
/// Sampler input file name.
pub const INTEGRATED_CSV: &str = "integrated.csv";
/// Sampler output file name.
pub const SAMPLE_CSV: &str = "integrated_10k.csv";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`, two levels above
/// this package. Falls back to the package directory itself.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.ancestors().nth(2).unwrap_or(manifest).to_path_buf()
}

/// Returns the data directory: `$COLLISION_PREP_DATA_DIR` if set and
/// non-empty, otherwise `<project root>/data`.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the `raw/` directory for downloaded exports.
#[must_use]
pub fn raw_dir() -> PathBuf {
    data_dir().join("raw")
}

/// Returns the `processed/` directory for cleaned outputs.
#[must_use]
pub fn processed_dir() -> PathBuf {
    data_dir().join("processed")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
