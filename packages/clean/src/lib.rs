#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cleaning and integration step.
//!
//! Reads the raw crash and person CSVs, cleans each table, left joins them
//! on `collision_id`, and writes three Parquet files plus a JSON run
//! summary into the processed directory.

pub mod crashes;
pub mod datetime;
pub mod integrate;
pub mod persons;
pub mod summary;

use std::path::{Path, PathBuf};
use std::time::Instant;

use collision_prep_frame::csv_io::read_csv;
use collision_prep_frame::parquet_io::write_parquet;
use collision_prep_frame::{Frame, FrameError};
use collision_prep_source::paths;
use collision_prep_source::progress::{ProgressCallback, stage};

pub use summary::PipelineSummary;

/// Errors from the cleaning step.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    /// Reading, transforming, or writing a table failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// I/O error on a file or directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing the run summary failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input and output locations for a cleaning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanConfig {
    /// Directory holding `crashes.csv` and `persons.csv`.
    pub raw_dir: PathBuf,
    /// Directory the Parquet files and `summary.json` are written to.
    pub processed_dir: PathBuf,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            raw_dir: paths::raw_dir(),
            processed_dir: paths::processed_dir(),
        }
    }
}

/// Number of progress steps reported by [`run`].
pub const STEPS: u64 = 5;

/// Runs the full clean-and-integrate step.
///
/// # Errors
///
/// Returns [`CleanError`] if an input cannot be read, a required column is
/// missing, or an output cannot be written.
pub fn run(
    config: &CleanConfig,
    progress: &dyn ProgressCallback,
) -> Result<PipelineSummary, CleanError> {
    paths::ensure_dir(&config.processed_dir).map_err(|e| CleanError::Io {
        path: config.processed_dir.display().to_string(),
        source: e,
    })?;

    let (raw_crashes, raw_persons) = stage(progress, "Loading raw CSVs", || {
        let start = Instant::now();
        let crashes = read_csv(&config.raw_dir.join(paths::CRASHES_CSV))?;
        let persons = read_csv(&config.raw_dir.join(paths::PERSONS_CSV))?;
        log::info!(
            "Loaded {} crashes and {} persons in {:.1}s",
            crashes.height(),
            persons.height(),
            start.elapsed().as_secs_f64()
        );
        Ok::<_, FrameError>((crashes, persons))
    })?;

    let crashes = stage(progress, "Cleaning crashes", || {
        crashes::clean_crashes(raw_crashes)
    })?;
    log::info!("Crashes after clean: {}", crashes.height());

    let persons = stage(progress, "Cleaning persons", || {
        persons::clean_persons(raw_persons)
    })?;
    log::info!("Persons after clean: {}", persons.height());

    let integrated = stage(progress, "Integrating on collision_id", || {
        integrate::integrate(&crashes, &persons)
    })?;
    log::info!("Integrated rows: {}", integrated.height());

    let summary = stage(progress, "Saving Parquet", || {
        save(&crashes, &config.processed_dir.join(paths::CRASHES_PARQUET))?;
        save(&persons, &config.processed_dir.join(paths::PERSONS_PARQUET))?;
        save(&integrated, &config.processed_dir.join(paths::INTEGRATED_PARQUET))?;

        let summary = PipelineSummary::compute(&crashes, &persons, &integrated)
            .map_err(FrameError::from)?;
        write_summary(&summary, &config.processed_dir.join(paths::SUMMARY_JSON))?;
        Ok::<_, CleanError>(summary)
    })?;

    progress.finish("Clean complete".to_string());
    Ok(summary)
}

fn save(frame: &Frame, path: &Path) -> Result<(), CleanError> {
    write_parquet(frame, path)?;
    log::info!("Saved: {} ({} rows)", path.display(), frame.height());
    Ok(())
}

fn write_summary(summary: &PipelineSummary, path: &Path) -> Result<(), CleanError> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).map_err(|e| CleanError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("Saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray as _;
    use arrow::datatypes::Int64Type;
    use collision_prep_frame::parquet_io::read_parquet;
    use collision_prep_source::progress::NullProgress;

    const CRASHES: &str = "\u{feff}CRASH DATE,CRASH TIME,BOROUGH,LATITUDE,LONGITUDE,NUMBER OF PERSONS INJURED,NUMBER OF PERSONS KILLED,COLLISION_ID\n\
        03/14/2022,10:30, Queens ,40.7,-73.9,1,0,100\n\
        ,,,,,,,100\n\
        03/14/2022,[,,,,-2,0,101\n\
        01/01/2021,0:05,BROOKLYN,,,0,1,102\n";

    const PERSONS: &str = "COLLISION_ID,PERSON_TYPE,PERSON_INJURY,PERSON_AGE\n\
        100,Pedestrian,Injured,150\n\
        100,Pedestrian,Injured,150\n\
        102,Occupant,Killed,40\n\
        999,Driver,Unspecified,30\n";

    fn setup(name: &str) -> CleanConfig {
        let root = std::env::temp_dir().join("collision_prep_clean_test").join(name);
        std::fs::remove_dir_all(&root).ok();
        let raw_dir = root.join("raw");
        std::fs::create_dir_all(&raw_dir).unwrap();
        std::fs::write(raw_dir.join(paths::CRASHES_CSV), CRASHES).unwrap();
        std::fs::write(raw_dir.join(paths::PERSONS_CSV), PERSONS).unwrap();
        CleanConfig {
            raw_dir,
            processed_dir: root.join("processed"),
        }
    }

    #[test]
    fn writes_parquet_outputs_and_summary() {
        let config = setup("outputs");
        let summary = run(&config, &NullProgress).unwrap();

        assert_eq!(summary.crash_rows, 2);
        assert_eq!(summary.person_rows, 3);
        assert_eq!(summary.integrated_rows, 2);

        let crashes = read_parquet(&config.processed_dir.join(paths::CRASHES_PARQUET)).unwrap();
        let ids = crashes.column("collision_id").unwrap().as_primitive::<Int64Type>();
        assert_eq!(ids.values().to_vec(), vec![100, 102]);
        assert_eq!(
            crashes.column("borough").unwrap().as_string::<i64>().value(0),
            "QUEENS"
        );

        let persons = read_parquet(&config.processed_dir.join(paths::PERSONS_PARQUET)).unwrap();
        assert_eq!(
            persons.column("person_age").unwrap().as_primitive::<Int64Type>().value(0),
            110
        );

        let json = std::fs::read_to_string(config.processed_dir.join(paths::SUMMARY_JSON)).unwrap();
        let parsed: PipelineSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn rerunning_produces_identical_tables() {
        let config = setup("idempotent");
        run(&config, &NullProgress).unwrap();
        let first = read_parquet(&config.processed_dir.join(paths::INTEGRATED_PARQUET)).unwrap();
        run(&config, &NullProgress).unwrap();
        let second = read_parquet(&config.processed_dir.join(paths::INTEGRATED_PARQUET)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_input_is_an_error() {
        let config = setup("missing");
        std::fs::remove_file(config.raw_dir.join(paths::PERSONS_CSV)).unwrap();
        assert!(matches!(
            run(&config, &NullProgress),
            Err(CleanError::Frame(FrameError::Io { .. }))
        ));
    }
}
