#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reproducible fixed-size sampling of a large CSV.
//!
//! The input is streamed twice: once to count records, then in chunks,
//! drawing a proportional share from each chunk. A final draw over the
//! pooled chunk samples yields exactly the requested number of rows. Only
//! the pooled rows are held in memory.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use collision_prep_source::normalize::{count_rows, fit_record};
use collision_prep_source::progress::ProgressCallback;
use collision_prep_source::{SourceError, paths};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::index;

/// Default number of rows to sample.
pub const DEFAULT_SIZE: usize = 10_000;
/// Default number of records read per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 200_000;
/// Default RNG seed.
pub const DEFAULT_SEED: u64 = 42;

/// Errors from the sampling step.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The input has fewer records than requested.
    #[error("Cannot sample {requested} rows from {available}")]
    InsufficientPopulation {
        /// Requested sample size.
        requested: usize,
        /// Records in the input.
        available: usize,
    },

    /// Counting the input failed, or a record is wider than the header.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error on the input or output file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl SampleError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    /// CSV to sample from.
    pub input: PathBuf,
    /// Where to write the sample.
    pub output: PathBuf,
    /// Exact number of rows to draw.
    pub size: usize,
    /// Records per chunk on the second pass.
    pub chunk_size: usize,
    /// RNG seed; the same seed over the same input gives the same sample.
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            input: paths::raw_dir().join(paths::INTEGRATED_CSV),
            output: paths::processed_dir().join(paths::SAMPLE_CSV),
            size: DEFAULT_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<BufReader<File>>, SampleError> {
    let file = File::open(path).map_err(|e| SampleError::io(path, e))?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file)))
}

/// Rows to draw from a chunk of `len` records: `ceil(size * len / total)`,
/// capped at `len`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn chunk_quota(size: usize, len: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let (size, len_wide, total) = (size as u128, len as u128, total as u128);
    let quota = (size * len_wide).div_ceil(total);
    (quota as usize).min(len)
}

/// Draws `amount` distinct records from `pool` in draw order, using a
/// fresh RNG seeded with `seed`.
fn draw(pool: Vec<csv::ByteRecord>, amount: usize, seed: u64) -> Vec<csv::ByteRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let picks = index::sample(&mut rng, pool.len(), amount);
    let mut slots: Vec<Option<csv::ByteRecord>> = pool.into_iter().map(Some).collect();
    picks
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Samples `config.size` records from `config.input` into `config.output`,
/// returning the number of rows written.
///
/// Records shorter than the header are padded with empty fields.
///
/// # Errors
///
/// Returns [`SampleError::InsufficientPopulation`] when the input has
/// fewer records than requested, [`SourceError::RaggedRow`] (wrapped in
/// [`SampleError::Source`]) for a record wider than the header, or an I/O
/// or CSV error.
pub fn sample_csv(
    config: &SampleConfig,
    progress: &dyn ProgressCallback,
) -> Result<usize, SampleError> {
    progress.set_message("Counting rows".to_string());
    let total = usize::try_from(count_rows(&config.input)?).unwrap_or(usize::MAX);
    log::info!("Total rows: {total}");

    if total < config.size {
        return Err(SampleError::InsufficientPopulation {
            requested: config.size,
            available: total,
        });
    }

    let chunk_size = config.chunk_size.max(1);
    progress.set_message("Sampling".to_string());
    progress.set_total(total as u64);

    let mut reader = open_reader(&config.input)?;
    let header = reader.byte_headers()?.clone();
    let width = header.len();

    let mut pooled = Vec::with_capacity(config.size + total.div_ceil(chunk_size));
    let mut chunk = Vec::with_capacity(chunk_size.min(total));
    let mut record = csv::ByteRecord::new();
    // Header is line 1.
    let mut line: u64 = 1;

    loop {
        let more = reader.read_byte_record(&mut record)?;
        if more {
            line += 1;
            fit_record(&mut record, width, line)?;
            chunk.push(record.clone());
        }
        if chunk.len() == chunk_size || (!more && !chunk.is_empty()) {
            let len = chunk.len();
            let quota = chunk_quota(config.size, len, total);
            pooled.extend(draw(std::mem::take(&mut chunk), quota, config.seed));
            progress.inc(len as u64);
        }
        if !more {
            break;
        }
    }

    log::debug!("Pooled {} candidate rows", pooled.len());
    let sample = draw(pooled, config.size, config.seed);

    if let Some(parent) = config.output.parent() {
        paths::ensure_dir(parent).map_err(|e| SampleError::io(parent, e))?;
    }
    let file = File::create(&config.output).map_err(|e| SampleError::io(&config.output, e))?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(BufWriter::new(file));

    writer.write_byte_record(&header)?;
    for row in &sample {
        writer.write_byte_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| SampleError::io(&config.output, e))?;

    progress.finish(format!("Sampled {} rows", sample.len()));
    log::info!("Saved: {} ({} rows)", config.output.display(), sample.len());

    Ok(sample.len())
}
