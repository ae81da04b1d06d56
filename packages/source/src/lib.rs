#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw collision dataset sources.
//!
//! Datasets are described by embedded TOML configs ([`registry`]),
//! fetched with a streaming HTTP download ([`download`]), and rewritten
//! into a normalized CSV layout ([`normalize`]) under the data directory
//! resolved by [`paths`].

pub mod dataset_def;
pub mod download;
pub mod normalize;
pub mod paths;
pub mod progress;
pub mod registry;

/// Errors that can occur while fetching or normalizing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error reading or writing a local file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record is wider than the header row.
    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        /// 1-based line number of the record.
        line: u64,
        /// Header width.
        expected: usize,
        /// Record width.
        found: usize,
    },

    /// A dataset config is malformed or a dataset id is unknown.
    #[error("Registry error: {0}")]
    Registry(String),
}

impl SourceError {
    /// Wraps an [`std::io::Error`] with the path it relates to.
    #[must_use]
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
