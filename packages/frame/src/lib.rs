#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Arrow-backed tables for the collision pipeline.
//!
//! A [`Frame`] wraps a single [`RecordBatch`] whose columns are uniquely
//! named and always nullable. Every operation returns a new frame whose
//! rows are numbered from zero again.
//!
//! * [`csv_io`] loads header-first CSV through `arrow::csv` with schema
//!   inference.
//! * [`parquet_io`] persists frames as Parquet and reads them back.
//! * [`coerce`] holds the column conversions (numeric coercion, clamping,
//!   text normalization) built on the `cast`, `cmp` and `zip` kernels.
//! * [`ops`] holds sort, dedup and the left join.

pub mod coerce;
pub mod csv_io;
pub mod ops;
pub mod parquet_io;

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray};
use arrow::compute::{filter_record_batch, take_record_batch};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

/// Errors produced while building, reading, or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A required column is missing from a named table.
    #[error("Expected '{column}' in {table}")]
    MissingColumn {
        /// The missing column name.
        column: String,
        /// The table that should have contained it.
        table: String,
    },

    /// Two columns share a name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column's length differs from the frame height.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        /// Offending column.
        column: String,
        /// Frame height.
        expected: usize,
        /// Column length.
        found: usize,
    },

    /// A file could not be opened or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV decoding or an Arrow compute kernel failed.
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Reading or writing Parquet failed.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The NA-token pattern failed to compile.
    #[error("NA pattern error: {0}")]
    NaPattern(#[from] regex::Error),
}

impl FrameError {
    /// Wraps an [`std::io::Error`] with the path it relates to.
    #[must_use]
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// A record batch with uniquely named, nullable columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    batch: RecordBatch,
}

impl Frame {
    /// Wraps a record batch.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::DuplicateColumn`] if two fields share a name.
    pub fn new(batch: RecordBatch) -> Result<Self, FrameError> {
        check_unique(batch.schema_ref().fields().iter().map(|f| f.name().as_str()))?;
        Ok(Self { batch })
    }

    /// Builds a frame from named columns.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::DuplicateColumn`] if two columns share a name,
    /// or [`FrameError::LengthMismatch`] if the columns differ in length.
    pub fn from_columns(columns: Vec<(String, ArrayRef)>) -> Result<Self, FrameError> {
        let height = columns.first().map_or(0, |(_, array)| array.len());
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for (name, array) in columns {
            check_len(&name, array.len(), height)?;
            fields.push(Field::new(name, array.data_type().clone(), true));
            arrays.push(array);
        }
        Self::assemble(fields, arrays, height)
    }

    fn assemble(
        fields: Vec<Field>,
        arrays: Vec<ArrayRef>,
        height: usize,
    ) -> Result<Self, FrameError> {
        check_unique(fields.iter().map(|f| f.name().as_str()))?;
        let options = RecordBatchOptions::new().with_row_count(Some(height));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Self { batch })
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.batch.num_columns()
    }

    /// The frame's schema.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// The underlying record batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Returns `true` if a column with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Ensures a column exists, naming `table` in the error otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] when `name` is absent.
    pub fn require(&self, name: &str, table: &str) -> Result<&ArrayRef, FrameError> {
        self.column(name).ok_or_else(|| FrameError::MissingColumn {
            column: name.to_string(),
            table: table.to_string(),
        })
    }

    /// Replaces the column of the same name in place, or appends it when no
    /// such column exists.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::LengthMismatch`] if the column length differs
    /// from the frame height.
    pub fn set_column(&mut self, name: &str, array: ArrayRef) -> Result<(), FrameError> {
        let height = self.height();
        check_len(name, array.len(), height)?;

        let mut fields: Vec<Field> = self
            .batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut arrays = self.batch.columns().to_vec();
        let field = Field::new(name, array.data_type().clone(), true);

        match self.batch.schema_ref().column_with_name(name) {
            Some((idx, _)) => {
                fields[idx] = field;
                arrays[idx] = array;
            }
            None => {
                fields.push(field);
                arrays.push(array);
            }
        }

        *self = Self::assemble(fields, arrays, height)?;
        Ok(())
    }

    /// Rewrites an existing column with `f`. Does nothing when the column is
    /// absent.
    ///
    /// # Errors
    ///
    /// Propagates errors from `f`, and returns
    /// [`FrameError::LengthMismatch`] if `f` changes the number of cells.
    pub fn update_column(
        &mut self,
        name: &str,
        f: impl FnOnce(&ArrayRef) -> Result<ArrayRef, FrameError>,
    ) -> Result<(), FrameError> {
        let Some(column) = self.column(name) else {
            return Ok(());
        };
        let updated = f(column)?;
        self.set_column(name, updated)
    }

    /// Renames every column with `f`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::DuplicateColumn`] if two columns end up with
    /// the same name.
    pub fn rename_columns(&mut self, f: impl Fn(&str) -> String) -> Result<(), FrameError> {
        let fields: Vec<Field> = self
            .batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| field.as_ref().clone().with_name(f(field.name())))
            .collect();
        *self = Self::assemble(fields, self.batch.columns().to_vec(), self.height())?;
        Ok(())
    }

    /// Gathers the rows at `indices`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Arrow`] if an index is out of bounds.
    pub fn take(&self, indices: &dyn Array) -> Result<Self, FrameError> {
        Ok(Self {
            batch: take_record_batch(&self.batch, indices)?,
        })
    }

    /// Keeps only the rows whose `mask` entry is `true`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Arrow`] if `mask` does not match the height.
    pub fn filter(&self, mask: &BooleanArray) -> Result<Self, FrameError> {
        Ok(Self {
            batch: filter_record_batch(&self.batch, mask)?,
        })
    }
}

fn check_len(name: &str, found: usize, expected: usize) -> Result<(), FrameError> {
    if found == expected {
        return Ok(());
    }
    Err(FrameError::LengthMismatch {
        column: name.to_string(),
        expected,
        found,
    })
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), FrameError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(FrameError::DuplicateColumn(name.to_string()));
        }
    }
    Ok(())
}
