//! CSV ingest through `arrow::csv` with schema inference.
//!
//! The standard NA spellings become nulls, rows shorter than the header are
//! padded with nulls, and every text column is widened to `LargeUtf8` so
//! that no single column is limited by 32-bit offsets.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use regex::Regex;

use crate::{Frame, FrameError};

/// Cell spellings read as missing values.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Rows decoded per Arrow batch before the batches are concatenated.
pub const BATCH_SIZE: usize = 65_536;

const BOM: char = '\u{feff}';

/// Builds the anchored pattern matching exactly one of [`NA_VALUES`].
///
/// # Errors
///
/// Returns [`FrameError::NaPattern`] if the pattern fails to compile.
pub fn na_pattern() -> Result<Regex, FrameError> {
    let alternatives: Vec<String> = NA_VALUES.iter().copied().map(regex::escape).collect();
    Ok(Regex::new(&format!("^(?:{})$", alternatives.join("|")))?)
}

/// Reads a header-first CSV file into a [`Frame`].
///
/// # Errors
///
/// Returns [`FrameError::Io`] if the file cannot be opened, or any error
/// from [`read_csv_from`].
pub fn read_csv(path: &Path) -> Result<Frame, FrameError> {
    let file = File::open(path).map_err(|e| FrameError::io(path, e))?;
    let frame = read_csv_from(file)?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        frame.height(),
        frame.width(),
        path.display()
    );
    Ok(frame)
}

/// Reads header-first CSV from a seekable reader into a [`Frame`].
///
/// The input is scanned once to infer the schema, then rewound and decoded.
///
/// # Errors
///
/// Returns [`FrameError::Arrow`] on malformed input, invalid UTF-8, or a
/// record wider than the header, and [`FrameError::DuplicateColumn`] when
/// two header cells are identical.
pub fn read_csv_from<R: Read + Seek>(mut reader: R) -> Result<Frame, FrameError> {
    let format = Format::default()
        .with_header(true)
        .with_null_regex(na_pattern()?)
        .with_truncated_rows(true);

    let (inferred, _) = format.infer_schema(&mut reader, None)?;
    reader.rewind().map_err(ArrowError::from)?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = if i == 0 {
                field.name().trim_start_matches(BOM)
            } else {
                field.name()
            };
            let data_type = match field.data_type() {
                DataType::Utf8 => DataType::LargeUtf8,
                other => other.clone(),
            };
            Field::new(name, data_type, true)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let batches = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(BATCH_SIZE)
        .build(reader)?
        .collect::<Result<Vec<_>, ArrowError>>()?;

    Frame::new(concat_batches(&schema, &batches)?)
}
