//! Rewrites a downloaded CSV into a normalized layout.
//!
//! The normalized file uses `\n` line endings, minimal quoting, valid
//! UTF-8 (invalid bytes are replaced) and no byte-order mark. Records
//! shorter than the header are padded with empty fields; longer records
//! are rejected.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::SourceError;

const BOM: char = '\u{feff}';

/// Normalizes the CSV at `path` in place, returning the number of data
/// rows written.
///
/// Writes to a sibling temp file and renames it over the original, so a
/// failure never leaves a half-written file at `path`.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] for malformed input,
/// [`SourceError::RaggedRow`] for records wider than the header, and
/// [`SourceError::Io`] for file system failures.
pub fn normalize_csv(path: &Path) -> Result<u64, SourceError> {
    let tmp = temp_path(path);
    let result = write_normalized(path, &tmp);

    match result {
        Ok(rows) => {
            std::fs::rename(&tmp, path).map_err(|e| SourceError::io(path, e))?;
            Ok(rows)
        }
        Err(e) => {
            std::fs::remove_file(&tmp).ok();
            Err(e)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_normalized(src: &Path, dest: &Path) -> Result<u64, SourceError> {
    let input = File::open(src).map_err(|e| SourceError::io(src, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(input));

    let output = File::create(dest).map_err(|e| SourceError::io(dest, e))?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(BufWriter::new(output));

    let mut records = reader.byte_records();
    let Some(header) = records.next().transpose()? else {
        writer.flush().map_err(|e| SourceError::io(dest, e))?;
        return Ok(0);
    };

    let header: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let text = String::from_utf8_lossy(field);
            if i == 0 {
                text.trim_start_matches(BOM).to_string()
            } else {
                text.into_owned()
            }
        })
        .collect();
    let width = header.len();
    writer.write_record(&header)?;

    let mut rows: u64 = 0;
    for (index, record) in records.enumerate() {
        let mut record = record?;
        // Header is line 1.
        fit_record(&mut record, width, index as u64 + 2)?;

        let fields: Vec<String> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();

        writer.write_record(&fields)?;
        rows += 1;
    }

    writer.flush().map_err(|e| SourceError::io(dest, e))?;
    Ok(rows)
}

/// Pads `record` with empty fields up to `width`.
///
/// `line` is the record's 1-based position in the file, header included,
/// and is only used for the error.
///
/// # Errors
///
/// Returns [`SourceError::RaggedRow`] if the record is wider than `width`.
pub fn fit_record(
    record: &mut csv::ByteRecord,
    width: usize,
    line: u64,
) -> Result<(), SourceError> {
    if record.len() > width {
        return Err(SourceError::RaggedRow {
            line,
            expected: width,
            found: record.len(),
        });
    }
    while record.len() < width {
        record.push_field(b"");
    }
    Ok(())
}

/// Counts the data rows (excluding the header) of a CSV file.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] or [`SourceError::Io`] if the file cannot
/// be read.
pub fn count_rows(path: &Path) -> Result<u64, SourceError> {
    let input = File::open(path).map_err(|e| SourceError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(input));

    let mut record = csv::ByteRecord::new();
    let mut rows = 0;
    while reader.read_byte_record(&mut record)? {
        rows += 1;
    }
    Ok(rows)
}
