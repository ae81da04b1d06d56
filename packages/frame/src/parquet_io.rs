//! Parquet persistence for [`Frame`]s.
//!
//! Frames are written in [`ROW_GROUP_SIZE`] slices so that no single batch
//! handed to the writer grows with the table. The Arrow schema is stored in
//! the file metadata, so column types (including `LargeUtf8` text) read back
//! unchanged.

use std::fs::File;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::error::ArrowError;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::{Frame, FrameError};

/// Rows written per Parquet row group.
pub const ROW_GROUP_SIZE: usize = 65_536;

/// Writes a frame to `path` as Snappy-compressed Parquet, overwriting any
/// existing file.
///
/// # Errors
///
/// Returns [`FrameError::Io`] if the file cannot be created, or
/// [`FrameError::Parquet`] if encoding fails.
pub fn write_parquet(frame: &Frame, path: &Path) -> Result<(), FrameError> {
    let file = File::create(path).map_err(|e| FrameError::io(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(ROW_GROUP_SIZE)
        .build();

    let mut writer = ArrowWriter::try_new(file, frame.schema(), Some(props))?;
    let height = frame.height();
    for offset in (0..height).step_by(ROW_GROUP_SIZE) {
        let len = ROW_GROUP_SIZE.min(height - offset);
        writer.write(&frame.batch().slice(offset, len))?;
    }
    writer.close()?;

    log::debug!(
        "Wrote {} rows x {} columns to {}",
        height,
        frame.width(),
        path.display()
    );
    Ok(())
}

/// Reads a Parquet file back into a single frame.
///
/// # Errors
///
/// Returns [`FrameError::Io`] if the file cannot be opened,
/// [`FrameError::Parquet`]/[`FrameError::Arrow`] on decode failures, and
/// [`FrameError::DuplicateColumn`] if the file repeats a column name.
pub fn read_parquet(path: &Path) -> Result<Frame, FrameError> {
    let file = File::open(path).map_err(|e| FrameError::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<Result<Vec<_>, ArrowError>>()?;

    Frame::new(concat_batches(&schema, &batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{
        Array as _, ArrayRef, Float64Array, Int64Array, LargeStringArray, TimestampMicrosecondArray,
    };
    use arrow::datatypes::DataType;

    fn column(name: &str, array: ArrayRef) -> (String, ArrayRef) {
        (name.to_string(), array)
    }

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("collision_prep_frame_parquet_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn writes_and_reads_back_every_type() {
        let frame = Frame::from_columns(vec![
            column("collision_id", Arc::new(Int64Array::from(vec![1, 2]))),
            column("latitude", Arc::new(Float64Array::from(vec![Some(40.7), None]))),
            column(
                "borough",
                Arc::new(LargeStringArray::from(vec![Some("QUEENS"), None])),
            ),
            column(
                "crash_datetime",
                Arc::new(TimestampMicrosecondArray::from(vec![
                    None,
                    Some(1_647_225_540_000_000),
                ])),
            ),
        ])
        .unwrap();

        let path = scratch("types.parquet");
        write_parquet(&frame, &path).unwrap();
        let read = read_parquet(&path).unwrap();

        assert_eq!(read, frame);
        assert_eq!(
            read.column("borough").unwrap().data_type(),
            &DataType::LargeUtf8
        );
    }

    #[test]
    fn writes_tables_larger_than_one_row_group() {
        let height = ROW_GROUP_SIZE + 10;
        let ids: Vec<i64> = (0..).take(height).collect();
        let frame =
            Frame::from_columns(vec![column("collision_id", Arc::new(Int64Array::from(ids)))])
                .unwrap();

        let path = scratch("groups.parquet");
        write_parquet(&frame, &path).unwrap();

        let file = File::open(&path).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        assert_eq!(builder.metadata().num_row_groups(), 2);
        assert_eq!(read_parquet(&path).unwrap(), frame);
    }

    #[test]
    fn empty_frame_keeps_its_schema() {
        let empty: ArrayRef = Arc::new(Int64Array::from(Vec::<i64>::new()));
        let frame = Frame::from_columns(vec![column("collision_id", empty)]).unwrap();

        let path = scratch("empty.parquet");
        write_parquet(&frame, &path).unwrap();
        let read = read_parquet(&path).unwrap();

        assert_eq!(read.height(), 0);
        assert_eq!(read.column_names(), vec!["collision_id"]);
    }
}
