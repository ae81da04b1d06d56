//! Crash table cleaning.

use std::sync::Arc;

use arrow::array::{
    Array as _, ArrayRef, AsArray as _, BooleanArray, TimestampMicrosecondArray, new_null_array,
};
use arrow::compute::kernels::boolean::{and, is_not_null, or};
use arrow::compute::kernels::cast::cast;
use arrow::compute::kernels::temporal::{DatePart, date_part};
use arrow::datatypes::{DataType, TimeUnit};
use collision_prep_frame::coerce::{clip, strip_upper, to_numeric};
use collision_prep_frame::ops::SortKey;
use collision_prep_frame::{Frame, FrameError};

use crate::datetime::parse_fuzzy;

/// Key column shared by the crash and person tables.
pub const COLLISION_ID: &str = "collision_id";
/// Combined crash timestamp column added during cleaning.
pub const CRASH_DATETIME: &str = "crash_datetime";

const TABLE: &str = "crashes";

const DATE_PARTS: [(&str, DatePart); 4] = [
    ("year", DatePart::Year),
    ("month", DatePart::Month),
    ("day", DatePart::Day),
    ("hour", DatePart::Hour),
];

/// Normalizes a raw header: trims, lowercases, and replaces spaces with
/// underscores (`"CRASH DATE"` becomes `"crash_date"`).
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Cleans the raw crash table.
///
/// 1. Normalizes column names.
/// 2. Requires `collision_id`.
/// 3. Combines `crash_date` and `crash_time` into `crash_datetime` and
///    derives `year`, `month`, `day` and `hour`.
/// 4. Trims and uppercases `borough`.
/// 5. Coerces every `*injured*`/`*killed*` column to numbers, clamping
///    negatives to zero.
/// 6. Keeps one row per `collision_id`, preferring the latest timestamp.
/// 7. Coerces `latitude`/`longitude` to numbers.
/// 8. Drops rows with no timestamp, no borough, and no full coordinate pair.
///
/// # Errors
///
/// Returns [`FrameError::DuplicateColumn`] if two headers normalize to the
/// same name, or [`FrameError::MissingColumn`] without `collision_id`.
pub fn clean_crashes(mut frame: Frame) -> Result<Frame, FrameError> {
    frame.rename_columns(normalize_column_name)?;
    frame.require(COLLISION_ID, TABLE)?;

    add_crash_datetime(&mut frame)?;

    frame.update_column("borough", strip_upper)?;

    let counts: Vec<String> = frame
        .column_names()
        .into_iter()
        .filter(|name| name.contains("injured") || name.contains("killed"))
        .map(str::to_owned)
        .collect();
    for name in &counts {
        frame.update_column(name, |data| clip(&to_numeric(data)?, Some(0.0), None))?;
    }

    let mut frame = frame
        .sort_by(&[SortKey::asc(COLLISION_ID), SortKey::desc(CRASH_DATETIME)])?
        .drop_duplicates(&[COLLISION_ID])?;

    frame.update_column("latitude", to_numeric)?;
    frame.update_column("longitude", to_numeric)?;

    let mask = keep_mask(&frame)?;
    frame.filter(&mask)
}

fn add_crash_datetime(frame: &mut Frame) -> Result<(), FrameError> {
    let (Some(date), Some(time)) = (
        frame.column("crash_date").cloned(),
        frame.column("crash_time").cloned(),
    ) else {
        let nulls = new_null_array(
            &DataType::Timestamp(TimeUnit::Microsecond, None),
            frame.height(),
        );
        return frame.set_column(CRASH_DATETIME, nulls);
    };

    let date = cast(&date, &DataType::LargeUtf8)?;
    let time = cast(&time, &DataType::LargeUtf8)?;
    let stamps: TimestampMicrosecondArray = date
        .as_string::<i64>()
        .iter()
        .zip(time.as_string::<i64>().iter())
        .map(|(date, time)| {
            let parsed = match time {
                None => parse_fuzzy(date?),
                Some(time) => parse_fuzzy(&format!("{} {time}", date?)),
            };
            parsed.map(|ts| ts.and_utc().timestamp_micros())
        })
        .collect();
    let stamps: ArrayRef = Arc::new(stamps);

    frame.set_column(CRASH_DATETIME, Arc::clone(&stamps))?;
    for (name, part) in DATE_PARTS {
        frame.set_column(name, date_part(stamps.as_ref(), part)?)?;
    }

    Ok(())
}

/// Rows with a timestamp, a borough, or both coordinates.
fn keep_mask(frame: &Frame) -> Result<BooleanArray, FrameError> {
    let present = |name: &str| match frame.column(name) {
        Some(column) => is_not_null(column.as_ref()),
        None => Ok(BooleanArray::from(vec![false; frame.height()])),
    };

    let located = and(&present("latitude")?, &present("longitude")?)?;
    let placed = or(&present("borough")?, &located)?;
    Ok(or(&present(CRASH_DATETIME)?, &placed)?)
}
