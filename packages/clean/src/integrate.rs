//! Crash/person integration.

use collision_prep_frame::coerce::blank_to_null;
use arrow::datatypes::DataType;
use collision_prep_frame::{Frame, FrameError};

use crate::crashes::COLLISION_ID;

/// Suffix appended to person columns whose names clash with crash columns.
pub const PERSON_SUFFIX: &str = "_person";

/// Left joins cleaned crashes with cleaned persons on `collision_id`, then
/// turns empty strings in every text column into nulls.
///
/// # Errors
///
/// Returns [`FrameError::MissingColumn`] if either table lacks
/// `collision_id`.
pub fn integrate(crashes: &Frame, persons: &Frame) -> Result<Frame, FrameError> {
    let mut merged = crashes.left_join(persons, COLLISION_ID, PERSON_SUFFIX)?;

    let text_columns: Vec<String> = merged
        .schema()
        .fields()
        .iter()
        .filter(|f| matches!(f.data_type(), DataType::Utf8 | DataType::LargeUtf8))
        .map(|f| f.name().clone())
        .collect();
    for name in &text_columns {
        merged.update_column(name, blank_to_null)?;
    }

    log::debug!(
        "Joined {} crashes with {} persons into {} rows",
        crashes.height(),
        persons.height(),
        merged.height()
    );

    Ok(merged)
}
