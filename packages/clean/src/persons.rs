//! Person table cleaning.

use collision_prep_frame::coerce::{clip, strip_upper, to_numeric};
use collision_prep_frame::{Frame, FrameError};

use crate::crashes::{COLLISION_ID, normalize_column_name};

const TABLE: &str = "persons";

/// Text columns trimmed and uppercased when present.
pub const TEXT_COLUMNS: &[&str] = &[
    "person_type",
    "person_injury",
    "ejection",
    "safety_equipment",
    "contributing_factor_1",
];

/// Columns (beyond `collision_id`) that identify a repeated person row.
pub const DEDUP_COLUMNS: &[&str] = &["person_type", "person_injury", "person_age"];

/// Oldest plausible age; larger values are clamped down to it.
pub const MAX_AGE: f64 = 110.0;

/// Cleans the raw person table.
///
/// Normalizes column names, standardizes the categorical text columns,
/// clamps `person_age` into `[0, 110]`, and drops repeated rows over
/// `collision_id` plus whichever of [`DEDUP_COLUMNS`] are present. Row
/// order is preserved.
///
/// # Errors
///
/// Returns [`FrameError::DuplicateColumn`] if two headers normalize to the
/// same name, or [`FrameError::MissingColumn`] without `collision_id`.
pub fn clean_persons(mut frame: Frame) -> Result<Frame, FrameError> {
    frame.rename_columns(normalize_column_name)?;
    frame.require(COLLISION_ID, TABLE)?;

    for name in TEXT_COLUMNS {
        frame.update_column(name, strip_upper)?;
    }

    frame.update_column("person_age", |data| {
        clip(&to_numeric(data)?, Some(0.0), Some(MAX_AGE))
    })?;

    let subset: Vec<&str> = std::iter::once(COLLISION_ID)
        .chain(DEDUP_COLUMNS.iter().copied().filter(|c| frame.contains(c)))
        .collect();

    frame.drop_duplicates(&subset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array as _, AsArray as _};
    use arrow::datatypes::{DataType, Float64Type, Int64Type};
    use collision_prep_frame::csv_io::read_csv_from;
    use std::io::Cursor;

    fn raw(csv: &str) -> Frame {
        read_csv_from(Cursor::new(csv)).unwrap()
    }

    fn persons(csv: &str) -> Frame {
        clean_persons(raw(csv)).unwrap()
    }

    fn text(frame: &Frame, name: &str) -> Vec<Option<String>> {
        frame
            .column(name)
            .unwrap()
            .as_string::<i64>()
            .iter()
            .map(|v| v.map(str::to_owned))
            .collect()
    }

    #[test]
    fn requires_collision_id() {
        let err = clean_persons(raw("PERSON_TYPE\nPedestrian\n")).unwrap_err();
        assert_eq!(err.to_string(), "Expected 'collision_id' in persons");
    }

    #[test]
    fn clamps_age_into_range() {
        let frame = persons("COLLISION_ID,PERSON_AGE\n1,150\n2,-4\n3,35\n4,unknown\n");
        let ages: Vec<Option<f64>> = frame
            .column("person_age")
            .unwrap()
            .as_primitive::<Float64Type>()
            .iter()
            .collect();
        assert_eq!(ages, vec![Some(110.0), Some(0.0), Some(35.0), None]);
    }

    #[test]
    fn integer_ages_stay_integers() {
        let frame = persons("COLLISION_ID,PERSON_AGE\n1,150\n");
        let ages = frame.column("person_age").unwrap();
        assert_eq!(ages.data_type(), &DataType::Int64);
        assert_eq!(ages.as_primitive::<Int64Type>().value(0), 110);
    }

    #[test]
    fn standardizes_text_columns() {
        let frame = persons(
            "COLLISION_ID,PERSON_TYPE,PERSON_INJURY,EJECTION,SAFETY_EQUIPMENT,CONTRIBUTING_FACTOR_1,PERSON_SEX\n\
             1, pedestrian ,Injured,not ejected,none,unspecified,f\n",
        );
        assert_eq!(text(&frame, "person_type"), vec![Some("PEDESTRIAN".to_string())]);
        assert_eq!(text(&frame, "person_injury"), vec![Some("INJURED".to_string())]);
        assert_eq!(text(&frame, "ejection"), vec![Some("NOT EJECTED".to_string())]);
        assert_eq!(text(&frame, "person_sex"), vec![Some("f".to_string())]);
    }

    #[test]
    fn drops_repeats_keeping_order() {
        let frame = persons(
            "COLLISION_ID,PERSON_TYPE,PERSON_INJURY,PERSON_AGE,PERSON_ID\n\
             2,Driver,Injured,30,a\n\
             1,Occupant,,,b\n\
             2,driver,injured,30,c\n\
             1,Occupant,,,d\n\
             1,Occupant,Killed,,e\n",
        );
        assert_eq!(
            text(&frame, "person_id"),
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("e".to_string()),
            ]
        );
    }

    #[test]
    fn dedups_on_collision_id_alone_without_person_columns() {
        let frame = persons("COLLISION_ID,VEHICLE_ID\n1,10\n1,11\n2,12\n");
        assert_eq!(frame.height(), 2);
    }
}
