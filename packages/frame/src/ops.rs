//! Row-level operations: sorting, deduplication, and the left join.
//!
//! Sorting runs on `lexsort_to_indices`; dedup and join keys use the
//! `arrow::row` format, so nulls compare equal to nulls and every column
//! type hashes the same way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arrow::array::{Array as _, ArrayRef, BooleanArray, UInt64Array};
use arrow::compute::kernels::cast::cast;
use arrow::compute::{SortColumn, SortOptions, lexsort_to_indices, take};
use arrow::row::{RowConverter, SortField};

use crate::{Frame, FrameError};

/// One key of a multi-column sort.
#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
    /// Column to sort on.
    pub column: &'a str,
    /// Sort largest first.
    pub descending: bool,
}

impl<'a> SortKey<'a> {
    /// Ascending sort on `column`.
    #[must_use]
    pub const fn asc(column: &'a str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    /// Descending sort on `column`.
    #[must_use]
    pub const fn desc(column: &'a str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

fn row_converter(columns: &[ArrayRef]) -> Result<RowConverter, FrameError> {
    let fields = columns
        .iter()
        .map(|c| SortField::new(c.data_type().clone()))
        .collect();
    Ok(RowConverter::new(fields)?)
}

impl Frame {
    /// Stable multi-column sort. Nulls sort last for every key regardless
    /// of direction.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] if a sort column is absent.
    pub fn sort_by(&self, keys: &[SortKey<'_>]) -> Result<Self, FrameError> {
        let mut columns = keys
            .iter()
            .map(|key| {
                Ok(SortColumn {
                    values: Arc::clone(self.require(key.column, "sort keys")?),
                    options: Some(SortOptions {
                        descending: key.descending,
                        nulls_first: false,
                    }),
                })
            })
            .collect::<Result<Vec<_>, FrameError>>()?;

        // Row position breaks ties so equal keys keep their input order.
        let position: ArrayRef = Arc::new(UInt64Array::from_iter_values(
            (0..self.height()).map(|i| i as u64),
        ));
        columns.push(SortColumn {
            values: position,
            options: None,
        });

        let indices = lexsort_to_indices(&columns, None)?;
        self.take(&indices)
    }

    /// Drops rows that repeat an earlier row across `subset`, keeping the
    /// first occurrence. Nulls compare equal to nulls.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] if a subset column is absent.
    pub fn drop_duplicates(&self, subset: &[&str]) -> Result<Self, FrameError> {
        let columns = subset
            .iter()
            .map(|name| Ok(Arc::clone(self.require(name, "dedup subset")?)))
            .collect::<Result<Vec<_>, FrameError>>()?;

        let rows = row_converter(&columns)?.convert_columns(&columns)?;
        let mut seen = HashSet::with_capacity(rows.num_rows());
        let first: Vec<bool> = rows.iter().map(|row| seen.insert(row)).collect();

        self.filter(&BooleanArray::from(first))
    }

    /// Left join on `on`.
    ///
    /// Every left row appears once per matching right row (in right-table
    /// order), or once with nulls in the right-side columns when nothing
    /// matches. Null keys never match. The right key is cast to the left
    /// key's type first, so `100` and `100.0` match. Right-side columns
    /// other than `on` follow the left columns; a right column whose name is
    /// already taken is renamed with `suffix` appended.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] if either side lacks `on`, or
    /// [`FrameError::DuplicateColumn`] if a suffixed name is still taken.
    pub fn left_join(&self, right: &Self, on: &str, suffix: &str) -> Result<Self, FrameError> {
        let left_key = Arc::clone(self.require(on, "left join input")?);
        let right_key = cast(right.require(on, "right join input")?, left_key.data_type())?;

        let converter = row_converter(std::slice::from_ref(&left_key))?;
        let left_rows = converter.convert_columns(std::slice::from_ref(&left_key))?;
        let right_rows = converter.convert_columns(std::slice::from_ref(&right_key))?;

        let mut matches: HashMap<_, Vec<u64>> = HashMap::new();
        for (idx, row) in right_rows.iter().enumerate() {
            if right_key.is_valid(idx) {
                matches.entry(row).or_default().push(idx as u64);
            }
        }

        let mut left_indices = Vec::with_capacity(self.height());
        let mut right_indices = Vec::with_capacity(self.height());
        for (idx, row) in left_rows.iter().enumerate() {
            let found = left_key
                .is_valid(idx)
                .then(|| matches.get(&row))
                .flatten();
            match found {
                Some(hits) => {
                    for &hit in hits {
                        left_indices.push(idx as u64);
                        right_indices.push(Some(hit));
                    }
                }
                None => {
                    left_indices.push(idx as u64);
                    right_indices.push(None);
                }
            }
        }
        let left_indices = UInt64Array::from(left_indices);
        let right_indices = UInt64Array::from(right_indices);

        let mut columns = Vec::with_capacity(self.width() + right.width());
        for (name, column) in self.column_names().into_iter().zip(self.batch().columns()) {
            columns.push((name.to_string(), take(column, &left_indices, None)?));
        }
        for (name, column) in right.column_names().into_iter().zip(right.batch().columns()) {
            if name == on {
                continue;
            }
            let name = if columns.iter().any(|(taken, _)| taken == name) {
                format!("{name}{suffix}")
            } else {
                name.to_string()
            };
            columns.push((name, take(column, &right_indices, None)?));
        }

        Self::from_columns(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray as _, Float64Array, Int64Array, LargeStringArray};
    use arrow::datatypes::Int64Type;

    fn ints(name: &str, values: &[Option<i64>]) -> (String, ArrayRef) {
        (name.to_string(), Arc::new(Int64Array::from(values.to_vec())))
    }

    fn text(name: &str, values: &[Option<&str>]) -> (String, ArrayRef) {
        (
            name.to_string(),
            Arc::new(values.iter().copied().collect::<LargeStringArray>()),
        )
    }

    fn int_values(frame: &Frame, name: &str) -> Vec<Option<i64>> {
        frame
            .column(name)
            .unwrap()
            .as_primitive::<Int64Type>()
            .iter()
            .collect()
    }

    fn text_values(frame: &Frame, name: &str) -> Vec<Option<String>> {
        frame
            .column(name)
            .unwrap()
            .as_string::<i64>()
            .iter()
            .map(|v| v.map(str::to_owned))
            .collect()
    }

    #[test]
    fn sort_puts_nulls_last_in_both_directions() {
        let frame = Frame::from_columns(vec![
            ints("id", &[Some(2), Some(1), Some(1), Some(1)]),
            ints("ts", &[Some(5), None, Some(3), Some(7)]),
        ])
        .unwrap();

        let sorted = frame
            .sort_by(&[SortKey::asc("id"), SortKey::desc("ts")])
            .unwrap();

        assert_eq!(int_values(&sorted, "ts"), vec![Some(7), Some(3), None, Some(5)]);
    }

    #[test]
    fn sort_is_stable() {
        let frame = Frame::from_columns(vec![
            ints("k", &[Some(1), Some(1), Some(0)]),
            text("tag", &[Some("first"), Some("second"), Some("zero")]),
        ])
        .unwrap();
        let sorted = frame.sort_by(&[SortKey::asc("k")]).unwrap();
        assert_eq!(
            text_values(&sorted, "tag"),
            vec![
                Some("zero".to_string()),
                Some("first".to_string()),
                Some("second".to_string())
            ]
        );
    }

    #[test]
    fn drop_duplicates_treats_nulls_as_equal() {
        let frame = Frame::from_columns(vec![
            ints("id", &[Some(1), Some(1), Some(1), Some(2)]),
            text("t", &[None, None, Some("A"), None]),
        ])
        .unwrap();
        let deduped = frame.drop_duplicates(&["id", "t"]).unwrap();
        assert_eq!(deduped.height(), 3);
        assert_eq!(text_values(&deduped, "t")[1].as_deref(), Some("A"));
    }

    #[test]
    fn left_join_expands_and_nulls() {
        let left = Frame::from_columns(vec![
            ints("collision_id", &[Some(1), Some(2), None]),
            text("borough", &[Some("QUEENS"), Some("BRONX"), None]),
        ])
        .unwrap();
        let right = Frame::from_columns(vec![
            ints("collision_id", &[Some(1), Some(1), None]),
            text("borough", &[Some("x"), Some("y"), Some("z")]),
            ints("person_age", &[Some(30), Some(40), Some(50)]),
        ])
        .unwrap();

        let joined = left.left_join(&right, "collision_id", "_person").unwrap();

        assert_eq!(
            joined.column_names(),
            vec!["collision_id", "borough", "borough_person", "person_age"]
        );
        assert_eq!(joined.height(), 4);
        assert_eq!(
            int_values(&joined, "person_age"),
            vec![Some(30), Some(40), None, None]
        );
        assert_eq!(
            int_values(&joined, "collision_id"),
            vec![Some(1), Some(1), Some(2), None]
        );
    }

    #[test]
    fn left_join_matches_integral_floats() {
        let left = Frame::from_columns(vec![ints("id", &[Some(100)])]).unwrap();
        let right = Frame::from_columns(vec![
            ("id".to_string(), Arc::new(Float64Array::from(vec![100.0])) as ArrayRef),
            ints("v", &[Some(1)]),
        ])
        .unwrap();
        let joined = left.left_join(&right, "id", "_r").unwrap();
        assert_eq!(int_values(&joined, "v"), vec![Some(1)]);
    }
}
