//! Column conversions.
//!
//! Every function here is total over cell values: cells that cannot be
//! converted become nulls instead of errors. The `Result` only carries
//! kernel failures.

use std::sync::Arc;

use arrow::array::{
    Array as _, ArrayRef, AsArray as _, Float64Array, LargeStringArray, Scalar, StringArray,
};
use arrow::compute::kernels::cast::cast;
use arrow::compute::kernels::cmp::{eq, gt, lt};
use arrow::compute::kernels::nullif::nullif;
use arrow::compute::kernels::zip::zip;
use arrow::datatypes::{DataType, Float64Type};

use crate::FrameError;

/// Coerces a column to numbers.
///
/// Integer columns become `Int64` and float columns `Float64` unchanged in
/// value. Anything else is rendered as text, trimmed and parsed; cells that
/// do not parse become null. The result is `Int64` only when every cell
/// parsed to an integral value, otherwise `Float64`.
///
/// # Errors
///
/// Returns [`FrameError::Arrow`] if a cast kernel fails.
#[allow(clippy::cast_precision_loss)]
pub fn to_numeric(array: &ArrayRef) -> Result<ArrayRef, FrameError> {
    let data_type = array.data_type();
    if data_type.is_integer() || data_type.is_temporal() || *data_type == DataType::Boolean {
        return Ok(cast(array, &DataType::Int64)?);
    }
    if data_type.is_floating() {
        return Ok(cast(array, &DataType::Float64)?);
    }

    let text = cast(array, &DataType::LargeUtf8)?;
    let trimmed: LargeStringArray = text
        .as_string::<i64>()
        .iter()
        .map(|cell| cell.map(str::trim))
        .collect();
    let parsed = cast(&trimmed, &DataType::Float64)?;
    let floats: Float64Array = parsed
        .as_primitive::<Float64Type>()
        .unary_opt(|v| (!v.is_nan()).then_some(v));

    let integral = !floats.is_empty()
        && floats.null_count() == 0
        && floats
            .values()
            .iter()
            .all(|v| v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64);

    if integral {
        Ok(cast(&floats, &DataType::Int64)?)
    } else {
        Ok(Arc::new(floats))
    }
}

/// Clamps numeric cells into `[lower, upper]`; either bound may be open.
///
/// Non-numeric columns are returned unchanged. Nulls stay null.
///
/// # Errors
///
/// Returns [`FrameError::Arrow`] if a comparison or zip kernel fails.
pub fn clip(
    array: &ArrayRef,
    lower: Option<f64>,
    upper: Option<f64>,
) -> Result<ArrayRef, FrameError> {
    let data_type = array.data_type().clone();
    if !data_type.is_numeric() {
        return Ok(Arc::clone(array));
    }
    let integer = data_type.is_integer();

    let mut clipped = Arc::clone(array);
    if let Some(lower) = lower {
        let bound = scalar_bound(if integer { lower.ceil() } else { lower }, &data_type)?;
        let below = lt(&clipped, &bound)?;
        clipped = zip(&below, &bound, &clipped)?;
    }
    if let Some(upper) = upper {
        let bound = scalar_bound(if integer { upper.floor() } else { upper }, &data_type)?;
        let above = gt(&clipped, &bound)?;
        clipped = zip(&above, &bound, &clipped)?;
    }
    Ok(clipped)
}

fn scalar_bound(value: f64, data_type: &DataType) -> Result<Scalar<ArrayRef>, FrameError> {
    let single = Float64Array::from(vec![value]);
    Ok(Scalar::new(cast(&single, data_type)?))
}

/// Renders every non-null cell as text, trims it, and uppercases it.
///
/// # Errors
///
/// Returns [`FrameError::Arrow`] if the column cannot be cast to text.
pub fn strip_upper(array: &ArrayRef) -> Result<ArrayRef, FrameError> {
    let text = cast(array, &DataType::LargeUtf8)?;
    let upper: LargeStringArray = text
        .as_string::<i64>()
        .iter()
        .map(|cell| cell.map(|v| v.trim().to_uppercase()))
        .collect();
    Ok(Arc::new(upper))
}

/// Replaces empty strings in a text column with nulls.
///
/// Non-text columns are returned unchanged.
///
/// # Errors
///
/// Returns [`FrameError::Arrow`] if the comparison or `nullif` kernel fails.
pub fn blank_to_null(array: &ArrayRef) -> Result<ArrayRef, FrameError> {
    let blank = match array.data_type() {
        DataType::LargeUtf8 => eq(array, &Scalar::new(LargeStringArray::from(vec![""])))?,
        DataType::Utf8 => eq(array, &Scalar::new(StringArray::from(vec![""])))?,
        _ => return Ok(Arc::clone(array)),
    };
    Ok(nullif(array, &blank)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::Int64Type;

    fn text(values: &[Option<&str>]) -> ArrayRef {
        Arc::new(values.iter().copied().collect::<LargeStringArray>())
    }

    fn ints(values: &[Option<i64>]) -> ArrayRef {
        Arc::new(Int64Array::from(values.to_vec()))
    }

    fn floats(values: &[Option<f64>]) -> ArrayRef {
        Arc::new(Float64Array::from(values.to_vec()))
    }

    #[test]
    fn to_numeric_keeps_integers_when_every_cell_parses() {
        let out = to_numeric(&text(&[Some("1"), Some(" 2 ")])).unwrap();
        assert_eq!(out.data_type(), &DataType::Int64);
        assert_eq!(out.as_primitive::<Int64Type>().values().to_vec(), vec![1, 2]);
    }

    #[test]
    fn to_numeric_falls_back_to_float_on_failures() {
        let out = to_numeric(&text(&[Some("1"), Some("x"), None, Some("2.5")])).unwrap();
        assert_eq!(&out, &floats(&[Some(1.0), None, None, Some(2.5)]));
    }

    #[test]
    fn to_numeric_passes_numbers_through() {
        let input = ints(&[Some(3), None]);
        assert_eq!(&to_numeric(&input).unwrap(), &input);
    }

    #[test]
    fn clip_lower_only_zeroes_negatives() {
        assert_eq!(
            &clip(&ints(&[Some(-3), Some(4), None]), Some(0.0), None).unwrap(),
            &ints(&[Some(0), Some(4), None])
        );
        assert_eq!(
            &clip(&floats(&[Some(-0.5)]), Some(0.0), None).unwrap(),
            &floats(&[Some(0.0)])
        );
    }

    #[test]
    fn clip_range_hits_both_bounds() {
        let ages = floats(&[Some(150.0), Some(-2.0), Some(37.0)]);
        assert_eq!(
            &clip(&ages, Some(0.0), Some(110.0)).unwrap(),
            &floats(&[Some(110.0), Some(0.0), Some(37.0)])
        );
    }

    #[test]
    fn clip_leaves_text_alone() {
        let input = text(&[Some("-1")]);
        assert_eq!(&clip(&input, Some(0.0), None).unwrap(), &input);
    }

    #[test]
    fn strip_upper_renders_non_text_cells() {
        assert_eq!(
            &strip_upper(&text(&[Some(" Queens "), None])).unwrap(),
            &text(&[Some("QUEENS"), None])
        );
        assert_eq!(&strip_upper(&ints(&[Some(5)])).unwrap(), &text(&[Some("5")]));
    }

    #[test]
    fn blank_to_null_only_touches_empty_strings() {
        assert_eq!(
            &blank_to_null(&text(&[Some(""), Some(" "), Some("A")])).unwrap(),
            &text(&[None, Some(" "), Some("A")])
        );
        let numbers = ints(&[Some(0)]);
        assert_eq!(&blank_to_null(&numbers).unwrap(), &numbers);
    }
}
