//! Run summary written next to the processed tables.

use std::collections::{BTreeMap, HashMap};

use arrow::array::AsArray as _;
use arrow::compute::kernels::aggregate::sum;
use arrow::compute::kernels::cast::cast;
use arrow::compute::kernels::temporal::{DatePart, date_part};
use arrow::datatypes::{DataType, Float64Type, Int32Type};
use arrow::error::ArrowError;
use collision_prep_frame::Frame;
use serde::{Deserialize, Serialize};

/// How many boroughs [`PipelineSummary::top_boroughs`] lists.
pub const TOP_BOROUGHS: usize = 10;

/// Injury or fatality totals split by road-user type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadUserTotals {
    /// Pedestrians.
    pub pedestrians: u64,
    /// Cyclists.
    pub cyclists: u64,
    /// Motorists.
    pub motorists: u64,
}

/// Crash count for one borough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoroughCount {
    /// Borough name as cleaned (uppercase).
    pub borough: String,
    /// Number of crashes.
    pub crashes: u64,
}

/// Headline figures for one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    /// Rows in the cleaned crash table.
    pub crash_rows: u64,
    /// Rows in the cleaned person table.
    pub person_rows: u64,
    /// Rows in the integrated table.
    pub integrated_rows: u64,
    /// Sum of `number_of_persons_injured`.
    pub total_injured: u64,
    /// Sum of `number_of_persons_killed`.
    pub total_killed: u64,
    /// Injuries by road-user type.
    pub injured_by_type: RoadUserTotals,
    /// Fatalities by road-user type.
    pub killed_by_type: RoadUserTotals,
    /// Boroughs with the most crashes, largest first, ties by name.
    pub top_boroughs: Vec<BoroughCount>,
    /// Crashes per calendar year.
    pub crashes_by_year: BTreeMap<i32, u64>,
}

impl PipelineSummary {
    /// Computes the summary from the three cleaned tables.
    ///
    /// # Errors
    ///
    /// Returns [`ArrowError`] if a summed or ranked column cannot be cast.
    pub fn compute(
        crashes: &Frame,
        persons: &Frame,
        integrated: &Frame,
    ) -> Result<Self, ArrowError> {
        Ok(Self {
            crash_rows: crashes.height() as u64,
            person_rows: persons.height() as u64,
            integrated_rows: integrated.height() as u64,
            total_injured: column_sum(crashes, "number_of_persons_injured")?,
            total_killed: column_sum(crashes, "number_of_persons_killed")?,
            injured_by_type: RoadUserTotals {
                pedestrians: column_sum(crashes, "number_of_pedestrians_injured")?,
                cyclists: column_sum(crashes, "number_of_cyclist_injured")?,
                motorists: column_sum(crashes, "number_of_motorist_injured")?,
            },
            killed_by_type: RoadUserTotals {
                pedestrians: column_sum(crashes, "number_of_pedestrians_killed")?,
                cyclists: column_sum(crashes, "number_of_cyclist_killed")?,
                motorists: column_sum(crashes, "number_of_motorist_killed")?,
            },
            top_boroughs: top_boroughs(crashes)?,
            crashes_by_year: crashes_by_year(crashes)?,
        })
    }
}

/// Sums a count column, treating nulls and a missing column as zero.
/// Cleaned counts are never negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn column_sum(frame: &Frame, name: &str) -> Result<u64, ArrowError> {
    let Some(column) = frame.column(name) else {
        return Ok(0);
    };
    let values = cast(column, &DataType::Float64)?;
    let total = sum(values.as_primitive::<Float64Type>()).unwrap_or(0.0);
    Ok(total.max(0.0).round() as u64)
}

fn top_boroughs(crashes: &Frame) -> Result<Vec<BoroughCount>, ArrowError> {
    let Some(column) = crashes.column("borough") else {
        return Ok(Vec::new());
    };

    let text = cast(column, &DataType::LargeUtf8)?;
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for borough in text.as_string::<i64>().iter().flatten() {
        *counts.entry(borough).or_default() += 1;
    }

    let mut ranked: Vec<BoroughCount> = counts
        .into_iter()
        .map(|(borough, crashes)| BoroughCount {
            borough: borough.to_string(),
            crashes,
        })
        .collect();
    ranked.sort_by(|a, b| b.crashes.cmp(&a.crashes).then_with(|| a.borough.cmp(&b.borough)));
    ranked.truncate(TOP_BOROUGHS);
    Ok(ranked)
}

fn crashes_by_year(crashes: &Frame) -> Result<BTreeMap<i32, u64>, ArrowError> {
    let mut years = BTreeMap::new();
    let Some(column) = crashes.column(crate::crashes::CRASH_DATETIME) else {
        return Ok(years);
    };
    let parts = date_part(column.as_ref(), DatePart::Year)?;
    for year in parts.as_primitive::<Int32Type>().iter().flatten() {
        *years.entry(year).or_default() += 1;
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use collision_prep_frame::csv_io::read_csv_from;
    use std::io::Cursor;

    use crate::{crashes::clean_crashes, integrate::integrate, persons::clean_persons};

    #[test]
    fn summarizes_cleaned_tables() {
        let crashes = clean_crashes(
            read_csv_from(Cursor::new(
                "COLLISION_ID,CRASH DATE,CRASH TIME,BOROUGH,NUMBER OF PERSONS INJURED,\
                 NUMBER OF PERSONS KILLED,NUMBER OF PEDESTRIANS INJURED,NUMBER OF CYCLIST KILLED\n\
                 1,03/14/2022,10:30,QUEENS,2,0,1,0\n\
                 2,01/02/2021,08:00,BRONX,1,1,0,1\n\
                 3,05/05/2022,12:00,queens,,0,,0\n\
                 4,,,,-5,,,\n",
            ))
            .unwrap(),
        )
        .unwrap();
        let persons = clean_persons(
            read_csv_from(Cursor::new("COLLISION_ID,PERSON_TYPE\n1,Driver\n1,Pedestrian\n"))
                .unwrap(),
        )
        .unwrap();
        let integrated = integrate(&crashes, &persons).unwrap();

        let summary = PipelineSummary::compute(&crashes, &persons, &integrated).unwrap();

        assert_eq!(summary.crash_rows, 3);
        assert_eq!(summary.person_rows, 2);
        assert_eq!(summary.integrated_rows, 4);
        assert_eq!(summary.total_injured, 3);
        assert_eq!(summary.total_killed, 1);
        assert_eq!(summary.injured_by_type.pedestrians, 1);
        assert_eq!(summary.killed_by_type.cyclists, 1);
        assert_eq!(summary.killed_by_type.motorists, 0);
        assert_eq!(
            summary.top_boroughs,
            vec![
                BoroughCount {
                    borough: "QUEENS".to_string(),
                    crashes: 2
                },
                BoroughCount {
                    borough: "BRONX".to_string(),
                    crashes: 1
                },
            ]
        );
        assert_eq!(summary.crashes_by_year.get(&2022), Some(&2));
        assert_eq!(summary.crashes_by_year.get(&2021), Some(&1));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(PipelineSummary::default()).unwrap();
        assert!(json.get("crashRows").is_some());
        assert!(json.get("injuredByType").is_some());
        assert!(json.get("crashesByYear").is_some());
    }
}
