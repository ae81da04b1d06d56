//! Dataset registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the
//! binary at compile time via [`include_str!`].

use crate::SourceError;
use crate::dataset_def::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time, in download order.
const DATASET_TOMLS: &[(&str, &str)] = &[
    ("crashes", include_str!("../datasets/crashes.toml")),
    ("persons", include_str!("../datasets/persons.toml")),
];

/// Returns all configured dataset definitions.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the datasets named in a comma-separated `filter`, or every
/// dataset when no filter is given.
///
/// # Errors
///
/// Returns [`SourceError::Registry`] naming the first unknown id.
pub fn select_datasets(filter: Option<&str>) -> Result<Vec<DatasetDefinition>, SourceError> {
    let all = all_datasets();
    let Some(filter) = filter else {
        return Ok(all);
    };

    filter
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            all.iter().find(|d| d.id() == id).cloned().ok_or_else(|| {
                SourceError::Registry(format!(
                    "Unknown dataset '{id}'. Available: {}",
                    all.iter()
                        .map(DatasetDefinition::id)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_crashes_then_persons() {
        let ids: Vec<String> = all_datasets().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["crashes", "persons"]);
    }

    #[test]
    fn dataset_files_are_csv() {
        for dataset in all_datasets() {
            assert!(dataset.filename.ends_with(".csv"), "{}", dataset.id);
            assert!(dataset.url.starts_with("https://"), "{}", dataset.id);
        }
    }

    #[test]
    fn select_filters_by_id() {
        let selected = select_datasets(Some(" persons ")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id(), "persons");
    }

    #[test]
    fn select_rejects_unknown_ids() {
        let err = select_datasets(Some("vehicles")).unwrap_err();
        assert!(err.to_string().contains("vehicles"));
    }
}
