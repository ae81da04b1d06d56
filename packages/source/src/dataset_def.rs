//! Config-driven dataset definition.

use serde::Deserialize;

/// One downloadable raw dataset, loaded from an embedded TOML config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"crashes"`).
    pub id: String,
    /// Human-readable name shown in logs and progress bars.
    pub name: String,
    /// CSV export URL.
    pub url: String,
    /// File name written under the raw data directory.
    pub filename: String,
}

impl DatasetDefinition {
    /// Returns the dataset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Parses a dataset definition from TOML text.
///
/// # Errors
///
/// Returns the TOML deserialization error as a string.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
