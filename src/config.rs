// Pipeline configuration.
//
// The region filter and the column groups are plain data so the same
// pipeline can be pointed at another continent or metric set from a TOML
// file instead of a rebuild. Every key is optional; absent keys keep the
// defaults below.
use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const LOCATION_COLUMN: &str = "location";
pub const DATE_COLUMN: &str = "date";
pub const CONTINENT_COLUMN: &str = "continent";

pub const DEFAULT_CONTINENT: &str = "Europe";

/// Output projection after `location` and `date`, in output order.
pub const DEFAULT_METRIC_COLUMNS: [&str; 9] = [
    "new_cases_smoothed_per_million",
    "new_deaths_smoothed_per_million",
    "icu_patients_per_million",
    "hosp_patients_per_million",
    "weekly_icu_admissions_per_million",
    "weekly_hosp_admissions_per_million",
    "new_tests_smoothed_per_thousand",
    "new_vaccinations_smoothed_per_million",
    "hospital_beds_per_thousand",
];

/// Flow metrics: no report means no events.
pub const DEFAULT_ZERO_FILL_COLUMNS: [&str; 4] = [
    "new_vaccinations_smoothed_per_million",
    "new_cases_smoothed_per_million",
    "new_deaths_smoothed_per_million",
    "new_tests_smoothed_per_thousand",
];

/// Census metrics: the last report holds until the next one.
pub const DEFAULT_CARRY_FILL_COLUMNS: [&str; 2] =
    ["icu_patients_per_million", "hosp_patients_per_million"];

pub const DEFAULT_MISSING_MARKERS: [&str; 7] = ["", "NA", "NaN", "nan", "null", "N/A", "#N/A"];

/// Header of the prepared panel: the key columns, then the metrics in order.
pub fn output_header(metric_columns: &[String]) -> Vec<&str> {
    let mut header = vec![LOCATION_COLUMN, DATE_COLUMN];
    header.extend(metric_columns.iter().map(String::as_str));
    header
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub continent: String,
    pub metric_columns: Vec<String>,
    pub zero_fill_columns: Vec<String>,
    pub carry_fill_columns: Vec<String>,
    pub missing_markers: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            continent: DEFAULT_CONTINENT.to_string(),
            metric_columns: owned(&DEFAULT_METRIC_COLUMNS),
            zero_fill_columns: owned(&DEFAULT_ZERO_FILL_COLUMNS),
            carry_fill_columns: owned(&DEFAULT_CARRY_FILL_COLUMNS),
            missing_markers: owned(&DEFAULT_MISSING_MARKERS),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn with_continent(mut self, continent: impl Into<String>) -> Self {
        self.continent = continent.into();
        self
    }

    /// Check that the column groups describe a consistent projection.
    pub fn validate(&self) -> Result<()> {
        if self.continent.trim().is_empty() {
            return Err(PrepError::Config("continent must not be empty".into()));
        }
        if self.metric_columns.is_empty() {
            return Err(PrepError::Config("at least one metric column is required".into()));
        }

        let mut seen = HashSet::new();
        for c in &self.metric_columns {
            if c.trim().is_empty() {
                return Err(PrepError::Config("metric column names must not be empty".into()));
            }
            if [LOCATION_COLUMN, DATE_COLUMN, CONTINENT_COLUMN].contains(&c.as_str()) {
                return Err(PrepError::Config(format!(
                    "`{}` is a key column and cannot be a metric",
                    c
                )));
            }
            if !seen.insert(c.as_str()) {
                return Err(PrepError::Config(format!("metric column `{}` listed twice", c)));
            }
        }

        for (group, columns) in [
            ("zero_fill_columns", &self.zero_fill_columns),
            ("carry_fill_columns", &self.carry_fill_columns),
        ] {
            for c in columns {
                if !seen.contains(c.as_str()) {
                    return Err(PrepError::Config(format!(
                        "{} names `{}`, which is not a metric column",
                        group, c
                    )));
                }
            }
        }

        if let Some(c) = self
            .zero_fill_columns
            .iter()
            .find(|c| self.carry_fill_columns.contains(c))
        {
            return Err(PrepError::Config(format!(
                "`{}` cannot be both zero-filled and carry-filled",
                c
            )));
        }
        Ok(())
    }

    pub fn is_missing_marker(&self, cell: &str) -> bool {
        let cell = cell.trim();
        self.missing_markers.iter().any(|m| m == cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.continent, "Europe");
        let header = output_header(&config.metric_columns);
        assert_eq!(header.len(), 11);
        assert_eq!(header[..2], ["location", "date"]);
        assert_eq!(header[2..], DEFAULT_METRIC_COLUMNS);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str("continent = \"Asia\"\n").unwrap();
        assert_eq!(config.continent, "Asia");
        assert_eq!(config.metric_columns, PipelineConfig::default().metric_columns);
    }

    #[test]
    fn fill_column_outside_projection_is_rejected() {
        let toml = r#"
            metric_columns = ["a", "b"]
            zero_fill_columns = ["a"]
            carry_fill_columns = ["c"]
        "#;
        let err = PipelineConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, PrepError::Config(_)));
    }

    #[test]
    fn overlapping_fill_groups_are_rejected() {
        let config = PipelineConfig {
            metric_columns: vec!["a".into()],
            zero_fill_columns: vec!["a".into()],
            carry_fill_columns: vec!["a".into()],
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PrepError::Config(_))));
    }

    #[test]
    fn key_column_as_metric_is_rejected() {
        let config = PipelineConfig {
            metric_columns: vec!["date".into()],
            zero_fill_columns: vec![],
            carry_fill_columns: vec![],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let err = PipelineConfig::from_toml_str("contnent = \"Asia\"").unwrap_err();
        assert!(matches!(err, PrepError::ConfigParse(_)));
    }

    #[test]
    fn missing_markers_are_trimmed() {
        let config = PipelineConfig::default();
        assert!(config.is_missing_marker("  "));
        assert!(config.is_missing_marker(" NaN "));
        assert!(!config.is_missing_marker("0"));
    }
}
