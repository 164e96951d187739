use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrepError>;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column `{column}` is missing")]
    MissingColumn { column: String },

    #[error("line {line}: column `{column}` holds non-numeric value {value:?}")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("line {line}: unparsable date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { line: u64, value: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("configuration file is not valid TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown metric view {0:?}")]
    UnknownView(String),

    #[error("unknown aggregation {0:?} (expected `mean` or `sum`)")]
    UnknownAggregation(String),
}

impl PrepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_column(column: impl Into<String>) -> Self {
        PrepError::MissingColumn {
            column: column.into(),
        }
    }

    /// Schema errors abort the run; they are never corrected in place.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            PrepError::MissingColumn { .. }
                | PrepError::InvalidNumber { .. }
                | PrepError::InvalidDate { .. }
        )
    }
}
