use crate::error::{PrepError, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use tabled::Tabled;

/// The input file as read: header plus string records, nothing parsed yet.
#[derive(Debug, Clone, Default)]
pub struct RawPanel {
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
}

impl RawPanel {
    /// Build a raw panel from literal cells (handy for fixtures).
    pub fn from_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        RawPanel {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            records: rows.iter().map(|r| StringRecord::from(r.clone())).collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PrepError::missing_column(name))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Physical line of the `idx`-th record, header being line 1.
    pub fn line_of(&self, idx: usize) -> u64 {
        self.records[idx]
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2)
    }
}

/// One (location, date) observation. `values` follows `Panel::metric_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub location: String,
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Projected panel, sorted by location then date once it leaves the selector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Panel {
    pub metric_columns: Vec<String>,
    pub rows: Vec<PanelRow>,
}

impl Panel {
    pub fn new(metric_columns: Vec<String>, rows: Vec<PanelRow>) -> Self {
        Panel {
            metric_columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.metric_columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PrepError::missing_column(name))
    }

    /// Copy of one metric column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Contiguous runs of rows sharing a location. Only meaningful on a
    /// sorted panel.
    pub fn groups(&self) -> impl Iterator<Item = &[PanelRow]> {
        self.rows.chunk_by(|a, b| a.location == b.location)
    }

    pub fn locations(&self) -> Vec<&str> {
        self.groups().map(|g| g[0].location.as_str()).collect()
    }

    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnfilledSeries {
    pub location: String,
    pub column: String,
}

/// What a run of the pipeline did, serialized as the optional JSON summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrepareReport {
    pub continent: String,
    pub total_rows: usize,
    pub selected_rows: usize,
    pub locations: usize,
    pub zero_filled_cells: usize,
    pub carried_cells: usize,
    pub clamped_cells: usize,
    pub missing_cells: usize,
    pub unfilled_series: Vec<UnfilledSeries>,
}

#[derive(Debug, Clone, Tabled)]
pub struct ReportLine {
    #[tabled(rename = "Step")]
    pub step: String,
    #[tabled(rename = "Count")]
    pub count: String,
}

/// Rendered row of a map view aggregation.
#[derive(Debug, Clone, Tabled)]
pub struct ViewAggregateRow {
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Value")]
    pub value: String,
}
