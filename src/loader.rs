use crate::config::{PipelineConfig, CONTINENT_COLUMN, DATE_COLUMN, LOCATION_COLUMN};
use crate::error::{PrepError, Result};
use crate::types::{Panel, PanelRow, RawPanel};
use crate::util::{parse_date_strict, parse_f64_strict};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read a delimited file into a `RawPanel` without interpreting any cell.
pub fn read_panel(path: impl AsRef<Path>, delimiter: u8) -> Result<RawPanel> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    let raw = read_panel_from_reader(file, delimiter)?;
    info!(
        path = %path.display(),
        rows = raw.len(),
        columns = raw.headers.len(),
        "read input panel"
    );
    Ok(raw)
}

pub fn read_panel_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<RawPanel> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);
    let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(RawPanel { headers, records })
}

/// Keep the rows of the configured continent, project them onto
/// `location`, `date` and the metric columns, and sort by (location, date).
///
/// Every required column is resolved before any row is read, so a schema
/// mismatch fails fast and never yields a partial panel.
pub fn select_and_project(raw: &RawPanel, config: &PipelineConfig) -> Result<Panel> {
    let continent_idx = raw.column_index(CONTINENT_COLUMN)?;
    let location_idx = raw.column_index(LOCATION_COLUMN)?;
    let date_idx = raw.column_index(DATE_COLUMN)?;
    let metric_idx = config
        .metric_columns
        .iter()
        .map(|c| raw.column_index(c))
        .collect::<Result<Vec<usize>>>()?;

    let wanted = config.continent.trim();
    let mut rows = Vec::new();
    for (i, record) in raw.records.iter().enumerate() {
        if record.get(continent_idx).map(str::trim) != Some(wanted) {
            continue;
        }
        let line = raw.line_of(i);

        let location = record.get(location_idx).unwrap_or("").trim().to_string();
        let date_text = record.get(date_idx).unwrap_or("");
        let date = parse_date_strict(date_text).ok_or_else(|| PrepError::InvalidDate {
            line,
            value: date_text.to_string(),
        })?;

        let mut values = Vec::with_capacity(metric_idx.len());
        for (col, &idx) in config.metric_columns.iter().zip(&metric_idx) {
            let cell = record.get(idx).unwrap_or("");
            if config.is_missing_marker(cell) {
                values.push(None);
                continue;
            }
            let v = parse_f64_strict(cell).ok_or_else(|| PrepError::InvalidNumber {
                line,
                column: col.clone(),
                value: cell.to_string(),
            })?;
            values.push(Some(v));
        }

        rows.push(PanelRow {
            location,
            date,
            values,
        });
    }

    // Stable, so duplicate (location, date) pairs keep input order.
    rows.sort_by(|a, b| a.location.cmp(&b.location).then(a.date.cmp(&b.date)));
    debug!(
        continent = wanted,
        kept = rows.len(),
        dropped = raw.len() - rows.len(),
        "selected rows"
    );
    Ok(Panel::new(config.metric_columns.clone(), rows))
}
