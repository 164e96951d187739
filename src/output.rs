use crate::config::output_header;
use crate::error::{PrepError, Result};
use crate::types::{Panel, PrepareReport, ReportLine};
use crate::util::{format_cell, format_int, DATE_FORMAT};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Write the panel as `location,date,<metrics...>`; missing cells are empty.
pub fn write_panel<W: Write>(writer: W, panel: &Panel) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let header = output_header(&panel.metric_columns);
    wtr.write_record(&header)?;

    for row in &panel.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.location.clone());
        record.push(row.date.format(DATE_FORMAT).to_string());
        record.extend(row.values.iter().map(|v| format_cell(*v)));
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Create (or replace) `path` with the panel.
pub fn write_panel_csv(path: impl AsRef<Path>, panel: &Panel) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| PrepError::io(path, e))?;
    write_panel(file, panel)
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| PrepError::io(path, e))?;
    Ok(())
}

pub fn report_lines(report: &PrepareReport) -> Vec<ReportLine> {
    let line = |step: &str, n: usize| ReportLine {
        step: step.to_string(),
        count: format_int(n),
    };
    vec![
        line("Input rows", report.total_rows),
        line(&format!("Rows in {}", report.continent), report.selected_rows),
        line("Locations", report.locations),
        line("Zero-filled cells", report.zero_filled_cells),
        line("Carried cells", report.carried_cells),
        line("Clamped cells", report.clamped_cells),
        line("Series without any report", report.unfilled_series.len()),
        line("Cells still missing", report.missing_cells),
    ]
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    println!("{}\n", render_table(rows, max_rows));
}
