// Selector -> zero fill -> carry fill -> clamp, as one pure call.
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::impute::{carry_fill, clamp_negative, zero_fill};
use crate::loader::select_and_project;
use crate::types::{Panel, PrepareReport, RawPanel};
use tracing::info;

/// Run the whole cleaning pass over a raw panel.
///
/// The input is not modified; on error nothing is returned, so callers can
/// never write a half-cleaned panel.
pub fn prepare(raw: &RawPanel, config: &PipelineConfig) -> Result<(Panel, PrepareReport)> {
    config.validate()?;

    let selected = select_and_project(raw, config)?;
    let (zeroed, zero_stats) = zero_fill(&selected, &config.zero_fill_columns)?;
    let (carried, carry_stats) = carry_fill(&zeroed, &config.carry_fill_columns)?;
    let (panel, clamped_cells) = clamp_negative(&carried);

    let report = PrepareReport {
        continent: config.continent.clone(),
        total_rows: raw.len(),
        selected_rows: panel.len(),
        locations: panel.locations().len(),
        zero_filled_cells: zero_stats.filled_cells,
        carried_cells: carry_stats.filled_cells,
        clamped_cells,
        missing_cells: panel.missing_cells(),
        unfilled_series: carry_stats.unfilled_series,
    };
    info!(
        continent = %report.continent,
        rows = report.selected_rows,
        locations = report.locations,
        zero_filled = report.zero_filled_cells,
        carried = report.carried_cells,
        clamped = report.clamped_cells,
        "panel prepared"
    );
    Ok((panel, report))
}
