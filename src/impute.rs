//! Missing-value policies for the projected panel.
//!
//! Two column groups are filled differently. Flow metrics (events per
//! period) are only reported when something happened, so a gap is a zero.
//! Stock metrics (occupancy censuses) are reported intermittently, so a gap
//! means the previous report still holds; leading gaps take the first later
//! report instead. A final pass clamps negative values to zero.
//!
//! Every function takes the panel by reference and returns a new one.

use crate::error::Result;
use crate::types::{Panel, PanelRow, UnfilledSeries};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillStats {
    /// Cells that were missing and now hold a value.
    pub filled_cells: usize,
    /// (location, column) series with no report at all, left missing.
    pub unfilled_series: Vec<UnfilledSeries>,
}

/// Replace every missing cell of `columns` with zero. Not time-aware.
pub fn zero_fill(panel: &Panel, columns: &[String]) -> Result<(Panel, FillStats)> {
    let idx = resolve(panel, columns)?;
    let mut stats = FillStats::default();
    let rows = panel
        .rows
        .iter()
        .map(|row| {
            let mut values = row.values.clone();
            for &i in &idx {
                if values[i].is_none() {
                    values[i] = Some(0.0);
                    stats.filled_cells += 1;
                }
            }
            PanelRow {
                values,
                ..row.clone()
            }
        })
        .collect();
    Ok((Panel::new(panel.metric_columns.clone(), rows), stats))
}

/// Carry the last report forward within each location, then backfill the
/// leading gap from the first report. A location that never reported a
/// column keeps it missing.
///
/// Expects the panel sorted by (location, date).
pub fn carry_fill(panel: &Panel, columns: &[String]) -> Result<(Panel, FillStats)> {
    let idx = resolve(panel, columns)?;
    let mut stats = FillStats::default();
    let mut rows: Vec<PanelRow> = Vec::with_capacity(panel.len());

    for group in panel.groups() {
        let mut out: Vec<PanelRow> = group.to_vec();
        for (&i, column) in idx.iter().zip(columns) {
            let series: Vec<Option<f64>> = group.iter().map(|r| r.values[i]).collect();
            let filled = carry_series(&series);

            let before = series.iter().filter(|v| v.is_none()).count();
            let after = filled.iter().filter(|v| v.is_none()).count();
            stats.filled_cells += before - after;

            let location = &group[0].location;
            if after == filled.len() {
                warn!(
                    location = %location,
                    column = %column,
                    rows = group.len(),
                    "no report in series, left missing"
                );
                stats.unfilled_series.push(UnfilledSeries {
                    location: location.clone(),
                    column: column.clone(),
                });
            } else if before > after {
                debug!(location = %location, column = %column, filled = before - after, "carried");
            }

            for (row, v) in out.iter_mut().zip(filled) {
                row.values[i] = v;
            }
        }
        rows.extend(out);
    }

    Ok((Panel::new(panel.metric_columns.clone(), rows), stats))
}

/// Fill one location's date-ordered series.
///
/// 1. forward pass: a gap takes the latest earlier value;
/// 2. the last cell is anchored to its carried value (when there is one);
/// 3. backward pass: a remaining gap takes the nearest later value.
///
/// After step 1 the only gaps left form a leading run, so step 3 fills it
/// from the first report. An all-missing series is returned unchanged.
pub fn carry_series(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(series.len());
    let mut last = None;
    for &v in series {
        if v.is_some() {
            last = v;
        }
        out.push(last);
    }

    if let Some(tail) = out.last_mut() {
        // No-op when the forward pass already reached the end.
        *tail = last;
    }

    let mut next = None;
    for v in out.iter_mut().rev() {
        if v.is_some() {
            next = *v;
        } else {
            *v = next;
        }
    }
    out
}

/// Replace every negative metric value with zero. Missing stays missing.
pub fn clamp_negative(panel: &Panel) -> (Panel, usize) {
    let mut clamped = 0;
    let rows = panel
        .rows
        .iter()
        .map(|row| PanelRow {
            values: row
                .values
                .iter()
                .map(|v| {
                    v.map(|v| {
                        if v < 0.0 {
                            clamped += 1;
                        }
                        // `<=` also folds -0.0 into 0.0.
                        if v <= 0.0 {
                            0.0
                        } else {
                            v
                        }
                    })
                })
                .collect(),
            ..row.clone()
        })
        .collect();
    (Panel::new(panel.metric_columns.clone(), rows), clamped)
}

fn resolve(panel: &Panel, columns: &[String]) -> Result<Vec<usize>> {
    columns.iter().map(|c| panel.column_index(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use chrono::NaiveDate;

    fn panel(columns: &[&str], rows: &[(&str, u32, Vec<Option<f64>>)]) -> Panel {
        Panel::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|(loc, day, values)| PanelRow {
                    location: loc.to_string(),
                    date: NaiveDate::from_ymd_opt(2021, 4, *day).unwrap(),
                    values: values.clone(),
                })
                .collect(),
        )
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn carry_series_prefers_earlier_then_later_reports() {
        let series = [None, Some(5.0), None, None, Some(3.0), None];
        assert_eq!(
            carry_series(&series),
            vec![Some(5.0), Some(5.0), Some(5.0), Some(5.0), Some(3.0), Some(3.0)]
        );
    }

    #[test]
    fn carry_series_all_missing_stays_missing() {
        assert_eq!(carry_series(&[None, None, None]), vec![None, None, None]);
        assert_eq!(carry_series(&[]), Vec::<Option<f64>>::new());
    }

    #[test]
    fn carry_series_report_only_at_end_backfills_everything() {
        assert_eq!(
            carry_series(&[None, None, Some(2.0)]),
            vec![Some(2.0), Some(2.0), Some(2.0)]
        );
    }

    #[test]
    fn carry_series_is_idempotent() {
        let once = carry_series(&[None, Some(1.0), None, Some(4.0), None]);
        assert_eq!(carry_series(&once), once);
    }

    #[test]
    fn carry_fill_does_not_leak_between_locations() {
        let p = panel(
            &["icu"],
            &[
                ("A", 1, vec![Some(1.0)]),
                ("A", 2, vec![None]),
                ("B", 1, vec![None]),
                ("B", 2, vec![None]),
                ("C", 1, vec![None]),
                ("C", 2, vec![Some(9.0)]),
            ],
        );
        let (filled, stats) = carry_fill(&p, &cols(&["icu"])).unwrap();
        assert_eq!(
            filled.column("icu").unwrap(),
            vec![Some(1.0), Some(1.0), None, None, Some(9.0), Some(9.0)]
        );
        assert_eq!(stats.filled_cells, 2);
        assert_eq!(
            stats.unfilled_series,
            vec![UnfilledSeries {
                location: "B".into(),
                column: "icu".into()
            }]
        );
    }

    #[test]
    fn carry_fill_leaves_other_columns_alone() {
        let p = panel(
            &["icu", "beds"],
            &[("A", 1, vec![None, None]), ("A", 2, vec![Some(2.0), None])],
        );
        let (filled, _) = carry_fill(&p, &cols(&["icu"])).unwrap();
        assert_eq!(filled.column("beds").unwrap(), vec![None, None]);
        assert_eq!(filled.column("icu").unwrap(), vec![Some(2.0), Some(2.0)]);
        // Input untouched.
        assert_eq!(p.column("icu").unwrap(), vec![None, Some(2.0)]);
    }

    #[test]
    fn zero_fill_is_blind_substitution() {
        let p = panel(
            &["cases", "icu"],
            &[
                ("A", 1, vec![None, None]),
                ("A", 2, vec![Some(2.0), None]),
                ("B", 1, vec![None, Some(1.0)]),
            ],
        );
        let (filled, stats) = zero_fill(&p, &cols(&["cases"])).unwrap();
        assert_eq!(
            filled.column("cases").unwrap(),
            vec![Some(0.0), Some(2.0), Some(0.0)]
        );
        assert_eq!(filled.column("icu").unwrap(), vec![None, None, Some(1.0)]);
        assert_eq!(stats.filled_cells, 2);
    }

    #[test]
    fn unknown_fill_column_is_rejected() {
        let p = panel(&["cases"], &[]);
        assert!(matches!(
            zero_fill(&p, &cols(&["deaths"])),
            Err(PrepError::MissingColumn { .. })
        ));
        assert!(matches!(
            carry_fill(&p, &cols(&["icu"])),
            Err(PrepError::MissingColumn { .. })
        ));
    }

    #[test]
    fn clamp_is_max_with_zero_and_idempotent() {
        let p = panel(
            &["a", "b"],
            &[
                ("A", 1, vec![Some(-3.0), Some(2.5)]),
                ("A", 2, vec![None, Some(-0.0)]),
                ("A", 3, vec![Some(0.0), Some(-1e-9)]),
            ],
        );
        let (once, clamped) = clamp_negative(&p);
        assert_eq!(clamped, 2);
        for (before, after) in p.rows.iter().zip(&once.rows) {
            for (b, a) in before.values.iter().zip(&after.values) {
                assert_eq!(*a, b.map(|v| v.max(0.0)));
            }
        }
        let (twice, again) = clamp_negative(&once);
        assert_eq!(twice, once);
        assert_eq!(again, 0);
        assert!(once.rows[1].values[1].unwrap().is_sign_positive());
    }
}
