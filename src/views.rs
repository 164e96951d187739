// Data side of the dashboard: which column each map view shows, its color
// scale, and the per-location aggregation over a date window. Rendering
// lives elsewhere; this only shapes the prepared panel for it.
use crate::error::{PrepError, Result};
use crate::types::{Panel, ViewAggregateRow};
use crate::util::{average, format_number};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScale {
    Reds,
    Greens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricView {
    NewCases,
    NewDeaths,
    HospPatients,
    IcuPatients,
    IcuAdmissions,
    HospAdmissions,
    NewTests,
    NewVaccinations,
}

impl MetricView {
    const ALL: [MetricView; 8] = [
        MetricView::NewCases,
        MetricView::NewDeaths,
        MetricView::HospPatients,
        MetricView::IcuPatients,
        MetricView::IcuAdmissions,
        MetricView::HospAdmissions,
        MetricView::NewTests,
        MetricView::NewVaccinations,
    ];

    /// Every view, ordered by label as the view picker lists them.
    pub fn all() -> Vec<MetricView> {
        let mut views = Self::ALL.to_vec();
        views.sort_by_key(|v| v.label());
        views
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricView::NewCases => "New Covid-19 cases per million inhabitants",
            MetricView::NewDeaths => "New Covid-19 deaths per million inhabitants",
            MetricView::HospPatients => "Covid-19 hospitalized patients per million inhabitants",
            MetricView::IcuPatients => "Covid-19 ICU patients per million inhabitants",
            MetricView::IcuAdmissions => "New Covid-19 ICU admissions per million inhabitants",
            MetricView::HospAdmissions => {
                "New Covid-19 hospitalization admissions per million inhabitants"
            }
            MetricView::NewTests => "New Covid-19 tests per thousand inhabitants",
            MetricView::NewVaccinations => "New Covid-19 vaccinations per million inhabitants",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            MetricView::NewCases => "new_cases_smoothed_per_million",
            MetricView::NewDeaths => "new_deaths_smoothed_per_million",
            MetricView::HospPatients => "hosp_patients_per_million",
            MetricView::IcuPatients => "icu_patients_per_million",
            MetricView::IcuAdmissions => "weekly_icu_admissions_per_million",
            MetricView::HospAdmissions => "weekly_hosp_admissions_per_million",
            MetricView::NewTests => "new_tests_smoothed_per_thousand",
            MetricView::NewVaccinations => "new_vaccinations_smoothed_per_million",
        }
    }

    pub fn color_scale(self) -> ColorScale {
        match self {
            MetricView::NewTests | MetricView::NewVaccinations => ColorScale::Greens,
            _ => ColorScale::Reds,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            MetricView::NewCases => "new-cases",
            MetricView::NewDeaths => "new-deaths",
            MetricView::HospPatients => "hosp-patients",
            MetricView::IcuPatients => "icu-patients",
            MetricView::IcuAdmissions => "icu-admissions",
            MetricView::HospAdmissions => "hosp-admissions",
            MetricView::NewTests => "new-tests",
            MetricView::NewVaccinations => "new-vaccinations",
        }
    }
}

impl fmt::Display for MetricView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MetricView {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.slug() == s.trim())
            .ok_or_else(|| PrepError::UnknownView(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Sum,
}

impl Aggregation {
    pub fn label(self) -> &'static str {
        match self {
            Aggregation::Mean => "Mean value for the date range in map",
            Aggregation::Sum => "Total (sum) value for the date range in map",
        }
    }

    /// Missing cells are skipped; the mean of nothing is missing, the sum 0.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Mean => average(values),
            Aggregation::Sum => Some(values.iter().sum()),
        }
    }
}

impl FromStr for Aggregation {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "sum" => Ok(Aggregation::Sum),
            _ => Err(PrepError::UnknownAggregation(s.to_string())),
        }
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange { from, to }
    }

    /// Window covering every date in the panel; `None` for an empty panel.
    pub fn spanning(panel: &Panel) -> Option<Self> {
        let from = panel.rows.iter().map(|r| r.date).min()?;
        let to = panel.rows.iter().map(|r| r.date).max()?;
        Some(DateRange { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewAggregate {
    pub location: String,
    pub value: Option<f64>,
}

impl ViewAggregate {
    pub fn to_row(&self) -> ViewAggregateRow {
        ViewAggregateRow {
            location: self.location.clone(),
            value: self
                .value
                .map(|v| format_number(v, 2))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionPoint {
    pub location: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
}

fn selected(location: &str, locations: Option<&[String]>) -> bool {
    locations.map_or(true, |ls| ls.iter().any(|l| l == location))
}

/// Map data: one aggregated value per location, sorted by location.
pub fn aggregate_view(
    panel: &Panel,
    view: MetricView,
    aggregation: Aggregation,
    range: DateRange,
    locations: Option<&[String]>,
) -> Result<Vec<ViewAggregate>> {
    let idx = panel.column_index(view.column())?;
    let mut by_location: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in &panel.rows {
        if !range.contains(row.date) || !selected(&row.location, locations) {
            continue;
        }
        let values = by_location.entry(row.location.as_str()).or_default();
        if let Some(v) = row.values[idx] {
            values.push(v);
        }
    }
    Ok(by_location
        .into_iter()
        .map(|(location, values)| ViewAggregate {
            location: location.to_string(),
            value: aggregation.apply(&values),
        })
        .collect())
}

/// Line-chart data: the view's column over the window, in panel order.
pub fn evolution(
    panel: &Panel,
    view: MetricView,
    range: DateRange,
    locations: Option<&[String]>,
) -> Result<Vec<EvolutionPoint>> {
    let idx = panel.column_index(view.column())?;
    Ok(panel
        .rows
        .iter()
        .filter(|r| range.contains(r.date) && selected(&r.location, locations))
        .map(|r| EvolutionPoint {
            location: r.location.clone(),
            date: r.date,
            value: r.values[idx],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_METRIC_COLUMNS;
    use crate::types::PanelRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, day).unwrap()
    }

    fn panel() -> Panel {
        let cols: Vec<String> = DEFAULT_METRIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mk = |loc: &str, day: u32, cases: f64, beds: Option<f64>| {
            let mut values = vec![Some(0.0); cols.len()];
            values[0] = Some(cases);
            values[4] = beds;
            PanelRow {
                location: loc.to_string(),
                date: d(day),
                values,
            }
        };
        Panel::new(
            cols.clone(),
            vec![
                mk("Austria", 1, 2.0, None),
                mk("Austria", 2, 4.0, None),
                mk("Austria", 3, 9.0, Some(1.0)),
                mk("Slovakia", 1, 1.0, None),
                mk("Slovakia", 2, 3.0, None),
            ],
        )
    }

    #[test]
    fn every_view_maps_to_a_default_column() {
        for view in MetricView::all() {
            assert!(DEFAULT_METRIC_COLUMNS.contains(&view.column()));
            assert_eq!(view.slug().parse::<MetricView>().unwrap(), view);
        }
        assert_eq!(MetricView::all().len(), 8);
        assert_eq!(MetricView::NewTests.color_scale(), ColorScale::Greens);
        assert_eq!(MetricView::IcuPatients.color_scale(), ColorScale::Reds);
    }

    #[test]
    fn views_are_listed_by_label() {
        let labels: Vec<&str> = MetricView::all().into_iter().map(|v| v.label()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            "beds".parse::<MetricView>(),
            Err(PrepError::UnknownView(_))
        ));
        assert!(matches!(
            "median".parse::<Aggregation>(),
            Err(PrepError::UnknownAggregation(_))
        ));
        assert_eq!("Sum".parse::<Aggregation>().unwrap(), Aggregation::Sum);
    }

    #[test]
    fn mean_and_sum_over_window() {
        let p = panel();
        let range = DateRange::new(d(1), d(2));
        let mean =
            aggregate_view(&p, MetricView::NewCases, Aggregation::Mean, range, None).unwrap();
        assert_eq!(
            mean,
            vec![
                ViewAggregate {
                    location: "Austria".into(),
                    value: Some(3.0),
                },
                ViewAggregate {
                    location: "Slovakia".into(),
                    value: Some(2.0),
                },
            ]
        );
        let sum = aggregate_view(&p, MetricView::NewCases, Aggregation::Sum, range, None).unwrap();
        assert_eq!(sum[0].value, Some(6.0));
        assert_eq!(sum[1].value, Some(4.0));
    }

    #[test]
    fn missing_cells_are_skipped() {
        let p = panel();
        let range = DateRange::spanning(&p).unwrap();
        let only_sk = vec!["Slovakia".to_string()];
        let mean = aggregate_view(
            &p,
            MetricView::IcuAdmissions,
            Aggregation::Mean,
            range,
            Some(&only_sk),
        )
        .unwrap();
        assert_eq!(
            mean,
            vec![ViewAggregate {
                location: "Slovakia".into(),
                value: None,
            }]
        );
        assert_eq!(mean[0].to_row().value, "-");

        let sum =
            aggregate_view(&p, MetricView::IcuAdmissions, Aggregation::Sum, range, None).unwrap();
        assert_eq!(sum[0].value, Some(1.0));
        assert_eq!(sum[1].value, Some(0.0));
    }

    #[test]
    fn evolution_filters_dates_and_locations() {
        let p = panel();
        let only_at = vec!["Austria".to_string()];
        let points =
            evolution(&p, MetricView::NewCases, DateRange::new(d(2), d(3)), Some(&only_at))
                .unwrap();
        let got: Vec<(NaiveDate, Option<f64>)> = points.iter().map(|p| (p.date, p.value)).collect();
        assert_eq!(got, vec![(d(2), Some(4.0)), (d(3), Some(9.0))]);
    }

    #[test]
    fn view_on_panel_without_its_column_fails() {
        let p = Panel::new(vec!["other".into()], vec![]);
        let range = DateRange::new(d(1), d(1));
        assert!(evolution(&p, MetricView::NewCases, range, None).is_err());
    }
}
