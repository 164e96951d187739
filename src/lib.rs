//! Cleaning pass for a daily multi-country epidemiological panel.
//!
//! The input panel is cut down to one continent and a fixed set of metric
//! columns, sorted by (location, date), and its gaps are filled per metric
//! class: flow metrics with zeros, census metrics by carrying the last report
//! forward. Negative values are clamped to zero. The result feeds the
//! dashboard views in [`views`].

pub mod config;
pub mod error;
pub mod impute;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod util;
pub mod views;

pub use config::PipelineConfig;
pub use error::{PrepError, Result};
pub use pipeline::prepare;
pub use types::{Panel, PanelRow, PrepareReport, RawPanel};
