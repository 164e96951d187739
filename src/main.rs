// Command line entry point.
//
// `prepare_panel INPUT OUTPUT` reads the raw panel, runs the cleaning pass
// and writes the prepared panel. The output file is only created once the
// whole pass succeeded, so a schema error never leaves a partial file.
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use covid_panel_prep::output::{self, preview_table, report_lines};
use covid_panel_prep::util::{format_int, parse_date_strict};
use covid_panel_prep::views::{self, Aggregation, DateRange, MetricView};
use covid_panel_prep::{loader, pipeline, Panel, PipelineConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Prepare the Covid-19 panel for the dashboard",
    long_about = None
)]
struct Cli {
    /// CSV with cases, deaths, hospitalization, testing and vaccination data
    input: PathBuf,
    /// Where to write the prepared panel
    output: PathBuf,
    /// TOML file overriding continent, column groups or missing markers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Continent to keep (overrides the config file)
    #[arg(long)]
    continent: Option<String>,
    /// Field delimiter of the input file
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Also write the run report as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Rows of each console preview
    #[arg(long, default_value_t = 10)]
    preview: usize,
    /// Print a map aggregation for this view (e.g. `new-cases`, `icu-patients`)
    #[arg(long)]
    view: Option<MetricView>,
    /// `mean` or `sum`
    #[arg(long, default_value = "mean")]
    aggregation: Aggregation,
    /// First date of the aggregation window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    from: Option<NaiveDate>,
    /// Last date of the aggregation window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    to: Option<NaiveDate>,
    /// Restrict the aggregation to these locations (repeatable)
    #[arg(long = "location")]
    locations: Vec<String>,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date_strict(s).ok_or_else(|| format!("`{}` is not a YYYY-MM-DD date", s))
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(continent) = &cli.continent {
        config = config.with_continent(continent.clone());
    }
    Ok(config)
}

fn print_view(cli: &Cli, view: MetricView, panel: &Panel) -> Result<()> {
    let Some(span) = DateRange::spanning(panel) else {
        warn!("prepared panel is empty, nothing to aggregate");
        return Ok(());
    };
    let range = DateRange::new(cli.from.unwrap_or(span.from), cli.to.unwrap_or(span.to));
    if range.from > range.to {
        bail!("--from {} is after --to {}", range.from, range.to);
    }
    let locations = (!cli.locations.is_empty()).then_some(cli.locations.as_slice());
    let aggregates = views::aggregate_view(panel, view, cli.aggregation, range, locations)?;
    let rows: Vec<_> = aggregates.iter().map(|a| a.to_row()).collect();
    preview_table(
        &format!(
            "{} ({}) from {} to {}",
            view.label(),
            cli.aggregation.label(),
            range.from.format("%d.%m.%Y"),
            range.to.format("%d.%m.%Y")
        ),
        &rows,
        cli.preview,
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if !cli.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    let config = load_config(&cli)?;

    let raw = loader::read_panel(&cli.input, cli.delimiter as u8)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let (panel, report) = pipeline::prepare(&raw, &config)
        .with_context(|| format!("preparing {}", cli.input.display()))?;

    output::write_panel_csv(&cli.output, &panel)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!(
        path = %cli.output.display(),
        rows = panel.len(),
        "wrote prepared panel"
    );
    println!(
        "Prepared {} rows for {} locations in {}.\n",
        format_int(report.selected_rows),
        format_int(report.locations),
        report.continent
    );
    preview_table("Run summary", &report_lines(&report), usize::MAX);

    if let Some(path) = &cli.summary {
        output::write_json(path, &report)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }
    if let Some(view) = cli.view {
        print_view(&cli, view, &panel)?;
    }
    Ok(())
}
