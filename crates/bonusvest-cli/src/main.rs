mod chart;
mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::prelude::*;

use bonusvest_core::chart_json::{align, CloseHistory};
use bonusvest_core::synthetic::synthetic_series;
use bonusvest_core::{compute_windows, PriceSeries, SimConfig, Window, WindowAlignment};
use bonusvest_engine::{ComparisonEngine, ParallelRunner, SummaryCalculator};

use crate::report::{Labels, RollingReport, SingleReport};

#[derive(Parser, Debug)]
#[command(
    name = "bonusvest",
    about = "Compare index dollar-cost averaging with a vesting employee share plan"
)]
struct Cli {
    /// Path to TOML config file(s), comma-separated for merge
    #[arg(long, global = true)]
    config: Option<String>,

    /// Write the JSON report here
    #[arg(long, global = true)]
    output_file: Option<PathBuf>,

    /// Write an SVG chart here
    #[arg(long, global = true)]
    chart: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every fixed-length window of a historical price series
    Rolling(RollingArgs),
    /// One window over synthetic constant-return prices
    Single(SingleArgs),
}

#[derive(Args, Debug)]
struct RollingArgs {
    /// Yahoo chart JSON for the index fund
    #[arg(long, requires = "stock_json")]
    index_json: Option<PathBuf>,

    /// Yahoo chart JSON for the employer stock
    #[arg(long, requires = "index_json")]
    stock_json: Option<PathBuf>,

    /// CSV with `timestamp,price_a,price_b` rows
    #[arg(long, conflicts_with_all = ["index_json", "stock_json"])]
    csv: Option<PathBuf>,

    /// Start windows only in January
    #[arg(long, conflicts_with = "monthly")]
    yearly: bool,

    /// Start a window in every month
    #[arg(long)]
    monthly: bool,

    /// Run windows on one thread
    #[arg(long)]
    sequential: bool,

    #[arg(long)]
    window_months: Option<u32>,

    #[arg(long)]
    investment_months: Option<u32>,

    /// Ignore closes before this epoch second
    #[arg(long)]
    start_epoch: Option<i64>,
}

#[derive(Args, Debug)]
struct SingleArgs {
    /// Index fund annual return, percent
    #[arg(long, allow_negative_numbers = true)]
    index_return: Option<f64>,

    /// Employer stock annual return, percent
    #[arg(long, allow_negative_numbers = true)]
    stock_return: Option<f64>,

    /// Length of the simulated window
    #[arg(long)]
    months: Option<u32>,

    #[arg(long)]
    investment_months: Option<u32>,

    /// First month, YYYY-MM-DD
    #[arg(long)]
    start: Option<NaiveDate>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Rolling(args) => run_rolling(&cli, args, config),
        Command::Single(args) => run_single(&cli, args, config),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bonusvest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(paths: Option<&str>) -> Result<SimConfig> {
    let Some(paths) = paths else {
        tracing::debug!("no config given, using defaults");
        return Ok(SimConfig::default());
    };
    let config_paths: Vec<PathBuf> = paths.split(',').map(str::trim).map(PathBuf::from).collect();
    let config = match config_paths.as_slice() {
        [single] => SimConfig::from_toml(single),
        _ => {
            let config_refs: Vec<&Path> = config_paths.iter().map(PathBuf::as_path).collect();
            SimConfig::from_toml_files(&config_refs)
        }
    };
    config.with_context(|| format!("loading config from {paths}"))
}

fn run_rolling(cli: &Cli, args: &RollingArgs, mut config: SimConfig) -> Result<()> {
    let start = Instant::now();

    let data = &mut config.data;
    if let Some(path) = &args.index_json {
        data.index_json = Some(path.clone());
    }
    if let Some(path) = &args.stock_json {
        data.stock_json = Some(path.clone());
    }
    if let Some(path) = &args.csv {
        data.csv = Some(path.clone());
        data.index_json = None;
        data.stock_json = None;
    }
    if let Some(epoch) = args.start_epoch {
        data.start_epoch = epoch;
    }
    if args.yearly {
        config.windows.alignment = WindowAlignment::Yearly;
    } else if args.monthly {
        config.windows.alignment = WindowAlignment::Monthly;
    }
    config.windows.sequential |= args.sequential;
    if let Some(w) = args.window_months {
        config.strategy.window_months = w;
    }
    if let Some(h) = args.investment_months {
        config.strategy.investment_months = h;
    }

    let engine = ComparisonEngine::new(config.strategy.clone()).context("invalid strategy parameters")?;
    let (series, source) = load_series(&config)?;
    tracing::info!(months = series.len(), %source, "price series loaded");

    let alignment = config.windows.alignment;
    let windows = compute_windows(&series, config.strategy.window_len(), alignment);
    tracing::info!(windows = windows.len(), ?alignment, "computed windows");

    let run_start = Instant::now();
    let runner = ParallelRunner::new(engine);
    let results = if config.windows.sequential {
        runner.run_sequential(&series, &windows)
    } else {
        runner.run_all(&series, &windows)
    }
    .context("simulating windows")?;
    tracing::info!(
        elapsed_ms = run_start.elapsed().as_secs_f64() * 1000.0,
        "simulation complete"
    );

    let summary = SummaryCalculator::summarize(&results);
    let labels = Labels {
        source,
        index: &config.data.index_label,
        stock: &config.data.stock_label,
    };
    let report = RollingReport::build(
        &labels,
        &series,
        alignment,
        runner.engine().params(),
        &results,
        summary,
        start.elapsed().as_millis(),
    );
    report::print_rolling(&report);

    write_json(cli.output_file.as_deref(), &report)?;
    if let Some(path) = &cli.chart {
        if results.is_empty() {
            tracing::warn!("no windows simulated, skipping chart");
        } else {
            let svg = chart::returns_chart(&results, labels.index, labels.stock);
            write_file(path, &svg)?;
        }
    }
    Ok(())
}

fn run_single(cli: &Cli, args: &SingleArgs, mut config: SimConfig) -> Result<()> {
    let synthetic = &mut config.synthetic;
    if let Some(r) = args.index_return {
        synthetic.index_annual_return_pct = r;
    }
    if let Some(r) = args.stock_return {
        synthetic.stock_annual_return_pct = r;
    }
    if let Some(m) = args.months {
        synthetic.months = m;
    }
    if let Some(date) = args.start {
        synthetic.start_date = date;
    }
    if let Some(h) = args.investment_months {
        synthetic.investment_months = h;
    }
    // The synthetic series is exactly one window long.
    config.strategy = config.synthetic.strategy_params(&config.strategy);

    let engine = ComparisonEngine::new(config.strategy.clone()).context("invalid strategy parameters")?;
    let series = synthetic_series(&config.synthetic).context("generating synthetic prices")?;
    let Some(window) = Window::full(&series) else {
        bail!("synthetic series is empty");
    };
    let detail = engine
        .run_detailed(&series, &window)
        .context("simulating synthetic window")?;

    let labels = Labels {
        source: "synthetic".into(),
        index: &config.data.index_label,
        stock: &config.data.stock_label,
    };
    let report = SingleReport::build(&labels, &config.synthetic, engine.params(), &detail);
    report::print_single(&report);

    write_json(cli.output_file.as_deref(), &report)?;
    if let Some(path) = &cli.chart {
        let svg = chart::portfolio_chart(
            &detail,
            config.strategy.investment_months,
            labels.index,
            labels.stock,
        );
        write_file(path, &svg)?;
    }
    Ok(())
}

/// Aligned series and a description of where it came from.
fn load_series(config: &SimConfig) -> Result<(PriceSeries, String)> {
    let data = &config.data;
    if let Some(csv) = &data.csv {
        let series = PriceSeries::from_csv(csv)
            .with_context(|| format!("loading price CSV {}", csv.display()))?;
        return Ok((series, csv.display().to_string()));
    }

    let (Some(index_path), Some(stock_path)) = (&data.index_json, &data.stock_json) else {
        bail!("no price data: pass --csv or both --index-json and --stock-json");
    };
    let index = CloseHistory::from_path(index_path)
        .with_context(|| format!("loading {}", index_path.display()))?;
    let stock = CloseHistory::from_path(stock_path)
        .with_context(|| format!("loading {}", stock_path.display()))?;
    let series = align(&index, &stock, data.start_epoch).context("aligning close histories")?;
    Ok((
        series,
        format!("{} + {}", index_path.display(), stock_path.display()),
    ))
}

fn write_json<T: Serialize>(path: Option<&Path>, report: &T) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    write_file(path, &json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "written");
    Ok(())
}
