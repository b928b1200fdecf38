use chrono::DateTime;
use serde::Serialize;

use bonusvest_core::{PriceSeries, StrategyParams, SyntheticConfig, WindowAlignment};
use bonusvest_engine::{ComparisonSummary, DetailedComparison, WindowComparison};
use bonusvest_strategy::{MaturityEvent, SimulationResult, StrategyKind};

/// JSON output of a rolling-window comparison.
#[derive(Debug, Serialize)]
pub struct RollingReport {
    pub meta: RollingMeta,
    pub summary: ComparisonSummary,
    pub windows: Vec<WindowRecord>,
}

#[derive(Debug, Serialize)]
pub struct RollingMeta {
    pub source: String,
    pub index_label: String,
    pub stock_label: String,
    pub series_months: usize,
    pub first_month: Option<String>,
    pub last_month: Option<String>,
    pub alignment: WindowAlignment,
    pub params: StrategyParams,
    pub elapsed_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct WindowRecord {
    pub start: String,
    pub end: String,
    pub plain_final_value: f64,
    pub plain_annualized_return_pct: f64,
    pub bonus_final_value: f64,
    pub bonus_annualized_return_pct: f64,
}

impl From<&WindowComparison> for WindowRecord {
    fn from(c: &WindowComparison) -> Self {
        Self {
            start: format_month(c.window.start_ts),
            end: format_month(c.window.end_ts),
            plain_final_value: round2(c.plain.final_value),
            plain_annualized_return_pct: round2(c.plain.annualized_return_pct()),
            bonus_final_value: round2(c.bonus.final_value),
            bonus_annualized_return_pct: round2(c.bonus.annualized_return_pct()),
        }
    }
}

/// Labels and provenance shared by both report kinds.
pub struct Labels<'a> {
    pub source: String,
    pub index: &'a str,
    pub stock: &'a str,
}

impl RollingReport {
    pub fn build(
        labels: &Labels<'_>,
        series: &PriceSeries,
        alignment: WindowAlignment,
        params: &StrategyParams,
        results: &[WindowComparison],
        summary: ComparisonSummary,
        elapsed_ms: u128,
    ) -> Self {
        Self {
            meta: RollingMeta {
                source: labels.source.clone(),
                index_label: labels.index.to_string(),
                stock_label: labels.stock.to_string(),
                series_months: series.len(),
                first_month: series.timestamps.first().map(|&ts| format_month(ts)),
                last_month: series.timestamps.last().map(|&ts| format_month(ts)),
                alignment,
                params: params.clone(),
                elapsed_ms,
            },
            summary,
            windows: results.iter().map(WindowRecord::from).collect(),
        }
    }
}

/// JSON output of a single synthetic window.
#[derive(Debug, Serialize)]
pub struct SingleReport {
    pub meta: SingleMeta,
    pub plain: StrategySummary,
    pub bonus: StrategySummary,
    /// `None` when both final values are equal.
    pub winner: Option<StrategyKind>,
    pub margin: f64,
    pub trajectory: Vec<TrajectoryRow>,
    pub maturities: Vec<MaturityEvent>,
}

#[derive(Debug, Serialize)]
pub struct SingleMeta {
    pub index_label: String,
    pub stock_label: String,
    pub index_annual_return_pct: f64,
    pub stock_annual_return_pct: f64,
    pub start_month: String,
    pub params: StrategyParams,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StrategySummary {
    pub final_value: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
}

impl From<&SimulationResult> for StrategySummary {
    fn from(r: &SimulationResult) -> Self {
        Self {
            final_value: r.final_value,
            total_return_pct: r.total_return() * 100.0,
            annualized_return_pct: r.annualized_return_pct(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrajectoryRow {
    pub month: String,
    pub plain_value: f64,
    pub bonus_index_value: f64,
    pub bonus_stock_value: f64,
    pub bonus_total: f64,
}

impl SingleReport {
    pub fn build(
        labels: &Labels<'_>,
        synthetic: &SyntheticConfig,
        params: &StrategyParams,
        detail: &DetailedComparison,
    ) -> Self {
        let plain_final = detail.plain.result.final_value;
        let bonus_final = detail.bonus.result.final_value;
        let winner = if plain_final > bonus_final {
            Some(StrategyKind::Plain)
        } else if bonus_final > plain_final {
            Some(StrategyKind::VestingBonus)
        } else {
            None
        };

        let trajectory = detail
            .plain
            .trajectory
            .iter()
            .zip(&detail.bonus.trajectory)
            .map(|(p, b)| TrajectoryRow {
                month: format_month(p.timestamp),
                plain_value: p.total,
                bonus_index_value: b.index_value,
                bonus_stock_value: b.stock_value,
                bonus_total: b.total,
            })
            .collect();

        Self {
            meta: SingleMeta {
                index_label: labels.index.to_string(),
                stock_label: labels.stock.to_string(),
                index_annual_return_pct: synthetic.index_annual_return_pct,
                stock_annual_return_pct: synthetic.stock_annual_return_pct,
                start_month: format_month(detail.window.start_ts),
                params: params.clone(),
            },
            plain: StrategySummary::from(&detail.plain.result),
            bonus: StrategySummary::from(&detail.bonus.result),
            winner,
            margin: (plain_final - bonus_final).abs(),
            trajectory,
            maturities: detail.bonus.maturities.clone(),
        }
    }
}

/// Human-readable rolling summary.
pub fn print_rolling(report: &RollingReport) {
    let meta = &report.meta;
    let summary = &report.summary;

    println!(
        "Total {} windows simulated: {}",
        window_span(meta.params.window_months),
        summary.window_count
    );

    let (Some(plain), Some(bonus)) = (summary.plain, summary.bonus) else {
        println!(
            "No window of {} months fits in the {}-month price series.",
            meta.params.window_months, meta.series_months
        );
        return;
    };

    for (title, stats) in [
        (format!("{} Strategy", meta.index_label), plain),
        (format!("{} Bonus Strategy", meta.stock_label), bonus),
    ] {
        println!("\n=== {title} Summary ===");
        println!("Min annualized return: {:.2}%", stats.min_return_pct);
        println!("Max annualized return: {:.2}%", stats.max_return_pct);
        println!("Average annualized return: {:.2}%", stats.mean_return_pct);
    }

    let unit = meta.alignment.unit();
    let tally = summary.tally;
    println!("\n=== Strategy Comparison ===");
    println!("{} Strategy wins: {} {unit}", meta.index_label, tally.plain_wins);
    println!("{} Bonus Strategy wins: {} {unit}", meta.stock_label, tally.bonus_wins);
    if tally.ties > 0 {
        println!("Ties: {} {unit}", tally.ties);
    }
    println!("{} win rate: {:.1}%", meta.index_label, summary.plain_win_rate * 100.0);
    println!("{} Bonus win rate: {:.1}%", meta.stock_label, summary.bonus_win_rate * 100.0);
}

/// Human-readable single-window summary.
pub fn print_single(report: &SingleReport) {
    let meta = &report.meta;
    let params = &meta.params;

    println!("Simulation Parameters:");
    println!("  {} Average Yearly Return: {}%", meta.index_label, meta.index_annual_return_pct);
    println!("  {} Average Yearly Return: {}%", meta.stock_label, meta.stock_annual_return_pct);
    println!("  Monthly Investment: ${}", params.monthly_investment);
    println!(
        "  Investment Period: First {} months ({})",
        params.investment_months,
        window_span(params.investment_months)
    );
    println!(
        "  Total Period: {} months ({})",
        params.window_months,
        window_span(params.window_months)
    );

    for (title, s) in [
        (format!("{} Strategy", meta.index_label), report.plain),
        (format!("{} Bonus Strategy", meta.stock_label), report.bonus),
    ] {
        println!("\n=== {title} Summary ===");
        println!("Final portfolio value: ${}", format_money(s.final_value));
        println!("Total return: {:.2}%", s.total_return_pct);
        println!("Annualized return: {:.2}%", s.annualized_return_pct);
    }

    println!("\n=== Strategy Comparison ===");
    match report.winner {
        Some(StrategyKind::Plain) => println!(
            "{} Strategy wins by ${}",
            meta.index_label,
            format_money(report.margin)
        ),
        Some(StrategyKind::VestingBonus) => println!(
            "{} Bonus Strategy wins by ${}",
            meta.stock_label,
            format_money(report.margin)
        ),
        None => println!("Both strategies have the same final value"),
    }
}

/// `YYYY-MM` of a UTC timestamp.
pub fn format_month(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// `6y` for whole years, `30m` otherwise.
fn window_span(months: u32) -> String {
    if months % 12 == 0 {
        format!("{}y", months / 12)
    } else {
        format!("{months}m")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two decimals with thousands separators.
pub fn format_money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
