use bonusvest_core::config::SyntheticConfig;
use bonusvest_core::synthetic::synthetic_series;
use bonusvest_core::{compute_windows, PriceSeries, StrategyParams, WindowAlignment};
use bonusvest_engine::{ComparisonEngine, ParallelRunner, SummaryCalculator};

fn series(index_pct: f64, stock_pct: f64, months: u32) -> PriceSeries {
    synthetic_series(&SyntheticConfig {
        months,
        index_annual_return_pct: index_pct,
        stock_annual_return_pct: stock_pct,
        index_start_price: 100.0,
        stock_start_price: 25.0,
        ..SyntheticConfig::default()
    })
    .unwrap()
}

#[test]
fn yearly_rolling_run_over_25_years() {
    let series = series(7.0, 2.0, 300);
    let windows = compute_windows(&series, 72, WindowAlignment::Yearly);
    assert_eq!(windows.len(), 20);

    let runner = ParallelRunner::new(ComparisonEngine::default());
    let results = runner.run_all(&series, &windows).unwrap();
    let summary = SummaryCalculator::summarize(&results);

    assert_eq!(summary.window_count, 20);
    let tally = summary.tally;
    assert_eq!(tally.plain_wins + tally.bonus_wins + tally.ties, 20);
    let plain = summary.plain.unwrap();
    assert!(plain.min_return_pct <= plain.mean_return_pct);
    assert!(plain.mean_return_pct <= plain.max_return_pct);
}

#[test]
fn identical_instruments_give_bonus_a_one_third_edge() {
    // Same growth for both instruments: selling at maturity and buying the
    // index is value-neutral, so only the bonus shares differ.
    let series = series(6.0, 6.0, 180);
    let windows = compute_windows(&series, 72, WindowAlignment::Monthly);
    let runner = ParallelRunner::new(ComparisonEngine::default());
    let results = runner.run_all(&series, &windows).unwrap();

    for r in &results {
        let ratio = r.bonus.final_value / r.plain.final_value;
        assert!((ratio - 4.0 / 3.0).abs() < 1e-9, "ratio {ratio}");
    }
    let summary = SummaryCalculator::summarize(&results);
    assert_eq!(summary.tally.bonus_wins, results.len());
    assert!((summary.bonus_win_rate - 1.0).abs() < 1e-12);
}

#[test]
fn series_shorter_than_window_produces_empty_summary() {
    let series = series(7.0, 2.0, 60);
    let windows = compute_windows(&series, 72, WindowAlignment::Monthly);
    assert!(windows.is_empty());

    let runner = ParallelRunner::new(ComparisonEngine::default());
    let results = runner.run_all(&series, &windows).unwrap();
    let summary = SummaryCalculator::summarize(&results);
    assert_eq!(summary.window_count, 0);
    assert!(summary.plain.is_none());
}

#[test]
fn discarding_unvested_lots_never_raises_value() {
    let series = series(9.0, 4.0, 120);
    let windows = compute_windows(&series, 48, WindowAlignment::Yearly);
    let base = StrategyParams {
        window_months: 48,
        investment_months: 36,
        ..StrategyParams::default()
    };
    let discard = StrategyParams {
        unvested_valuation: bonusvest_core::UnvestedValuation::Discard,
        ..base.clone()
    };

    let marked = ParallelRunner::new(ComparisonEngine::new(base).unwrap())
        .run_sequential(&series, &windows)
        .unwrap();
    let dropped = ParallelRunner::new(ComparisonEngine::new(discard).unwrap())
        .run_sequential(&series, &windows)
        .unwrap();

    for (m, d) in marked.iter().zip(&dropped) {
        assert_eq!(m.plain, d.plain);
        // A 48-month window cannot mature purchases made in its last years.
        assert!(m.bonus.final_value > d.bonus.final_value);
    }
}
