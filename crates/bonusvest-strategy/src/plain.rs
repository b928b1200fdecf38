use bonusvest_core::{PriceSeries, StrategyParams, Window};

use crate::error::Result;
use crate::kind::StrategyKind;
use crate::run::{check_window, MonthlyValue, SimulationResult, StrategyRun};

/// Dollar-cost averaging straight into the index fund.
///
/// For each month `i` in `1..W`: the running value first earns the index
/// return `a[i] / a[i-1]`, then, while `i <= investment_months`, receives
/// one monthly contribution. The contribution therefore starts earning in
/// the following month.
pub fn simulate(
    series: &PriceSeries,
    window: &Window,
    params: &StrategyParams,
) -> Result<StrategyRun> {
    check_window(series, window, params)?;

    let prices = &series.price_a[window.start_idx..window.end_idx];
    let timestamps = &series.timestamps[window.start_idx..window.end_idx];
    let horizon = params.horizon_len();

    let mut value = 0.0;
    let mut trajectory = Vec::with_capacity(prices.len() - 1);

    for i in 1..prices.len() {
        value *= prices[i] / prices[i - 1];
        if i <= horizon {
            value += params.monthly_investment;
        }
        trajectory.push(MonthlyValue::new(timestamps[i], value, 0.0));
    }

    Ok(StrategyRun {
        result: SimulationResult::new(StrategyKind::Plain, window, value, params),
        trajectory,
        maturities: Vec::new(),
        unvested_lots: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{params, series_from_prices};

    #[test]
    fn test_flat_prices_return_contributions() {
        let series = series_from_prices(2000, 1, &[100.0; 24], &[50.0; 24]);
        let window = Window::full(&series).unwrap();
        let run = simulate(&series, &window, &params(24, 12)).unwrap();

        assert!((run.result.final_value - 12_000.0).abs() < 1e-9);
        assert_eq!(run.result.annualized_return, 0.0);
        assert_eq!(run.trajectory.len(), 23);
        assert!((run.trajectory[11].total - 12_000.0).abs() < 1e-9);
        assert!(run.maturities.is_empty());
    }

    #[test]
    fn test_return_applies_before_contribution() {
        let prices = [100.0, 110.0, 121.0];
        let series = series_from_prices(2000, 1, &prices, &[50.0; 3]);
        let window = Window::full(&series).unwrap();
        let run = simulate(&series, &window, &params(3, 1)).unwrap();

        // Month 1: 0 * 1.1 + 1000; month 2: 1000 * 1.1.
        assert!((run.trajectory[0].total - 1000.0).abs() < 1e-9);
        assert!((run.result.final_value - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_inside_longer_series() {
        let prices: Vec<f64> = (0..36).map(|i| 100.0 + i as f64).collect();
        let series = series_from_prices(2000, 1, &prices, &[50.0; 36]);
        let window = Window::new(&series, 12, 24).unwrap();
        let run = simulate(&series, &window, &params(24, 12)).unwrap();

        assert_eq!(run.result.window_start, series.timestamps[12]);
        assert_eq!(run.result.window_end, series.timestamps[35]);
        assert_eq!(run.trajectory[0].timestamp, series.timestamps[13]);
        assert!(run.result.final_value > 12_000.0);
    }

    #[test]
    fn test_horizon_spanning_whole_window() {
        let series = series_from_prices(2000, 1, &[100.0; 24], &[50.0; 24]);
        let window = Window::full(&series).unwrap();
        let run = simulate(&series, &window, &params(24, 24)).unwrap();

        // Only months 1..=23 carry a contribution; the divisor keeps all 24.
        assert!((run.result.final_value - 23_000.0).abs() < 1e-9);
        assert!((run.result.total_invested - 24_000.0).abs() < 1e-9);
        assert!(run.result.annualized_return < 0.0);
    }

    #[test]
    fn test_mismatched_window_length_is_rejected() {
        let series = series_from_prices(2000, 1, &[100.0; 24], &[50.0; 24]);
        let window = Window::new(&series, 0, 12).unwrap();
        assert!(simulate(&series, &window, &params(24, 12)).is_err());
    }

    #[test]
    fn test_zero_horizon_fails_fast() {
        let series = series_from_prices(2000, 1, &[100.0; 24], &[50.0; 24]);
        let window = Window::full(&series).unwrap();
        let err = simulate(&series, &window, &params(24, 0)).unwrap_err();
        assert!(matches!(err, crate::SimError::Config(_)));
    }
}
