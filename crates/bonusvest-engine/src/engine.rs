use serde::Serialize;

use bonusvest_core::{PriceSeries, StrategyParams, Window};
use bonusvest_strategy::{Result, SimulationResult, StrategyKind, StrategyRun};

/// Both strategies evaluated over the same window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WindowComparison {
    pub window: Window,
    pub plain: SimulationResult,
    pub bonus: SimulationResult,
}

impl WindowComparison {
    /// Bonus minus plain annualized return, in percentage points.
    pub fn difference_pct(&self) -> f64 {
        self.bonus.annualized_return_pct() - self.plain.annualized_return_pct()
    }
}

/// Full per-month detail of both strategies over one window.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedComparison {
    pub window: Window,
    pub plain: StrategyRun,
    pub bonus: StrategyRun,
}

/// Runs the plain and vesting-bonus strategies side by side.
///
/// Parameters are validated once at construction; every window is then an
/// independent pure computation over the shared price series.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    params: StrategyParams,
}

impl ComparisonEngine {
    pub fn new(params: StrategyParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Evaluate both strategies over `window`, keeping only the summaries.
    pub fn run_window(&self, series: &PriceSeries, window: &Window) -> Result<WindowComparison> {
        let detail = self.run_detailed(series, window)?;
        Ok(WindowComparison {
            window: detail.window,
            plain: detail.plain.result,
            bonus: detail.bonus.result,
        })
    }

    /// Evaluate both strategies over `window` with trajectories and maturities.
    pub fn run_detailed(
        &self,
        series: &PriceSeries,
        window: &Window,
    ) -> Result<DetailedComparison> {
        let plain = StrategyKind::Plain.simulate(series, window, &self.params)?;
        let bonus = StrategyKind::VestingBonus.simulate(series, window, &self.params)?;

        tracing::debug!(
            start_idx = window.start_idx,
            plain_final = plain.result.final_value,
            bonus_final = bonus.result.final_value,
            maturities = bonus.maturities.len(),
            "window simulated"
        );

        Ok(DetailedComparison {
            window: *window,
            plain,
            bonus,
        })
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self {
            params: StrategyParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonusvest_core::config::SyntheticConfig;
    use bonusvest_core::synthetic::synthetic_series;

    fn flat_series(months: u32) -> PriceSeries {
        synthetic_series(&SyntheticConfig {
            months,
            index_annual_return_pct: 0.0,
            stock_annual_return_pct: 0.0,
            ..SyntheticConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_engine_rejects_invalid_params() {
        let params = StrategyParams {
            investment_months: 0,
            ..StrategyParams::default()
        };
        assert!(ComparisonEngine::new(params).is_err());
    }

    #[test]
    fn test_run_window_flat_prices() {
        let series = flat_series(72);
        let window = Window::full(&series).unwrap();
        let engine = ComparisonEngine::default();

        let cmp = engine.run_window(&series, &window).unwrap();
        assert!((cmp.plain.final_value - 36_000.0).abs() < 1e-9);
        // Flat prices: bonus keeps its one-third extra shares.
        assert!((cmp.bonus.final_value - 48_000.0).abs() < 1e-6);
        assert!(cmp.difference_pct() > 0.0);
    }

    #[test]
    fn test_run_detailed_keeps_trajectories() {
        let series = flat_series(72);
        let window = Window::full(&series).unwrap();
        let detail = ComparisonEngine::default().run_detailed(&series, &window).unwrap();

        assert_eq!(detail.plain.trajectory.len(), 71);
        assert_eq!(detail.bonus.trajectory.len(), 71);
        assert!(!detail.bonus.maturities.is_empty());
    }
}
