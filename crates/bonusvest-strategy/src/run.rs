use serde::Serialize;

use bonusvest_core::{PriceSeries, StrategyParams, Window};

use crate::error::{Result, SimError};
use crate::kind::StrategyKind;
use crate::lots::PurchaseLot;

/// Outcome of one strategy over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationResult {
    pub strategy: StrategyKind,
    pub window_start: i64,
    pub window_end: i64,
    pub final_value: f64,
    pub total_invested: f64,
    /// Fraction, not percent.
    pub annualized_return: f64,
}

impl SimulationResult {
    pub fn new(
        strategy: StrategyKind,
        window: &Window,
        final_value: f64,
        params: &StrategyParams,
    ) -> Self {
        let total_invested = params.total_invested();
        Self {
            strategy,
            window_start: window.start_ts,
            window_end: window.end_ts,
            final_value,
            total_invested,
            annualized_return: annualized_return(final_value, total_invested, window.month_count()),
        }
    }

    /// Annualized return in percent.
    #[inline]
    pub fn annualized_return_pct(&self) -> f64 {
        self.annualized_return * 100.0
    }

    /// Final value over total invested, minus one.
    pub fn total_return(&self) -> f64 {
        self.final_value / self.total_invested - 1.0
    }
}

/// Portfolio split at the end of one simulated month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyValue {
    pub timestamp: i64,
    /// Holdings in the index fund.
    pub index_value: f64,
    /// Unvested stock lots at this month's price.
    pub stock_value: f64,
    pub total: f64,
}

impl MonthlyValue {
    pub fn new(timestamp: i64, index_value: f64, stock_value: f64) -> Self {
        Self {
            timestamp,
            index_value,
            stock_value,
            total: index_value + stock_value,
        }
    }
}

/// A lot liquidated and rolled into the index fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaturityEvent {
    pub timestamp: i64,
    pub source_year: i32,
    pub shares: f64,
    pub price: f64,
    pub proceeds: f64,
}

/// Everything a single simulation produced.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyRun {
    pub result: SimulationResult,
    /// One entry per return-bearing month (window months 1..W-1).
    pub trajectory: Vec<MonthlyValue>,
    pub maturities: Vec<MaturityEvent>,
    /// Lots still open when the window ended.
    pub unvested_lots: Vec<PurchaseLot>,
}

/// Money-weighted annualized return: `(final / invested)^(12 / months) - 1`.
///
/// This approximates, and is not, an internal rate of return.
pub fn annualized_return(final_value: f64, total_invested: f64, window_months: usize) -> f64 {
    (final_value / total_invested).powf(12.0 / window_months as f64) - 1.0
}

/// Validate `params` and check that `window` is a full-length slice of `series`.
pub(crate) fn check_window(
    series: &PriceSeries,
    window: &Window,
    params: &StrategyParams,
) -> Result<()> {
    params.validate()?;
    if window.start_idx >= window.end_idx || window.end_idx > series.len() {
        return Err(SimError::WindowOutOfBounds {
            start_idx: window.start_idx,
            end_idx: window.end_idx,
            series_len: series.len(),
        });
    }
    if window.month_count() != params.window_len() {
        return Err(SimError::WindowLength {
            expected: params.window_len(),
            actual: window.month_count(),
        });
    }
    Ok(())
}
