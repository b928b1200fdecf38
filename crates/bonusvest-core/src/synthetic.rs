//! Constant-return price generator for what-if runs.

use chrono::{Months, NaiveDate};

use crate::config::SyntheticConfig;
use crate::series::{midnight_utc, PriceSeries, SeriesError};

/// Equivalent monthly compounding rate for an annual return in percent.
///
/// `(1 + r_annual)^(1/12) - 1`
pub fn monthly_rate(annual_return_pct: f64) -> f64 {
    (1.0 + annual_return_pct / 100.0).powf(1.0 / 12.0) - 1.0
}

/// `month_count` prices starting at `start_price`, compounding monthly.
pub fn generate_prices(start_price: f64, annual_return_pct: f64, month_count: usize) -> Vec<f64> {
    let growth = 1.0 + monthly_rate(annual_return_pct);
    std::iter::successors(Some(start_price), |p| Some(p * growth))
        .take(month_count)
        .collect()
}

/// UTC-midnight timestamps on the same day of `month_count` successive months.
///
/// Days past the end of a shorter month clamp to its last day.
pub fn month_timestamps(start: NaiveDate, month_count: usize) -> Result<Vec<i64>, SeriesError> {
    (0..month_count)
        .map(|i| {
            let months = u32::try_from(i).map_err(|_| {
                SeriesError::Parse(format!("{month_count} months is too long a series"))
            })?;
            start
                .checked_add_months(Months::new(months))
                .map(midnight_utc)
                .ok_or_else(|| SeriesError::Parse(format!("date overflow {i} months after {start}")))
        })
        .collect()
}

/// Aligned two-instrument series from flat annual return assumptions.
pub fn synthetic_series(config: &SyntheticConfig) -> Result<PriceSeries, SeriesError> {
    let n = config.months as usize;
    let timestamps = month_timestamps(config.start_date, n)?;
    let index = generate_prices(config.index_start_price, config.index_annual_return_pct, n);
    let stock = generate_prices(config.stock_start_price, config.stock_annual_return_pct, n);

    let mut series = PriceSeries::with_capacity(n);
    for ((ts, a), b) in timestamps.into_iter().zip(index).zip(stock) {
        series.push(ts, a, b)?;
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_monthly_rate_compounds_to_annual() {
        let r = monthly_rate(10.0);
        assert!(((1.0 + r).powi(12) - 1.10).abs() < 1e-12);
        assert_eq!(monthly_rate(0.0), 0.0);
    }

    #[test]
    fn test_generate_prices() {
        let prices = generate_prices(100.0, 10.0, 13);
        assert_eq!(prices.len(), 13);
        assert_eq!(prices[0], 100.0);
        assert!((prices[12] - 110.0).abs() < 1e-9);

        let flat = generate_prices(50.0, 0.0, 5);
        assert!(flat.iter().all(|&p| p == 50.0));
        assert!(generate_prices(50.0, 0.0, 0).is_empty());
    }

    #[test]
    fn test_month_timestamps_roll_over_years() {
        let start = NaiveDate::from_ymd_opt(2000, 11, 1).unwrap();
        let ts = month_timestamps(start, 3).unwrap();
        assert_eq!(ts[0], 973_036_800); // 2000-11-01
        assert_eq!(ts[2], 978_307_200); // 2001-01-01
    }

    #[test]
    fn test_synthetic_series() {
        let config = SyntheticConfig {
            months: 24,
            ..SyntheticConfig::default()
        };
        let series = synthetic_series(&config).unwrap();
        assert_eq!(series.len(), 24);
        assert_eq!(series.dates[0], NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(series.dates[14].year(), 2001);
        assert_eq!(series.dates[14].month(), 3);
        assert!(series.price_b.iter().all(|&p| p == 50.0));
        assert!(series.price_a[23] > series.price_a[0]);
    }
}
