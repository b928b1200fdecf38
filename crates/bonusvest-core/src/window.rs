use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::series::PriceSeries;

/// Which months may start a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAlignment {
    /// Every month starts a window.
    Monthly,
    /// Only January months start a window.
    #[default]
    Yearly,
}

impl WindowAlignment {
    /// Unit used when reporting window tallies.
    pub fn unit(&self) -> &'static str {
        match self {
            WindowAlignment::Monthly => "months",
            WindowAlignment::Yearly => "years",
        }
    }
}

/// A fixed-length contiguous slice of the monthly price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Index of the first month in this window (inclusive).
    pub start_idx: usize,
    /// Index past the last month in this window (exclusive).
    pub end_idx: usize,
    /// Timestamp of the first month.
    pub start_ts: i64,
    /// Timestamp of the last month.
    pub end_ts: i64,
}

impl Window {
    /// Window covering `[start_idx, start_idx + len)` of `series`.
    ///
    /// Returns `None` when the range does not fit in the series.
    pub fn new(series: &PriceSeries, start_idx: usize, len: usize) -> Option<Self> {
        let end_idx = start_idx.checked_add(len)?;
        if len == 0 || end_idx > series.len() {
            return None;
        }
        Some(Self {
            start_idx,
            end_idx,
            start_ts: series.timestamps[start_idx],
            end_ts: series.timestamps[end_idx - 1],
        })
    }

    /// Window spanning the whole series.
    pub fn full(series: &PriceSeries) -> Option<Self> {
        Self::new(series, 0, series.len())
    }

    /// Number of months in this window.
    #[inline]
    pub fn month_count(&self) -> usize {
        self.end_idx - self.start_idx
    }
}

/// Enumerate every window of `window_len` months that fits in `series`.
///
/// Start indices `i` satisfy `i + window_len <= series.len()`; with
/// [`WindowAlignment::Yearly`] only starts falling in January are kept.
/// An empty vector is returned when the series is shorter than one window.
pub fn compute_windows(
    series: &PriceSeries,
    window_len: usize,
    alignment: WindowAlignment,
) -> Vec<Window> {
    if window_len == 0 || series.len() < window_len {
        return Vec::new();
    }

    let last_start = series.len() - window_len;
    (0..=last_start)
        .filter(|&i| match alignment {
            WindowAlignment::Monthly => true,
            WindowAlignment::Yearly => series.dates[i].month() == 1,
        })
        .filter_map(|i| Window::new(series, i, window_len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::midnight_utc;
    use chrono::{Months, NaiveDate};

    fn monthly_series(start: NaiveDate, n: usize) -> PriceSeries {
        let mut series = PriceSeries::with_capacity(n);
        for i in 0..n {
            let date = start + Months::new(i as u32);
            series.push(midnight_utc(date), 100.0, 50.0).unwrap();
        }
        series
    }

    #[test]
    fn test_monthly_windows_cover_every_start() {
        let series = monthly_series(NaiveDate::from_ymd_opt(2000, 6, 1).unwrap(), 30);
        let windows = compute_windows(&series, 24, WindowAlignment::Monthly);
        assert_eq!(windows.len(), 7);
        assert_eq!(windows[0].start_idx, 0);
        assert_eq!(windows[6].start_idx, 6);
        assert_eq!(windows[6].end_idx, 30);
        for w in &windows {
            assert_eq!(w.month_count(), 24);
        }
    }

    #[test]
    fn test_window_exactly_series_length() {
        let series = monthly_series(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 24);
        let windows = compute_windows(&series, 24, WindowAlignment::Monthly);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_ts, series.timestamps[0]);
        assert_eq!(windows[0].end_ts, series.timestamps[23]);
    }

    #[test]
    fn test_short_series_yields_no_windows() {
        let series = monthly_series(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 10);
        assert!(compute_windows(&series, 24, WindowAlignment::Monthly).is_empty());
        assert!(compute_windows(&PriceSeries::new(), 24, WindowAlignment::Yearly).is_empty());
    }

    #[test]
    fn test_yearly_windows_on_25_year_series() {
        let series = monthly_series(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 300);
        let windows = compute_windows(&series, 72, WindowAlignment::Yearly);

        // Januaries at 0, 12, ..., 228 have at least 72 months remaining.
        assert_eq!(windows.len(), 20);
        for (k, w) in windows.iter().enumerate() {
            assert_eq!(w.start_idx, k * 12);
            assert_eq!(series.dates[w.start_idx].month(), 1);
            assert!(w.end_idx <= series.len());
        }
    }

    #[test]
    fn test_yearly_windows_skip_partial_first_year() {
        let series = monthly_series(NaiveDate::from_ymd_opt(2000, 6, 1).unwrap(), 44);
        let windows = compute_windows(&series, 24, WindowAlignment::Yearly);
        // Januaries at index 7 (2001) and 19 (2002) fit; 31 (2003) does not.
        let starts: Vec<usize> = windows.iter().map(|w| w.start_idx).collect();
        assert_eq!(starts, vec![7, 19]);
    }

    #[test]
    fn test_window_new_out_of_range() {
        let series = monthly_series(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 12);
        assert!(Window::new(&series, 6, 7).is_none());
        assert!(Window::new(&series, 0, 0).is_none());
        assert_eq!(Window::full(&series).unwrap().month_count(), 12);
    }
}
