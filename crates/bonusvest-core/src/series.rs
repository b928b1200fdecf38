use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// One aligned monthly observation of both instruments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    /// Unix epoch seconds (UTC).
    pub timestamp: i64,
    /// Index fund close (instrument A).
    pub price_a: f64,
    /// Employer stock close (instrument B).
    pub price_b: f64,
}

/// Struct-of-Arrays monthly price storage for two instruments.
///
/// All vectors are parallel: index `i` across all fields is one month.
/// Timestamps are strictly increasing and prices strictly positive; `push`
/// enforces both so the simulators can index without further checks.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    pub timestamps: Vec<i64>,
    pub price_a: Vec<f64>,
    pub price_b: Vec<f64>,
    /// UTC calendar date of each timestamp, resolved once at insertion.
    pub dates: Vec<NaiveDate>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(cap),
            price_a: Vec::with_capacity(cap),
            price_b: Vec::with_capacity(cap),
            dates: Vec::with_capacity(cap),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append one month. Rejects out-of-order timestamps and non-positive prices.
    pub fn push(&mut self, ts: i64, price_a: f64, price_b: f64) -> Result<(), SeriesError> {
        if let Some(&last) = self.timestamps.last() {
            if ts <= last {
                return Err(SeriesError::NotIncreasing { previous: last, current: ts });
            }
        }
        for price in [price_a, price_b] {
            if !price.is_finite() || price <= 0.0 {
                return Err(SeriesError::InvalidPrice { timestamp: ts, price });
            }
        }
        let date = utc_date(ts)?;

        self.timestamps.push(ts);
        self.price_a.push(price_a);
        self.price_b.push(price_b);
        self.dates.push(date);
        Ok(())
    }

    /// Build a series from points in any order.
    pub fn from_points<I>(points: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = PricePoint>,
    {
        let mut points: Vec<PricePoint> = points.into_iter().collect();
        points.sort_unstable_by_key(|p| p.timestamp);

        let mut series = Self::with_capacity(points.len());
        for p in points {
            series.push(p.timestamp, p.price_a, p.price_b)?;
        }
        Ok(series)
    }

    /// Load an aligned series from a CSV file using memory-mapped I/O.
    ///
    /// Expected CSV format: `timestamp,price_a,price_b` with a header row.
    /// Timestamps may be unix seconds, `YYYY-MM-DD`, or RFC 3339
    /// (`2025-11-01T00:00:00Z`, `2024-02-01T00:00:00+00:00`).
    pub fn from_csv(path: &Path) -> Result<Self, SeriesError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and dropped before this function returns.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        Self::parse_csv_bytes(&mmap[..])
    }

    /// Parse CSV from raw bytes (testable without files).
    pub fn parse_csv_bytes(data: &[u8]) -> Result<Self, SeriesError> {
        // ~32 bytes per row
        let mut rows: Vec<PricePoint> = Vec::with_capacity(data.len() / 32);
        let len = data.len();

        // Skip header row
        let mut pos = match memchr::memchr(b'\n', data) {
            Some(nl) => nl + 1,
            None => return Ok(Self::new()),
        };

        let mut line_no = 1;
        while pos < len {
            line_no += 1;
            let line_end = memchr::memchr(b'\n', &data[pos..])
                .map(|i| pos + i)
                .unwrap_or(len);

            let line = &data[pos..line_end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if !line.is_empty() {
                rows.push(Self::parse_row(line, line_no)?);
            }

            pos = line_end + 1;
        }

        Self::from_points(rows)
    }

    fn parse_row(line: &[u8], line_no: usize) -> Result<PricePoint, SeriesError> {
        let mut fields = line.split(|&b| b == b',');
        let (Some(ts), Some(a), Some(b)) = (fields.next(), fields.next(), fields.next()) else {
            return Err(SeriesError::Parse(format!(
                "line {line_no}: expected 3 columns (timestamp,price_a,price_b)"
            )));
        };

        let timestamp = parse_timestamp(trim_ascii(ts))
            .map_err(|e| SeriesError::Parse(format!("line {line_no}: {e}")))?;
        let price_a: f64 = fast_float::parse(trim_ascii(a))
            .map_err(|_| SeriesError::Parse(format!("line {line_no}: bad price_a")))?;
        let price_b: f64 = fast_float::parse(trim_ascii(b))
            .map_err(|_| SeriesError::Parse(format!("line {line_no}: bad price_b")))?;

        Ok(PricePoint { timestamp, price_a, price_b })
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Parse a timestamp cell to Unix epoch seconds.
fn parse_timestamp(bytes: &[u8]) -> Result<i64, String> {
    let s = std::str::from_utf8(bytes).map_err(|_| "non-UTF8 timestamp".to_string())?;

    if let Ok(ts) = s.parse::<i64>() {
        return Ok(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(midnight_utc(date));
    }
    Err(format!("unrecognised timestamp: {s}"))
}

/// Resolve epoch seconds to a UTC calendar date.
pub fn utc_date(ts: i64) -> Result<NaiveDate, SeriesError> {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or(SeriesError::TimestampOutOfRange(ts))
}

/// Epoch seconds of 00:00:00 UTC on `date`.
pub fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("timestamps must be strictly increasing ({current} follows {previous})")]
    NotIncreasing { previous: i64, current: i64 },
    #[error("price {price} at {timestamp} is not a positive finite number")]
    InvalidPrice { timestamp: i64, price: f64 },
    #[error("timestamp {0} is outside the representable date range")]
    TimestampOutOfRange(i64),
}
