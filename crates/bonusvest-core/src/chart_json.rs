//! Loader for Yahoo-style chart JSON (`chart.result[0]`) monthly closes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::series::{PricePoint, PriceSeries, SeriesError};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Raw close history for one instrument, nulls preserved.
#[derive(Debug, Clone, Default)]
pub struct CloseHistory {
    pub timestamps: Vec<i64>,
    pub closes: Vec<Option<f64>>,
}

impl CloseHistory {
    pub fn from_path(path: &Path) -> Result<Self, SeriesError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, SeriesError> {
        let envelope: ChartEnvelope =
            serde_json::from_str(s).map_err(|e| SeriesError::Parse(e.to_string()))?;

        let result = envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| SeriesError::Parse("chart.result is empty".into()))?;
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .ok_or_else(|| SeriesError::Parse("indicators.quote is empty".into()))?;

        if closes.len() != result.timestamp.len() {
            return Err(SeriesError::Parse(format!(
                "{} timestamps but {} closes",
                result.timestamp.len(),
                closes.len()
            )));
        }

        Ok(Self {
            timestamps: result.timestamp,
            closes,
        })
    }

    /// Non-null closes at or after `start_epoch`, keyed by timestamp.
    pub fn usable_closes(&self, start_epoch: i64) -> BTreeMap<i64, f64> {
        self.timestamps
            .iter()
            .zip(&self.closes)
            .filter_map(|(&ts, close)| match close {
                Some(c) if ts >= start_epoch => Some((ts, *c)),
                _ => None,
            })
            .collect()
    }
}

/// Intersect two close histories on common timestamps into an aligned series.
pub fn align(
    index: &CloseHistory,
    stock: &CloseHistory,
    start_epoch: i64,
) -> Result<PriceSeries, SeriesError> {
    let index_closes = index.usable_closes(start_epoch);
    let stock_closes = stock.usable_closes(start_epoch);

    let points = index_closes.iter().filter_map(|(&ts, &price_a)| {
        stock_closes.get(&ts).map(|&price_b| PricePoint {
            timestamp: ts,
            price_a,
            price_b,
        })
    });
    let series = PriceSeries::from_points(points)?;

    tracing::debug!(
        index_points = index_closes.len(),
        stock_points = stock_closes.len(),
        aligned = series.len(),
        "aligned close histories"
    );
    Ok(series)
}
