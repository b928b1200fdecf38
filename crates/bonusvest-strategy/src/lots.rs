use std::collections::BTreeMap;

use serde::Serialize;

/// All stock shares bought within one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PurchaseLot {
    pub year: i32,
    pub shares: f64,
}

/// Purchase-year → accumulated shares for one simulation run.
///
/// A lot only grows while contributions are made and leaves the book whole
/// when it matures; there is no partial sale.
#[derive(Debug, Clone, Default)]
pub struct LotBook {
    lots: BTreeMap<i32, f64>,
}

impl LotBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `shares` to the lot for `year`, opening it if absent.
    pub fn add(&mut self, year: i32, shares: f64) {
        *self.lots.entry(year).or_insert(0.0) += shares;
    }

    /// Remove the lot for `year` and return its share count.
    pub fn mature(&mut self, year: i32) -> Option<f64> {
        self.lots.remove(&year)
    }

    pub fn shares(&self, year: i32) -> Option<f64> {
        self.lots.get(&year).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn total_shares(&self) -> f64 {
        self.lots.values().sum()
    }

    /// Market value of every open lot at `price`.
    pub fn value_at(&self, price: f64) -> f64 {
        self.total_shares() * price
    }

    /// Open lots in ascending year order.
    pub fn lots(&self) -> Vec<PurchaseLot> {
        self.lots
            .iter()
            .map(|(&year, &shares)| PurchaseLot { year, shares })
            .collect()
    }
}
