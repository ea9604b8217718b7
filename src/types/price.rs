//! Daily closing prices for one symbol.

use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Chronologically ordered daily closes for a single symbol.
///
/// Dates are unique and strictly ascending, prices positive and finite.
/// Non-trading days are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a validated series. Malformed input is rejected, never repaired.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let symbol = symbol.into().to_uppercase();

        for point in &points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(AppError::Data(format!(
                    "{}: non-positive price {} on {}",
                    symbol, point.price, point.date
                )));
            }
        }

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(AppError::Data(format!(
                    "{}: dates not strictly ascending ({} then {})",
                    symbol, pair[0].date, pair[1].date
                )));
            }
        }

        Ok(Self { symbol, points })
    }

    /// An empty series for a symbol with no stored prices.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Close on an exact date.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].price)
    }

    /// Points with `start <= date <= end`.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[PricePoint] {
        if start > end {
            return &[];
        }
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        &self.points[lo..hi]
    }

    /// Points strictly after `date`.
    pub fn after(&self, date: NaiveDate) -> &[PricePoint] {
        let lo = self.points.partition_point(|p| p.date <= date);
        &self.points[lo..]
    }

    /// The last `n` sessions on or before `end` (fewer when history is short).
    pub fn trailing(&self, end: NaiveDate, n: usize) -> &[PricePoint] {
        let hi = self.points.partition_point(|p| p.date <= end);
        &self.points[hi.saturating_sub(n)..hi]
    }

    /// Distinct (year, month) pairs covered by the series, ascending.
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut months: Vec<(i32, u32)> = Vec::new();
        for point in &self.points {
            let key = (point.date.year(), point.date.month());
            if months.last() != Some(&key) {
                months.push(key);
            }
        }
        months
    }
}

/// Lowest close in a slice. Ties resolve to the earliest date.
pub fn lowest(points: &[PricePoint]) -> Option<PricePoint> {
    points.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.price <= p.price => Some(b),
        _ => Some(p),
    })
}

/// Highest close in a slice. Ties resolve to the latest date.
pub fn highest(points: &[PricePoint]) -> Option<PricePoint> {
    points.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.price > p.price => Some(b),
        _ => Some(p),
    })
}
