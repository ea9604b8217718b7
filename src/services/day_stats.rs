//! Price statistics by trading-day-of-month.

use crate::types::{round_to, PriceSeries};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate of every close that fell on the n-th session of its month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingDayStat {
    pub trading_day: u32,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// Sample standard deviation; absent below two observations.
    pub std_dev: Option<f64>,
}

/// Number each session within its month from 1 and aggregate closes per number.
pub fn trading_day_stats(series: &PriceSeries) -> Vec<TradingDayStat> {
    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut current_month: Option<(i32, u32)> = None;
    let mut session = 0u32;

    for point in series.points() {
        let month = (point.date.year(), point.date.month());
        if current_month != Some(month) {
            current_month = Some(month);
            session = 0;
        }
        session += 1;
        buckets.entry(session).or_default().push(point.price);
    }

    buckets
        .into_iter()
        .map(|(trading_day, mut prices)| {
            prices.sort_by(|a, b| a.total_cmp(b));
            let count = prices.len();
            let mean = prices.iter().sum::<f64>() / count as f64;
            let median = if count % 2 == 1 {
                prices[count / 2]
            } else {
                (prices[count / 2 - 1] + prices[count / 2]) / 2.0
            };
            let std_dev = (count > 1).then(|| {
                let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>()
                    / (count - 1) as f64;
                round_to(variance.sqrt(), 5)
            });

            TradingDayStat {
                trading_day,
                count,
                mean: round_to(mean, 5),
                min: round_to(prices[0], 5),
                max: round_to(prices[count - 1], 5),
                median: round_to(median, 5),
                std_dev,
            }
        })
        .collect()
}
