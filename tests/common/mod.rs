//! Shared fixtures for integration tests.
#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate};
use cyclewatch::services::calendar::is_trading_day;
use cyclewatch::PricePoint;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Anchor-shaped closes: climb to day 21, then slide into month end.
pub fn usfr_price(date: NaiveDate) -> f64 {
    let day = date.day() as f64;
    if day <= 21.0 {
        50.0 + 0.004 * day
    } else {
        50.084 - 0.012 * (day - 21.0)
    }
}

/// Peer-shaped closes: dip over the first three days, then climb to month end.
pub fn peer_price(date: NaiveDate) -> f64 {
    let day = date.day() as f64;
    if day <= 3.0 {
        100.0 - 0.01 * day
    } else {
        100.0 + 0.01 * day
    }
}

/// One close per trading day in `[start, end]`.
pub fn closes(start: NaiveDate, end: NaiveDate, price: fn(NaiveDate) -> f64) -> Vec<PricePoint> {
    let mut points = Vec::new();
    let mut date = start;
    while date <= end {
        if is_trading_day(date) {
            points.push(PricePoint::new(date, price(date)));
        }
        date += Duration::days(1);
    }
    points
}

pub fn usfr_closes(start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    closes(start, end, usfr_price)
}

pub fn peer_closes(start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    closes(start, end, peer_price)
}
