//! Same-day peak scoring.
//!
//! Blends four sub-scores into a 0-100 "today is a peak" score:
//! proximity to the recent high, calendar position, divergence from peer
//! funds, and a reserved slot held at a fixed value.

use crate::error::{AppError, Result};
use crate::types::{
    highest, round_to, PeakScore, PriceSeries, RuleProfile, ScoreBand, ScoreComponents,
    ScoreThresholds, ScoringRule,
};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

/// `1 - (high - price) / high`.
pub fn proximity_score(price: f64, high: f64) -> f64 {
    if high <= 0.0 {
        return 0.0;
    }
    1.0 - (high - price) / high
}

/// Full credit inside the target days, half inside the wider band.
pub fn calendar_score(day: u32, rule: &ScoringRule) -> f64 {
    let (target_start, target_end) = rule.target_days;
    let (band_start, band_end) = rule.band_days;
    if (target_start..=target_end).contains(&day) {
        1.0
    } else if (band_start..=band_end).contains(&day) {
        0.5
    } else {
        0.0
    }
}

/// Thresholded on `price - mean(peers)`.
pub fn divergence_score(price: f64, peer_mean: Option<f64>, rule: &ScoringRule) -> f64 {
    let Some(mean) = peer_mean else {
        return 0.0;
    };
    let divergence = price - mean;
    if divergence > rule.strong_divergence {
        1.0
    } else if divergence > rule.mild_divergence {
        0.5
    } else {
        0.0
    }
}

/// Score `today` for the profile's symbol.
///
/// `peers` holds the series of the profile's peer funds; peers without a
/// close on `today` are left out of the mean.
pub fn score_same_day(
    profile: &RuleProfile,
    series: &PriceSeries,
    peers: &[PriceSeries],
    today: NaiveDate,
    thresholds: &ScoreThresholds,
) -> Result<PeakScore> {
    let rule = &profile.scoring;

    let price = series.price_on(today).ok_or_else(|| {
        AppError::Data(format!("{}: no close on {}", series.symbol(), today))
    })?;

    let window = series.trailing(today, rule.lookback_sessions);
    if window.len() < rule.lookback_sessions {
        return Err(AppError::Data(format!(
            "{}: need {} sessions up to {}, have {}",
            series.symbol(),
            rule.lookback_sessions,
            today,
            window.len()
        )));
    }
    let recent_high = highest(window).map(|p| p.price).unwrap_or(price);

    let peer_prices: Vec<f64> = peers
        .iter()
        .filter(|p| rule.peers.iter().any(|s| s == p.symbol()))
        .filter_map(|p| p.price_on(today))
        .collect();
    let peer_mean = if peer_prices.is_empty() {
        warn!("{}: no peer closes on {}", series.symbol(), today);
        None
    } else {
        Some(peer_prices.iter().sum::<f64>() / peer_prices.len() as f64)
    };

    let components = ScoreComponents {
        proximity: proximity_score(price, recent_high),
        calendar: calendar_score(today.day(), rule),
        divergence: divergence_score(price, peer_mean, rule),
        reserved: rule.reserved_value,
    };

    let w = &rule.weights;
    let blended = w.proximity * components.proximity
        + w.calendar * components.calendar
        + w.divergence * components.divergence
        + w.reserved * components.reserved;
    let score = round_to(blended * 100.0, 1);
    let band = ScoreBand::from_score(score, thresholds);

    debug!(
        "{} {} score {} ({})",
        series.symbol(),
        today,
        score,
        band.label()
    );

    Ok(PeakScore {
        symbol: series.symbol().to_string(),
        date: today,
        price,
        recent_high,
        peer_mean,
        score,
        band,
        components,
    })
}
