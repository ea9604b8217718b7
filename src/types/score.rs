//! Same-day peak score types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Score band thresholds (score out of 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub likely: f64,
    pub watch: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            likely: 75.0,
            watch: 60.0,
        }
    }
}

/// Classification of a same-day score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Likely,
    Watch,
    #[serde(rename = "none")]
    NoSignal,
}

impl ScoreBand {
    pub fn from_score(score: f64, thresholds: &ScoreThresholds) -> Self {
        if score >= thresholds.likely {
            ScoreBand::Likely
        } else if score >= thresholds.watch {
            ScoreBand::Watch
        } else {
            ScoreBand::NoSignal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Likely => "likely",
            ScoreBand::Watch => "watch",
            ScoreBand::NoSignal => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "likely" => Some(ScoreBand::Likely),
            "watch" => Some(ScoreBand::Watch),
            "none" => Some(ScoreBand::NoSignal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Likely => "Peak Likely",
            ScoreBand::Watch => "Watch Closely",
            ScoreBand::NoSignal => "No Peak Signal",
        }
    }
}

/// Sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub proximity: f64,
    pub calendar: f64,
    pub divergence: f64,
    pub reserved: f64,
}

/// Composite "today is a peak" score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakScore {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub recent_high: f64,
    pub peer_mean: Option<f64>,
    pub score: f64,
    pub band: ScoreBand,
    pub components: ScoreComponents,
}

/// A stored score, as listed from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub score: f64,
    pub band: ScoreBand,
    pub components: ScoreComponents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_thresholds() {
        let t = ScoreThresholds::default();
        assert_eq!(ScoreBand::from_score(75.0, &t), ScoreBand::Likely);
        assert_eq!(ScoreBand::from_score(74.9, &t), ScoreBand::Watch);
        assert_eq!(ScoreBand::from_score(60.0, &t), ScoreBand::Watch);
        assert_eq!(ScoreBand::from_score(59.9, &t), ScoreBand::NoSignal);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = ScoreThresholds {
            likely: 90.0,
            watch: 50.0,
        };
        assert_eq!(ScoreBand::from_score(75.0, &t), ScoreBand::Watch);
    }

    #[test]
    fn test_band_round_trip_str() {
        for band in [ScoreBand::Likely, ScoreBand::Watch, ScoreBand::NoSignal] {
            assert_eq!(ScoreBand::parse(band.as_str()), Some(band));
        }
        assert_eq!(serde_json::to_string(&ScoreBand::NoSignal).unwrap(), "\"none\"");
    }
}
