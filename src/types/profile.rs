//! Per-symbol rule profiles.
//!
//! A profile is plain data consumed by the generic detector, projector and
//! scorer. Adding a symbol means adding a profile, not a code path.

use serde::{Deserialize, Serialize};

/// Symbol class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolClass {
    /// Low late in one month, peak in the following month.
    Anchor,
    /// Low and peak inside the same month.
    Peer,
}

/// A search window inside one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DayWindow {
    /// Day-of-month range, inclusive. `end` is clipped to the month length.
    DaysOfMonth { start: u32, end: u32 },
    /// The final `n` trading days of the month.
    LastTradingDays { count: u32 },
}

/// A search window that starts right after an already chosen date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FollowingWindow {
    /// The next `count` observed sessions.
    TradingDays { count: usize },
    /// The next `count` calendar days.
    CalendarDays { count: i64 },
}

/// What happens when a confirmation check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmFailure {
    Reject,
    MarkIncomplete,
}

/// Local extremum check over a few calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub days: i64,
    pub on_failure: ConfirmFailure,
}

/// How the peak is searched while its month is still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InProgressPeak {
    /// Every close observed after the low so far.
    SinceLow,
    /// The configured peak window, same as for elapsed months.
    ConfiguredWindow,
}

/// Low-then-peak detection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullCycleRule {
    pub low_window: DayWindow,
    /// Months between the low's month and the peak's month.
    pub peak_month_offset: u32,
    pub peak_window: DayWindow,
    pub in_progress_peak: InProgressPeak,
    /// Minimum calendar days from low to peak.
    pub min_separation_days: i64,
    /// Low must stay the minimum over this many days starting at the low.
    pub low_confirmation: Option<Confirmation>,
    /// Peak must not be matched or exceeded this many days after it.
    pub peak_confirmation: Option<Confirmation>,
    /// Gain (percent) a pair must exceed to count as a cycle.
    pub rebound_threshold_pct: f64,
    /// Sessions (peak included) used for signal strength.
    pub signal_lookback: usize,
}

/// Peak-then-low detection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPeakRule {
    pub peak_window: DayWindow,
    pub low_window: FollowingWindow,
    /// Gain (percent, low to peak) a pair must exceed.
    pub min_drop_pct: f64,
    /// Largest plausible drop from the peak (percent).
    pub max_drop_pct: f64,
}

/// Projection overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRule {
    /// The next low is the trading day after the projected peak.
    pub low_follows_peak: bool,
    /// A peak modal day of 31 means "last trading day of the month".
    pub snap_month_end_peak: bool,
    /// Days ahead of today used when no candidate can be built.
    pub fallback_days: i64,
}

/// Sub-score weights. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub proximity: f64,
    pub calendar: f64,
    pub divergence: f64,
    pub reserved: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            proximity: 0.4,
            calendar: 0.3,
            divergence: 0.2,
            reserved: 0.1,
        }
    }
}

/// Same-day peak scoring rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    /// Full calendar credit on these days of month.
    pub target_days: (u32, u32),
    /// Half calendar credit on these days of month.
    pub band_days: (u32, u32),
    pub peers: Vec<String>,
    /// Sessions, today included, for the recent high.
    pub lookback_sessions: usize,
    /// Price minus peer mean above this earns full divergence credit.
    pub strong_divergence: f64,
    /// Above this earns half credit.
    pub mild_divergence: f64,
    pub weights: ScoreWeights,
    /// Fixed value of the reserved sub-score.
    pub reserved_value: f64,
}

/// Everything the engine needs to know about one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProfile {
    pub symbol: String,
    pub class: SymbolClass,
    pub full_cycle: FullCycleRule,
    pub post_peak: Option<PostPeakRule>,
    pub projection: ProjectionRule,
    pub scoring: ScoringRule,
}
