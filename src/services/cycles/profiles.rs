//! Built-in rule profiles and the registry that serves them.

use crate::error::{AppError, Result};
use crate::types::{
    ConfirmFailure, Confirmation, DayWindow, FollowingWindow, FullCycleRule, InProgressPeak,
    PostPeakRule, ProjectionRule, RuleProfile, ScoreWeights, ScoringRule, SymbolClass,
};
use std::collections::HashMap;

/// The anchor fund.
pub const ANCHOR_SYMBOL: &str = "USFR";

/// Funds whose cycle completes inside one month.
pub const PEER_SYMBOLS: [&str; 5] = ["SGOV", "TFLO", "BIL", "SHV", "ICSH"];

/// Anchor profile: low from day 19 of month M, peak from day 13 of M+1.
pub fn anchor_profile(symbol: &str, peers: Vec<String>) -> RuleProfile {
    RuleProfile {
        symbol: symbol.to_uppercase(),
        class: SymbolClass::Anchor,
        full_cycle: FullCycleRule {
            low_window: DayWindow::DaysOfMonth { start: 19, end: 31 },
            peak_month_offset: 1,
            peak_window: DayWindow::DaysOfMonth { start: 13, end: 31 },
            in_progress_peak: InProgressPeak::SinceLow,
            min_separation_days: 10,
            low_confirmation: Some(Confirmation {
                days: 2,
                on_failure: ConfirmFailure::Reject,
            }),
            peak_confirmation: Some(Confirmation {
                days: 2,
                on_failure: ConfirmFailure::Reject,
            }),
            rebound_threshold_pct: 0.10,
            signal_lookback: 10,
        },
        post_peak: Some(PostPeakRule {
            peak_window: DayWindow::DaysOfMonth { start: 18, end: 25 },
            low_window: FollowingWindow::CalendarDays { count: 6 },
            min_drop_pct: 0.0,
            max_drop_pct: 2.0,
        }),
        projection: ProjectionRule {
            low_follows_peak: true,
            snap_month_end_peak: false,
            fallback_days: 10,
        },
        scoring: ScoringRule {
            target_days: (18, 25),
            band_days: (15, 27),
            peers,
            lookback_sessions: 10,
            strong_divergence: 0.05,
            mild_divergence: 0.01,
            weights: ScoreWeights::default(),
            reserved_value: 0.5,
        },
    }
}

/// Peer profile: low in days 1-5, peak from day 25 of the same month.
pub fn peer_profile(symbol: &str, peers: Vec<String>) -> RuleProfile {
    RuleProfile {
        symbol: symbol.to_uppercase(),
        class: SymbolClass::Peer,
        full_cycle: FullCycleRule {
            low_window: DayWindow::DaysOfMonth { start: 1, end: 5 },
            peak_month_offset: 0,
            peak_window: DayWindow::DaysOfMonth { start: 25, end: 31 },
            in_progress_peak: InProgressPeak::SinceLow,
            min_separation_days: 1,
            low_confirmation: None,
            peak_confirmation: None,
            rebound_threshold_pct: 0.07,
            signal_lookback: 10,
        },
        post_peak: Some(PostPeakRule {
            peak_window: DayWindow::LastTradingDays { count: 3 },
            low_window: FollowingWindow::TradingDays { count: 3 },
            min_drop_pct: 0.0,
            max_drop_pct: 5.0,
        }),
        projection: ProjectionRule {
            low_follows_peak: false,
            snap_month_end_peak: true,
            fallback_days: 10,
        },
        scoring: ScoringRule {
            target_days: (27, 31),
            band_days: (25, 31),
            peers,
            lookback_sessions: 10,
            strong_divergence: 0.05,
            mild_divergence: 0.01,
            weights: ScoreWeights::default(),
            reserved_value: 0.5,
        },
    }
}

/// Rule profiles keyed by uppercase symbol.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, RuleProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The anchor plus the five peer funds.
    pub fn default_treasury() -> Self {
        let mut registry = Self::new();
        let peers: Vec<String> = PEER_SYMBOLS.iter().map(|s| s.to_string()).collect();

        registry.insert(anchor_profile(ANCHOR_SYMBOL, peers.clone()));
        for symbol in PEER_SYMBOLS {
            let others: Vec<String> = peers.iter().filter(|p| *p != symbol).cloned().collect();
            registry.insert(peer_profile(symbol, others));
        }
        registry
    }

    pub fn insert(&mut self, profile: RuleProfile) {
        self.profiles.insert(profile.symbol.to_uppercase(), profile);
    }

    pub fn get(&self, symbol: &str) -> Result<&RuleProfile> {
        self.profiles.get(&symbol.to_uppercase()).ok_or_else(|| {
            AppError::Configuration(format!("no rule profile for symbol {}", symbol.to_uppercase()))
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.profiles.contains_key(&symbol.to_uppercase())
    }

    /// Registered symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.profiles.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn profiles(&self) -> impl Iterator<Item = &RuleProfile> {
        self.profiles.values()
    }

    /// Keep only the listed symbols. Each must already be registered.
    pub fn retain_symbols(mut self, symbols: &[String]) -> Result<Self> {
        for symbol in symbols {
            self.get(symbol)?;
        }
        let wanted: Vec<String> = symbols.iter().map(|s| s.to_uppercase()).collect();
        self.profiles.retain(|symbol, _| wanted.contains(symbol));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
