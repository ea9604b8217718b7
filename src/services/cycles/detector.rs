//! Rule-profile driven cycle detection.
//!
//! One generic pass over a price series, month by month. Everything that
//! differs between the anchor fund and its peers lives in the profile.

use crate::services::calendar::{
    add_months, clip_day, days_in_month, is_month_in_progress, last_trading_days,
};
use crate::types::{
    gain_pct, highest, lowest, round_to, ConfirmFailure, CycleKind, CycleMonth, CycleRecord,
    DayWindow, Extremum, FollowingWindow, InProgressPeak, PostPeakRule, PricePoint, PriceSeries,
    RuleProfile,
};
use chrono::{Duration, NaiveDate};
use std::fmt;
use tracing::debug;

/// Why a month produced no record.
#[derive(Debug, Clone, PartialEq)]
enum Skip {
    EmptyLowWindow,
    EmptyPeakWindow,
    Separation(i64),
    LowUndercut,
    PeakExceeded,
    BelowThreshold(f64),
    DropTooLarge(f64),
    Invalid(String),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::EmptyLowWindow => write!(f, "no prices in low window"),
            Skip::EmptyPeakWindow => write!(f, "no prices in peak window"),
            Skip::Separation(days) => write!(f, "low and peak only {} days apart", days),
            Skip::LowUndercut => write!(f, "low undercut inside confirmation window"),
            Skip::PeakExceeded => write!(f, "peak matched or exceeded inside confirmation window"),
            Skip::BelowThreshold(gain) => write!(f, "gain {}% below threshold", gain),
            Skip::DropTooLarge(drop) => write!(f, "drop {}% beyond sanity bound", drop),
            Skip::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

/// Scans a series with one symbol's rule profile.
pub struct CycleDetector<'a> {
    profile: &'a RuleProfile,
    verbose: bool,
}

impl<'a> CycleDetector<'a> {
    pub fn new(profile: &'a RuleProfile) -> Self {
        Self {
            profile,
            verbose: false,
        }
    }

    /// Log every skipped month with its reason.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Detect every qualifying record in the series, ordered by first leg.
    ///
    /// Months without a qualifying pair are omitted. The result is a fresh
    /// list; nothing is written anywhere.
    pub fn detect(&self, series: &PriceSeries) -> Vec<CycleRecord> {
        let Some(latest) = series.last_date() else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for (year, month) in series.months() {
            match self.full_cycle(series, year, month, latest) {
                Ok(record) => records.push(record),
                Err(reason) => self.skip(CycleKind::FullCycle, year, month, &reason),
            }

            if let Some(rule) = &self.profile.post_peak {
                match self.post_peak_low(rule, series, year, month, latest) {
                    Ok(record) => records.push(record),
                    Err(reason) => self.skip(CycleKind::PostPeakLow, year, month, &reason),
                }
            }
        }

        records.sort_by_key(|r| (r.first_leg_date(), r.kind));
        debug!(
            "Detected {} cycle records for {} across {} sessions",
            records.len(),
            self.profile.symbol,
            series.len()
        );
        records
    }

    fn skip(&self, kind: CycleKind, year: i32, month: u32, reason: &Skip) {
        if self.verbose {
            debug!(
                "{} {:04}-{:02} {}: skipped, {}",
                self.profile.symbol,
                year,
                month,
                kind.as_str(),
                reason
            );
        }
    }

    fn full_cycle(
        &self,
        series: &PriceSeries,
        year: i32,
        month: u32,
        latest: NaiveDate,
    ) -> Result<CycleRecord, Skip> {
        let rule = &self.profile.full_cycle;

        let (low_start, low_end) =
            window_bounds(&rule.low_window, year, month).ok_or(Skip::EmptyLowWindow)?;
        let low = lowest(series.range(low_start, low_end)).ok_or(Skip::EmptyLowWindow)?;

        let (peak_year, peak_month) = add_months(year, month, rule.peak_month_offset);
        let in_progress = is_month_in_progress(peak_year, peak_month, latest);

        let peak_slice = if in_progress && rule.in_progress_peak == InProgressPeak::SinceLow {
            // Closes after the low, but never before the peak month opens.
            let since_low = series.after(low.date);
            match clip_day(peak_year, peak_month, 1) {
                Some(month_start) => {
                    let from = since_low.partition_point(|p| p.date < month_start);
                    &since_low[from..]
                }
                None => &[],
            }
        } else {
            match window_bounds(&rule.peak_window, peak_year, peak_month) {
                Some((start, end)) => series.range(start, end),
                None => &[],
            }
        };
        let peak = highest(peak_slice).ok_or(Skip::EmptyPeakWindow)?;

        let separation = (peak.date - low.date).num_days();
        if separation < rule.min_separation_days {
            return Err(Skip::Separation(separation));
        }

        let mut complete = !in_progress;

        if let Some(check) = rule.low_confirmation {
            let end = low.date + Duration::days(check.days);
            let undercut = series
                .range(low.date, end)
                .iter()
                .any(|p| p.price < low.price);
            if undercut {
                match check.on_failure {
                    ConfirmFailure::Reject => return Err(Skip::LowUndercut),
                    ConfirmFailure::MarkIncomplete => complete = false,
                }
            }
        }

        // An in-progress peak is accepted as is and stays incomplete.
        if let (Some(check), false) = (rule.peak_confirmation, in_progress) {
            let end = peak.date + Duration::days(check.days);
            let exceeded = series
                .range(peak.date + Duration::days(1), end)
                .iter()
                .any(|p| p.price >= peak.price);
            if exceeded {
                match check.on_failure {
                    ConfirmFailure::Reject => return Err(Skip::PeakExceeded),
                    ConfirmFailure::MarkIncomplete => complete = false,
                }
            }
            if end > latest {
                complete = false;
            }
        }

        let gain = gain_pct(low.price, peak.price);
        if gain <= rule.rebound_threshold_pct {
            return Err(Skip::BelowThreshold(gain));
        }

        let cycle_month = CycleMonth::new(year, month).map_err(|e| Skip::Invalid(e.to_string()))?;
        CycleRecord::full_cycle(
            &self.profile.symbol,
            cycle_month,
            Extremum::new(low.date, low.price),
            Extremum::new(peak.date, peak.price),
            complete,
            signal_strength(series, peak, rule.signal_lookback),
        )
        .map_err(|e| Skip::Invalid(e.to_string()))
    }

    fn post_peak_low(
        &self,
        rule: &PostPeakRule,
        series: &PriceSeries,
        year: i32,
        month: u32,
        latest: NaiveDate,
    ) -> Result<CycleRecord, Skip> {
        let (start, end) =
            window_bounds(&rule.peak_window, year, month).ok_or(Skip::EmptyPeakWindow)?;
        let peak = highest(series.range(start, end)).ok_or(Skip::EmptyPeakWindow)?;

        let (low_slice, fully_observed) = match rule.low_window {
            FollowingWindow::TradingDays { count } => {
                let after = series.after(peak.date);
                let slice = &after[..after.len().min(count)];
                (slice, slice.len() == count)
            }
            FollowingWindow::CalendarDays { count } => {
                let end = peak.date + Duration::days(count);
                (series.range(peak.date + Duration::days(1), end), end <= latest)
            }
        };
        let low = lowest(low_slice).ok_or(Skip::EmptyLowWindow)?;

        let gain = gain_pct(low.price, peak.price);
        if gain <= rule.min_drop_pct {
            return Err(Skip::BelowThreshold(gain));
        }
        let drop = round_to((peak.price - low.price) / peak.price * 100.0, 3);
        if drop > rule.max_drop_pct {
            return Err(Skip::DropTooLarge(drop));
        }

        let complete = fully_observed && !is_month_in_progress(year, month, latest);
        let cycle_month = CycleMonth::new(year, month).map_err(|e| Skip::Invalid(e.to_string()))?;
        CycleRecord::post_peak_low(
            &self.profile.symbol,
            cycle_month,
            Extremum::new(peak.date, peak.price),
            Extremum::new(low.date, low.price),
            complete,
            signal_strength(series, peak, self.profile.full_cycle.signal_lookback),
        )
        .map_err(|e| Skip::Invalid(e.to_string()))
    }
}

/// Inclusive date bounds of a window inside one month.
pub fn window_bounds(window: &DayWindow, year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    match *window {
        DayWindow::DaysOfMonth { start, end } => {
            if start == 0 || start > end || start > days_in_month(year, month) {
                return None;
            }
            Some((clip_day(year, month, start)?, clip_day(year, month, end)?))
        }
        DayWindow::LastTradingDays { count } => {
            let days = last_trading_days(year, month, count);
            Some((*days.first()?, *days.last()?))
        }
    }
}

/// Percent distance from the peak to the highest close of the trailing
/// sessions ending at the peak. Zero when the peak is the recent high.
fn signal_strength(series: &PriceSeries, peak: PricePoint, lookback: usize) -> Option<f64> {
    let high = highest(series.trailing(peak.date, lookback))?.price;
    Some(round_to((high - peak.price) / high * 100.0, 3))
}
