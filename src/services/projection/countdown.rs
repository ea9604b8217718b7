//! Countdown to the next low or peak.

use super::modal::{candidate_for_day, modal_day};
use crate::services::calendar::{adjust_forward, last_trading_day_of_month, next_trading_day};
use crate::services::cycles::ProfileRegistry;
use crate::error::Result;
use crate::types::{CycleHistory, EventType, Projection, ProjectionBasis, RuleProfile};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

/// Project the next occurrence of `event` for `symbol` as seen from `today`.
pub fn project_next(
    symbol: &str,
    event: EventType,
    history: &CycleHistory,
    today: NaiveDate,
    profiles: &ProfileRegistry,
) -> Result<Projection> {
    let profile = profiles.get(symbol)?;
    Ok(CountdownProjector::new(profile).project(event, history, today))
}

/// Projects next events with one symbol's projection rule.
pub struct CountdownProjector<'a> {
    profile: &'a RuleProfile,
}

impl<'a> CountdownProjector<'a> {
    pub fn new(profile: &'a RuleProfile) -> Self {
        Self { profile }
    }

    /// A recorded event on or after today wins. Otherwise the date is
    /// estimated from the modal day, or from the projected peak for
    /// profiles whose low follows the peak.
    pub fn project(&self, event: EventType, history: &CycleHistory, today: NaiveDate) -> Projection {
        let symbol = &self.profile.symbol;

        if history.is_empty() {
            debug!("No {} history for {}", event, symbol);
            return Projection::unknown(symbol, event);
        }

        if let Some(date) = history.next_recorded(event, today) {
            return Projection::dated(symbol, event, date, today, None, ProjectionBasis::Confirmed);
        }

        if event == EventType::Low && self.profile.projection.low_follows_peak {
            let peak = self.project(EventType::Peak, history, today);
            // No stored low backs this date, so it is never confirmed.
            return match (peak.next_date, peak.basis) {
                (Some(peak_date), Some(basis)) => Projection::dated(
                    symbol,
                    event,
                    next_trading_day(peak_date),
                    today,
                    peak.modal_day,
                    match basis {
                        ProjectionBasis::Fallback => ProjectionBasis::Fallback,
                        _ => ProjectionBasis::Estimated,
                    },
                ),
                _ => Projection::unknown(symbol, event),
            };
        }

        let Some(day) = modal_day(&history.event_dates(event)) else {
            return Projection::unknown(symbol, event);
        };

        if event == EventType::Peak && self.profile.projection.snap_month_end_peak && day == 31 {
            if let Some(date) = month_end_session(today) {
                return Projection::dated(
                    symbol,
                    event,
                    date,
                    today,
                    Some(day),
                    ProjectionBasis::Estimated,
                );
            }
        }

        match candidate_for_day(day, today) {
            Some(candidate) => Projection::dated(
                symbol,
                event,
                adjust_forward(candidate),
                today,
                Some(day),
                ProjectionBasis::Estimated,
            ),
            None => {
                let date = fallback_date(history, today, self.profile.projection.fallback_days);
                warn!(
                    "{} {}: no candidate for modal day {}, falling back to {}",
                    symbol, event, day, date
                );
                Projection::dated(
                    symbol,
                    event,
                    date,
                    today,
                    Some(day),
                    ProjectionBasis::Fallback,
                )
            }
        }
    }
}

/// Last-resort date: the next recorded date of either leg, else `today`
/// plus `fallback_days`, moved forward to a trading day.
pub fn fallback_date(history: &CycleHistory, today: NaiveDate, fallback_days: i64) -> NaiveDate {
    let date = history
        .next_recorded_any(today)
        .unwrap_or_else(|| today + Duration::days(fallback_days));
    adjust_forward(date)
}

/// Last session of this month if still ahead, otherwise of next month.
fn month_end_session(today: NaiveDate) -> Option<NaiveDate> {
    let this_month = last_trading_day_of_month(today.year(), today.month())?;
    if this_month >= today {
        return Some(this_month);
    }
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    last_trading_day_of_month(year, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cycles::{anchor_profile, peer_profile};
    use crate::types::{CountdownStatus, CycleMonth, CycleRecord, Extremum};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn peer_record(month: u32, low_day: u32, peak_day: u32) -> CycleRecord {
        CycleRecord::full_cycle(
            "SGOV",
            CycleMonth::new(2024, month).unwrap(),
            Extremum::new(d(2024, month, low_day), 100.0),
            Extremum::new(d(2024, month, peak_day), 100.4),
            true,
            None,
        )
        .unwrap()
    }

    fn anchor_record(month: u32, low_day: u32, peak_day: u32) -> CycleRecord {
        CycleRecord::full_cycle(
            "USFR",
            CycleMonth::new(2024, month).unwrap(),
            Extremum::new(d(2024, month, low_day), 50.0),
            Extremum::new(d(2024, month + 1, peak_day), 50.3),
            true,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_history_is_unknown() {
        let profile = peer_profile("SGOV", Vec::new());
        let history = CycleHistory::new("SGOV");
        let p = CountdownProjector::new(&profile).project(EventType::Low, &history, d(2024, 6, 1));
        assert_eq!(p.status, CountdownStatus::Unknown);
        assert_eq!(p.next_date, None);
        assert_eq!(p.basis, None);
    }

    #[test]
    fn test_modal_low_estimate() {
        let profile = peer_profile("SGOV", Vec::new());
        let history = CycleHistory::from_records(
            "SGOV",
            vec![
                peer_record(1, 3, 29),
                peer_record(2, 3, 28),
                peer_record(3, 5, 28),
                peer_record(4, 3, 29),
            ],
        );
        // 2024-06-03 is a Monday.
        let p = CountdownProjector::new(&profile).project(EventType::Low, &history, d(2024, 5, 10));
        assert_eq!(p.modal_day, Some(3));
        assert_eq!(p.next_date, Some(d(2024, 6, 3)));
        assert_eq!(p.basis, Some(ProjectionBasis::Estimated));
        assert_eq!(p.days_until, Some(24));
    }

    #[test]
    fn test_peer_month_end_snap() {
        let profile = peer_profile("SGOV", Vec::new());
        let history = CycleHistory::from_records(
            "SGOV",
            vec![peer_record(1, 2, 31), peer_record(3, 1, 31), peer_record(5, 1, 31)],
        );
        // June 2024 ends on a Sunday: last session is Friday the 28th.
        let p = CountdownProjector::new(&profile).project(EventType::Peak, &history, d(2024, 6, 10));
        assert_eq!(p.modal_day, Some(31));
        assert_eq!(p.next_date, Some(d(2024, 6, 28)));
    }

    #[test]
    fn test_anchor_low_follows_projected_peak() {
        let profile = anchor_profile("USFR", Vec::new());
        let history = CycleHistory::from_records(
            "USFR",
            vec![anchor_record(1, 23, 21), anchor_record(2, 23, 21), anchor_record(3, 25, 19)],
        );
        // Modal peak day 21; 2024-06-21 is a Friday, so the low lands on Monday.
        let today = d(2024, 6, 10);
        let peak = CountdownProjector::new(&profile).project(EventType::Peak, &history, today);
        assert_eq!(peak.next_date, Some(d(2024, 6, 21)));

        let low = CountdownProjector::new(&profile).project(EventType::Low, &history, today);
        assert_eq!(low.next_date, Some(d(2024, 6, 24)));
        assert_eq!(low.basis, Some(ProjectionBasis::Estimated));
    }

    #[test]
    fn test_anchor_low_after_recorded_peak_is_estimated() {
        let profile = anchor_profile("USFR", Vec::new());
        let history = CycleHistory::from_records("USFR", vec![anchor_record(5, 31, 21)]);
        let today = d(2024, 6, 10);

        let peak = CountdownProjector::new(&profile).project(EventType::Peak, &history, today);
        assert_eq!(peak.basis, Some(ProjectionBasis::Confirmed));

        let low = CountdownProjector::new(&profile).project(EventType::Low, &history, today);
        assert_eq!(low.next_date, Some(d(2024, 6, 24)));
        assert_eq!(low.basis, Some(ProjectionBasis::Estimated));
        assert_eq!(history.event_dates(EventType::Low), vec![d(2024, 5, 31)]);
    }

    // =========================================================================
    // Fallback
    // =========================================================================

    #[test]
    fn test_fallback_uses_next_recorded_date() {
        let history = CycleHistory::from_records("SGOV", vec![peer_record(6, 3, 27)]);
        assert_eq!(fallback_date(&history, d(2024, 6, 10), 10), d(2024, 6, 27));
    }

    #[test]
    fn test_fallback_without_future_record() {
        let history = CycleHistory::from_records("SGOV", vec![peer_record(1, 3, 29)]);
        // 2024-06-16 is a Sunday.
        assert_eq!(fallback_date(&history, d(2024, 6, 6), 10), d(2024, 6, 17));
        // 2024-07-04 is a holiday.
        assert_eq!(fallback_date(&history, d(2024, 6, 24), 10), d(2024, 7, 5));
    }

    #[test]
    fn test_fallback_projection_basis() {
        let history = CycleHistory::from_records("SGOV", vec![peer_record(1, 3, 29)]);
        let today = d(2024, 6, 6);
        let date = fallback_date(&history, today, 10);
        let p = Projection::dated("SGOV", EventType::Peak, date, today, Some(29), ProjectionBasis::Fallback);
        assert_eq!(p.days_until, Some(11));
        assert_eq!(p.basis, Some(ProjectionBasis::Fallback));
        assert!(p.describe().contains("(fallback)"));
    }

    #[test]
    fn test_confirmed_record_preferred() {
        let profile = peer_profile("SGOV", Vec::new());
        let history = CycleHistory::from_records(
            "SGOV",
            vec![peer_record(1, 3, 29), peer_record(6, 3, 27)],
        );
        let p = CountdownProjector::new(&profile).project(EventType::Peak, &history, d(2024, 6, 10));
        assert_eq!(p.next_date, Some(d(2024, 6, 27)));
        assert_eq!(p.basis, Some(ProjectionBasis::Confirmed));
        assert_eq!(p.days_until, Some(17));
    }

    #[test]
    fn test_active_today() {
        let profile = peer_profile("SGOV", Vec::new());
        let history = CycleHistory::from_records("SGOV", vec![peer_record(6, 3, 27)]);
        let p = CountdownProjector::new(&profile).project(EventType::Peak, &history, d(2024, 6, 27));
        assert_eq!(p.status, CountdownStatus::ActiveToday);
        assert_eq!(p.days_until, Some(0));
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let registry = ProfileRegistry::default_treasury();
        let history = CycleHistory::new("SPY");
        let result = project_next("SPY", EventType::Peak, &history, d(2024, 6, 1), &registry);
        assert!(result.is_err());
    }
}
