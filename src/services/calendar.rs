//! Market calendar helpers.
//!
//! Pure date logic: weekends plus New Year's Day, Independence Day and
//! Christmas Day, each shifted to its observed weekday (Saturday to the
//! preceding Friday, Sunday to the following Monday).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Fixed (month, day) holidays.
const FIXED_HOLIDAYS: [(u32, u32); 3] = [(1, 1), (7, 4), (12, 25)];

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// (year, month) shifted by `offset` months.
pub fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + offset as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Day `day` of the month, clipped to the month's last day.
pub fn clip_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if day == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Observed market holidays falling in `year`.
pub fn holidays(year: i32) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = Vec::new();
    for y in [year, year + 1] {
        for (month, day) in FIXED_HOLIDAYS {
            if let Some(date) = NaiveDate::from_ymd_opt(y, month, day) {
                let obs = observed(date);
                if obs.year() == year {
                    dates.push(obs);
                }
            }
        }
    }
    dates.sort();
    dates
}

pub fn is_market_holiday(date: NaiveDate) -> bool {
    holidays(date.year()).contains(&date)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !is_weekend(date) && !is_market_holiday(date)
}

/// First trading day on or after `date`.
pub fn adjust_forward(date: NaiveDate) -> NaiveDate {
    let mut current = date;
    while !is_trading_day(current) {
        current += Duration::days(1);
    }
    current
}

/// First trading day strictly after `date`.
pub fn next_trading_day(date: NaiveDate) -> NaiveDate {
    adjust_forward(date + Duration::days(1))
}

pub fn last_trading_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let mut current = clip_day(year, month, 31)?;
    while !is_trading_day(current) {
        current -= Duration::days(1);
        if current.month() != month {
            return None;
        }
    }
    Some(current)
}

/// The final `count` trading days of a month, earliest first.
pub fn last_trading_days(year: i32, month: u32, count: u32) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = Vec::new();
    let Some(mut current) = clip_day(year, month, 31) else {
        return days;
    };
    while days.len() < count as usize && current.month() == month {
        if is_trading_day(current) {
            days.push(current);
        }
        current -= Duration::days(1);
    }
    days.reverse();
    days
}

/// Whether the month's final session is still ahead of `latest`.
pub fn is_month_in_progress(year: i32, month: u32, latest: NaiveDate) -> bool {
    match last_trading_day_of_month(year, month) {
        Some(last) => latest < last,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // =========================================================================
    // Month Arithmetic
    // =========================================================================

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_add_months_wraps_year() {
        assert_eq!(add_months(2024, 12, 1), (2025, 1));
        assert_eq!(add_months(2024, 5, 0), (2024, 5));
        assert_eq!(add_months(2024, 11, 14), (2026, 1));
    }

    #[test]
    fn test_clip_day() {
        assert_eq!(clip_day(2024, 4, 31), Some(d(2024, 4, 30)));
        assert_eq!(clip_day(2023, 2, 31), Some(d(2023, 2, 28)));
        assert_eq!(clip_day(2024, 4, 15), Some(d(2024, 4, 15)));
        assert_eq!(clip_day(2024, 4, 0), None);
    }

    // =========================================================================
    // Holidays
    // =========================================================================

    #[test]
    fn test_saturday_holiday_observed_friday() {
        // July 4th 2026 is a Saturday.
        assert!(is_market_holiday(d(2026, 7, 3)));
        assert!(!is_market_holiday(d(2026, 7, 4)));
    }

    #[test]
    fn test_sunday_holiday_observed_monday() {
        // Christmas 2022 is a Sunday.
        assert!(is_market_holiday(d(2022, 12, 26)));
    }

    #[test]
    fn test_saturday_new_year_observed_prior_december() {
        // New Year's Day 2022 is a Saturday.
        assert!(is_market_holiday(d(2021, 12, 31)));
        assert!(holidays(2021).contains(&d(2021, 12, 31)));
        assert!(!holidays(2022).contains(&d(2021, 12, 31)));
    }

    #[test]
    fn test_weekday_holidays() {
        assert!(is_market_holiday(d(2024, 1, 1)));
        assert!(is_market_holiday(d(2024, 7, 4)));
        assert!(is_market_holiday(d(2024, 12, 25)));
        assert!(!is_market_holiday(d(2024, 12, 24)));
    }

    // =========================================================================
    // Trading Day Adjustment
    // =========================================================================

    #[test]
    fn test_saturday_adjusts_to_monday() {
        // 2024-06-15 is a Saturday.
        assert_eq!(adjust_forward(d(2024, 6, 15)), d(2024, 6, 17));
    }

    #[test]
    fn test_adjust_skips_holiday_after_weekend() {
        // Sunday 2022-12-25 -> Monday is observed Christmas -> Tuesday.
        assert_eq!(adjust_forward(d(2022, 12, 25)), d(2022, 12, 27));
    }

    #[test]
    fn test_adjust_forward_is_monotonic() {
        let mut date = d(2023, 12, 1);
        while date < d(2025, 2, 1) {
            let adjusted = adjust_forward(date);
            assert!(adjusted >= date);
            assert!(!is_weekend(adjusted));
            assert!(!is_market_holiday(adjusted));
            date += Duration::days(1);
        }
    }

    #[test]
    fn test_next_trading_day_is_strict() {
        assert_eq!(next_trading_day(d(2024, 6, 17)), d(2024, 6, 18));
        assert_eq!(next_trading_day(d(2024, 6, 14)), d(2024, 6, 17));
        assert_eq!(next_trading_day(d(2024, 7, 3)), d(2024, 7, 5));
    }

    #[test]
    fn test_last_trading_day_of_month() {
        // 2024-03-31 is a Sunday.
        assert_eq!(last_trading_day_of_month(2024, 3), Some(d(2024, 3, 29)));
        // 2024-04-30 is a Tuesday.
        assert_eq!(last_trading_day_of_month(2024, 4), Some(d(2024, 4, 30)));
        // 2024-06-30 is a Sunday.
        assert_eq!(last_trading_day_of_month(2024, 6), Some(d(2024, 6, 28)));
    }

    #[test]
    fn test_last_trading_days() {
        let days = last_trading_days(2024, 4, 3);
        assert_eq!(days, vec![d(2024, 4, 26), d(2024, 4, 29), d(2024, 4, 30)]);
    }

    #[test]
    fn test_month_in_progress() {
        assert!(is_month_in_progress(2024, 4, d(2024, 4, 29)));
        assert!(!is_month_in_progress(2024, 4, d(2024, 4, 30)));
        assert!(!is_month_in_progress(2024, 4, d(2024, 5, 2)));
        assert!(is_month_in_progress(2024, 5, d(2024, 4, 30)));
    }
}
