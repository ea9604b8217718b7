//! Modal day-of-month estimation.

use crate::services::calendar::clip_day;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Most frequent day-of-month among `dates`. Ties go to the smallest day.
pub fn modal_day(dates: &[NaiveDate]) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for date in dates {
        *counts.entry(date.day()).or_insert(0) += 1;
    }

    let mut best: Option<(u32, usize)> = None;
    for (day, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((day, count)),
        }
    }
    best.map(|(day, _)| day)
}

/// Next date on or after `today` whose day-of-month is `day`, clipped to
/// short months. Looks at this month, then the next.
pub fn candidate_for_day(day: u32, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(date) = clip_day(today.year(), today.month(), day) {
        if date >= today {
            return Some(date);
        }
    }
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    clip_day(year, month, day).filter(|date| *date >= today)
}
