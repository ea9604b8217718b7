//! Cross-check of a projected peak against distribution ex-dates.

use crate::types::{AlignmentLevel, ExDateAlignment};
use chrono::{Datelike, NaiveDate};

/// Days of slack for a green match.
const GREEN_DAYS: i64 = 1;
/// Days of slack for a yellow match.
const YELLOW_DAYS: i64 = 3;

/// Compare a projected peak with the ex-dates falling in the same month.
pub fn ex_date_alignment(projected_peak: NaiveDate, ex_dates: &[NaiveDate]) -> ExDateAlignment {
    let nearest = ex_dates
        .iter()
        .filter(|d| d.year() == projected_peak.year() && d.month() == projected_peak.month())
        .map(|d| (*d, (*d - projected_peak).num_days()))
        .min_by_key(|(_, delta)| delta.abs());

    match nearest {
        Some((ex_date, delta)) => {
            let level = if delta.abs() <= GREEN_DAYS {
                AlignmentLevel::Green
            } else if delta.abs() <= YELLOW_DAYS {
                AlignmentLevel::Yellow
            } else {
                AlignmentLevel::Red
            };
            ExDateAlignment {
                level,
                ex_date: Some(ex_date),
                delta_days: Some(delta),
            }
        }
        None => ExDateAlignment {
            level: AlignmentLevel::Red,
            ex_date: None,
            delta_days: None,
        },
    }
}
