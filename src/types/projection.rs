//! Next-occurrence projections.

use super::EventType;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Where a projected date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionBasis {
    /// A recorded event on or after today.
    Confirmed,
    /// Derived from the modal day.
    Estimated,
    /// Last-resort estimate; no candidate could be built from the modal day.
    Fallback,
}

/// Countdown status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountdownStatus {
    ActiveToday,
    Upcoming,
    Unknown,
}

/// Projection of the next low or peak for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub symbol: String,
    pub event: EventType,
    pub next_date: Option<NaiveDate>,
    pub days_until: Option<i64>,
    pub modal_day: Option<u32>,
    pub basis: Option<ProjectionBasis>,
    pub status: CountdownStatus,
}

impl Projection {
    /// No history to project from.
    pub fn unknown(symbol: &str, event: EventType) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            event,
            next_date: None,
            days_until: None,
            modal_day: None,
            basis: None,
            status: CountdownStatus::Unknown,
        }
    }

    /// Projection landing on `next_date`, with the countdown taken against `today`.
    pub fn dated(
        symbol: &str,
        event: EventType,
        next_date: NaiveDate,
        today: NaiveDate,
        modal_day: Option<u32>,
        basis: ProjectionBasis,
    ) -> Self {
        let days_until = (next_date - today).num_days().max(0);
        let status = if next_date == today {
            CountdownStatus::ActiveToday
        } else {
            CountdownStatus::Upcoming
        };
        Self {
            symbol: symbol.to_uppercase(),
            event,
            next_date: Some(next_date),
            days_until: Some(days_until),
            modal_day,
            basis: Some(basis),
            status,
        }
    }

    pub fn is_active_today(&self) -> bool {
        self.status == CountdownStatus::ActiveToday
    }

    /// One-line summary for display.
    pub fn describe(&self) -> String {
        let (Some(date), Some(days), Some(basis)) = (self.next_date, self.days_until, self.basis)
        else {
            return format!("{}: no {} history", self.symbol, self.event);
        };

        let when = format!(
            "{}/{}/{:02} ({} days left)",
            date.month(),
            date.day(),
            date.year() % 100,
            days
        );
        let mut line = match (basis, self.modal_day) {
            (ProjectionBasis::Confirmed, _) => {
                format!("{}: confirmed {} on {}", self.symbol, self.event, when)
            }
            (ProjectionBasis::Estimated, Some(day)) => format!(
                "{}: expected {} on modal day {} -> {}",
                self.symbol, self.event, day, when
            ),
            (ProjectionBasis::Estimated, None) => {
                format!("{}: expected {} on {}", self.symbol, self.event, when)
            }
            (ProjectionBasis::Fallback, _) => {
                format!("{}: estimated {} (fallback) on {}", self.symbol, self.event, when)
            }
        };
        if self.is_active_today() {
            line.push_str(" TODAY'S MATCH");
        }
        line
    }
}

/// How closely a projected peak lines up with a distribution ex-date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlignmentLevel {
    Green,
    Yellow,
    Red,
}

/// Ex-date alignment check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExDateAlignment {
    pub level: AlignmentLevel,
    pub ex_date: Option<NaiveDate>,
    pub delta_days: Option<i64>,
}
