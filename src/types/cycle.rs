//! Detected cycle records and the per-symbol history they accumulate into.

use super::round_to;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which leg of a cycle a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Low,
    Peak,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Low => "low",
            EventType::Peak => "peak",
        }
    }

    /// Parse from a path segment or query value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(EventType::Low),
            "peak" => Some(EventType::Peak),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two mirror-image record shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    /// Low first, peak later.
    FullCycle,
    /// Peak first, the low that follows it later.
    PostPeakLow,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::FullCycle => "full_cycle",
            CycleKind::PostPeakLow => "post_peak_low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full_cycle" => Some(CycleKind::FullCycle),
            "post_peak_low" => Some(CycleKind::PostPeakLow),
            _ => None,
        }
    }
}

/// Calendar month a cycle is attributed to, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CycleMonth {
    pub year: i32,
    pub month: u32,
}

impl CycleMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Data(format!("invalid month {}", month)));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for CycleMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CycleMonth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| AppError::Data(format!("invalid cycle month '{}'", s)))?;
        let year = year
            .parse()
            .map_err(|_| AppError::Data(format!("invalid cycle month '{}'", s)))?;
        let month = month
            .parse()
            .map_err(|_| AppError::Data(format!("invalid cycle month '{}'", s)))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for CycleMonth {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CycleMonth> for String {
    fn from(month: CycleMonth) -> Self {
        month.to_string()
    }
}

/// A dated extreme close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub date: NaiveDate,
    pub price: f64,
}

impl Extremum {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// One detected low/peak pair for one symbol in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub symbol: String,
    pub kind: CycleKind,
    pub cycle_month: CycleMonth,
    pub low: Extremum,
    pub peak: Extremum,
    /// `(peak - low) / low * 100`, rounded to 3 places, regardless of leg order.
    pub gain_pct: f64,
    pub complete: bool,
    /// Percent distance from the peak to the highest close of the preceding sessions.
    pub signal_strength: Option<f64>,
}

impl CycleRecord {
    /// A low followed by a later peak.
    pub fn full_cycle(
        symbol: &str,
        cycle_month: CycleMonth,
        low: Extremum,
        peak: Extremum,
        complete: bool,
        signal_strength: Option<f64>,
    ) -> Result<Self> {
        if peak.date <= low.date {
            return Err(AppError::Data(format!(
                "{} {}: full cycle peak {} does not follow low {}",
                symbol, cycle_month, peak.date, low.date
            )));
        }
        Self::build(symbol, CycleKind::FullCycle, cycle_month, low, peak, complete, signal_strength)
    }

    /// A peak followed by the low it falls to.
    pub fn post_peak_low(
        symbol: &str,
        cycle_month: CycleMonth,
        peak: Extremum,
        low: Extremum,
        complete: bool,
        signal_strength: Option<f64>,
    ) -> Result<Self> {
        if low.date <= peak.date {
            return Err(AppError::Data(format!(
                "{} {}: post-peak low {} does not follow peak {}",
                symbol, cycle_month, low.date, peak.date
            )));
        }
        Self::build(symbol, CycleKind::PostPeakLow, cycle_month, low, peak, complete, signal_strength)
    }

    fn build(
        symbol: &str,
        kind: CycleKind,
        cycle_month: CycleMonth,
        low: Extremum,
        peak: Extremum,
        complete: bool,
        signal_strength: Option<f64>,
    ) -> Result<Self> {
        if low.price <= 0.0 || peak.price <= 0.0 {
            return Err(AppError::Data(format!(
                "{} {}: non-positive extremum price",
                symbol, cycle_month
            )));
        }
        Ok(Self {
            symbol: symbol.to_uppercase(),
            kind,
            cycle_month,
            low,
            peak,
            gain_pct: gain_pct(low.price, peak.price),
            complete,
            signal_strength,
        })
    }

    /// Date of the requested leg.
    pub fn event_date(&self, event: EventType) -> NaiveDate {
        match event {
            EventType::Low => self.low.date,
            EventType::Peak => self.peak.date,
        }
    }

    /// Date of whichever leg came first chronologically.
    pub fn first_leg_date(&self) -> NaiveDate {
        self.low.date.min(self.peak.date)
    }

    fn sort_key(&self) -> (NaiveDate, CycleKind) {
        (self.first_leg_date(), self.kind)
    }
}

/// Percent move from low to peak, rounded to 3 places.
pub fn gain_pct(low: f64, peak: f64) -> f64 {
    round_to((peak - low) / low * 100.0, 3)
}

/// Ordered cycle records for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleHistory {
    pub symbol: String,
    records: Vec<CycleRecord>,
}

impl CycleHistory {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            records: Vec::new(),
        }
    }

    pub fn from_records(symbol: impl Into<String>, mut records: Vec<CycleRecord>) -> Self {
        records.sort_by_key(CycleRecord::sort_key);
        Self {
            symbol: symbol.into().to_uppercase(),
            records,
        }
    }

    pub fn records(&self) -> &[CycleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> &[CycleRecord] {
        &self.records[self.records.len().saturating_sub(n)..]
    }

    /// Latest full cycle with a positive gain.
    pub fn last_confirmed_peak(&self) -> Option<&CycleRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.kind == CycleKind::FullCycle && r.gain_pct > 0.0)
    }

    /// Every recorded date of one leg, across both record shapes.
    pub fn event_dates(&self, event: EventType) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.event_date(event)).collect()
    }

    /// Earliest recorded date of one leg on or after `today`.
    pub fn next_recorded(&self, event: EventType, today: NaiveDate) -> Option<NaiveDate> {
        self.records
            .iter()
            .map(|r| r.event_date(event))
            .filter(|d| *d >= today)
            .min()
    }

    /// Earliest date of any leg on or after `today`.
    pub fn next_recorded_any(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.records
            .iter()
            .flat_map(|r| [r.low.date, r.peak.date])
            .filter(|d| *d >= today)
            .min()
    }

    /// Fold a fresh detection run into this history.
    ///
    /// Complete records are kept as stored. Incomplete ones are replaced by the
    /// fresh record for the same shape and month. Unseen months are appended.
    pub fn merge(self, fresh: Vec<CycleRecord>) -> CycleHistory {
        let symbol = self.symbol;
        let mut records = self.records;

        for record in fresh {
            let existing = records
                .iter_mut()
                .find(|r| r.kind == record.kind && r.cycle_month == record.cycle_month);
            match existing {
                Some(stored) if stored.complete => {}
                Some(stored) => *stored = record,
                None => records.push(record),
            }
        }

        CycleHistory::from_records(symbol, records)
    }

    /// Replace everything with a full re-scan.
    pub fn rebuild(self, fresh: Vec<CycleRecord>) -> CycleHistory {
        CycleHistory::from_records(self.symbol, fresh)
    }
}
