//! SQLite persistence for prices, cycle histories and score snapshots.
//!
//! - `prices`: one close per (symbol, date)
//! - `cycles`: one record per (symbol, kind, cycle month)
//! - `score_history`: one same-day score per (symbol, date)

use crate::error::{AppError, Result};
use crate::types::{
    CycleHistory, CycleKind, CycleMonth, CycleRecord, Extremum, PeakScore, PricePoint,
    PriceSeries, ScoreBand, ScoreComponents, ScoreSnapshot,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite store for price and cycle history.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw `cycles` row before validation.
struct CycleRow {
    symbol: String,
    kind: String,
    cycle_month: String,
    low_date: String,
    low_price: f64,
    peak_date: String,
    peak_price: f64,
    complete: bool,
    signal_strength: Option<f64>,
}

/// Raw `score_history` row before validation.
struct ScoreRow {
    symbol: String,
    date: String,
    price: f64,
    score: f64,
    band: String,
    components_json: String,
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.parse()
        .map_err(|_| AppError::Data(format!("invalid stored date '{}'", raw)))
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("SQLite connection lock poisoned".to_string()))
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cycles (
                symbol TEXT NOT NULL,
                kind TEXT NOT NULL,
                cycle_month TEXT NOT NULL,
                low_date TEXT NOT NULL,
                low_price REAL NOT NULL,
                peak_date TEXT NOT NULL,
                peak_price REAL NOT NULL,
                gain_pct REAL NOT NULL,
                complete INTEGER NOT NULL,
                signal_strength REAL,
                PRIMARY KEY (symbol, kind, cycle_month)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS score_history (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                price REAL NOT NULL,
                score REAL NOT NULL,
                band TEXT NOT NULL,
                components_json TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_score_history_date ON score_history(symbol, date DESC)",
            [],
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    // ========== Price Methods ==========

    /// Insert or overwrite closes for a symbol. Returns rows written.
    pub fn upsert_prices(&self, symbol: &str, points: &[PricePoint]) -> Result<usize> {
        let symbol = symbol.to_uppercase();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO prices (symbol, date, close) VALUES (?1, ?2, ?3)",
            )?;
            for point in points {
                stmt.execute(params![symbol, point.date.to_string(), point.price])?;
            }
        }
        tx.commit()?;
        debug!("Stored {} closes for {}", points.len(), symbol);
        Ok(points.len())
    }

    /// Load every stored close for a symbol as a validated series.
    pub fn load_price_series(&self, symbol: &str) -> Result<PriceSeries> {
        let symbol = symbol.to_uppercase();
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT date, close FROM prices WHERE symbol = ?1 ORDER BY date ASC")?;
        let rows = stmt
            .query_map(params![symbol], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let points = rows
            .iter()
            .map(|(date, close)| Ok(PricePoint::new(parse_date(date)?, *close)))
            .collect::<Result<Vec<_>>>()?;

        PriceSeries::new(symbol, points)
    }

    /// Symbols that have at least one stored close.
    pub fn price_symbols(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")?;
        let symbols = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(symbols)
    }

    // ========== Cycle History Methods ==========

    /// Load a symbol's cycle history (empty when nothing is stored).
    pub fn load_cycle_history(&self, symbol: &str) -> Result<CycleHistory> {
        let symbol = symbol.to_uppercase();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, kind, cycle_month, low_date, low_price, peak_date, peak_price,
                    complete, signal_strength
             FROM cycles WHERE symbol = ?1",
        )?;
        let rows = stmt
            .query_map(params![symbol], |row| {
                Ok(CycleRow {
                    symbol: row.get(0)?,
                    kind: row.get(1)?,
                    cycle_month: row.get(2)?,
                    low_date: row.get(3)?,
                    low_price: row.get(4)?,
                    peak_date: row.get(5)?,
                    peak_price: row.get(6)?,
                    complete: row.get::<_, i64>(7)? != 0,
                    signal_strength: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .map(Self::cycle_from_row)
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} cycle records for {}", records.len(), symbol);
        Ok(CycleHistory::from_records(symbol, records))
    }

    fn cycle_from_row(row: CycleRow) -> Result<CycleRecord> {
        let kind = CycleKind::parse(&row.kind)
            .ok_or_else(|| AppError::Data(format!("unknown cycle kind '{}'", row.kind)))?;
        let cycle_month: CycleMonth = row.cycle_month.parse()?;
        let low = Extremum::new(parse_date(&row.low_date)?, row.low_price);
        let peak = Extremum::new(parse_date(&row.peak_date)?, row.peak_price);

        match kind {
            CycleKind::FullCycle => CycleRecord::full_cycle(
                &row.symbol,
                cycle_month,
                low,
                peak,
                row.complete,
                row.signal_strength,
            ),
            CycleKind::PostPeakLow => CycleRecord::post_peak_low(
                &row.symbol,
                cycle_month,
                peak,
                low,
                row.complete,
                row.signal_strength,
            ),
        }
    }

    /// Replace a symbol's stored history in one transaction.
    pub fn save_cycle_history(&self, history: &CycleHistory) -> Result<()> {
        let symbol = history.symbol.to_uppercase();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM cycles WHERE symbol = ?1", params![symbol])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cycles (symbol, kind, cycle_month, low_date, low_price, peak_date,
                                     peak_price, gain_pct, complete, signal_strength)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for record in history.records() {
                stmt.execute(params![
                    symbol,
                    record.kind.as_str(),
                    record.cycle_month.to_string(),
                    record.low.date.to_string(),
                    record.low.price,
                    record.peak.date.to_string(),
                    record.peak.price,
                    record.gain_pct,
                    record.complete as i64,
                    record.signal_strength,
                ])?;
            }
        }
        tx.commit()?;

        info!("Saved {} cycle records for {}", history.len(), symbol);
        Ok(())
    }

    // ========== Score History Methods ==========

    /// Store a same-day score, replacing any earlier one for the same date.
    pub fn record_score(&self, score: &PeakScore) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO score_history (symbol, date, price, score, band, components_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                score.symbol.to_uppercase(),
                score.date.to_string(),
                score.price,
                score.score,
                score.band.as_str(),
                serde_json::to_string(&score.components)?,
            ],
        )?;
        debug!("Recorded score {} for {} on {}", score.score, score.symbol, score.date);
        Ok(())
    }

    /// Stored scores for a symbol, newest first.
    pub fn score_history(&self, symbol: &str, limit: usize) -> Result<Vec<ScoreSnapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, date, price, score, band, components_json
             FROM score_history
             WHERE symbol = ?1
             ORDER BY date DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![symbol.to_uppercase(), limit as i64], |row| {
                Ok(ScoreRow {
                    symbol: row.get(0)?,
                    date: row.get(1)?,
                    price: row.get(2)?,
                    score: row.get(3)?,
                    band: row.get(4)?,
                    components_json: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| {
                let band = ScoreBand::parse(&row.band)
                    .ok_or_else(|| AppError::Data(format!("unknown score band '{}'", row.band)))?;
                let components: ScoreComponents = serde_json::from_str(&row.components_json)?;
                Ok(ScoreSnapshot {
                    symbol: row.symbol,
                    date: parse_date(&row.date)?,
                    price: row.price,
                    score: row.score,
                    band,
                    components,
                })
            })
            .collect()
    }
}
