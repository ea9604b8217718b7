//! Price refresh and cycle re-detection pipeline.
//!
//! Per symbol: fetch closes, store them, reload the series, detect, merge
//! into the stored history and save. Symbols run as independent tasks.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::cycles::{CycleDetector, ProfileRegistry};
use crate::services::{SeriesCache, SqliteStore};
use crate::sources::YahooFinanceClient;
use crate::types::{CycleHistory, PricePoint};
use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// Outcome of one symbol's refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub symbol: String,
    pub prices_stored: usize,
    pub sessions: usize,
    pub records_detected: usize,
    pub history_len: usize,
    pub incomplete: usize,
}

/// Keeps stored prices and cycle histories current.
pub struct RefreshService {
    config: Arc<Config>,
    store: Arc<SqliteStore>,
    profiles: Arc<ProfileRegistry>,
    cache: Arc<SeriesCache>,
    client: YahooFinanceClient,
    /// Serializes load, merge and save of one symbol's history.
    detect_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RefreshService {
    pub fn new(
        config: Arc<Config>,
        store: Arc<SqliteStore>,
        profiles: Arc<ProfileRegistry>,
        cache: Arc<SeriesCache>,
        client: YahooFinanceClient,
    ) -> Self {
        Self {
            config,
            store,
            profiles,
            cache,
            client,
            detect_locks: DashMap::new(),
        }
    }

    /// Fetch fresh closes for one symbol and fold them in.
    pub async fn refresh_symbol(&self, symbol: &str) -> Result<RefreshSummary> {
        self.profiles.get(symbol)?;
        let points = self
            .client
            .get_daily_closes(symbol, &self.config.history_range)
            .await?;
        if points.is_empty() {
            return Err(AppError::ExternalApi(format!("no closes returned for {}", symbol)));
        }
        self.ingest(symbol, &points)
    }

    /// Store closes, re-detect and merge into the stored history.
    pub fn ingest(&self, symbol: &str, points: &[PricePoint]) -> Result<RefreshSummary> {
        self.profiles.get(symbol)?;
        let prices_stored = self.store.upsert_prices(symbol, points)?;
        let (history, sessions, detected) = self.detect(symbol, false)?;
        Ok(self.summary(symbol, prices_stored, sessions, detected, &history))
    }

    /// Full re-scan of stored prices, replacing the stored history.
    pub fn rescan(&self, symbol: &str) -> Result<CycleHistory> {
        let (history, _, _) = self.detect(symbol, true)?;
        Ok(history)
    }

    fn symbol_lock(&self, symbol: &str) -> Arc<Mutex<()>> {
        self.detect_locks
            .entry(symbol.to_uppercase())
            .or_default()
            .clone()
    }

    fn detect(&self, symbol: &str, rebuild: bool) -> Result<(CycleHistory, usize, usize)> {
        let profile = self.profiles.get(symbol)?;

        let lock = self.symbol_lock(symbol);
        let _guard = lock
            .lock()
            .map_err(|_| AppError::Internal(format!("detection lock poisoned for {}", symbol)))?;

        self.cache.invalidate(symbol);
        let series = self.store.load_price_series(symbol)?;
        let records = CycleDetector::new(profile)
            .with_verbose(self.config.detection_verbose)
            .detect(&series);
        let detected = records.len();
        let sessions = series.len();
        self.cache.insert(series);

        let stored = self.store.load_cycle_history(symbol)?;
        let history = if rebuild {
            stored.rebuild(records)
        } else {
            stored.merge(records)
        };
        self.store.save_cycle_history(&history)?;

        Ok((history, sessions, detected))
    }

    fn summary(
        &self,
        symbol: &str,
        prices_stored: usize,
        sessions: usize,
        records_detected: usize,
        history: &CycleHistory,
    ) -> RefreshSummary {
        RefreshSummary {
            symbol: symbol.to_uppercase(),
            prices_stored,
            sessions,
            records_detected,
            history_len: history.len(),
            incomplete: history.records().iter().filter(|r| !r.complete).count(),
        }
    }

    /// Refresh every configured symbol concurrently.
    pub async fn refresh_all(self: Arc<Self>) -> Vec<(String, Result<RefreshSummary>)> {
        let symbols = self.profiles.symbols();
        info!("Refreshing {} symbols", symbols.len());

        let handles: Vec<_> = symbols
            .into_iter()
            .map(|symbol| {
                let service = self.clone();
                tokio::spawn(async move {
                    let result = service.refresh_symbol(&symbol).await;
                    (symbol, result)
                })
            })
            .collect();

        let mut results = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok((symbol, Ok(summary))) => {
                    info!(
                        "Refreshed {}: {} sessions, {} records ({} incomplete)",
                        symbol, summary.sessions, summary.history_len, summary.incomplete
                    );
                    results.push((symbol, Ok(summary)));
                }
                Ok((symbol, Err(e))) => {
                    warn!("Refresh failed for {}: {}", symbol, e);
                    results.push((symbol, Err(e)));
                }
                Err(e) => error!("Refresh task panicked: {}", e),
            }
        }
        results
    }

    /// Time between refresh passes, never under a minute.
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.config.refresh_interval_secs.max(60))
    }

    /// Delay before the first pass: none when refreshing on startup,
    /// otherwise one full interval.
    pub fn first_pass_delay(&self, run_immediately: bool) -> Duration {
        if run_immediately {
            Duration::ZERO
        } else {
            self.polling_interval()
        }
    }

    /// Refresh on every interval, starting now or after one interval.
    pub fn start_polling(self: Arc<Self>, run_immediately: bool) {
        let interval = self.polling_interval();
        let first_delay = self.first_pass_delay(run_immediately);
        tokio::spawn(async move {
            info!(
                "Starting refresh polling every {:?} (first pass in {:?})",
                interval, first_delay
            );
            tokio::time::sleep(first_delay).await;
            loop {
                self.clone().refresh_all().await;
                tokio::time::sleep(interval).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CycleKind, ScoreThresholds};
    use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_path: ":memory:".to_string(),
            symbols: vec!["SGOV".to_string()],
            history_range: "1y".to_string(),
            refresh_interval_secs: 3600,
            refresh_on_startup: false,
            detection_verbose: true,
            score_thresholds: ScoreThresholds::default(),
            series_cache_ttl_secs: 60,
        })
    }

    fn service() -> RefreshService {
        RefreshService::new(
            test_config(),
            Arc::new(SqliteStore::new_in_memory().unwrap()),
            Arc::new(ProfileRegistry::default_treasury()),
            Arc::new(SeriesCache::new(Duration::from_secs(60))),
            YahooFinanceClient::new().unwrap(),
        )
    }

    /// Weekday closes that dip in the first week and climb into month end.
    fn peer_closes(start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        let mut points = Vec::new();
        let mut date = start;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let day = date.day() as f64;
                let price = if day <= 3.0 { 100.0 - day * 0.01 } else { 100.0 + day * 0.01 };
                points.push(PricePoint::new(date, price));
            }
            date += ChronoDuration::days(1);
        }
        points
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ingest_detects_and_persists() {
        let service = service();
        let summary = service
            .ingest("SGOV", &peer_closes(d(2024, 1, 1), d(2024, 3, 29)))
            .unwrap();

        assert_eq!(summary.symbol, "SGOV");
        assert!(summary.records_detected >= 3);

        let stored = service.store.load_cycle_history("SGOV").unwrap();
        let full: Vec<_> = stored
            .records()
            .iter()
            .filter(|r| r.kind == CycleKind::FullCycle)
            .collect();
        assert_eq!(full.len(), 3);
        assert!(full.iter().all(|r| r.gain_pct > 0.07));
        assert!(service.cache.get("SGOV").is_some());
    }

    #[test]
    fn test_ingest_completes_in_progress_month() {
        let service = service();
        service
            .ingest("SGOV", &peer_closes(d(2024, 4, 1), d(2024, 4, 18)))
            .unwrap();
        let before = service.store.load_cycle_history("SGOV").unwrap();
        assert!(before.records().iter().all(|r| !r.complete));

        service
            .ingest("SGOV", &peer_closes(d(2024, 4, 19), d(2024, 5, 2)))
            .unwrap();
        let after = service.store.load_cycle_history("SGOV").unwrap();
        let april = after
            .records()
            .iter()
            .find(|r| r.kind == CycleKind::FullCycle && r.cycle_month.to_string() == "2024-04")
            .unwrap();
        assert!(april.complete);
        assert_eq!(april.peak.date, d(2024, 4, 30));
    }

    #[test]
    fn test_rescan_rebuilds_from_prices() {
        let service = service();
        service
            .ingest("SGOV", &peer_closes(d(2024, 1, 1), d(2024, 2, 29)))
            .unwrap();
        let history = service.rescan("SGOV").unwrap();
        assert_eq!(history, service.store.load_cycle_history("SGOV").unwrap());
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let service = service();
        let result = service.ingest("SPY", &peer_closes(d(2024, 1, 1), d(2024, 1, 31)));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_symbol_lock_shared_across_case() {
        let service = service();
        let upper = service.symbol_lock("SGOV");
        let lower = service.symbol_lock("sgov");
        assert!(Arc::ptr_eq(&upper, &lower));
        assert!(!Arc::ptr_eq(&upper, &service.symbol_lock("BIL")));
    }

    #[test]
    fn test_concurrent_ingest_and_rescan_keep_history_consistent() {
        let service = service();
        service
            .ingest("SGOV", &peer_closes(d(2024, 1, 1), d(2024, 2, 29)))
            .unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    service
                        .ingest("SGOV", &peer_closes(d(2024, 3, 1), d(2024, 3, 29)))
                        .unwrap();
                });
                scope.spawn(|| {
                    service.rescan("SGOV").unwrap();
                });
            }
        });

        let stored = service.store.load_cycle_history("SGOV").unwrap();
        let rebuilt = service.rescan("SGOV").unwrap();
        assert_eq!(stored, rebuilt);
        assert_eq!(
            stored
                .records()
                .iter()
                .filter(|r| r.kind == CycleKind::FullCycle)
                .count(),
            3
        );
    }

    #[test]
    fn test_polling_interval_floor() {
        assert_eq!(service().polling_interval(), Duration::from_secs(3600));

        let fast = RefreshService::new(
            Arc::new(Config {
                refresh_interval_secs: 5,
                ..(*test_config()).clone()
            }),
            Arc::new(SqliteStore::new_in_memory().unwrap()),
            Arc::new(ProfileRegistry::default_treasury()),
            Arc::new(SeriesCache::new(Duration::from_secs(60))),
            YahooFinanceClient::new().unwrap(),
        );
        assert_eq!(fast.polling_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_first_pass_delay_follows_startup_flag() {
        let service = service();
        assert_eq!(service.first_pass_delay(true), Duration::ZERO);
        assert_eq!(service.first_pass_delay(false), Duration::from_secs(3600));
    }
}
