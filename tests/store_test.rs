//! Persistence and refresh pipeline tests

mod common;

use common::{d, usfr_closes};
use cyclewatch::config::Config;
use cyclewatch::services::{ProfileRegistry, RefreshService, SeriesCache, SqliteStore};
use cyclewatch::sources::YahooFinanceClient;
use cyclewatch::{CycleKind, PricePoint, ScoreThresholds};
use std::sync::Arc;
use std::time::Duration;

fn config() -> Arc<Config> {
    Arc::new(Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        symbols: vec!["USFR".to_string()],
        history_range: "1y".to_string(),
        refresh_interval_secs: 3600,
        refresh_on_startup: false,
        detection_verbose: false,
        score_thresholds: ScoreThresholds::default(),
        series_cache_ttl_secs: 60,
    })
}

fn refresher(store: Arc<SqliteStore>) -> RefreshService {
    RefreshService::new(
        config(),
        store,
        Arc::new(ProfileRegistry::default_treasury()),
        Arc::new(SeriesCache::new(Duration::from_secs(60))),
        YahooFinanceClient::new().unwrap(),
    )
}

#[test]
fn test_history_survives_reopen() {
    let path = std::env::temp_dir().join(format!("cyclewatch-store-{}.sqlite", std::process::id()));
    let _ = std::fs::remove_file(&path);

    {
        let store = Arc::new(SqliteStore::new(&path).unwrap());
        let summary = refresher(store)
            .ingest("USFR", &usfr_closes(d(2024, 1, 2), d(2024, 6, 28)))
            .unwrap();
        assert_eq!(summary.history_len, 11);
        assert_eq!(summary.incomplete, 0);
    }

    let reopened = SqliteStore::new(&path).unwrap();
    let history = reopened.load_cycle_history("usfr").unwrap();
    assert_eq!(history.len(), 11);
    assert_eq!(
        history
            .records()
            .iter()
            .filter(|r| r.kind == CycleKind::FullCycle)
            .count(),
        5
    );
    assert_eq!(reopened.load_price_series("USFR").unwrap().last_date(), Some(d(2024, 6, 28)));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_incremental_ingest_completes_in_progress_cycle() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let service = refresher(store.clone());

    let first = service
        .ingest("USFR", &usfr_closes(d(2024, 1, 2), d(2024, 6, 20)))
        .unwrap();
    assert_eq!(first.incomplete, 1);

    let second = service
        .ingest("USFR", &usfr_closes(d(2024, 6, 21), d(2024, 6, 28)))
        .unwrap();
    assert_eq!(second.prices_stored, 6);
    assert_eq!(second.history_len, 11);
    assert_eq!(second.incomplete, 0);

    let last_peak = store.load_cycle_history("USFR").unwrap();
    assert_eq!(last_peak.last_confirmed_peak().unwrap().peak.date, d(2024, 6, 21));
}

#[test]
fn test_overlapping_closes_overwrite() {
    let store = SqliteStore::new_in_memory().unwrap();
    store
        .upsert_prices("SGOV", &[PricePoint::new(d(2024, 4, 1), 100.0)])
        .unwrap();
    store
        .upsert_prices(
            "sgov",
            &[
                PricePoint::new(d(2024, 4, 1), 100.5),
                PricePoint::new(d(2024, 4, 2), 100.6),
            ],
        )
        .unwrap();

    let series = store.load_price_series("SGOV").unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.price_on(d(2024, 4, 1)), Some(100.5));
    assert_eq!(store.price_symbols().unwrap(), vec!["SGOV"]);
}
