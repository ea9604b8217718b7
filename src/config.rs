use crate::types::ScoreThresholds;
use std::env;

/// Default tracked symbols: the anchor fund followed by its peers.
pub const DEFAULT_SYMBOLS: &str = "USFR,SGOV,BIL,SHV,TFLO,ICSH";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Path of the SQLite database holding prices, cycles and scores.
    pub database_path: String,
    /// Symbols to track. Each must have a rule profile.
    pub symbols: Vec<String>,
    /// Yahoo chart range requested on refresh ("1y", "5y", "max", ...).
    pub history_range: String,
    /// Seconds between refresh passes.
    pub refresh_interval_secs: u64,
    /// Run a refresh pass as soon as the server starts.
    pub refresh_on_startup: bool,
    /// Log the reason every skipped month was rejected during detection.
    pub detection_verbose: bool,
    /// Band thresholds for the same-day peak score.
    pub score_thresholds: ScoreThresholds,
    /// Lifetime of cached price series (seconds).
    pub series_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = ScoreThresholds::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3002),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "cyclewatch.sqlite".to_string()),
            symbols: parse_symbols(
                &env::var("SYMBOLS").unwrap_or_else(|_| DEFAULT_SYMBOLS.to_string()),
            ),
            history_range: env::var("HISTORY_RANGE").unwrap_or_else(|_| "5y".to_string()),
            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6 * 60 * 60),
            refresh_on_startup: env::var("REFRESH_ON_STARTUP")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            detection_verbose: env::var("DETECTION_VERBOSE")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            score_thresholds: ScoreThresholds {
                likely: env::var("SCORE_LIKELY_THRESHOLD")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.likely),
                watch: env::var("SCORE_WATCH_THRESHOLD")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.watch),
            },
            series_cache_ttl_secs: env::var("SERIES_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse a comma separated symbol list, uppercased, blanks and repeats dropped.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
