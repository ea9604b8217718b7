pub mod cycles;
pub mod dashboard;
pub mod health;
pub mod profiles;
pub mod projections;
pub mod scores;
pub mod stats;

use crate::error::{AppError, Result};
use crate::types::PriceSeries;
use crate::AppState;
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub cached: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ApiMeta { cached: false },
        }
    }
}

/// `?today=YYYY-MM-DD` override for the evaluation date.
#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub today: Option<String>,
}

/// `?limit=N` for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Parse an ISO date supplied by a client.
pub fn parse_date_param(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// The requested evaluation date, defaulting to the local calendar date.
pub fn resolve_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) if !s.trim().is_empty() => parse_date_param(s),
        _ => Ok(chrono::Local::now().date_naive()),
    }
}

/// Load a symbol's stored series through the cache.
pub fn load_series(state: &AppState, symbol: &str) -> Result<Arc<PriceSeries>> {
    state
        .cache
        .get_or_load(symbol, |s| state.store.load_price_series(s))
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/profiles", profiles::router())
        .nest("/api/cycles", cycles::router())
        .nest("/api/projections", projections::router())
        .nest("/api/dashboard", dashboard::router())
        .nest("/api/scores", scores::router())
        .nest("/api/stats", stats::router())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_param() {
        assert_eq!(
            parse_date_param("2024-06-17").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 17).unwrap()
        );
        assert!(matches!(parse_date_param("06/17/24"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_resolve_today_defaults_to_local_date() {
        assert_eq!(resolve_today(None).unwrap(), chrono::Local::now().date_naive());
        assert_eq!(resolve_today(Some("")).unwrap(), chrono::Local::now().date_naive());
        assert_eq!(
            resolve_today(Some("2024-01-02")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_query_parsing() {
        let query: TodayQuery = serde_urlencoded::from_str("").unwrap();
        assert!(query.today.is_none());

        let query: LimitQuery = serde_urlencoded::from_str("limit=5").unwrap();
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_api_response_serialization() {
        let json = serde_json::to_value(ApiResponse::new(vec![1, 2])).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["cached"], false);
    }
}
