//! Same-day peak score endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use super::{load_series, resolve_today, ApiResponse, LimitQuery, TodayQuery};
use crate::error::Result;
use crate::services::score_same_day;
use crate::types::{PeakScore, PriceSeries, ScoreSnapshot};
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub score: PeakScore,
    pub label: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_score))
        .route("/:symbol/history", get(get_score_history))
}

/// Score today and store the result.
async fn get_score(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<ApiResponse<ScoreResponse>>> {
    let symbol = symbol.to_uppercase();
    let profile = state.profiles.get(&symbol)?;
    let today = resolve_today(query.today.as_deref())?;

    let series = load_series(&state, &symbol)?;
    let peers = profile
        .scoring
        .peers
        .iter()
        .map(|peer| load_series(&state, peer).map(|s| PriceSeries::clone(&s)))
        .collect::<Result<Vec<_>>>()?;

    let score = score_same_day(profile, &series, &peers, today, &state.config.score_thresholds)?;
    state.store.record_score(&score)?;
    debug!("{} scored {} on {}", symbol, score.score, today);

    Ok(Json(ApiResponse::new(ScoreResponse {
        label: score.band.label(),
        score,
    })))
}

async fn get_score_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<ScoreSnapshot>>>> {
    let symbol = symbol.to_uppercase();
    state.profiles.get(&symbol)?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(ApiResponse::new(state.store.score_history(&symbol, limit)?)))
}
