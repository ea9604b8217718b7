//! Trading-day statistics endpoint.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::{load_series, ApiResponse};
use crate::error::Result;
use crate::services::{trading_day_stats, TradingDayStat};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub symbol: String,
    pub sessions: usize,
    pub days: Vec<TradingDayStat>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol", get(get_stats))
}

async fn get_stats(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<StatsResponse>>> {
    let symbol = symbol.to_uppercase();
    state.profiles.get(&symbol)?;

    let series = load_series(&state, &symbol)?;
    Ok(Json(ApiResponse::new(StatsResponse {
        sessions: series.len(),
        days: trading_day_stats(&series),
        symbol,
    })))
}
