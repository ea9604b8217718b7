//! Cycle history endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::{ApiResponse, LimitQuery};
use crate::error::{AppError, Result};
use crate::types::CycleRecord;
use crate::AppState;

const DEFAULT_LIMIT: usize = 12;

/// Recent records of one symbol.
#[derive(Debug, Serialize)]
pub struct CyclesResponse {
    pub symbol: String,
    pub total: usize,
    pub records: Vec<CycleRecord>,
}

/// Outcome of a full re-scan.
#[derive(Debug, Serialize)]
pub struct RescanResponse {
    pub symbol: String,
    pub records: usize,
    pub incomplete: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_cycles))
        .route("/:symbol/last-peak", get(get_last_peak))
        .route("/:symbol/rescan", post(rescan))
}

async fn get_cycles(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<CyclesResponse>>> {
    let symbol = symbol.to_uppercase();
    state.profiles.get(&symbol)?;

    let history = state.store.load_cycle_history(&symbol)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    Ok(Json(ApiResponse::new(CyclesResponse {
        total: history.len(),
        records: history.recent(limit).to_vec(),
        symbol,
    })))
}

async fn get_last_peak(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<CycleRecord>>> {
    let symbol = symbol.to_uppercase();
    state.profiles.get(&symbol)?;

    let history = state.store.load_cycle_history(&symbol)?;
    let record = history
        .last_confirmed_peak()
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no confirmed peak for {}", symbol)))?;

    Ok(Json(ApiResponse::new(record)))
}

async fn rescan(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<RescanResponse>>> {
    let symbol = symbol.to_uppercase();
    let history = state.refresher.rescan(&symbol)?;
    info!("Rescanned {}: {} records", symbol, history.len());

    Ok(Json(ApiResponse::new(RescanResponse {
        records: history.len(),
        incomplete: history.records().iter().filter(|r| !r.complete).count(),
        symbol,
    })))
}
