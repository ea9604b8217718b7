//! Countdown dashboard across every configured symbol.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;

use super::{resolve_today, ApiResponse, TodayQuery};
use crate::error::Result;
use crate::services::CountdownProjector;
use crate::types::{CycleRecord, EventType, Projection, SymbolClass};
use crate::AppState;

/// One symbol's row on the dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardRow {
    pub symbol: String,
    pub class: SymbolClass,
    pub low: Projection,
    pub peak: Projection,
    pub last_confirmed_peak: Option<CycleRecord>,
    /// Next low is the soonest among all symbols.
    pub soonest_low: bool,
    /// Next peak is the soonest among all symbols.
    pub soonest_peak: bool,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub rows: Vec<DashboardRow>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<ApiResponse<Dashboard>>> {
    let today = resolve_today(query.today.as_deref())?;
    Ok(Json(ApiResponse::new(build_dashboard(&state, today)?)))
}

/// Project both legs for every symbol and flag the soonest of each.
pub fn build_dashboard(state: &AppState, today: NaiveDate) -> Result<Dashboard> {
    let mut rows = Vec::new();
    for symbol in state.profiles.symbols() {
        let profile = state.profiles.get(&symbol)?;
        let history = state.store.load_cycle_history(&symbol)?;
        let projector = CountdownProjector::new(profile);

        rows.push(DashboardRow {
            class: profile.class,
            low: projector.project(EventType::Low, &history, today),
            peak: projector.project(EventType::Peak, &history, today),
            last_confirmed_peak: history.last_confirmed_peak().cloned(),
            soonest_low: false,
            soonest_peak: false,
            symbol,
        });
    }

    // Ties are all flagged.
    if let Some(min) = rows.iter().filter_map(|r| r.low.days_until).min() {
        for row in rows.iter_mut() {
            row.soonest_low = row.low.days_until == Some(min);
        }
    }
    if let Some(min) = rows.iter().filter_map(|r| r.peak.days_until).min() {
        for row in rows.iter_mut() {
            row.soonest_peak = row.peak.days_until == Some(min);
        }
    }

    Ok(Dashboard { today, rows })
}
