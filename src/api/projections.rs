//! Next-event projection endpoint.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{parse_date_param, resolve_today, ApiResponse};
use crate::error::{AppError, Result};
use crate::services::{ex_date_alignment, project_next};
use crate::types::{EventType, ExDateAlignment, Projection};
use crate::AppState;

/// Query parameters for the projection endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectionQuery {
    pub today: Option<String>,
    /// Comma separated distribution ex-dates.
    pub ex_dates: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    pub projection: Projection,
    pub description: String,
    /// Only for peak projections with ex-dates supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<ExDateAlignment>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol/:event", get(get_projection))
}

/// Parse a comma separated ex-date list. Blank entries are ignored.
pub fn parse_ex_dates(raw: &str) -> Result<Vec<NaiveDate>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_date_param)
        .collect()
}

async fn get_projection(
    State(state): State<AppState>,
    Path((symbol, event)): Path<(String, String)>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<ApiResponse<ProjectionResponse>>> {
    let symbol = symbol.to_uppercase();
    let event = EventType::parse(&event)
        .ok_or_else(|| AppError::BadRequest(format!("unknown event '{}', expected low or peak", event)))?;
    let today = resolve_today(query.today.as_deref())?;
    let ex_dates = match query.ex_dates.as_deref() {
        Some(raw) => parse_ex_dates(raw)?,
        None => Vec::new(),
    };

    let history = state.store.load_cycle_history(&symbol)?;
    let projection = project_next(&symbol, event, &history, today, &state.profiles)?;

    let alignment = match (event, projection.next_date) {
        (EventType::Peak, Some(peak)) if !ex_dates.is_empty() => {
            Some(ex_date_alignment(peak, &ex_dates))
        }
        _ => None,
    };

    Ok(Json(ApiResponse::new(ProjectionResponse {
        description: projection.describe(),
        projection,
        alignment,
    })))
}
