//! Rule profile listing.

use axum::{extract::State, routing::get, Json, Router};

use super::ApiResponse;
use crate::types::RuleProfile;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_profiles))
}

/// Every configured symbol's rule profile, sorted by symbol.
async fn list_profiles(State(state): State<AppState>) -> Json<ApiResponse<Vec<RuleProfile>>> {
    let mut profiles: Vec<RuleProfile> = state.profiles.profiles().cloned().collect();
    profiles.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Json(ApiResponse::new(profiles))
}
