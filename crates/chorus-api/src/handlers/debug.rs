//! Debug handlers

use axum::{extract::State, Json};
use chorus_service::dto::StatsResponse;
use chorus_service::StatusService;

use crate::response::ApiResult;
use crate::state::AppState;

/// Row counts and recent broadcasts
///
/// GET /debug/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = StatusService::new(state.service_context()).stats().await?;
    Ok(Json(stats))
}
