use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SystemStatusDto};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatusDto>>, ApiError> {
    let database_ok = state.store().ping().await.is_ok();

    let algorithm_count = state.store().count_algorithms().await.unwrap_or(0);
    let project_count = state.store().count_projects().await.unwrap_or(0);

    Ok(Json(ApiResponse::success(SystemStatusDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database_ok,
        algorithm_count,
        project_count,
    })))
}
