//! History REST API handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{HistoryEntryResponse, SummaryResponse};
use crate::interfaces::http::common::{error_response, ApiResponse};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "History",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open sessions and completed episodes, newest first", body = ApiResponse<Vec<HistoryEntryResponse>>)
    )
)]
pub async fn get_history(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<HistoryEntryResponse>>>, (StatusCode, Json<ApiResponse<()>>)> {
    let rows = state
        .history
        .history_for(&user.caller())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/summary",
    tag = "History",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Aggregated usage of the caller", body = ApiResponse<SummaryResponse>)
    )
)]
pub async fn get_summary(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<SummaryResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let summary = state
        .history
        .summary_for(&user.caller())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(summary.into())))
}
