//! Analytics REST API handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::LotOccupancyResponse;
use crate::interfaces::http::common::{error_response, ApiResponse};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/analytics/summary",
    tag = "Analytics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Per-lot occupancy and utilization", body = ApiResponse<Vec<LotOccupancyResponse>>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn admin_summary(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<LotOccupancyResponse>>>, (StatusCode, Json<ApiResponse<()>>)> {
    let summary = state
        .history
        .admin_summary(&user.caller())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        summary.into_iter().map(Into::into).collect(),
    )))
}
