//! Report export REST API handlers
//!
//! The request path only queues work and returns the task for polling;
//! generation happens in the background worker.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{ExportRequest, ExportTaskResponse};
use crate::interfaces::http::common::{error_response, ApiResponse};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/reports/export",
    tag = "Reports",
    security(("bearer_auth" = [])),
    request_body = ExportRequest,
    responses(
        (status = 202, description = "Export queued", body = ApiResponse<ExportTaskResponse>),
        (status = 403, description = "Scope not permitted for this caller")
    )
)]
pub async fn request_export(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<ExportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExportTaskResponse>>), (StatusCode, Json<ApiResponse<()>>)>
{
    let scope = if req.all_users {
        None
    } else {
        Some(req.user_id.unwrap_or_else(|| user.user_id.clone()))
    };

    let task = state
        .reports
        .request_export(&user.caller(), scope)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(task.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/export/{id}",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Export task ID")),
    responses(
        (status = 200, description = "Task status", body = ApiResponse<ExportTaskResponse>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn export_status(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ExportTaskResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let task = state
        .reports
        .task_status(&user.caller(), id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(task.into())))
}
