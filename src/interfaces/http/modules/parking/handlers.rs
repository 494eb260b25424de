//! Occupancy REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{OccupyRequest, OccupyResponse, ReleaseResponse};
use crate::interfaces::http::common::{error_response, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/lots/{id}/slots/{number}/occupy",
    tag = "Parking",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Lot ID"),
        ("number" = i32, Path, description = "Slot number")
    ),
    request_body = OccupyRequest,
    responses(
        (status = 200, description = "Slot occupied, reservation opened", body = ApiResponse<OccupyResponse>),
        (status = 404, description = "Lot or slot not found"),
        (status = 409, description = "Slot already occupied")
    )
)]
pub async fn occupy_slot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((lot_id, number)): Path<(i64, i32)>,
    ValidatedJson(req): ValidatedJson<OccupyRequest>,
) -> Result<Json<ApiResponse<OccupyResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let ticket = state
        .occupancy
        .occupy(&user.caller(), lot_id, number, &req.vehicle_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(ticket.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots/{id}/slots/{number}/release",
    tag = "Parking",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Lot ID"),
        ("number" = i32, Path, description = "Slot number")
    ),
    responses(
        (status = 200, description = "Slot released, usage billed", body = ApiResponse<ReleaseResponse>),
        (status = 403, description = "Caller is not the occupant"),
        (status = 404, description = "Lot, slot or open reservation not found"),
        (status = 409, description = "Slot is not occupied")
    )
)]
pub async fn release_slot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((lot_id, number)): Path<(i64, i32)>,
) -> Result<Json<ApiResponse<ReleaseResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let receipt = state
        .occupancy
        .release(&user.caller(), lot_id, number)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(receipt.into())))
}
