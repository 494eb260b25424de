//! Lot administration REST API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    CreateLotRequest, LotDetailResponse, LotResponse, SearchParams, SlotCreatedResponse,
    UpdateLotRequest,
};
use crate::application::services::{LotUpdate, NewLot};
use crate::interfaces::http::common::{error_response, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/lots",
    tag = "Lots",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All lots with their slots", body = ApiResponse<Vec<LotDetailResponse>>)
    )
)]
pub async fn list_lots(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<LotDetailResponse>>>, (StatusCode, Json<ApiResponse<()>>)> {
    let listings = state
        .lots
        .list_lots(&user.caller())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        listings.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/search",
    tag = "Lots",
    security(("bearer_auth" = [])),
    params(SearchParams),
    responses(
        (status = 200, description = "Matching lots", body = ApiResponse<Vec<LotResponse>>)
    )
)]
pub async fn search_lots(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<LotResponse>>>, (StatusCode, Json<ApiResponse<()>>)> {
    let lots = state
        .lots
        .search_lots(&user.caller(), &params.q)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{id}",
    tag = "Lots",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Lot with its slots", body = ApiResponse<LotDetailResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_lot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LotDetailResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let listing = state
        .lots
        .get_lot(&user.caller(), id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(listing.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots",
    tag = "Lots",
    security(("bearer_auth" = [])),
    request_body = CreateLotRequest,
    responses(
        (status = 201, description = "Created with its initial slots", body = ApiResponse<LotResponse>),
        (status = 403, description = "Admin role required"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_lot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<CreateLotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LotResponse>>), (StatusCode, Json<ApiResponse<()>>)> {
    let lot = state
        .lots
        .create_lot(
            &user.caller(),
            NewLot {
                name: req.name,
                address: req.address,
                pin_code: req.pin_code,
                hourly_price: req.hourly_price,
                capacity: req.capacity,
            },
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(lot.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lots/{id}",
    tag = "Lots",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lot ID")),
    request_body = UpdateLotRequest,
    responses(
        (status = 200, description = "Updated; a capacity change resizes the lot", body = ApiResponse<LotResponse>),
        (status = 400, description = "Capacity below occupied count"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not enough available slots to shrink")
    )
)]
pub async fn update_lot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateLotRequest>,
) -> Result<Json<ApiResponse<LotResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let lot = state
        .lots
        .update_lot(
            &user.caller(),
            id,
            LotUpdate {
                name: req.name,
                address: req.address,
                pin_code: req.pin_code,
                hourly_price: req.hourly_price,
                capacity: req.capacity,
            },
        )
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(lot.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lots/{id}",
    tag = "Lots",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Lot has occupied slots")
    )
)]
pub async fn delete_lot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ApiResponse<()>>)> {
    state
        .lots
        .delete_lot(&user.caller(), id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success("Lot deleted".to_string())))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots/{id}/slots",
    tag = "Lots",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lot ID")),
    responses(
        (status = 201, description = "Slot appended", body = ApiResponse<SlotCreatedResponse>),
        (status = 400, description = "Maximum slots reached"),
        (status = 404, description = "Not found")
    )
)]
pub async fn add_slot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<SlotCreatedResponse>>), (StatusCode, Json<ApiResponse<()>>)>
{
    let slot_number = state
        .lots
        .add_slot(&user.caller(), id)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SlotCreatedResponse { slot_number })),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lots/{id}/slots/{number}",
    tag = "Lots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Lot ID"),
        ("number" = i32, Path, description = "Slot number")
    ),
    responses(
        (status = 200, description = "Deleted and renumbered"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Slot is occupied")
    )
)]
pub async fn delete_slot(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, number)): Path<(i64, i32)>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ApiResponse<()>>)> {
    state
        .lots
        .delete_slot(&user.caller(), id, number)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success("Slot deleted".to_string())))
}
