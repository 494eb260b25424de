//! User management REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{UpdateProfileRequest, UserResponse};
use crate::application::services::ProfileUpdate;
use crate::interfaces::http::common::{error_response, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All registered accounts", body = ApiResponse<Vec<UserResponse>>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, (StatusCode, Json<ApiResponse<()>>)> {
    let users = state
        .users
        .list_users(&user.caller())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/ban",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User banned"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Cannot ban an admin")
    )
)]
pub async fn ban_user(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ApiResponse<()>>)> {
    state
        .users
        .ban(&user.caller(), &id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success("Banned".to_string())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/unban",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User unbanned"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn unban_user(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ApiResponse<()>>)> {
    state
        .users
        .unban(&user.caller(), &id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success("Active".to_string())))
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = ApiResponse<UserResponse>)
    )
)]
pub async fn get_profile(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UserResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let profile = state
        .users
        .profile(&user.caller())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(profile.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_profile(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let profile = state
        .users
        .update_profile(
            &user.caller(),
            ProfileUpdate {
                username: req.username,
                email: req.email,
                address: req.address,
                pin_code: req.pin_code,
            },
        )
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(profile.into())))
}
