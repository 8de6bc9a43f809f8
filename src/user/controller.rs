use crate::auth::middleware::AuthUser;
use crate::user::model::{
    ProfileResponse, UpdateProfileRequest, UserError, UserErrorResponse, UserListResponse,
};
use crate::user::service::UserService;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQueryParams {
    page: Option<i64>,
}

fn user_error_to_response(err: UserError) -> (StatusCode, Json<UserErrorResponse>) {
    let (status, error_message, code) = match err {
        UserError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "DB_ERROR",
            )
        }
        UserError::NotFound => (
            StatusCode::NOT_FOUND,
            "User not found".to_string(),
            "NOT_FOUND",
        ),
        UserError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
    };

    (
        status,
        Json(UserErrorResponse {
            error: error_message,
            code: code.to_string(),
        }),
    )
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile retrieved", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = UserErrorResponse),
        (status = 404, description = "User not found", body = UserErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_profile(
    Extension(user): Extension<AuthUser>,
    Extension(user_service): Extension<Arc<UserService>>,
) -> impl IntoResponse {
    match user_service.get_profile(user.user_id).await {
        Ok(profile) => (StatusCode::OK, Json(ProfileResponse::from(profile))).into_response(),
        Err(e) => user_error_to_response(e).into_response(),
    }
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid input", body = UserErrorResponse),
        (status = 401, description = "Unauthorized", body = UserErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_profile(
    Extension(user): Extension<AuthUser>,
    Extension(user_service): Extension<Arc<UserService>>,
    Json(update): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    info!("Profile update requested by user {}", user.user_id);

    match user_service.update_profile(user.user_id, update).await {
        Ok(profile) => (StatusCode::OK, Json(ProfileResponse::from(profile))).into_response(),
        Err(e) => user_error_to_response(e).into_response(),
    }
}

/// List active users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UsersQueryParams),
    responses(
        (status = 200, description = "Users retrieved", body = UserListResponse),
        (status = 401, description = "Unauthorized", body = UserErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    Extension(user_service): Extension<Arc<UserService>>,
    Query(params): Query<UsersQueryParams>,
) -> impl IntoResponse {
    match user_service.list_users(params.page).await {
        Ok((users, total_count)) => (
            StatusCode::OK,
            Json(UserListResponse { users, total_count }),
        )
            .into_response(),
        Err(e) => user_error_to_response(e).into_response(),
    }
}
