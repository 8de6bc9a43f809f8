use crate::auth::middleware::AuthUser;
use crate::reaction::model::{
    CheckReactionResponse, LikesResponse, ReactionError, ReactionErrorResponse,
    ToggleReactionRequest, ToggleReactionResponse,
};
use crate::reaction::service::ReactionService;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

fn reaction_error_to_response(err: ReactionError) -> (StatusCode, Json<ReactionErrorResponse>) {
    let (status, error_message, code) = match err {
        ReactionError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "DB_ERROR",
            )
        }
        ReactionError::InvalidSubject(msg) => (StatusCode::BAD_REQUEST, msg, "INVALID_SUBJECT"),
        ReactionError::SubjectNotFound => (
            StatusCode::NOT_FOUND,
            "Object not found".to_string(),
            "NOT_FOUND",
        ),
        ReactionError::SubjectDeleted => (
            StatusCode::BAD_REQUEST,
            "Cannot react to deleted content".to_string(),
            "SUBJECT_DELETED",
        ),
        ReactionError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
    };

    (
        status,
        Json(ReactionErrorResponse {
            error: error_message,
            code: code.to_string(),
        }),
    )
}

/// Toggle a reaction on a post or comment
#[utoipa::path(
    post,
    path = "/api/like/{subject_type}/{id}",
    params(
        ("subject_type" = String, Path, description = "post or comment"),
        ("id" = i64, Path, description = "The subject id")
    ),
    request_body = ToggleReactionRequest,
    responses(
        (status = 200, description = "Reaction toggled", body = ToggleReactionResponse),
        (status = 400, description = "Invalid subject or reaction type", body = ReactionErrorResponse),
        (status = 404, description = "Subject not found", body = ReactionErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reactions"
)]
pub async fn toggle_reaction(
    Path((subject_type, subject_id)): Path<(String, i64)>,
    Extension(user): Extension<AuthUser>,
    Extension(reaction_service): Extension<Arc<ReactionService>>,
    Json(req): Json<ToggleReactionRequest>,
) -> impl IntoResponse {
    info!(
        "Toggle {} by user {} on {} {}",
        req.reaction_type, user.user_id, subject_type, subject_id
    );

    match reaction_service
        .toggle(user.user_id, &subject_type, subject_id, &req.reaction_type)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => reaction_error_to_response(e).into_response(),
    }
}

/// Get all reactions on a subject, grouped by kind
#[utoipa::path(
    get,
    path = "/api/likes/{subject_type}/{id}",
    params(
        ("subject_type" = String, Path, description = "post or comment"),
        ("id" = i64, Path, description = "The subject id")
    ),
    responses(
        (status = 200, description = "Reactions retrieved", body = LikesResponse),
        (status = 400, description = "Invalid subject type", body = ReactionErrorResponse),
        (status = 404, description = "Subject not found", body = ReactionErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reactions"
)]
pub async fn get_likes(
    Path((subject_type, subject_id)): Path<(String, i64)>,
    Extension(reaction_service): Extension<Arc<ReactionService>>,
) -> impl IntoResponse {
    match reaction_service.likes_for(&subject_type, subject_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => reaction_error_to_response(e).into_response(),
    }
}

/// Check the current user's reaction on a subject
#[utoipa::path(
    get,
    path = "/api/check/{subject_type}/{id}",
    params(
        ("subject_type" = String, Path, description = "post or comment"),
        ("id" = i64, Path, description = "The subject id")
    ),
    responses(
        (status = 200, description = "Current reaction state", body = CheckReactionResponse),
        (status = 400, description = "Invalid subject type", body = ReactionErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reactions"
)]
pub async fn check_reaction(
    Path((subject_type, subject_id)): Path<(String, i64)>,
    Extension(user): Extension<AuthUser>,
    Extension(reaction_service): Extension<Arc<ReactionService>>,
) -> impl IntoResponse {
    match reaction_service
        .check(user.user_id, &subject_type, subject_id)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => reaction_error_to_response(e).into_response(),
    }
}
