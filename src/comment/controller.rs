use crate::auth::middleware::AuthUser;
use crate::comment::model::{
    CommentError, CommentErrorResponse, CommentResponse, CommentsListResponse,
    CreateCommentRequest, UpdateCommentRequest,
};
use crate::comment::service::CommentService;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

// Query parameters for pagination
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentsQueryParams {
    #[schema(example = "1")]
    page: Option<i64>,
}

// Helper function to convert CommentError to HTTP response
fn comment_error_to_response(err: CommentError) -> (StatusCode, Json<CommentErrorResponse>) {
    let (status, error_message, code) = match err {
        CommentError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "DB_ERROR",
            )
        }
        CommentError::CacheError(e) => {
            error!("Cache error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cache error".to_string(),
                "CACHE_ERROR",
            )
        }
        CommentError::NotFound => (
            StatusCode::NOT_FOUND,
            "Comment not found".to_string(),
            "NOT_FOUND",
        ),
        CommentError::PostNotFound => (
            StatusCode::NOT_FOUND,
            "Post not found".to_string(),
            "POST_NOT_FOUND",
        ),
        CommentError::ParentCommentNotFound => (
            StatusCode::NOT_FOUND,
            "Parent comment not found".to_string(),
            "PARENT_NOT_FOUND",
        ),
        CommentError::ParentMismatch => (
            StatusCode::BAD_REQUEST,
            "Parent comment must belong to the same post".to_string(),
            "PARENT_MISMATCH",
        ),
        CommentError::Forbidden => (
            StatusCode::FORBIDDEN,
            "You do not have permission to view this post".to_string(),
            "FORBIDDEN",
        ),
        CommentError::NotOwner => (
            StatusCode::FORBIDDEN,
            "You can only modify your own comments".to_string(),
            "NOT_OWNER",
        ),
        CommentError::RateLimitExceeded => (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded, please try again later".to_string(),
            "RATE_LIMITED",
        ),
        CommentError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
        CommentError::InternalError(msg) => {
            error!("Internal error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "INTERNAL_ERROR",
            )
        }
    };

    (
        status,
        Json(CommentErrorResponse {
            error: error_message,
            code: code.to_string(),
        }),
    )
}

/// Create a new comment for a post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the post to comment on")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = CommentResponse),
        (status = 400, description = "Invalid input", body = CommentErrorResponse),
        (status = 403, description = "Not allowed to comment on this post", body = CommentErrorResponse),
        (status = 404, description = "Post not found", body = CommentErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = CommentErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_comment(
    Path(post_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Json(comment_data): Json<CreateCommentRequest>,
) -> impl IntoResponse {
    info!(
        "Creating comment for post: {}, user: {}",
        post_id, user.user_id
    );

    match comment_service
        .create_comment(post_id, user.user_id, comment_data)
        .await
    {
        Ok(comment) => {
            info!("Successfully created comment with ID: {}", comment.id);
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => comment_error_to_response(e).into_response(),
    }
}

/// Get top-level comments for a post
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the post to get comments for"),
        ("page" = Option<i64>, Query, description = "Page number for pagination", example = "1")
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = CommentsListResponse),
        (status = 403, description = "Not allowed to view this post", body = CommentErrorResponse),
        (status = 404, description = "Post not found", body = CommentErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_post_comments(
    Path(post_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Query(params): Query<CommentsQueryParams>,
) -> Result<(StatusCode, Json<CommentsListResponse>), (StatusCode, Json<CommentErrorResponse>)> {
    info!("Getting comments for post: {}", post_id);

    match comment_service
        .get_post_comments(post_id, user.user_id, params.page)
        .await
    {
        Ok(comments) => {
            let total_count = match comment_service.get_comment_count(post_id).await {
                Ok(count) => count,
                Err(e) => {
                    error!("Error getting comment count: {:?}", e);
                    0
                }
            };

            let response = CommentsListResponse {
                comments,
                total_count,
            };

            Ok((StatusCode::OK, Json(response)))
        }
        Err(err) => {
            error!("Error getting comments: {:?}", err);
            Err(comment_error_to_response(err))
        }
    }
}

/// Get replies to a comment
#[utoipa::path(
    get,
    path = "/api/comments/{id}/replies",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the comment to get replies for")
    ),
    responses(
        (status = 200, description = "Replies retrieved successfully", body = [CommentResponse]),
        (status = 404, description = "Comment not found", body = CommentErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_replies(
    Path(comment_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(comment_service): Extension<Arc<CommentService>>,
) -> impl IntoResponse {
    match comment_service.get_replies(comment_id, user.user_id).await {
        Ok(replies) => (StatusCode::OK, Json(replies)).into_response(),
        Err(e) => comment_error_to_response(e).into_response(),
    }
}

/// Edit a comment
#[utoipa::path(
    patch,
    path = "/api/comments/{id}",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the comment to edit")
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Invalid input", body = CommentErrorResponse),
        (status = 403, description = "Not the author", body = CommentErrorResponse),
        (status = 404, description = "Comment not found", body = CommentErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_comment(
    Path(comment_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Json(update): Json<UpdateCommentRequest>,
) -> impl IntoResponse {
    info!(
        "Updating comment: {}, requested by user: {}",
        comment_id, user.user_id
    );

    match comment_service
        .update_comment(comment_id, user.user_id, update)
        .await
    {
        Ok(comment) => (StatusCode::OK, Json(comment)).into_response(),
        Err(e) => comment_error_to_response(e).into_response(),
    }
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the comment to delete")
    ),
    responses(
        (status = 204, description = "Comment deleted successfully"),
        (status = 403, description = "Not the author", body = CommentErrorResponse),
        (status = 404, description = "Comment not found", body = CommentErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_comment(
    Path(comment_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(comment_service): Extension<Arc<CommentService>>,
) -> impl IntoResponse {
    info!(
        "Deleting comment: {}, requested by user: {}",
        comment_id, user.user_id
    );

    match comment_service.delete_comment(comment_id, user.user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => comment_error_to_response(e).into_response(),
    }
}
