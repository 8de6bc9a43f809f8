use crate::auth::middleware::AuthUser;
use crate::post::model::{
    CreatePostRequest, PostError, PostErrorResponse, PostResponse, PostsListResponse,
    UpdatePostRequest,
};
use crate::post::service::PostService;
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

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostsQueryParams {
    page: Option<i64>,
}

fn post_error_to_response(err: PostError) -> (StatusCode, Json<PostErrorResponse>) {
    let (status, error_message, code) = match err {
        PostError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "DB_ERROR",
            )
        }
        PostError::NotFound => (
            StatusCode::NOT_FOUND,
            "Post not found".to_string(),
            "NOT_FOUND",
        ),
        PostError::Forbidden => (
            StatusCode::FORBIDDEN,
            "You do not have permission to view this post".to_string(),
            "FORBIDDEN",
        ),
        PostError::NotOwner => (
            StatusCode::FORBIDDEN,
            "You can only modify your own posts".to_string(),
            "NOT_OWNER",
        ),
        PostError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
        PostError::InternalError(msg) => {
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
        Json(PostErrorResponse {
            error: error_message,
            code: code.to_string(),
        }),
    )
}

/// Create a new post
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid input", body = PostErrorResponse),
        (status = 401, description = "Unauthorized", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
    Json(post): Json<CreatePostRequest>,
) -> impl IntoResponse {
    info!("Creating post for user: {}", user.user_id);

    match post_service.create_post(user.user_id, post).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}

/// List posts visible to the current user
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostsQueryParams),
    responses(
        (status = 200, description = "Posts retrieved", body = PostsListResponse),
        (status = 401, description = "Unauthorized", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
    Query(params): Query<PostsQueryParams>,
) -> impl IntoResponse {
    match post_service.list_posts(user.user_id, params.page).await {
        Ok((posts, total_count)) => (
            StatusCode::OK,
            Json(PostsListResponse { posts, total_count }),
        )
            .into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}

/// Get a single post
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "The post id")),
    responses(
        (status = 200, description = "Post retrieved", body = PostResponse),
        (status = 403, description = "Not allowed to view this post", body = PostErrorResponse),
        (status = 404, description = "Post not found", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_post(
    Path(post_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
) -> impl IntoResponse {
    match post_service.get_post(user.user_id, post_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}

/// The timeline: own, friends' and public posts
#[utoipa::path(
    get,
    path = "/api/posts/timeline",
    responses(
        (status = 200, description = "Timeline retrieved", body = [PostResponse]),
        (status = 401, description = "Unauthorized", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn timeline(
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
) -> impl IntoResponse {
    match post_service.timeline(user.user_id).await {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}

/// The current user's own posts
#[utoipa::path(
    get,
    path = "/api/posts/my_posts",
    responses(
        (status = 200, description = "Posts retrieved", body = [PostResponse]),
        (status = 401, description = "Unauthorized", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn my_posts(
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
) -> impl IntoResponse {
    match post_service.my_posts(user.user_id).await {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}

/// Update a post
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "The post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 403, description = "Not the author", body = PostErrorResponse),
        (status = 404, description = "Post not found", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_post(
    Path(post_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
    Json(update): Json<UpdatePostRequest>,
) -> impl IntoResponse {
    match post_service.update_post(user.user_id, post_id, update).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}

/// Soft delete a post
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "The post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author", body = PostErrorResponse),
        (status = 404, description = "Post not found", body = PostErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    Path(post_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(post_service): Extension<Arc<PostService>>,
) -> impl IntoResponse {
    info!("Deleting post: {}, requested by user: {}", post_id, user.user_id);

    match post_service.delete_post(user.user_id, post_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => post_error_to_response(e).into_response(),
    }
}
