use crate::auth::middleware::auth_middleware;
use crate::comment::controller::{
    create_comment, delete_comment, get_post_comments, get_replies, update_comment,
};
use crate::comment::service::CommentService;
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

/// Create a router for comment routes
pub fn routes(comment_service: Arc<CommentService>) -> Router {
    Router::new()
        .route("/api/posts/:id/comments", get(get_post_comments))
        .route("/api/posts/:id/comments", post(create_comment))
        .route("/api/comments/:id/replies", get(get_replies))
        .route("/api/comments/:id", patch(update_comment))
        .route("/api/comments/:id", delete(delete_comment))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(comment_service))
}
