use crate::auth::middleware::auth_middleware;
use crate::post::controller;
use crate::post::service::PostService;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Create a router for post routes
pub fn routes(post_service: Arc<PostService>) -> Router {
    Router::new()
        // Order matters here - more specific routes first
        .route("/api/posts/timeline", get(controller::timeline))
        .route("/api/posts/my_posts", get(controller::my_posts))
        .route("/api/posts", get(controller::list_posts))
        .route("/api/posts", post(controller::create_post))
        .route("/api/posts/:id", get(controller::get_post))
        .route("/api/posts/:id", put(controller::update_post))
        .route("/api/posts/:id", delete(controller::delete_post))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(post_service))
}
