use crate::auth::middleware::auth_middleware;
use crate::reaction::controller::{check_reaction, get_likes, toggle_reaction};
use crate::reaction::service::ReactionService;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create a router for reaction routes
pub fn routes(reaction_service: Arc<ReactionService>) -> Router {
    Router::new()
        .route("/api/like/:subject_type/:id", post(toggle_reaction))
        .route("/api/likes/:subject_type/:id", get(get_likes))
        .route("/api/check/:subject_type/:id", get(check_reaction))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(reaction_service))
}
