use crate::auth::middleware::auth_middleware;
use crate::user::controller::{get_profile, list_users, update_profile};
use crate::user::service::UserService;
use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

/// Create a router for user profile routes
pub fn routes(user_service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/profile", get(get_profile))
        .route("/api/users/profile", patch(update_profile))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(user_service))
}
