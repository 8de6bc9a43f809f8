use crate::auth::middleware::auth_middleware;
use crate::friendship::controller;
use crate::friendship::service::FriendshipService;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Create a router for friendship routes. `:id` is a friendship id for
/// respond and a user id for the per-user actions.
pub fn routes(friendship_service: Arc<FriendshipService>) -> Router {
    Router::new()
        .route("/api/friends/send_request", post(controller::send_request))
        .route("/api/friends/friends", get(controller::friends))
        .route(
            "/api/friends/received_requests",
            get(controller::received_requests),
        )
        .route("/api/friends/sent_requests", get(controller::sent_requests))
        .route("/api/friends/suggestions", get(controller::suggestions))
        .route("/api/friends/:id/respond", post(controller::respond))
        .route(
            "/api/friends/:id/mutual_friends",
            get(controller::mutual_friends),
        )
        .route("/api/friends/:id/unfriend", delete(controller::unfriend))
        .route("/api/friends/:id/block", post(controller::block))
        .route("/api/friends/:id/unblock", delete(controller::unblock))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(friendship_service))
}
