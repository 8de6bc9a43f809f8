use crate::auth::middleware::auth_middleware;
use crate::notification::controller;
use crate::notification::service::NotificationService;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Create a router for notification routes
pub fn routes(notification_service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(controller::list_notifications))
        .route(
            "/api/notifications/counts",
            get(controller::notification_counts),
        )
        .route(
            "/api/notifications/mark-all-read",
            post(controller::mark_all_read),
        )
        .route(
            "/api/notifications/mark-all-seen",
            post(controller::mark_all_seen),
        )
        .route(
            "/api/notifications/preferences",
            get(controller::get_preferences),
        )
        .route(
            "/api/notifications/preferences",
            patch(controller::update_preferences),
        )
        .route("/api/notifications/:id", get(controller::get_notification))
        .route("/api/notifications/:id/read", post(controller::mark_read))
        .route("/api/notifications/:id/seen", post(controller::mark_seen))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(notification_service))
}
