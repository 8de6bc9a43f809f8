use crate::auth::middleware::AuthUser;
use crate::notification::model::{
    MarkAllResponse, NotificationCountsResponse, NotificationError, NotificationErrorResponse,
    NotificationListResponse, NotificationPreference, NotificationResponse,
    UpdatePreferencesRequest,
};
use crate::notification::service::NotificationService;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationsQueryParams {
    page: Option<i64>,
    /// Filter by notification type, e.g. "friend_request"
    #[serde(rename = "type")]
    type_filter: Option<String>,
    is_read: Option<bool>,
}

fn notification_error_to_response(
    err: NotificationError,
) -> (StatusCode, Json<NotificationErrorResponse>) {
    let (status, error_message, code) = match err {
        NotificationError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "DB_ERROR",
            )
        }
        NotificationError::NotFound => (
            StatusCode::NOT_FOUND,
            "Notification not found".to_string(),
            "NOT_FOUND",
        ),
        NotificationError::ValidationError(msg) => {
            (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR")
        }
    };

    (
        status,
        Json(NotificationErrorResponse {
            error: error_message,
            code: code.to_string(),
        }),
    )
}

/// List the current user's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationsQueryParams),
    responses(
        (status = 200, description = "Notifications retrieved", body = NotificationListResponse),
        (status = 401, description = "Unauthorized", body = NotificationErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
    Query(params): Query<NotificationsQueryParams>,
) -> impl IntoResponse {
    match notification_service
        .list_notifications(user.user_id, params.page, params.type_filter, params.is_read)
        .await
    {
        Ok((notifications, total_count)) => (
            StatusCode::OK,
            Json(NotificationListResponse {
                notifications,
                total_count,
            }),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Notification badge counts
#[utoipa::path(
    get,
    path = "/api/notifications/counts",
    responses(
        (status = 200, description = "Counts retrieved", body = NotificationCountsResponse),
        (status = 401, description = "Unauthorized", body = NotificationErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn notification_counts(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service.counts(user.user_id).await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Get a single notification
#[utoipa::path(
    get,
    path = "/api/notifications/{id}",
    params(("id" = i64, Path, description = "The notification id")),
    responses(
        (status = 200, description = "Notification retrieved", body = NotificationResponse),
        (status = 404, description = "Notification not found", body = NotificationErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn get_notification(
    Path(notification_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service
        .get_notification(notification_id, user.user_id)
        .await
    {
        Ok(notification) => (StatusCode::OK, Json(notification)).into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct FlagResponse {
    pub status: String,
}

/// Mark a notification as read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "The notification id")),
    responses(
        (status = 200, description = "Marked as read", body = FlagResponse),
        (status = 404, description = "Notification not found", body = NotificationErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    Path(notification_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service
        .mark_as_read(notification_id, user.user_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(FlagResponse {
                status: "notification marked as read".to_string(),
            }),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Mark a notification as seen
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/seen",
    params(("id" = i64, Path, description = "The notification id")),
    responses(
        (status = 200, description = "Marked as seen", body = FlagResponse),
        (status = 404, description = "Notification not found", body = NotificationErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_seen(
    Path(notification_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service
        .mark_as_seen(notification_id, user.user_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(FlagResponse {
                status: "notification marked as seen".to_string(),
            }),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Mark all notifications as read
#[utoipa::path(
    post,
    path = "/api/notifications/mark-all-read",
    responses(
        (status = 200, description = "All marked as read", body = MarkAllResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service.mark_all_read(user.user_id).await {
        Ok(updated_count) => (
            StatusCode::OK,
            Json(MarkAllResponse {
                status: "all notifications marked as read".to_string(),
                updated_count,
            }),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Mark all notifications as seen
#[utoipa::path(
    post,
    path = "/api/notifications/mark-all-seen",
    responses(
        (status = 200, description = "All marked as seen", body = MarkAllResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_seen(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service.mark_all_seen(user.user_id).await {
        Ok(updated_count) => (
            StatusCode::OK,
            Json(MarkAllResponse {
                status: "all notifications marked as seen".to_string(),
                updated_count,
            }),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Get notification preferences
#[utoipa::path(
    get,
    path = "/api/notifications/preferences",
    responses(
        (status = 200, description = "Preferences retrieved", body = NotificationPreference)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn get_preferences(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service
        .get_or_create_preferences(user.user_id)
        .await
    {
        Ok(prefs) => (StatusCode::OK, Json(prefs)).into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Update notification preferences
#[utoipa::path(
    patch,
    path = "/api/notifications/preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences updated", body = NotificationPreference)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn update_preferences(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
    Json(update): Json<UpdatePreferencesRequest>,
) -> impl IntoResponse {
    match notification_service
        .update_preferences(user.user_id, update)
        .await
    {
        Ok(prefs) => (StatusCode::OK, Json(prefs)).into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}
