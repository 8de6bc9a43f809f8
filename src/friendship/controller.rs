use crate::auth::middleware::AuthUser;
use crate::friendship::model::{
    FriendListResponse, FriendRequestListResponse, FriendshipError, FriendshipErrorResponse,
    FriendshipResponse, RespondAction, RespondToRequestRequest, SendFriendRequestRequest,
    SuggestionsResponse,
};
use crate::friendship::service::FriendshipService;
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
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionsQueryParams {
    limit: Option<i64>,
}

fn friendship_error_to_response(
    err: FriendshipError,
) -> (StatusCode, Json<FriendshipErrorResponse>) {
    let (status, error_message, code) = match err {
        FriendshipError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "DB_ERROR",
            )
        }
        FriendshipError::UserNotFound => (
            StatusCode::NOT_FOUND,
            "User not found".to_string(),
            "USER_NOT_FOUND",
        ),
        FriendshipError::RequestNotFound => (
            StatusCode::NOT_FOUND,
            "Friend request not found".to_string(),
            "REQUEST_NOT_FOUND",
        ),
        FriendshipError::AlreadyExists => (
            StatusCode::CONFLICT,
            "A friendship or request already exists between these users".to_string(),
            "ALREADY_EXISTS",
        ),
        FriendshipError::SelfRequest => (
            StatusCode::BAD_REQUEST,
            "You cannot send a friend request to yourself".to_string(),
            "SELF_REQUEST",
        ),
        FriendshipError::SelfBlock => (
            StatusCode::BAD_REQUEST,
            "You cannot block yourself".to_string(),
            "SELF_BLOCK",
        ),
        FriendshipError::NotFriends => (
            StatusCode::NOT_FOUND,
            "You are not friends with this user".to_string(),
            "NOT_FRIENDS",
        ),
        FriendshipError::NotBlocked => (
            StatusCode::NOT_FOUND,
            "User is not blocked".to_string(),
            "NOT_BLOCKED",
        ),
        FriendshipError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
    };

    (
        status,
        Json(FriendshipErrorResponse {
            error: error_message,
            code: code.to_string(),
        }),
    )
}

/// Send a friend request
#[utoipa::path(
    post,
    path = "/api/friends/send_request",
    request_body = SendFriendRequestRequest,
    responses(
        (status = 201, description = "Friend request sent", body = FriendshipResponse),
        (status = 400, description = "Invalid request", body = FriendshipErrorResponse),
        (status = 404, description = "User not found", body = FriendshipErrorResponse),
        (status = 409, description = "Edge already exists", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn send_request(
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
    Json(req): Json<SendFriendRequestRequest>,
) -> impl IntoResponse {
    info!(
        "Friend request from {} to {}",
        user.user_id, req.user_id
    );

    let friendship = match friendship_service
        .send_request(user.user_id, req.user_id)
        .await
    {
        Ok(friendship) => friendship,
        Err(e) => return friendship_error_to_response(e).into_response(),
    };

    match friendship_service.to_response(&friendship).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Respond to a pending friend request
#[utoipa::path(
    post,
    path = "/api/friends/{id}/respond",
    params(("id" = i64, Path, description = "The friendship id to respond to")),
    request_body = RespondToRequestRequest,
    responses(
        (status = 200, description = "Request answered", body = FriendshipResponse),
        (status = 400, description = "Invalid action", body = FriendshipErrorResponse),
        (status = 404, description = "No pending request for this user", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn respond(
    Path(friendship_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
    Json(req): Json<RespondToRequestRequest>,
) -> impl IntoResponse {
    let action = match RespondAction::from_str(&req.action) {
        Ok(action) => action,
        Err(msg) => {
            return friendship_error_to_response(FriendshipError::ValidationError(msg))
                .into_response()
        }
    };

    let friendship = match friendship_service
        .respond(friendship_id, user.user_id, action)
        .await
    {
        Ok(friendship) => friendship,
        Err(e) => return friendship_error_to_response(e).into_response(),
    };

    match friendship_service.to_response(&friendship).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Get the current user's friends
#[utoipa::path(
    get,
    path = "/api/friends/friends",
    responses(
        (status = 200, description = "Friends retrieved", body = FriendListResponse),
        (status = 401, description = "Unauthorized", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn friends(
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service.friends_of(user.user_id).await {
        Ok(friends) => {
            let total_count = friends.len() as i64;
            (
                StatusCode::OK,
                Json(FriendListResponse {
                    friends,
                    total_count,
                }),
            )
                .into_response()
        }
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Pending requests received by the current user
#[utoipa::path(
    get,
    path = "/api/friends/received_requests",
    responses(
        (status = 200, description = "Requests retrieved", body = FriendRequestListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn received_requests(
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service.received_requests(user.user_id).await {
        Ok(requests) => {
            (StatusCode::OK, Json(FriendRequestListResponse { requests })).into_response()
        }
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Pending requests sent by the current user
#[utoipa::path(
    get,
    path = "/api/friends/sent_requests",
    responses(
        (status = 200, description = "Requests retrieved", body = FriendRequestListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn sent_requests(
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service.sent_requests(user.user_id).await {
        Ok(requests) => {
            (StatusCode::OK, Json(FriendRequestListResponse { requests })).into_response()
        }
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Mutual friends with another user
#[utoipa::path(
    get,
    path = "/api/friends/{id}/mutual_friends",
    params(("id" = String, Path, description = "The other user")),
    responses(
        (status = 200, description = "Mutual friends retrieved", body = FriendListResponse),
        (status = 404, description = "User not found", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn mutual_friends(
    Path(other_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service
        .mutual_friends(user.user_id, other_id)
        .await
    {
        Ok(friends) => {
            let total_count = friends.len() as i64;
            (
                StatusCode::OK,
                Json(FriendListResponse {
                    friends,
                    total_count,
                }),
            )
                .into_response()
        }
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Friend suggestions for the current user
#[utoipa::path(
    get,
    path = "/api/friends/suggestions",
    params(SuggestionsQueryParams),
    responses(
        (status = 200, description = "Suggestions retrieved", body = SuggestionsResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn suggestions(
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
    Query(params): Query<SuggestionsQueryParams>,
) -> impl IntoResponse {
    match friendship_service
        .suggestions(user.user_id, params.limit)
        .await
    {
        Ok(suggestions) => {
            (StatusCode::OK, Json(SuggestionsResponse { suggestions })).into_response()
        }
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct FriendActionResponse {
    pub message: String,
}

/// Remove a friend
#[utoipa::path(
    delete,
    path = "/api/friends/{id}/unfriend",
    params(("id" = String, Path, description = "The friend to remove")),
    responses(
        (status = 200, description = "Friend removed", body = FriendActionResponse),
        (status = 404, description = "Not friends with this user", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn unfriend(
    Path(other_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service.unfriend(user.user_id, other_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(FriendActionResponse {
                message: "You are no longer friends with this user".to_string(),
            }),
        )
            .into_response(),
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Block a user
#[utoipa::path(
    post,
    path = "/api/friends/{id}/block",
    params(("id" = String, Path, description = "The user to block")),
    responses(
        (status = 200, description = "User blocked", body = FriendActionResponse),
        (status = 400, description = "Cannot block yourself", body = FriendshipErrorResponse),
        (status = 404, description = "User not found", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn block(
    Path(target_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service.block(user.user_id, target_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(FriendActionResponse {
                message: "User has been blocked".to_string(),
            }),
        )
            .into_response(),
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}

/// Unblock a user
#[utoipa::path(
    delete,
    path = "/api/friends/{id}/unblock",
    params(("id" = String, Path, description = "The user to unblock")),
    responses(
        (status = 200, description = "User unblocked", body = FriendActionResponse),
        (status = 404, description = "User is not blocked", body = FriendshipErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn unblock(
    Path(target_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(friendship_service): Extension<Arc<FriendshipService>>,
) -> impl IntoResponse {
    match friendship_service.unblock(user.user_id, target_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(FriendActionResponse {
                message: "User has been unblocked".to_string(),
            }),
        )
            .into_response(),
        Err(e) => friendship_error_to_response(e).into_response(),
    }
}
