use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserBrief;

/// Every event class that can produce a stored notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NotificationType {
    PostLike,
    PostComment,
    CommentLike,
    CommentReply,
    FriendRequest,
    FriendAccept,
}

impl NotificationType {
    pub fn from_str(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "post_like" => Ok(NotificationType::PostLike),
            "post_comment" => Ok(NotificationType::PostComment),
            "comment_like" => Ok(NotificationType::CommentLike),
            "comment_reply" => Ok(NotificationType::CommentReply),
            "friend_request" => Ok(NotificationType::FriendRequest),
            "friend_accept" => Ok(NotificationType::FriendAccept),
            _ => Err(format!("Invalid notification type: {}", value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::PostLike => "post_like",
            NotificationType::PostComment => "post_comment",
            NotificationType::CommentLike => "comment_like",
            NotificationType::CommentReply => "comment_reply",
            NotificationType::FriendRequest => "friend_request",
            NotificationType::FriendAccept => "friend_accept",
        }
    }

    /// Whether the recipient's in-app preferences allow this event class
    pub fn is_inapp_enabled(&self, prefs: &NotificationPreference) -> bool {
        match self {
            NotificationType::PostLike | NotificationType::CommentLike => prefs.inapp_post_likes,
            NotificationType::PostComment | NotificationType::CommentReply => {
                prefs.inapp_comments
            }
            NotificationType::FriendRequest | NotificationType::FriendAccept => {
                prefs.inapp_friend_requests
            }
        }
    }
}

/// What an event producer hands to the notification service
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub sender: Option<UserBrief>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<i64>,
    pub is_read: bool,
    pub is_seen: bool,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub total_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationCountsResponse {
    pub total_count: i64,
    pub unread_count: i64,
    pub unseen_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllResponse {
    pub status: String,
    pub updated_count: i64,
}

/// Database model for a user's notification preferences
#[derive(Debug, FromRow, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationPreference {
    #[schema(value_type = UuidWrapper)]
    pub user_id: Uuid,
    pub email_post_likes: bool,
    pub email_comments: bool,
    pub email_friend_requests: bool,
    pub email_mentions: bool,
    pub push_post_likes: bool,
    pub push_comments: bool,
    pub push_friend_requests: bool,
    pub push_mentions: bool,
    pub inapp_post_likes: bool,
    pub inapp_comments: bool,
    pub inapp_friend_requests: bool,
    pub inapp_mentions: bool,
}

/// Partial preference update; omitted flags keep their value
#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct UpdatePreferencesRequest {
    pub email_post_likes: Option<bool>,
    pub email_comments: Option<bool>,
    pub email_friend_requests: Option<bool>,
    pub email_mentions: Option<bool>,
    pub push_post_likes: Option<bool>,
    pub push_comments: Option<bool>,
    pub push_friend_requests: Option<bool>,
    pub push_mentions: Option<bool>,
    pub inapp_post_likes: Option<bool>,
    pub inapp_comments: Option<bool>,
    pub inapp_friend_requests: Option<bool>,
    pub inapp_mentions: Option<bool>,
}

/// Possible notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Notification not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationErrorResponse {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs_with(inapp_post_likes: bool, inapp_comments: bool, inapp_friend_requests: bool) -> NotificationPreference {
        NotificationPreference {
            user_id: Uuid::new_v4(),
            email_post_likes: true,
            email_comments: true,
            email_friend_requests: true,
            email_mentions: true,
            push_post_likes: true,
            push_comments: true,
            push_friend_requests: true,
            push_mentions: true,
            inapp_post_likes,
            inapp_comments,
            inapp_friend_requests,
            inapp_mentions: true,
        }
    }

    #[test]
    fn test_notification_type_round_trip() {
        for value in [
            "post_like",
            "post_comment",
            "comment_like",
            "comment_reply",
            "friend_request",
            "friend_accept",
        ] {
            let parsed = NotificationType::from_str(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!(NotificationType::from_str("birthday_party").is_err());
    }

    #[test]
    fn test_like_notifications_follow_likes_preference() {
        let enabled = prefs_with(true, false, false);
        assert!(NotificationType::PostLike.is_inapp_enabled(&enabled));
        assert!(NotificationType::CommentLike.is_inapp_enabled(&enabled));

        let disabled = prefs_with(false, true, true);
        assert!(!NotificationType::PostLike.is_inapp_enabled(&disabled));
        assert!(!NotificationType::CommentLike.is_inapp_enabled(&disabled));
    }

    #[test]
    fn test_comment_notifications_follow_comments_preference() {
        let disabled = prefs_with(true, false, true);
        assert!(!NotificationType::PostComment.is_inapp_enabled(&disabled));
        assert!(!NotificationType::CommentReply.is_inapp_enabled(&disabled));
    }

    #[test]
    fn test_friend_notifications_follow_friend_requests_preference() {
        let disabled = prefs_with(true, true, false);
        assert!(!NotificationType::FriendRequest.is_inapp_enabled(&disabled));
        assert!(!NotificationType::FriendAccept.is_inapp_enabled(&disabled));
    }
}
