use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserBrief;

/// Database model for a comment
#[derive(Debug, FromRow, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub parent_id: Option<i64>,
    pub content: String,
    pub content_html: String,
    pub likes_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new comment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCommentRequest {
    /// The comment content
    #[schema(example = "This is a great post!")]
    pub content: String,

    /// ID of the parent comment if this is a reply
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Response format for a single comment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub content_html: String,
    pub author: UserBrief,
    pub parent_id: Option<i64>,
    pub likes_count: i64,
    /// Number of non-deleted direct replies
    pub reply_count: i64,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

/// Response for a list of comments
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentsListResponse {
    pub comments: Vec<CommentResponse>,

    /// Total number of non-deleted comments on the post
    pub total_count: i64,
}

/// Possible comment errors
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Comment not found")]
    NotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Parent comment not found")]
    ParentCommentNotFound,

    #[error("Parent comment must belong to the same post")]
    ParentMismatch,

    #[error("You do not have permission to view this post")]
    Forbidden,

    #[error("You can only modify your own comments")]
    NotOwner,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cache error: {0}")]
    CacheError(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response for the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentErrorResponse {
    /// Error message
    #[schema(example = "Comment not found")]
    pub error: String,

    /// Error code
    #[schema(example = "NOT_FOUND")]
    pub code: String,
}

pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Field-level validation for comment bodies
pub fn validate_comment_content(content: &str) -> Result<(), CommentError> {
    if content.trim().is_empty() {
        return Err(CommentError::ValidationError(
            "Comment content cannot be empty".to_string(),
        ));
    }

    if content.len() > MAX_COMMENT_LENGTH {
        return Err(CommentError::ValidationError(
            "Comment content exceeds maximum length".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_comment_content_accepts_normal_text() {
        assert!(validate_comment_content("Nice post!").is_ok());
    }

    #[test]
    fn test_validate_comment_content_rejects_empty() {
        assert!(validate_comment_content("").is_err());
        assert!(validate_comment_content(" \t\n ").is_err());
    }

    #[test]
    fn test_validate_comment_content_rejects_oversized() {
        assert!(validate_comment_content(&"x".repeat(MAX_COMMENT_LENGTH)).is_ok());
        assert!(validate_comment_content(&"x".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }
}
