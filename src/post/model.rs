use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserBrief;

/// Who may see a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PostPrivacy {
    Public,
    Friends,
    Private,
}

impl PostPrivacy {
    pub fn from_str(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "public" => Ok(PostPrivacy::Public),
            "friends" => Ok(PostPrivacy::Friends),
            "private" => Ok(PostPrivacy::Private),
            _ => Err(format!("Invalid privacy setting: {}", value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PostPrivacy::Public => "public",
            PostPrivacy::Friends => "friends",
            PostPrivacy::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PostType {
    Text,
    Image,
    Video,
    Link,
}

impl PostType {
    pub fn from_str(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "text" => Ok(PostType::Text),
            "image" => Ok(PostType::Image),
            "video" => Ok(PostType::Video),
            "link" => Ok(PostType::Link),
            _ => Err(format!("Invalid post type: {}", value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
            PostType::Video => "video",
            PostType::Link => "link",
        }
    }
}

/// The visibility classifier. The author always sees their own post;
/// `friends` requires an accepted edge between viewer and author.
pub fn can_view_post(viewer: Uuid, author: Uuid, privacy: PostPrivacy, is_friend: bool) -> bool {
    if viewer == author {
        return true;
    }

    match privacy {
        PostPrivacy::Public => true,
        PostPrivacy::Private => false,
        PostPrivacy::Friends => is_friend,
    }
}

/// Database model for a post
#[derive(Debug, FromRow, Clone)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub content: String,
    pub content_html: String,
    pub post_type: String,
    pub privacy: String,
    pub location: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreatePostRequest {
    /// The post body
    #[schema(example = "Hello world!")]
    pub content: String,

    /// One of text, image, video, link; defaults to text
    pub post_type: Option<String>,

    /// One of public, friends, private; defaults to friends
    pub privacy: Option<String>,

    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub privacy: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub id: i64,
    pub content: String,
    pub content_html: String,
    pub author: UserBrief,
    pub post_type: String,
    pub privacy: String,
    pub location: String,
    pub likes_count: i64,
    pub comments_count: i64,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostsListResponse {
    pub posts: Vec<PostResponse>,
    pub total_count: i64,
}

/// Possible post errors
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Post not found")]
    NotFound,

    #[error("You do not have permission to view this post")]
    Forbidden,

    #[error("You can only modify your own posts")]
    NotOwner,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostErrorResponse {
    pub error: String,
    pub code: String,
}

pub const MAX_POST_LENGTH: usize = 5000;

/// Field-level validation for post bodies
pub fn validate_post_content(content: &str) -> Result<(), PostError> {
    if content.trim().is_empty() {
        return Err(PostError::ValidationError(
            "Post content cannot be empty".to_string(),
        ));
    }

    if content.len() > MAX_POST_LENGTH {
        return Err(PostError::ValidationError(
            "Post content exceeds maximum length".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_round_trip() {
        for value in ["public", "friends", "private"] {
            let parsed = PostPrivacy::from_str(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!(PostPrivacy::from_str("unlisted").is_err());
    }

    #[test]
    fn test_author_always_sees_own_post() {
        let author = Uuid::new_v4();

        for privacy in [PostPrivacy::Public, PostPrivacy::Friends, PostPrivacy::Private] {
            assert!(can_view_post(author, author, privacy, false));
        }
    }

    #[test]
    fn test_public_post_visible_to_anyone() {
        let viewer = Uuid::new_v4();
        let author = Uuid::new_v4();

        assert!(can_view_post(viewer, author, PostPrivacy::Public, false));
        assert!(can_view_post(viewer, author, PostPrivacy::Public, true));
    }

    #[test]
    fn test_private_post_hidden_from_everyone_else() {
        let viewer = Uuid::new_v4();
        let author = Uuid::new_v4();

        assert!(!can_view_post(viewer, author, PostPrivacy::Private, false));
        assert!(!can_view_post(viewer, author, PostPrivacy::Private, true));
    }

    #[test]
    fn test_friends_post_gated_on_friendship() {
        let viewer = Uuid::new_v4();
        let author = Uuid::new_v4();

        assert!(can_view_post(viewer, author, PostPrivacy::Friends, true));
        assert!(!can_view_post(viewer, author, PostPrivacy::Friends, false));
    }

    #[test]
    fn test_validate_post_content() {
        assert!(validate_post_content("hello").is_ok());
        assert!(validate_post_content("").is_err());
        assert!(validate_post_content("   ").is_err());
        assert!(validate_post_content(&"x".repeat(MAX_POST_LENGTH + 1)).is_err());
    }
}
