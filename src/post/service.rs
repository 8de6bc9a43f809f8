use crate::friendship::service::FriendshipService;
use crate::post::model::{
    can_view_post, validate_post_content, CreatePostRequest, Post, PostError, PostPrivacy,
    PostResponse, PostType, UpdatePostRequest,
};
use crate::user::model::UserBrief;
use chrono::Utc;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

const POSTS_PER_PAGE: i64 = 20;
const TIMELINE_LIMIT: i64 = 20;

// A post row with its author joined in
#[derive(Debug, FromRow)]
struct PostWithAuthor {
    pub id: i64,
    pub author_id: Uuid,
    pub content: String,
    pub content_html: String,
    pub post_type: String,
    pub privacy: String,
    pub location: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub author_username: String,
    pub author_online: bool,
}

impl From<PostWithAuthor> for PostResponse {
    fn from(row: PostWithAuthor) -> Self {
        Self {
            id: row.id,
            content: row.content,
            content_html: row.content_html,
            author: UserBrief {
                id: row.author_id,
                username: row.author_username,
                is_online: row.author_online,
            },
            post_type: row.post_type,
            privacy: row.privacy,
            location: row.location,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Posts visible to $1: own, public, or friends-only from an accepted friend
const VISIBLE_PREDICATE: &str = r#"
    p.is_deleted = false
    AND (p.author_id = $1
         OR p.privacy = 'public'
         OR (p.privacy = 'friends' AND EXISTS(
                SELECT 1 FROM global.friendships f
                WHERE ((f.requester_id = $1 AND f.addressee_id = p.author_id)
                    OR (f.requester_id = p.author_id AND f.addressee_id = $1))
                  AND f.status = 'accepted')))
"#;

#[derive(Clone)]
pub struct PostService {
    pool: PgPool,
    friendship_service: Arc<FriendshipService>,
}

impl PostService {
    pub fn new(pool: PgPool, friendship_service: Arc<FriendshipService>) -> Self {
        Self {
            pool,
            friendship_service,
        }
    }

    fn render_content(&self, content: &str) -> String {
        html_escape::encode_safe(content).to_string()
    }

    // Create a new post
    pub async fn create_post(
        &self,
        user_id: Uuid,
        post: CreatePostRequest,
    ) -> Result<PostResponse, PostError> {
        validate_post_content(&post.content)?;

        let post_type = match &post.post_type {
            Some(raw) => PostType::from_str(raw).map_err(PostError::ValidationError)?,
            None => PostType::Text,
        };
        let privacy = match &post.privacy {
            Some(raw) => PostPrivacy::from_str(raw).map_err(PostError::ValidationError)?,
            None => PostPrivacy::Friends,
        };

        let content_html = self.render_content(&post.content);

        let row = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            WITH inserted AS (
                INSERT INTO global.posts (
                    author_id, content, content_html, post_type, privacy, location,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                RETURNING *
            )
            SELECT i.id, i.author_id, i.content, i.content_html, i.post_type, i.privacy,
                   i.location, i.likes_count, i.comments_count, i.created_at, i.updated_at,
                   u.username AS author_username, u.is_online AS author_online
            FROM inserted i
            JOIN global.users u ON u.id = i.author_id
            "#,
        )
        .bind(user_id)
        .bind(&post.content)
        .bind(&content_html)
        .bind(post_type.as_str())
        .bind(privacy.as_str())
        .bind(post.location.unwrap_or_default())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert post: {}", e);
            PostError::DatabaseError(e)
        })?;

        info!("Created post {} by user {}", row.id, user_id);
        Ok(row.into())
    }

    // Fetch a single non-deleted post row
    async fn get_post_row(&self, post_id: i64) -> Result<Post, PostError> {
        sqlx::query_as::<_, Post>(
            "SELECT * FROM global.posts WHERE id = $1 AND is_deleted = false",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(PostError::DatabaseError)?
        .ok_or(PostError::NotFound)
    }

    /// Whether the viewer may see the post, consulting the friendship graph
    /// for friends-only posts
    pub async fn check_can_view(&self, viewer: Uuid, post: &Post) -> Result<bool, PostError> {
        let privacy = PostPrivacy::from_str(&post.privacy)
            .map_err(|e| PostError::InternalError(format!("Corrupt privacy value: {}", e)))?;

        let is_friend = if privacy == PostPrivacy::Friends && viewer != post.author_id {
            self.friendship_service
                .are_friends(viewer, post.author_id)
                .await
                .map_err(|e| PostError::InternalError(format!("Friendship lookup failed: {}", e)))?
        } else {
            false
        };

        Ok(can_view_post(viewer, post.author_id, privacy, is_friend))
    }

    // Get a post with its visibility check applied
    pub async fn get_post(&self, viewer: Uuid, post_id: i64) -> Result<PostResponse, PostError> {
        let post = self.get_post_row(post_id).await?;

        if !self.check_can_view(viewer, &post).await? {
            return Err(PostError::Forbidden);
        }

        let row = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.author_id, p.content, p.content_html, p.post_type, p.privacy,
                   p.location, p.likes_count, p.comments_count, p.created_at, p.updated_at,
                   u.username AS author_username, u.is_online AS author_online
            FROM global.posts p
            JOIN global.users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(PostError::DatabaseError)?;

        Ok(row.into())
    }

    // List posts visible to the viewer, newest first
    pub async fn list_posts(
        &self,
        viewer: Uuid,
        page: Option<i64>,
    ) -> Result<(Vec<PostResponse>, i64), PostError> {
        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1) * POSTS_PER_PAGE;

        let sql = format!(
            r#"
            SELECT p.id, p.author_id, p.content, p.content_html, p.post_type, p.privacy,
                   p.location, p.likes_count, p.comments_count, p.created_at, p.updated_at,
                   u.username AS author_username, u.is_online AS author_online
            FROM global.posts p
            JOIN global.users u ON u.id = p.author_id
            WHERE {}
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            VISIBLE_PREDICATE
        );

        let rows = sqlx::query_as::<_, PostWithAuthor>(&sql)
            .bind(viewer)
            .bind(POSTS_PER_PAGE)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(PostError::DatabaseError)?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM global.posts p WHERE {}",
            VISIBLE_PREDICATE
        );
        let total_count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(viewer)
            .fetch_one(&self.pool)
            .await
            .map_err(PostError::DatabaseError)?;

        Ok((rows.into_iter().map(Into::into).collect(), total_count))
    }

    // Timeline: the viewer's own posts plus friends' and public posts
    pub async fn timeline(&self, viewer: Uuid) -> Result<Vec<PostResponse>, PostError> {
        let sql = format!(
            r#"
            SELECT p.id, p.author_id, p.content, p.content_html, p.post_type, p.privacy,
                   p.location, p.likes_count, p.comments_count, p.created_at, p.updated_at,
                   u.username AS author_username, u.is_online AS author_online
            FROM global.posts p
            JOIN global.users u ON u.id = p.author_id
            WHERE {}
            ORDER BY p.created_at DESC
            LIMIT $2
            "#,
            VISIBLE_PREDICATE
        );

        let rows = sqlx::query_as::<_, PostWithAuthor>(&sql)
            .bind(viewer)
            .bind(TIMELINE_LIMIT)
            .fetch_all(&self.pool)
            .await
            .map_err(PostError::DatabaseError)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // The viewer's own non-deleted posts
    pub async fn my_posts(&self, user_id: Uuid) -> Result<Vec<PostResponse>, PostError> {
        let rows = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.author_id, p.content, p.content_html, p.post_type, p.privacy,
                   p.location, p.likes_count, p.comments_count, p.created_at, p.updated_at,
                   u.username AS author_username, u.is_online AS author_online
            FROM global.posts p
            JOIN global.users u ON u.id = p.author_id
            WHERE p.author_id = $1 AND p.is_deleted = false
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(PostError::DatabaseError)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // Update a post; only the author may edit
    pub async fn update_post(
        &self,
        user_id: Uuid,
        post_id: i64,
        update: UpdatePostRequest,
    ) -> Result<PostResponse, PostError> {
        let post = self.get_post_row(post_id).await?;

        if post.author_id != user_id {
            return Err(PostError::NotOwner);
        }

        let content = match update.content {
            Some(content) => {
                validate_post_content(&content)?;
                content
            }
            None => post.content,
        };
        let privacy = match &update.privacy {
            Some(raw) => PostPrivacy::from_str(raw)
                .map_err(PostError::ValidationError)?
                .as_str()
                .to_string(),
            None => post.privacy,
        };
        let location = update.location.unwrap_or(post.location);
        let content_html = self.render_content(&content);

        let row = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            WITH updated AS (
                UPDATE global.posts
                SET content = $1, content_html = $2, privacy = $3, location = $4, updated_at = $5
                WHERE id = $6
                RETURNING *
            )
            SELECT up.id, up.author_id, up.content, up.content_html, up.post_type, up.privacy,
                   up.location, up.likes_count, up.comments_count, up.created_at, up.updated_at,
                   u.username AS author_username, u.is_online AS author_online
            FROM updated up
            JOIN global.users u ON u.id = up.author_id
            "#,
        )
        .bind(&content)
        .bind(&content_html)
        .bind(&privacy)
        .bind(&location)
        .bind(Utc::now())
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(PostError::DatabaseError)?;

        info!("Post {} updated by user {}", post_id, user_id);
        Ok(row.into())
    }

    // Soft delete a post; only the author may delete
    pub async fn delete_post(&self, user_id: Uuid, post_id: i64) -> Result<(), PostError> {
        let post = self.get_post_row(post_id).await?;

        if post.author_id != user_id {
            return Err(PostError::NotOwner);
        }

        sqlx::query(
            "UPDATE global.posts SET is_deleted = true, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(PostError::DatabaseError)?;

        info!("Post {} soft-deleted by user {}", post_id, user_id);
        Ok(())
    }
}
