use crate::cache::redis::{RedisCache, COMMENT_COUNT_KEY_PREFIX, COMMENT_RATE_LIMIT_KEY_PREFIX};
use crate::comment::model::{
    validate_comment_content, Comment, CommentError, CommentResponse, CreateCommentRequest,
    UpdateCommentRequest,
};
use crate::friendship::service::FriendshipService;
use crate::notification::model::{NotificationPayload, NotificationType};
use crate::notification::service::NotificationService;
use crate::post::model::{can_view_post, PostPrivacy};
use crate::user::model::UserBrief;
use chrono::Utc;
use redis::AsyncCommands;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

// Constants
const COMMENTS_PER_PAGE: i64 = 20;
const COMMENT_RATE_LIMIT_SECONDS: u64 = 30;
const COMMENT_COUNT_TTL_SECONDS: u64 = 3600;

// A comment row with its author and reply count joined in
#[derive(Debug, FromRow)]
struct CommentWithAuthor {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub parent_id: Option<i64>,
    pub content: String,
    pub content_html: String,
    pub likes_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub author_username: String,
    pub author_online: bool,
    pub reply_count: i64,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            content_html: row.content_html,
            author: UserBrief {
                id: row.author_id,
                username: row.author_username,
                is_online: row.author_online,
            },
            parent_id: row.parent_id,
            likes_count: row.likes_count,
            reply_count: row.reply_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COMMENT_WITH_AUTHOR_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.parent_id, c.content, c.content_html,
           c.likes_count, c.created_at, c.updated_at,
           u.username AS author_username, u.is_online AS author_online,
           (SELECT COUNT(*) FROM global.comments r
             WHERE r.parent_id = c.id AND r.is_deleted = false) AS reply_count
    FROM global.comments c
    JOIN global.users u ON u.id = c.author_id
"#;

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    redis_cache: Option<RedisCache>,
    friendship_service: Arc<FriendshipService>,
    notification_service: Arc<NotificationService>,
}

impl CommentService {
    pub fn new(
        pool: PgPool,
        redis_cache: Option<RedisCache>,
        friendship_service: Arc<FriendshipService>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            redis_cache,
            friendship_service,
            notification_service,
        }
    }

    fn render_content(&self, content: &str) -> String {
        html_escape::encode_safe(content).to_string()
    }

    // Check if user can add a comment (rate limiting)
    async fn check_rate_limit(&self, user_id: &Uuid) -> Result<bool, CommentError> {
        if let Some(cache) = &self.redis_cache {
            let rate_limit_key = format!("{}:{}", COMMENT_RATE_LIMIT_KEY_PREFIX, user_id);

            let exists: bool = cache
                .get_client()
                .get_multiplexed_async_connection()
                .await
                .map_err(CommentError::CacheError)?
                .exists(&rate_limit_key)
                .await
                .map_err(CommentError::CacheError)?;

            if exists {
                return Ok(true);
            }

            let _: () = cache
                .get_client()
                .get_multiplexed_async_connection()
                .await
                .map_err(CommentError::CacheError)?
                .set_ex(&rate_limit_key, "1", COMMENT_RATE_LIMIT_SECONDS)
                .await
                .map_err(CommentError::CacheError)?;
        }

        Ok(false)
    }

    // The post a comment targets, with what the visibility check needs
    async fn load_post(
        &self,
        post_id: i64,
    ) -> Result<(Uuid, PostPrivacy), CommentError> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT author_id, privacy FROM global.posts WHERE id = $1 AND is_deleted = false",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CommentError::DatabaseError)?
        .ok_or(CommentError::PostNotFound)?;

        let privacy = PostPrivacy::from_str(&row.1)
            .map_err(|e| CommentError::InternalError(format!("Corrupt privacy value: {}", e)))?;

        Ok((row.0, privacy))
    }

    async fn check_post_access(
        &self,
        viewer: Uuid,
        post_author: Uuid,
        privacy: PostPrivacy,
    ) -> Result<(), CommentError> {
        let is_friend = if privacy == PostPrivacy::Friends && viewer != post_author {
            self.friendship_service
                .are_friends(viewer, post_author)
                .await
                .map_err(|e| {
                    CommentError::InternalError(format!("Friendship lookup failed: {}", e))
                })?
        } else {
            false
        };

        if !can_view_post(viewer, post_author, privacy, is_friend) {
            return Err(CommentError::Forbidden);
        }

        Ok(())
    }

    // Create a new comment
    pub async fn create_comment(
        &self,
        post_id: i64,
        user_id: Uuid,
        comment_data: CreateCommentRequest,
    ) -> Result<CommentResponse, CommentError> {
        validate_comment_content(&comment_data.content)?;

        // Check rate limit
        if self.check_rate_limit(&user_id).await? {
            return Err(CommentError::RateLimitExceeded);
        }

        let (post_author, privacy) = self.load_post(post_id).await?;
        self.check_post_access(user_id, post_author, privacy).await?;

        // A reply must target a live comment on the same post
        let parent_author_id = if let Some(parent_id) = comment_data.parent_id {
            let parent = sqlx::query_as::<_, (i64, Uuid, bool)>(
                "SELECT post_id, author_id, is_deleted FROM global.comments WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CommentError::DatabaseError)?;

            match parent {
                Some((_, _, true)) | None => return Err(CommentError::ParentCommentNotFound),
                Some((parent_post_id, _, _)) if parent_post_id != post_id => {
                    return Err(CommentError::ParentMismatch)
                }
                Some((_, author_id, _)) => Some(author_id),
            }
        } else {
            None
        };

        let content_html = self.render_content(&comment_data.content);

        // The insert and the counter recount commit together
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            CommentError::DatabaseError(e)
        })?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO global.comments (
                post_id, author_id, parent_id, content, content_html, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(comment_data.parent_id)
        .bind(&comment_data.content)
        .bind(&content_html)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert comment: {}", e);
            CommentError::DatabaseError(e)
        })?;

        let comments_count = self.recount_post_comments(&mut tx, post_id).await?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            CommentError::DatabaseError(e)
        })?;

        self.refresh_cached_count(post_id, comments_count).await;

        // Get author info for response
        let author = sqlx::query_as::<_, UserBrief>(
            "SELECT id, username, is_online FROM global.users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(CommentError::DatabaseError)?;

        // Notify the post author and, for replies, the parent comment author.
        // Runs off the request path; a failed notification is logged, not
        // surfaced.
        let self_clone = self.clone();
        let comment_clone = comment.clone();
        tokio::spawn(async move {
            self_clone
                .send_comment_notifications(&comment_clone, post_author, parent_author_id)
                .await;
        });

        info!(
            "Created comment with ID: {} for post: {}",
            comment.id, post_id
        );

        Ok(CommentResponse {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            content_html,
            author,
            parent_id: comment.parent_id,
            likes_count: comment.likes_count,
            reply_count: 0, // New comment has no replies
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }

    // Get top-level comments for a post
    pub async fn get_post_comments(
        &self,
        post_id: i64,
        viewer: Uuid,
        page: Option<i64>,
    ) -> Result<Vec<CommentResponse>, CommentError> {
        let (post_author, privacy) = self.load_post(post_id).await?;
        self.check_post_access(viewer, post_author, privacy).await?;

        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1) * COMMENTS_PER_PAGE;

        let sql = format!(
            r#"
            {}
            WHERE c.post_id = $1 AND c.parent_id IS NULL AND c.is_deleted = false
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_WITH_AUTHOR_SELECT
        );

        let rows = sqlx::query_as::<_, CommentWithAuthor>(&sql)
            .bind(post_id)
            .bind(COMMENTS_PER_PAGE)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(CommentError::DatabaseError)?;

        info!("Retrieved {} comments for post {}", rows.len(), post_id);
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // Get non-deleted direct replies to a comment, oldest first
    pub async fn get_replies(
        &self,
        comment_id: i64,
        viewer: Uuid,
    ) -> Result<Vec<CommentResponse>, CommentError> {
        let comment = self.get_comment_row(comment_id).await?;

        let (post_author, privacy) = self.load_post(comment.post_id).await?;
        self.check_post_access(viewer, post_author, privacy).await?;

        let sql = format!(
            r#"
            {}
            WHERE c.parent_id = $1 AND c.is_deleted = false
            ORDER BY c.created_at ASC
            "#,
            COMMENT_WITH_AUTHOR_SELECT
        );

        let rows = sqlx::query_as::<_, CommentWithAuthor>(&sql)
            .bind(comment_id)
            .fetch_all(&self.pool)
            .await
            .map_err(CommentError::DatabaseError)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_comment_row(&self, comment_id: i64) -> Result<Comment, CommentError> {
        sqlx::query_as::<_, Comment>(
            "SELECT * FROM global.comments WHERE id = $1 AND is_deleted = false",
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CommentError::DatabaseError)?
        .ok_or(CommentError::NotFound)
    }

    // Edit a comment; only the author may edit
    pub async fn update_comment(
        &self,
        comment_id: i64,
        user_id: Uuid,
        update: UpdateCommentRequest,
    ) -> Result<CommentResponse, CommentError> {
        let comment = self.get_comment_row(comment_id).await?;

        if comment.author_id != user_id {
            return Err(CommentError::NotOwner);
        }

        validate_comment_content(&update.content)?;
        let content_html = self.render_content(&update.content);

        sqlx::query(
            r#"
            UPDATE global.comments
            SET content = $1, content_html = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&update.content)
        .bind(&content_html)
        .bind(Utc::now())
        .bind(comment_id)
        .execute(&self.pool)
        .await
        .map_err(CommentError::DatabaseError)?;

        let sql = format!("{} WHERE c.id = $1", COMMENT_WITH_AUTHOR_SELECT);
        let row = sqlx::query_as::<_, CommentWithAuthor>(&sql)
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await
            .map_err(CommentError::DatabaseError)?;

        info!("Comment {} updated by user {}", comment_id, user_id);
        Ok(row.into())
    }

    // Delete a comment (soft delete)
    pub async fn delete_comment(&self, comment_id: i64, user_id: Uuid) -> Result<(), CommentError> {
        let comment = self.get_comment_row(comment_id).await?;

        // Check ownership
        if comment.author_id != user_id {
            return Err(CommentError::NotOwner);
        }

        let mut tx = self.pool.begin().await.map_err(CommentError::DatabaseError)?;

        sqlx::query(
            r#"
            UPDATE global.comments
            SET is_deleted = true, updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(comment_id)
        .execute(&mut *tx)
        .await
        .map_err(CommentError::DatabaseError)?;

        let comments_count = self.recount_post_comments(&mut tx, comment.post_id).await?;

        tx.commit().await.map_err(CommentError::DatabaseError)?;

        self.refresh_cached_count(comment.post_id, comments_count)
            .await;

        info!("Comment {} deleted by user {}", comment_id, user_id);
        Ok(())
    }

    // Recompute the denormalized counter from live rows inside the caller's
    // transaction
    async fn recount_post_comments(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: i64,
    ) -> Result<i64, CommentError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.comments WHERE post_id = $1 AND is_deleted = false",
        )
        .bind(post_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(CommentError::DatabaseError)?;

        sqlx::query("UPDATE global.posts SET comments_count = $1 WHERE id = $2")
            .bind(count)
            .bind(post_id)
            .execute(&mut **tx)
            .await
            .map_err(CommentError::DatabaseError)?;

        Ok(count)
    }

    // Keep the cached count in step with what was just committed
    async fn refresh_cached_count(&self, post_id: i64, count: i64) {
        if let Some(cache) = &self.redis_cache {
            let count_key = format!("{}:{}", COMMENT_COUNT_KEY_PREFIX, post_id);

            let result: Result<(), redis::RedisError> = async {
                cache
                    .get_client()
                    .get_multiplexed_async_connection()
                    .await?
                    .set_ex(&count_key, count.to_string(), COMMENT_COUNT_TTL_SECONDS)
                    .await
            }
            .await;

            if let Err(e) = result {
                warn!("Failed to refresh cached comment count: {}", e);
            }
        }
    }

    // Get comment count for a post (cached)
    pub async fn get_comment_count(&self, post_id: i64) -> Result<i64, CommentError> {
        // Try to get from cache first
        if let Some(cache) = &self.redis_cache {
            let count_key = format!("{}:{}", COMMENT_COUNT_KEY_PREFIX, post_id);

            if let Ok(cached_count) = cache
                .get_client()
                .get_multiplexed_async_connection()
                .await
                .map_err(CommentError::CacheError)?
                .get::<_, Option<i64>>(&count_key)
                .await
            {
                if let Some(count) = cached_count {
                    return Ok(count);
                }
            }
        }

        // Cache miss, get from DB
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.comments WHERE post_id = $1 AND is_deleted = false",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(CommentError::DatabaseError)?;

        self.refresh_cached_count(post_id, count).await;

        Ok(count)
    }

    async fn send_comment_notifications(
        &self,
        comment: &Comment,
        post_author: Uuid,
        parent_author: Option<Uuid>,
    ) {
        if post_author != comment.author_id {
            let payload = NotificationPayload {
                recipient_id: post_author,
                sender_id: Some(comment.author_id),
                notification_type: NotificationType::PostComment,
                title: "New comment".to_string(),
                message: "Someone commented on your post".to_string(),
                subject_type: Some("comment".to_string()),
                subject_id: Some(comment.id),
            };

            if let Err(e) = self.notification_service.create_notification(payload).await {
                warn!("Failed to send notification to post author: {:?}", e);
            }
        }

        // The parent author gets a reply notification unless they already got
        // the post-comment one above
        if let Some(parent_author) = parent_author {
            if parent_author != comment.author_id && parent_author != post_author {
                let payload = NotificationPayload {
                    recipient_id: parent_author,
                    sender_id: Some(comment.author_id),
                    notification_type: NotificationType::CommentReply,
                    title: "New reply".to_string(),
                    message: "You have a new reply to your comment".to_string(),
                    subject_type: Some("comment".to_string()),
                    subject_id: Some(comment.id),
                };

                if let Err(e) = self.notification_service.create_notification(payload).await {
                    warn!("Failed to send reply notification: {:?}", e);
                }
            }
        }
    }
}
