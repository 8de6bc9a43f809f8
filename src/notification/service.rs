use crate::notification::model::{
    NotificationCountsResponse, NotificationError, NotificationPayload, NotificationPreference,
    NotificationResponse, NotificationType, UpdatePreferencesRequest,
};
use crate::user::model::UserBrief;
use chrono::Utc;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

const NOTIFICATIONS_PER_PAGE: i64 = 20;

// A notification row with its sender joined in when present
#[derive(Debug, FromRow)]
struct NotificationWithSender {
    pub id: i64,
    pub sender_id: Option<Uuid>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<i64>,
    pub is_read: bool,
    pub is_seen: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sender_username: Option<String>,
    pub sender_online: Option<bool>,
}

impl From<NotificationWithSender> for NotificationResponse {
    fn from(row: NotificationWithSender) -> Self {
        let sender = match (row.sender_id, row.sender_username, row.sender_online) {
            (Some(id), Some(username), Some(is_online)) => Some(UserBrief {
                id,
                username,
                is_online,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            sender,
            notification_type: row.notification_type,
            title: row.title,
            message: row.message,
            subject_type: row.subject_type,
            subject_id: row.subject_id,
            is_read: row.is_read,
            is_seen: row.is_seen,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a notification unless the recipient has switched off in-app
    /// delivery for that event class. Returns the new id, or None when
    /// suppressed.
    pub async fn create_notification(
        &self,
        payload: NotificationPayload,
    ) -> Result<Option<i64>, NotificationError> {
        let prefs = self.get_or_create_preferences(payload.recipient_id).await?;

        if !payload.notification_type.is_inapp_enabled(&prefs) {
            debug!(
                "Notification of type {} suppressed by preferences for {}",
                payload.notification_type.as_str(),
                payload.recipient_id
            );
            return Ok(None);
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO global.notifications (
                recipient_id, sender_id, notification_type, title, message,
                subject_type, subject_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(payload.recipient_id)
        .bind(payload.sender_id)
        .bind(payload.notification_type.as_str())
        .bind(&payload.title)
        .bind(&payload.message)
        .bind(&payload.subject_type)
        .bind(payload.subject_id)
        .fetch_one(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        info!(
            "Created notification {} for recipient {} of type {}",
            id,
            payload.recipient_id,
            payload.notification_type.as_str()
        );

        Ok(Some(id))
    }

    /// The recipient's notifications, newest first, with optional type and
    /// read-state filters
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        page: Option<i64>,
        type_filter: Option<String>,
        is_read: Option<bool>,
    ) -> Result<(Vec<NotificationResponse>, i64), NotificationError> {
        // An unknown type filter is a caller mistake, not an empty result
        if let Some(raw) = &type_filter {
            NotificationType::from_str(raw).map_err(NotificationError::ValidationError)?;
        }

        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1) * NOTIFICATIONS_PER_PAGE;

        let rows = sqlx::query_as::<_, NotificationWithSender>(
            r#"
            SELECT n.id, n.sender_id, n.notification_type, n.title, n.message,
                   n.subject_type, n.subject_id, n.is_read, n.is_seen, n.created_at,
                   u.username AS sender_username, u.is_online AS sender_online
            FROM global.notifications n
            LEFT JOIN global.users u ON u.id = n.sender_id
            WHERE n.recipient_id = $1
              AND ($2::text IS NULL OR n.notification_type = $2)
              AND ($3::boolean IS NULL OR n.is_read = $3)
            ORDER BY n.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(&type_filter)
        .bind(is_read)
        .bind(NOTIFICATIONS_PER_PAGE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        let total_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM global.notifications
            WHERE recipient_id = $1
              AND ($2::text IS NULL OR notification_type = $2)
              AND ($3::boolean IS NULL OR is_read = $3)
            "#,
        )
        .bind(user_id)
        .bind(&type_filter)
        .bind(is_read)
        .fetch_one(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        Ok((rows.into_iter().map(Into::into).collect(), total_count))
    }

    /// Total, unread and unseen counts for the badge row
    pub async fn counts(&self, user_id: Uuid) -> Result<NotificationCountsResponse, NotificationError> {
        let (total_count, unread_count, unseen_count) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE is_read = false),
                       COUNT(*) FILTER (WHERE is_seen = false)
                FROM global.notifications
                WHERE recipient_id = $1
                "#,
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(NotificationError::DatabaseError)?;

        Ok(NotificationCountsResponse {
            total_count,
            unread_count,
            unseen_count,
        })
    }

    // Mark notification as read; only the recipient's rows match
    pub async fn mark_as_read(
        &self,
        notification_id: i64,
        user_id: Uuid,
    ) -> Result<(), NotificationError> {
        self.set_flag(notification_id, user_id, "is_read").await
    }

    // Mark notification as seen; only the recipient's rows match
    pub async fn mark_as_seen(
        &self,
        notification_id: i64,
        user_id: Uuid,
    ) -> Result<(), NotificationError> {
        self.set_flag(notification_id, user_id, "is_seen").await
    }

    async fn set_flag(
        &self,
        notification_id: i64,
        user_id: Uuid,
        flag_column: &str,
    ) -> Result<(), NotificationError> {
        // flag_column is one of two fixed literals, never user input
        let sql = format!(
            "UPDATE global.notifications SET {} = true, updated_at = $1 WHERE id = $2 AND recipient_id = $3",
            flag_column
        );

        let result = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(NotificationError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(NotificationError::NotFound);
        }

        info!("Notification {} flagged {}", notification_id, flag_column);
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<i64, NotificationError> {
        let result = sqlx::query(
            "UPDATE global.notifications SET is_read = true, updated_at = $1 WHERE recipient_id = $2 AND is_read = false",
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        Ok(result.rows_affected() as i64)
    }

    pub async fn mark_all_seen(&self, user_id: Uuid) -> Result<i64, NotificationError> {
        let result = sqlx::query(
            "UPDATE global.notifications SET is_seen = true, updated_at = $1 WHERE recipient_id = $2 AND is_seen = false",
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        Ok(result.rows_affected() as i64)
    }

    /// A user's preference row, created with defaults on first touch
    pub async fn get_or_create_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationPreference, NotificationError> {
        sqlx::query(
            r#"
            INSERT INTO global.notification_preferences (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        let prefs = sqlx::query_as::<_, NotificationPreference>(
            r#"
            SELECT user_id,
                   email_post_likes, email_comments, email_friend_requests, email_mentions,
                   push_post_likes, push_comments, push_friend_requests, push_mentions,
                   inapp_post_likes, inapp_comments, inapp_friend_requests, inapp_mentions
            FROM global.notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        Ok(prefs)
    }

    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        update: UpdatePreferencesRequest,
    ) -> Result<NotificationPreference, NotificationError> {
        let current = self.get_or_create_preferences(user_id).await?;

        let prefs = sqlx::query_as::<_, NotificationPreference>(
            r#"
            UPDATE global.notification_preferences
            SET email_post_likes = $1, email_comments = $2, email_friend_requests = $3,
                email_mentions = $4, push_post_likes = $5, push_comments = $6,
                push_friend_requests = $7, push_mentions = $8, inapp_post_likes = $9,
                inapp_comments = $10, inapp_friend_requests = $11, inapp_mentions = $12,
                updated_at = $13
            WHERE user_id = $14
            RETURNING user_id,
                      email_post_likes, email_comments, email_friend_requests, email_mentions,
                      push_post_likes, push_comments, push_friend_requests, push_mentions,
                      inapp_post_likes, inapp_comments, inapp_friend_requests, inapp_mentions
            "#,
        )
        .bind(update.email_post_likes.unwrap_or(current.email_post_likes))
        .bind(update.email_comments.unwrap_or(current.email_comments))
        .bind(
            update
                .email_friend_requests
                .unwrap_or(current.email_friend_requests),
        )
        .bind(update.email_mentions.unwrap_or(current.email_mentions))
        .bind(update.push_post_likes.unwrap_or(current.push_post_likes))
        .bind(update.push_comments.unwrap_or(current.push_comments))
        .bind(
            update
                .push_friend_requests
                .unwrap_or(current.push_friend_requests),
        )
        .bind(update.push_mentions.unwrap_or(current.push_mentions))
        .bind(update.inapp_post_likes.unwrap_or(current.inapp_post_likes))
        .bind(update.inapp_comments.unwrap_or(current.inapp_comments))
        .bind(
            update
                .inapp_friend_requests
                .unwrap_or(current.inapp_friend_requests),
        )
        .bind(update.inapp_mentions.unwrap_or(current.inapp_mentions))
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?;

        info!("Notification preferences updated for user {}", user_id);
        Ok(prefs)
    }

    /// Fetch one notification owned by the recipient
    pub async fn get_notification(
        &self,
        notification_id: i64,
        user_id: Uuid,
    ) -> Result<NotificationResponse, NotificationError> {
        let row = sqlx::query_as::<_, NotificationWithSender>(
            r#"
            SELECT n.id, n.sender_id, n.notification_type, n.title, n.message,
                   n.subject_type, n.subject_id, n.is_read, n.is_seen, n.created_at,
                   u.username AS sender_username, u.is_online AS sender_online
            FROM global.notifications n
            LEFT JOIN global.users u ON u.id = n.sender_id
            WHERE n.id = $1 AND n.recipient_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(NotificationError::DatabaseError)?
        .ok_or(NotificationError::NotFound)?;

        Ok(row.into())
    }
}
