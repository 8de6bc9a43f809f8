use crate::notification::model::{NotificationPayload, NotificationType};
use crate::notification::service::NotificationService;
use crate::reaction::model::{
    decide_toggle, CheckReactionResponse, LikesResponse, Reaction, ReactionEntry, ReactionError,
    ReactionType, SubjectKind, SubjectRecord, ToggleAction, ToggleReactionResponse,
};
use crate::user::model::UserBrief;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReactionService {
    pool: PgPool,
    notification_service: Arc<NotificationService>,
}

impl ReactionService {
    pub fn new(pool: PgPool, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    // Resolve a subject through its own table. Each kind knows how to report
    // existence, ownership and soft-delete state.
    async fn load_subject(
        &self,
        kind: SubjectKind,
        subject_id: i64,
    ) -> Result<SubjectRecord, ReactionError> {
        let sql = match kind {
            SubjectKind::Post => "SELECT author_id, is_deleted FROM global.posts WHERE id = $1",
            SubjectKind::Comment => {
                "SELECT author_id, is_deleted FROM global.comments WHERE id = $1"
            }
        };

        let row = sqlx::query_as::<_, (Uuid, bool)>(sql)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ReactionError::DatabaseError)?
            .ok_or(ReactionError::SubjectNotFound)?;

        Ok(SubjectRecord {
            author_id: row.0,
            is_deleted: row.1,
        })
    }

    /// Toggle the user's reaction on a subject and return the new state.
    /// The reaction write and the counter recount commit together.
    pub async fn toggle(
        &self,
        user_id: Uuid,
        kind_tag: &str,
        subject_id: i64,
        reaction_type_raw: &str,
    ) -> Result<ToggleReactionResponse, ReactionError> {
        let kind = SubjectKind::from_str(kind_tag).map_err(ReactionError::InvalidSubject)?;
        let reaction_type =
            ReactionType::from_str(reaction_type_raw).map_err(ReactionError::ValidationError)?;

        let subject = self.load_subject(kind, subject_id).await?;
        if subject.is_deleted {
            return Err(ReactionError::SubjectDeleted);
        }

        let mut tx = self.pool.begin().await.map_err(ReactionError::DatabaseError)?;

        let existing = sqlx::query_as::<_, Reaction>(
            r#"
            SELECT * FROM global.reactions
            WHERE user_id = $1 AND subject_type = $2 AND subject_id = $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(subject_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ReactionError::DatabaseError)?;

        let existing_type = match &existing {
            Some(reaction) => Some(ReactionType::from_str(&reaction.reaction_type).map_err(
                |_| {
                    ReactionError::ValidationError(format!(
                        "Corrupt reaction row: {}",
                        reaction.reaction_type
                    ))
                },
            )?),
            None => None,
        };

        let action = decide_toggle(existing_type, reaction_type);

        let (liked, reaction) = match action {
            ToggleAction::Create => {
                sqlx::query(
                    r#"
                    INSERT INTO global.reactions (user_id, subject_type, subject_id, reaction_type)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(user_id)
                .bind(kind.as_str())
                .bind(subject_id)
                .bind(reaction_type.as_str())
                .execute(&mut *tx)
                .await
                .map_err(ReactionError::DatabaseError)?;

                (true, Some(reaction_type))
            }
            ToggleAction::Remove => {
                let reaction = existing.as_ref().unwrap();
                sqlx::query("DELETE FROM global.reactions WHERE id = $1")
                    .bind(reaction.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(ReactionError::DatabaseError)?;

                (false, None)
            }
            ToggleAction::Update => {
                let reaction = existing.as_ref().unwrap();
                sqlx::query("UPDATE global.reactions SET reaction_type = $1 WHERE id = $2")
                    .bind(reaction_type.as_str())
                    .bind(reaction.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(ReactionError::DatabaseError)?;

                (true, Some(reaction_type))
            }
        };

        // Recount rather than increment so the cached value always matches a
        // live count once this transaction commits
        let likes_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.reactions WHERE subject_type = $1 AND subject_id = $2",
        )
        .bind(kind.as_str())
        .bind(subject_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(ReactionError::DatabaseError)?;

        let counter_sql = match kind {
            SubjectKind::Post => "UPDATE global.posts SET likes_count = $1 WHERE id = $2",
            SubjectKind::Comment => "UPDATE global.comments SET likes_count = $1 WHERE id = $2",
        };
        sqlx::query(counter_sql)
            .bind(likes_count)
            .bind(subject_id)
            .execute(&mut *tx)
            .await
            .map_err(ReactionError::DatabaseError)?;

        tx.commit().await.map_err(ReactionError::DatabaseError)?;

        info!(
            "User {} toggled {} on {} {} (now liked={})",
            user_id,
            reaction_type.as_str(),
            kind.as_str(),
            subject_id,
            liked
        );

        // Only a fresh reaction pings the author; flips and removals are silent
        if action == ToggleAction::Create && subject.author_id != user_id {
            let notification_type = match kind {
                SubjectKind::Post => NotificationType::PostLike,
                SubjectKind::Comment => NotificationType::CommentLike,
            };

            let payload = NotificationPayload {
                recipient_id: subject.author_id,
                sender_id: Some(user_id),
                notification_type,
                title: "New reaction".to_string(),
                message: format!("Someone reacted {} to your {}", reaction_type.as_str(), kind.as_str()),
                subject_type: Some(kind.as_str().to_string()),
                subject_id: Some(subject_id),
            };

            if let Err(e) = self.notification_service.create_notification(payload).await {
                warn!("Failed to create reaction notification: {:?}", e);
            }
        }

        Ok(ToggleReactionResponse {
            liked,
            reaction: reaction.map(|r| r.as_str().to_string()),
            likes_count,
        })
    }

    /// All reactions on a subject, grouped by reaction type
    pub async fn likes_for(
        &self,
        kind_tag: &str,
        subject_id: i64,
    ) -> Result<LikesResponse, ReactionError> {
        let kind = SubjectKind::from_str(kind_tag).map_err(ReactionError::InvalidSubject)?;

        // 404 for subjects that never existed, but deleted subjects keep
        // their historical reactions readable
        self.load_subject(kind, subject_id).await?;

        let rows = sqlx::query_as::<_, (Uuid, String, bool, String, chrono::DateTime<chrono::Utc>)>(
            r#"
            SELECT u.id, u.username, u.is_online, r.reaction_type, r.created_at
            FROM global.reactions r
            JOIN global.users u ON u.id = r.user_id
            WHERE r.subject_type = $1 AND r.subject_id = $2
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(kind.as_str())
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ReactionError::DatabaseError)?;

        let total_count = rows.len() as i64;
        let mut reactions: HashMap<String, Vec<ReactionEntry>> = HashMap::new();
        for (id, username, is_online, reaction_type, created_at) in rows {
            reactions
                .entry(reaction_type.clone())
                .or_default()
                .push(ReactionEntry {
                    user: UserBrief {
                        id,
                        username,
                        is_online,
                    },
                    reaction_type,
                    created_at,
                });
        }

        Ok(LikesResponse {
            reactions,
            total_count,
        })
    }

    /// The current user's reaction on a subject, if any
    pub async fn check(
        &self,
        user_id: Uuid,
        kind_tag: &str,
        subject_id: i64,
    ) -> Result<CheckReactionResponse, ReactionError> {
        let kind = SubjectKind::from_str(kind_tag).map_err(ReactionError::InvalidSubject)?;

        let reaction = sqlx::query_scalar::<_, String>(
            r#"
            SELECT reaction_type FROM global.reactions
            WHERE user_id = $1 AND subject_type = $2 AND subject_id = $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ReactionError::DatabaseError)?;

        Ok(CheckReactionResponse {
            liked: reaction.is_some(),
            reaction,
        })
    }
}
