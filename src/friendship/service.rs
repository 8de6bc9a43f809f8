use crate::friendship::model::{
    edge_peer, rank_suggestions, Friendship, FriendshipError, FriendshipResponse,
    FriendshipStatus, RespondAction,
};
use crate::notification::model::{NotificationPayload, NotificationType};
use crate::notification::service::NotificationService;
use crate::user::model::UserBrief;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_SUGGESTION_LIMIT: i64 = 10;
const MAX_SUGGESTION_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct FriendshipService {
    pool: PgPool,
    notification_service: Arc<NotificationService>,
}

impl FriendshipService {
    pub fn new(pool: PgPool, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, FriendshipError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global.users WHERE id = $1 AND is_active = true)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        Ok(exists)
    }

    // The single edge between two users, whichever direction it was sent in
    async fn get_edge(&self, a: Uuid, b: Uuid) -> Result<Option<Friendship>, FriendshipError> {
        let edge = sqlx::query_as::<_, Friendship>(
            r#"
            SELECT * FROM global.friendships
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        Ok(edge)
    }

    /// Send a friend request. Any existing edge between the pair, in any
    /// status, makes this a conflict.
    pub async fn send_request(
        &self,
        requester_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Friendship, FriendshipError> {
        if requester_id == addressee_id {
            return Err(FriendshipError::SelfRequest);
        }

        if !self.user_exists(addressee_id).await? {
            return Err(FriendshipError::UserNotFound);
        }

        if self.get_edge(requester_id, addressee_id).await?.is_some() {
            return Err(FriendshipError::AlreadyExists);
        }

        // Two users requesting each other at once can both pass the check
        // above; the unordered-pair unique index rejects the second insert.
        let friendship = sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO global.friendships (requester_id, addressee_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(addressee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FriendshipError::AlreadyExists
            }
            _ => FriendshipError::DatabaseError(e),
        })?;

        info!(
            "Friend request {} sent from {} to {}",
            friendship.id, requester_id, addressee_id
        );

        self.notify(NotificationPayload {
            recipient_id: addressee_id,
            sender_id: Some(requester_id),
            notification_type: NotificationType::FriendRequest,
            title: "New friend request".to_string(),
            message: "You have received a friend request".to_string(),
            subject_type: Some("friendship".to_string()),
            subject_id: Some(friendship.id),
        })
        .await;

        Ok(friendship)
    }

    /// Accept or decline a pending request. Only the addressee may respond.
    pub async fn respond(
        &self,
        friendship_id: i64,
        acting_user: Uuid,
        action: RespondAction,
    ) -> Result<Friendship, FriendshipError> {
        let new_status = action.resulting_status();

        let friendship = sqlx::query_as::<_, Friendship>(
            r#"
            UPDATE global.friendships
            SET status = $1, updated_at = $2
            WHERE id = $3 AND addressee_id = $4 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(new_status.as_str())
        .bind(Utc::now())
        .bind(friendship_id)
        .bind(acting_user)
        .fetch_optional(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?
        .ok_or(FriendshipError::RequestNotFound)?;

        info!(
            "Friend request {} {} by {}",
            friendship_id,
            new_status.as_str(),
            acting_user
        );

        if new_status == FriendshipStatus::Accepted {
            self.notify(NotificationPayload {
                recipient_id: friendship.requester_id,
                sender_id: Some(acting_user),
                notification_type: NotificationType::FriendAccept,
                title: "Friend request accepted".to_string(),
                message: "Your friend request was accepted".to_string(),
                subject_type: Some("friendship".to_string()),
                subject_id: Some(friendship.id),
            })
            .await;
        }

        Ok(friendship)
    }

    // Ids of everyone joined to `user_id` by an accepted edge
    async fn friend_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>, FriendshipError> {
        let edges = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT requester_id, addressee_id FROM global.friendships
            WHERE (requester_id = $1 OR addressee_id = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        Ok(edges
            .into_iter()
            .map(|(requester_id, addressee_id)| edge_peer(requester_id, addressee_id, user_id))
            .collect())
    }

    async fn fetch_briefs(&self, ids: &HashSet<Uuid>) -> Result<Vec<UserBrief>, FriendshipError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list: Vec<Uuid> = ids.iter().copied().collect();
        let users = sqlx::query_as::<_, UserBrief>(
            r#"
            SELECT id, username, is_online FROM global.users
            WHERE id = ANY($1) AND is_active = true
            ORDER BY username
            "#,
        )
        .bind(&id_list)
        .fetch_all(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        Ok(users)
    }

    /// Everyone connected to `user_id` by an accepted edge, either direction
    pub async fn friends_of(&self, user_id: Uuid) -> Result<Vec<UserBrief>, FriendshipError> {
        let ids = self.friend_ids(user_id).await?;
        self.fetch_briefs(&ids).await
    }

    /// Whether an accepted edge joins the two users
    pub async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool, FriendshipError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM global.friendships
                WHERE ((requester_id = $1 AND addressee_id = $2)
                    OR (requester_id = $2 AND addressee_id = $1))
                  AND status = 'accepted'
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        Ok(exists)
    }

    /// Intersection of both users' friend sets
    pub async fn mutual_friends(
        &self,
        user_id: Uuid,
        other_id: Uuid,
    ) -> Result<Vec<UserBrief>, FriendshipError> {
        if !self.user_exists(other_id).await? {
            return Err(FriendshipError::UserNotFound);
        }

        let mine = self.friend_ids(user_id).await?;
        let theirs = self.friend_ids(other_id).await?;

        let mutual: HashSet<Uuid> = mine.intersection(&theirs).copied().collect();
        self.fetch_briefs(&mutual).await
    }

    /// Friends-of-friends, minus self, existing friends, and anyone already
    /// connected to `user_id` by an edge in any status. Ranked by how many
    /// friends are shared.
    pub async fn suggestions(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<UserBrief>, FriendshipError> {
        let limit = limit
            .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
            .clamp(1, MAX_SUGGESTION_LIMIT) as usize;

        let friends = self.friend_ids(user_id).await?;
        if friends.is_empty() {
            return Ok(Vec::new());
        }

        // Users with any edge to me are not suggestion material
        let connected = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT requester_id, addressee_id FROM global.friendships
            WHERE requester_id = $1 OR addressee_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        let excluded: HashSet<Uuid> = connected
            .into_iter()
            .map(|(requester_id, addressee_id)| edge_peer(requester_id, addressee_id, user_id))
            .collect();

        // Accepted edges touching any of my friends; the far side is a candidate
        let friend_list: Vec<Uuid> = friends.iter().copied().collect();
        let edges = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT requester_id, addressee_id FROM global.friendships
            WHERE (requester_id = ANY($1) OR addressee_id = ANY($1)) AND status = 'accepted'
            "#,
        )
        .bind(&friend_list)
        .fetch_all(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        let mut candidates: HashMap<Uuid, i64> = HashMap::new();
        for (requester_id, addressee_id) in edges {
            for candidate in [requester_id, addressee_id] {
                if candidate == user_id
                    || friends.contains(&candidate)
                    || excluded.contains(&candidate)
                {
                    continue;
                }
                *candidates.entry(candidate).or_insert(0) += 1;
            }
        }

        let ranked = rank_suggestions(&candidates, limit);

        // Preserve the ranked order when resolving user rows
        let ranked_set: HashSet<Uuid> = ranked.iter().copied().collect();
        let briefs = self.fetch_briefs(&ranked_set).await?;
        let mut by_id: HashMap<Uuid, UserBrief> =
            briefs.into_iter().map(|u| (u.id, u)).collect();

        let mut result = Vec::with_capacity(ranked.len());
        for id in ranked {
            if let Some(brief) = by_id.remove(&id) {
                result.push(brief);
            }
        }

        Ok(result)
    }

    /// Drop the accepted edge between the two users
    pub async fn unfriend(&self, actor: Uuid, other: Uuid) -> Result<(), FriendshipError> {
        if !self.user_exists(other).await? {
            return Err(FriendshipError::UserNotFound);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM global.friendships
            WHERE ((requester_id = $1 AND addressee_id = $2)
                OR (requester_id = $2 AND addressee_id = $1))
              AND status = 'accepted'
            "#,
        )
        .bind(actor)
        .bind(other)
        .execute(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(FriendshipError::NotFriends);
        }

        info!("User {} unfriended {}", actor, other);
        Ok(())
    }

    /// Block a user, overwriting any existing edge. The blocker always ends
    /// up as the requester so unblock knows who owns the block.
    pub async fn block(&self, actor: Uuid, target: Uuid) -> Result<(), FriendshipError> {
        if actor == target {
            return Err(FriendshipError::SelfBlock);
        }

        if !self.user_exists(target).await? {
            return Err(FriendshipError::UserNotFound);
        }

        let updated = sqlx::query(
            r#"
            UPDATE global.friendships
            SET requester_id = $1, addressee_id = $2, status = 'blocked', updated_at = $3
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            "#,
        )
        .bind(actor)
        .bind(target)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO global.friendships (requester_id, addressee_id, status)
                VALUES ($1, $2, 'blocked')
                "#,
            )
            .bind(actor)
            .bind(target)
            .execute(&self.pool)
            .await
            .map_err(FriendshipError::DatabaseError)?;
        }

        info!("User {} blocked {}", actor, target);
        Ok(())
    }

    /// Remove a block previously placed by `actor`
    pub async fn unblock(&self, actor: Uuid, target: Uuid) -> Result<(), FriendshipError> {
        if !self.user_exists(target).await? {
            return Err(FriendshipError::UserNotFound);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM global.friendships
            WHERE requester_id = $1 AND addressee_id = $2 AND status = 'blocked'
            "#,
        )
        .bind(actor)
        .bind(target)
        .execute(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(FriendshipError::NotBlocked);
        }

        info!("User {} unblocked {}", actor, target);
        Ok(())
    }

    /// Pending requests where the user is the addressee, newest first
    pub async fn received_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendshipError> {
        self.pending_requests("addressee_id", user_id).await
    }

    /// Pending requests where the user is the requester, newest first
    pub async fn sent_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendshipError> {
        self.pending_requests("requester_id", user_id).await
    }

    async fn pending_requests(
        &self,
        side_column: &str,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendshipError> {
        // side_column is one of two fixed literals, never user input
        let sql = format!(
            r#"
            SELECT f.id, f.status, f.created_at,
                   req.id AS requester_id, req.username AS requester_username, req.is_online AS requester_online,
                   adr.id AS addressee_id, adr.username AS addressee_username, adr.is_online AS addressee_online
            FROM global.friendships f
            JOIN global.users req ON req.id = f.requester_id
            JOIN global.users adr ON adr.id = f.addressee_id
            WHERE f.{} = $1 AND f.status = 'pending'
            ORDER BY f.created_at DESC
            "#,
            side_column
        );

        let rows = sqlx::query_as::<
            _,
            (
                i64,
                String,
                chrono::DateTime<chrono::Utc>,
                Uuid,
                String,
                bool,
                Uuid,
                String,
                bool,
            ),
        >(&sql)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(FriendshipError::DatabaseError)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, status, created_at, req_id, req_name, req_online, adr_id, adr_name, adr_online)| {
                    FriendshipResponse {
                        id,
                        requester: UserBrief {
                            id: req_id,
                            username: req_name,
                            is_online: req_online,
                        },
                        addressee: UserBrief {
                            id: adr_id,
                            username: adr_name,
                            is_online: adr_online,
                        },
                        status,
                        created_at,
                    }
                },
            )
            .collect())
    }

    /// Resolve an edge into a response with both endpoints
    pub async fn to_response(
        &self,
        friendship: &Friendship,
    ) -> Result<FriendshipResponse, FriendshipError> {
        let endpoints: HashSet<Uuid> = [friendship.requester_id, friendship.addressee_id]
            .into_iter()
            .collect();
        let briefs = self.fetch_briefs(&endpoints).await?;

        let mut by_id: HashMap<Uuid, UserBrief> =
            briefs.into_iter().map(|u| (u.id, u)).collect();

        let requester = by_id
            .remove(&friendship.requester_id)
            .ok_or(FriendshipError::UserNotFound)?;
        let addressee = by_id
            .remove(&friendship.addressee_id)
            .ok_or(FriendshipError::UserNotFound)?;

        Ok(FriendshipResponse {
            id: friendship.id,
            requester,
            addressee,
            status: friendship.status.clone(),
            created_at: friendship.created_at,
        })
    }

    // Fire-and-forget: a lost notification never fails the graph operation
    async fn notify(&self, payload: NotificationPayload) {
        if let Err(e) = self.notification_service.create_notification(payload).await {
            warn!("Failed to create notification: {:?}", e);
        }
    }
}
