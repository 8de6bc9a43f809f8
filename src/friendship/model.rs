use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserBrief;

/// Lifecycle of a friendship edge. A row starts as a pending request from
/// the requester and is only ever in one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
    Blocked,
}

impl FriendshipStatus {
    pub fn from_str(status: &str) -> Result<Self, String> {
        match status.to_lowercase().as_str() {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            "declined" => Ok(FriendshipStatus::Declined),
            "blocked" => Ok(FriendshipStatus::Blocked),
            _ => Err(format!("Invalid friendship status: {}", status)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Declined => "declined",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}

/// What an addressee can do with a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondAction {
    Accept,
    Decline,
}

impl RespondAction {
    pub fn from_str(action: &str) -> Result<Self, String> {
        match action.to_lowercase().as_str() {
            "accept" => Ok(RespondAction::Accept),
            "decline" => Ok(RespondAction::Decline),
            _ => Err(format!("Invalid action: {}", action)),
        }
    }

    pub fn resulting_status(&self) -> FriendshipStatus {
        match self {
            RespondAction::Accept => FriendshipStatus::Accepted,
            RespondAction::Decline => FriendshipStatus::Declined,
        }
    }
}

/// Database model for a friendship edge
#[derive(Debug, FromRow, Clone)]
pub struct Friendship {
    pub id: i64,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user on the other end of an edge. Callers must pass a user that is
/// actually on the edge.
pub fn edge_peer(requester_id: Uuid, addressee_id: Uuid, user_id: Uuid) -> Uuid {
    if requester_id == user_id {
        addressee_id
    } else {
        requester_id
    }
}

/// Order suggestion candidates by shared-friend count, then id, so repeated
/// calls return the same slice.
pub fn rank_suggestions(candidates: &std::collections::HashMap<Uuid, i64>, limit: usize) -> Vec<Uuid> {
    let mut ranked: Vec<(Uuid, i64)> = candidates.iter().map(|(id, n)| (*id, *n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendFriendRequestRequest {
    /// The user to send a friend request to
    #[schema(value_type = UuidWrapper)]
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondToRequestRequest {
    /// Either "accept" or "decline"
    pub action: String,
}

/// A friendship edge with both endpoints resolved
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FriendshipResponse {
    pub id: i64,
    pub requester: UserBrief,
    pub addressee: UserBrief,
    pub status: String,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FriendListResponse {
    pub friends: Vec<UserBrief>,
    pub total_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FriendRequestListResponse {
    pub requests: Vec<FriendshipResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<UserBrief>,
}

/// Possible friendship errors
#[derive(Debug, thiserror::Error)]
pub enum FriendshipError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("User not found")]
    UserNotFound,

    #[error("Friend request not found")]
    RequestNotFound,

    #[error("A friendship or request already exists between these users")]
    AlreadyExists,

    #[error("Users cannot send friend requests to themselves")]
    SelfRequest,

    #[error("Users cannot block themselves")]
    SelfBlock,

    #[error("You are not friends with this user")]
    NotFriends,

    #[error("User is not blocked")]
    NotBlocked,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FriendshipErrorResponse {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_status_round_trip() {
        for value in ["pending", "accepted", "declined", "blocked"] {
            let parsed = FriendshipStatus::from_str(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!(FriendshipStatus::from_str("unfriended").is_err());
    }

    #[test]
    fn test_respond_action_parsing() {
        assert_eq!(
            RespondAction::from_str("accept").unwrap(),
            RespondAction::Accept
        );
        assert_eq!(
            RespondAction::from_str("DECLINE").unwrap(),
            RespondAction::Decline
        );
        assert!(RespondAction::from_str("ignore").is_err());
    }

    #[test]
    fn test_respond_action_status_transition() {
        assert_eq!(
            RespondAction::Accept.resulting_status(),
            FriendshipStatus::Accepted
        );
        assert_eq!(
            RespondAction::Decline.resulting_status(),
            FriendshipStatus::Declined
        );
    }

    #[test]
    fn test_edge_peer_picks_other_side() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(edge_peer(a, b, a), b);
        assert_eq!(edge_peer(a, b, b), a);
    }

    #[test]
    fn test_rank_suggestions_orders_by_count_then_id() {
        let mut ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        ids.sort();

        let mut candidates = HashMap::new();
        candidates.insert(ids[0], 1);
        candidates.insert(ids[1], 3);
        candidates.insert(ids[2], 3);

        let ranked = rank_suggestions(&candidates, 10);
        assert_eq!(ranked, vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_rank_suggestions_respects_limit() {
        let mut candidates = HashMap::new();
        for _ in 0..5 {
            candidates.insert(Uuid::new_v4(), 1);
        }

        assert_eq!(rank_suggestions(&candidates, 2).len(), 2);
        assert_eq!(rank_suggestions(&candidates, 0).len(), 0);
    }

    #[test]
    fn test_rank_suggestions_is_stable() {
        let mut candidates = HashMap::new();
        for _ in 0..8 {
            candidates.insert(Uuid::new_v4(), 2);
        }

        let first = rank_suggestions(&candidates, 8);
        let second = rank_suggestions(&candidates, 8);
        assert_eq!(first, second);
    }
}
