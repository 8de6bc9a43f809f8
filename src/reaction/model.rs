use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use thiserror;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserBrief;

/// The fixed set of reaction sentiments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub fn from_str(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "like" => Ok(ReactionType::Like),
            "love" => Ok(ReactionType::Love),
            "haha" => Ok(ReactionType::Haha),
            "wow" => Ok(ReactionType::Wow),
            "sad" => Ok(ReactionType::Sad),
            "angry" => Ok(ReactionType::Angry),
            _ => Err(format!("Invalid reaction type: {}", value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Love => "love",
            ReactionType::Haha => "haha",
            ReactionType::Wow => "wow",
            ReactionType::Sad => "sad",
            ReactionType::Angry => "angry",
        }
    }
}

/// Allow-list of things a reaction can target. Anything else in the URL is
/// rejected before touching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Post,
    Comment,
}

impl SubjectKind {
    pub fn from_str(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "post" => Ok(SubjectKind::Post),
            "comment" => Ok(SubjectKind::Comment),
            _ => Err(format!("Invalid subject type: {}", value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubjectKind::Post => "post",
            SubjectKind::Comment => "comment",
        }
    }
}

/// Existence and soft-delete state of a reaction target, plus who owns it
#[derive(Debug, Clone, Copy)]
pub struct SubjectRecord {
    pub author_id: Uuid,
    pub is_deleted: bool,
}

/// What a toggle does to the stored reaction row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Create,
    Remove,
    Update,
}

/// The toggle state machine: no row creates one, the same sentiment removes
/// it, a different sentiment rewrites it in place.
pub fn decide_toggle(existing: Option<ReactionType>, incoming: ReactionType) -> ToggleAction {
    match existing {
        None => ToggleAction::Create,
        Some(current) if current == incoming => ToggleAction::Remove,
        Some(_) => ToggleAction::Update,
    }
}

/// Database model for a reaction
#[derive(Debug, FromRow, Clone)]
pub struct Reaction {
    pub id: i64,
    pub user_id: Uuid,
    pub subject_type: String,
    pub subject_id: i64,
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleReactionRequest {
    /// One of like, love, haha, wow, sad, angry
    pub reaction_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleReactionResponse {
    pub liked: bool,
    pub reaction: Option<String>,
    pub likes_count: i64,
}

/// One stored reaction with its author, for grouped listings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReactionEntry {
    pub user: UserBrief,
    pub reaction_type: String,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikesResponse {
    /// Reactions grouped by reaction type
    #[schema(value_type = Object)]
    pub reactions: HashMap<String, Vec<ReactionEntry>>,
    pub total_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckReactionResponse {
    pub liked: bool,
    pub reaction: Option<String>,
}

/// Possible reaction errors
#[derive(Debug, thiserror::Error)]
pub enum ReactionError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid subject type: {0}")]
    InvalidSubject(String),

    #[error("Subject not found")]
    SubjectNotFound,

    #[error("Cannot react to deleted content")]
    SubjectDeleted,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReactionErrorResponse {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_type_round_trip() {
        for value in ["like", "love", "haha", "wow", "sad", "angry"] {
            let parsed = ReactionType::from_str(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!(ReactionType::from_str("meh").is_err());
    }

    #[test]
    fn test_subject_kind_allow_list() {
        assert_eq!(SubjectKind::from_str("post").unwrap(), SubjectKind::Post);
        assert_eq!(
            SubjectKind::from_str("Comment").unwrap(),
            SubjectKind::Comment
        );
        assert!(SubjectKind::from_str("user").is_err());
        assert!(SubjectKind::from_str("").is_err());
    }

    #[test]
    fn test_toggle_creates_when_no_reaction() {
        assert_eq!(
            decide_toggle(None, ReactionType::Like),
            ToggleAction::Create
        );
    }

    #[test]
    fn test_toggle_removes_on_same_reaction() {
        assert_eq!(
            decide_toggle(Some(ReactionType::Like), ReactionType::Like),
            ToggleAction::Remove
        );
        assert_eq!(
            decide_toggle(Some(ReactionType::Angry), ReactionType::Angry),
            ToggleAction::Remove
        );
    }

    #[test]
    fn test_toggle_updates_on_different_reaction() {
        assert_eq!(
            decide_toggle(Some(ReactionType::Like), ReactionType::Love),
            ToggleAction::Update
        );
    }

    #[test]
    fn test_toggle_pair_is_idempotent() {
        // like then like again lands back at no reaction
        let after_first = decide_toggle(None, ReactionType::Like);
        assert_eq!(after_first, ToggleAction::Create);

        let after_second = decide_toggle(Some(ReactionType::Like), ReactionType::Like);
        assert_eq!(after_second, ToggleAction::Remove);
    }
}
