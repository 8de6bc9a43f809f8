use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror;
use utoipa::ToSchema;
use uuid::Uuid;

/// Who may see a user's profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProfileVisibility {
    Public,
    Private,
    Friends,
}

impl ProfileVisibility {
    pub fn from_str(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "public" => Ok(ProfileVisibility::Public),
            "private" => Ok(ProfileVisibility::Private),
            "friends" => Ok(ProfileVisibility::Friends),
            _ => Err(format!("Invalid profile visibility: {}", value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProfileVisibility::Public => "public",
            ProfileVisibility::Private => "private",
            ProfileVisibility::Friends => "friends",
        }
    }
}

/// Database model for a user account
#[derive(Debug, FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub profile_visibility: String,
    pub is_online: bool,
    pub is_verified: bool,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full profile returned to the account owner
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub profile_visibility: String,
    pub is_online: bool,
    pub is_verified: bool,
    #[schema(value_type = DateTimeWrapper)]
    pub last_seen: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            location: user.location,
            website: user.website,
            profile_visibility: user.profile_visibility,
            is_online: user.is_online,
            is_verified: user.is_verified,
            last_seen: user.last_seen,
            created_at: user.created_at,
        }
    }
}

/// Partial profile update; omitted fields keep their value
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub profile_visibility: Option<String>,
}

/// Compact user record for directory listings and friend lists
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserBrief {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub username: String,
    pub is_online: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserBrief>,
    pub total_count: i64,
}

/// Possible user errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("User not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserErrorResponse {
    pub error: String,
    pub code: String,
}

const MAX_BIO_LENGTH: usize = 500;

/// Field-level validation for profile updates
pub fn validate_profile_update(req: &UpdateProfileRequest) -> Result<(), UserError> {
    if let Some(bio) = &req.bio {
        if bio.len() > MAX_BIO_LENGTH {
            return Err(UserError::ValidationError(
                "Bio exceeds maximum length".to_string(),
            ));
        }
    }

    if let Some(visibility) = &req.profile_visibility {
        ProfileVisibility::from_str(visibility).map_err(UserError::ValidationError)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_round_trip() {
        for value in ["public", "private", "friends"] {
            let parsed = ProfileVisibility::from_str(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!(ProfileVisibility::from_str("everyone").is_err());
    }

    #[test]
    fn test_validate_profile_update_rejects_bad_visibility() {
        let req = UpdateProfileRequest {
            bio: None,
            location: None,
            website: None,
            profile_visibility: Some("everybody".to_string()),
        };
        assert!(validate_profile_update(&req).is_err());
    }

    #[test]
    fn test_validate_profile_update_rejects_long_bio() {
        let req = UpdateProfileRequest {
            bio: Some("x".repeat(501)),
            location: None,
            website: None,
            profile_visibility: None,
        };
        assert!(validate_profile_update(&req).is_err());
    }

    #[test]
    fn test_validate_profile_update_accepts_partial() {
        let req = UpdateProfileRequest {
            bio: Some("hello".to_string()),
            location: None,
            website: None,
            profile_visibility: Some("friends".to_string()),
        };
        assert!(validate_profile_update(&req).is_ok());
    }
}
