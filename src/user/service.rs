use crate::user::model::{
    validate_profile_update, UpdateProfileRequest, User, UserBrief, UserError,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const USERS_PER_PAGE: i64 = 20;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Fetch the authenticated user's own profile
    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, bio, location, website, profile_visibility,
                   is_online, is_verified, last_seen, created_at, updated_at
            FROM global.users
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(UserError::DatabaseError)?
        .ok_or(UserError::NotFound)?;

        Ok(user)
    }

    // Apply a partial profile update and return the fresh row
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfileRequest,
    ) -> Result<User, UserError> {
        validate_profile_update(&update)?;

        let current = self.get_profile(user_id).await?;

        let bio = update.bio.unwrap_or(current.bio);
        let location = update.location.unwrap_or(current.location);
        let website = update.website.unwrap_or(current.website);
        let visibility = update
            .profile_visibility
            .unwrap_or(current.profile_visibility);

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE global.users
            SET bio = $1, location = $2, website = $3, profile_visibility = $4, updated_at = $5
            WHERE id = $6
            RETURNING id, username, email, bio, location, website, profile_visibility,
                      is_online, is_verified, last_seen, created_at, updated_at
            "#,
        )
        .bind(&bio)
        .bind(&location)
        .bind(&website)
        .bind(&visibility)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(UserError::DatabaseError)?;

        info!("Profile updated for user {}", user_id);
        Ok(user)
    }

    // Paginated directory of active users
    pub async fn list_users(&self, page: Option<i64>) -> Result<(Vec<UserBrief>, i64), UserError> {
        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1) * USERS_PER_PAGE;

        let users = sqlx::query_as::<_, UserBrief>(
            r#"
            SELECT id, username, is_online
            FROM global.users
            WHERE is_active = true
            ORDER BY username
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(USERS_PER_PAGE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(UserError::DatabaseError)?;

        let total_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.users WHERE is_active = true",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(UserError::DatabaseError)?;

        Ok((users, total_count))
    }
}
