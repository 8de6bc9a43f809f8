use argon2::{
    password_hash::PasswordVerifier,
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use super::jwt::{generate_token_pair, TokenPair};

// Input data structures
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct LoginData {
    pub email: String,
    pub password: String,
}

// Result data structure
pub struct AuthResult {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub tokens: TokenPair,
}

// Service errors
pub enum AuthError {
    InvalidInput(String),
    AlreadyExists(String),
    InvalidCredentials,
    DatabaseError(String),
    TokenError,
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DatabaseError(_) | Self::TokenError | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::AlreadyExists(msg) => msg.clone(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::DatabaseError(msg) => format!("Database error: {}", msg),
            Self::TokenError => "Failed to generate auth tokens".to_string(),
            Self::InternalError(msg) => msg.clone(),
        }
    }
}

// User registration service
pub async fn register(pool: &PgPool, data: RegisterData) -> Result<AuthResult, AuthError> {
    // Validate input
    if data.username.trim().is_empty() || data.email.trim().is_empty() || data.password.is_empty() {
        return Err(AuthError::InvalidInput(
            "Username, email, and password are required".to_string(),
        ));
    }

    info!("Checking if user with email {} already exists", data.email);

    // Check if user with email or username already exists
    let existing_user = sqlx::query_as::<_, (Uuid,)>(
        "SELECT id FROM global.users WHERE email = $1 OR username = $2",
    )
    .bind(&data.email)
    .bind(&data.username)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Database error while checking existing user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    if existing_user.is_some() {
        info!("User with email {} already exists", data.email);
        return Err(AuthError::AlreadyExists(
            "Email or username already in use".to_string(),
        ));
    }

    info!("Creating new user with email {}", data.email);

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(data.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::InternalError(format!("Password hashing failed: {}", e))
        })?
        .to_string();

    // Create new user
    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO global.users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(&data.username)
    .bind(&data.email)
    .bind(&password_hash)
    .execute(pool)
    .await
    .map_err(|e| {
        error!("Failed to insert new user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    info!("User created successfully with ID: {}", user_id);

    // Generate token pair
    let tokens = generate_token_pair(&user_id).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    Ok(AuthResult {
        user_id,
        username: data.username,
        email: data.email,
        tokens,
    })
}

// User login service
pub async fn login(pool: &PgPool, data: LoginData) -> Result<AuthResult, AuthError> {
    info!("Attempting login for user with email: {}", data.email);

    // Find user by email
    let user = sqlx::query_as::<_, (Uuid, String, String, String)>(
        "SELECT id, username, email, password_hash FROM global.users WHERE email = $1 AND is_active = true",
    )
    .bind(&data.email)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Database error while fetching user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    let user = match user {
        Some(user) => user,
        None => {
            info!("No user found with email: {}", data.email);
            return Err(AuthError::InvalidCredentials);
        }
    };

    info!("User found, verifying password");

    // Verify password
    let parsed_hash = argon2::password_hash::PasswordHash::new(&user.3).map_err(|e| {
        error!("Failed to parse password hash: {}", e);
        AuthError::InvalidCredentials
    })?;

    let argon2 = Argon2::default();
    argon2
        .verify_password(data.password.as_bytes(), &parsed_hash)
        .map_err(|e| {
            info!("Password verification failed: {}", e);
            AuthError::InvalidCredentials
        })?;

    info!("Password verified successfully");

    // Mark the user online
    sqlx::query("UPDATE global.users SET is_online = true, last_seen = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user.0)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Failed to update online status: {}", e);
            AuthError::DatabaseError(e.to_string())
        })?;

    // Generate token pair
    let tokens = generate_token_pair(&user.0).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    info!("Login successful for user ID: {}", user.0);

    Ok(AuthResult {
        user_id: user.0,
        username: user.1,
        email: user.2,
        tokens,
    })
}

// User logout service
pub async fn logout(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    info!("Logging out user: {}", user_id);

    sqlx::query("UPDATE global.users SET is_online = false, last_seen = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Failed to update online status on logout: {}", e);
            AuthError::DatabaseError(e.to_string())
        })?;

    Ok(())
}
