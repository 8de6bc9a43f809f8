use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Distinguishes the two tokens of a login pair
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn from_str(token_type: &str) -> Result<Self, String> {
        match token_type.to_lowercase().as_str() {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            _ => Err(format!("Invalid token type: {}", token_type)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,           // Subject (user ID)
    pub token_type: TokenType, // Access or refresh
    pub exp: usize,            // Expiration time
    pub iat: usize,            // Issued at
}

/// Access + refresh tokens issued together on register/login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

const ACCESS_TOKEN_HOURS: i64 = 24;
const REFRESH_TOKEN_DAYS: i64 = 7;

fn generate_token(user_id: &Uuid, token_type: TokenType) -> Result<String, JwtError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let now = Utc::now();
    let expiry = match token_type {
        TokenType::Access => now + Duration::hours(ACCESS_TOKEN_HOURS),
        TokenType::Refresh => now + Duration::days(REFRESH_TOKEN_DAYS),
    };

    let claims = Claims {
        sub: user_id.to_string(),
        token_type,
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|_| JwtError::TokenCreation)
}

/// Generate the access/refresh pair for a user
pub fn generate_token_pair(user_id: &Uuid) -> Result<TokenPair, JwtError> {
    Ok(TokenPair {
        access: generate_token(user_id, TokenType::Access)?,
        refresh: generate_token(user_id, TokenType::Refresh)?,
    })
}

/// Validate a JWT token and extract claims
pub fn validate_token(token: &str) -> Result<Claims, JwtError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_e| JwtError::InvalidToken)?;

    Ok(token_data.claims)
}

#[derive(Debug)]
pub enum JwtError {
    MissingSecret,
    TokenCreation,
    InvalidToken,
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::MissingSecret => write!(f, "JWT secret is missing or not set"),
            JwtError::TokenCreation => write!(f, "Failed to create JWT token"),
            JwtError::InvalidToken => write!(f, "Invalid or expired JWT token"),
        }
    }
}

impl From<JwtError> for StatusCode {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_token_type_from_str() {
        assert_eq!(TokenType::from_str("access").unwrap(), TokenType::Access);
        assert_eq!(TokenType::from_str("refresh").unwrap(), TokenType::Refresh);
        assert_eq!(TokenType::from_str("ACCESS").unwrap(), TokenType::Access);
        assert!(TokenType::from_str("invalid").is_err());
    }

    #[test]
    fn test_token_type_as_str() {
        assert_eq!(TokenType::Access.as_str(), "access");
        assert_eq!(TokenType::Refresh.as_str(), "refresh");
    }

    #[test]
    fn test_token_pair_generation_and_validation() {
        env::set_var("JWT_SECRET", "test_secret");

        let user_id = Uuid::new_v4();

        let pair = generate_token_pair(&user_id).expect("Token generation failed");
        assert!(!pair.access.is_empty());
        assert!(!pair.refresh.is_empty());
        assert_ne!(pair.access, pair.refresh);

        let access_claims = validate_token(&pair.access).expect("Access validation failed");
        assert_eq!(access_claims.sub, user_id.to_string());
        assert_eq!(access_claims.token_type, TokenType::Access);

        let refresh_claims = validate_token(&pair.refresh).expect("Refresh validation failed");
        assert_eq!(refresh_claims.sub, user_id.to_string());
        assert_eq!(refresh_claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_refresh_expires_after_access() {
        env::set_var("JWT_SECRET", "test_secret");

        let user_id = Uuid::new_v4();
        let pair = generate_token_pair(&user_id).unwrap();

        let access = validate_token(&pair.access).unwrap();
        let refresh = validate_token(&pair.refresh).unwrap();
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_jwt_error_conversion() {
        use axum::http::StatusCode;

        assert_eq!(
            StatusCode::from(JwtError::MissingSecret),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::TokenCreation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::InvalidToken),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_token_tampering() {
        env::set_var("JWT_SECRET", "test_secret");
        let user_id = Uuid::new_v4();

        let pair = generate_token_pair(&user_id).unwrap();

        let parts: Vec<&str> = pair.access.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");

        let tampered_token = format!("{}.{}tampered.{}", parts[0], parts[1], parts[2]);

        let result = validate_token(&tampered_token);
        assert!(result.is_err());
        match result {
            Err(JwtError::InvalidToken) => {} // Expected
            _ => panic!("Expected InvalidToken error"),
        }
    }

    #[test]
    fn test_malformed_tokens() {
        env::set_var("JWT_SECRET", "test_secret");

        let malformed_tokens = [
            "",                          // Empty token
            "not.a.jwt.token",           // Too many segments
            "missing.segments",          // Too few segments
            "invalid base64.parts.here", // Invalid base64
            "eyJhbGciOiJIUzI1NiJ9",      // Header only
        ];

        for token in &malformed_tokens {
            let result = validate_token(token);
            assert!(result.is_err(), "Token '{}' should be rejected", token);
            match result {
                Err(JwtError::InvalidToken) => {} // Expected
                _ => panic!("Expected InvalidToken error for '{}'", token),
            }
        }
    }

    #[test]
    fn test_claims_issued_and_expiry_times() {
        env::set_var("JWT_SECRET", "test_secret");
        let user_id = Uuid::new_v4();

        let now = chrono::Utc::now().timestamp() as usize;
        let pair = generate_token_pair(&user_id).unwrap();
        let claims = validate_token(&pair.access).unwrap();

        assert!(
            claims.iat <= now + 1 && claims.iat >= now - 1,
            "Issued at time should be close to current time"
        );

        let expected_expiry = now + (24 * 60 * 60);
        assert!(
            claims.exp <= expected_expiry + 5 && claims.exp >= expected_expiry - 5,
            "Expiry should be approximately 24 hours from now"
        );
    }

    #[test]
    fn test_uuid_conversion_in_claims() {
        env::set_var("JWT_SECRET", "test_secret");

        let user_id = Uuid::new_v4();
        let pair = generate_token_pair(&user_id).unwrap();
        let claims = validate_token(&pair.access).unwrap();
        assert_eq!(claims.sub, user_id.to_string());

        let nil_uuid = Uuid::nil();
        let pair = generate_token_pair(&nil_uuid).unwrap();
        let claims = validate_token(&pair.access).unwrap();
        assert_eq!(claims.sub, nil_uuid.to_string());
    }

    #[test]
    fn test_token_type_serialization_consistency() {
        for token_type in [TokenType::Access, TokenType::Refresh] {
            let serialized =
                serde_json::to_string(&token_type).expect("Failed to serialize token type");
            let deserialized: TokenType =
                serde_json::from_str(&serialized).expect("Failed to deserialize token type");

            assert_eq!(token_type, deserialized);
        }
    }
}
