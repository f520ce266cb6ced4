use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Claims carried by access tokens. `ver` mirrors `users.token_version`;
/// bumping the column invalidates every previously issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub ver: i32,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, token_version: i32) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_expiry(user_id, token_version, Duration::hours(expiry_hours as i64))
    }

    pub fn with_expiry(user_id: Uuid, token_version: i32, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            ver: token_version,
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Claims for passwordless login-link tokens. These identify the user by
/// email and are only accepted by the link-verification endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginLinkClaims {
    pub sub: String,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

pub const LOGIN_LINK_PURPOSE: &str = "login-link";

impl LoginLinkClaims {
    pub fn new(email: String) -> Self {
        let now = Utc::now();
        let expiry_minutes = config::config().security.login_link_expiry_minutes;
        Self {
            sub: email,
            purpose: LOGIN_LINK_PURPOSE.to_string(),
            exp: (now + Duration::minutes(expiry_minutes as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("Token generation error: {0}")]
    TokenGeneration(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Password hashing error: {0}")]
    Hashing(String),
}

impl From<AuthError> for crate::error::ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => crate::error::ApiError::token_expired(),
            AuthError::InvalidToken(_) => {
                crate::error::ApiError::invalid_token("Invalid or expired token")
            }
            other => {
                tracing::error!("Auth error: {}", other);
                crate::error::ApiError::internal_server_error()
            }
        }
    }
}

fn secret() -> Result<&'static [u8], AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret.as_bytes())
}

pub fn generate_access_token(claims: &Claims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret()?);
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_access_token(token: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret()?);
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(map_decode_error)
}

pub fn generate_login_link_token(claims: &LoginLinkClaims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret()?);
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_login_link_token(token: &str) -> Result<LoginLinkClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret()?);
    let claims = decode::<LoginLinkClaims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(map_decode_error)?;
    if claims.purpose != LOGIN_LINK_PURPOSE {
        return Err(AuthError::InvalidToken("wrong token purpose".to_string()));
    }
    Ok(claims)
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hashed).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Constant-time equality for shared-secret processor tokens.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    if expected.is_empty() || provided.len() != expected.len() {
        return false;
    }
    provided
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_secret() {
        std::env::set_var("JWT_SECRET", "test-secret");
        // CONFIG is lazy; setting the var before first access is enough in tests
        let _ = config::config();
    }

    #[test]
    fn access_token_roundtrip() {
        set_secret();
        let user_id = Uuid::new_v4();
        let claims = Claims::with_expiry(user_id, 3, Duration::hours(1));
        let token = generate_access_token(&claims).unwrap();
        let decoded = decode_access_token(&token).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.ver, 3);
    }

    #[test]
    fn expired_access_token_is_rejected() {
        set_secret();
        let claims = Claims::with_expiry(Uuid::new_v4(), 0, Duration::hours(-2));
        let token = generate_access_token(&claims).unwrap();
        assert!(matches!(
            decode_access_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn login_link_token_rejected_as_access_token() {
        set_secret();
        let link = LoginLinkClaims::new("kid@example.com".to_string());
        let token = generate_login_link_token(&link).unwrap();
        // Access-token decode expects a UUID subject
        assert!(decode_access_token(&token).is_err());

        let decoded = decode_login_link_token(&token).unwrap();
        assert_eq!(decoded.sub, "kid@example.com");
    }

    #[test]
    fn password_hash_roundtrip() {
        let hashed = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hashed).unwrap());
        assert!(!verify_password("hunter3", &hashed).unwrap());
    }

    #[test]
    fn secret_comparison_rejects_mismatches() {
        assert!(secrets_match("abc123", "abc123"));
        assert!(!secrets_match("abc124", "abc123"));
        assert!(!secrets_match("abc12", "abc123"));
        assert!(!secrets_match("", ""));
    }
}
