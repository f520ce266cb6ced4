use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};

use crate::auth;
use crate::database::manager;
use crate::database::models::User;
use crate::error::ApiError;

/// Authenticated user loaded from the bearer token. The embedded token
/// version must still match `users.token_version`, so password changes and
/// forced logouts invalidate older tokens.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authenticated user that must also carry the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// Trusted backend caller holding the video processor shared secret.
#[derive(Debug, Clone, Copy)]
pub struct VideoProcessorAuth;

/// Trusted backend caller holding the ebook processor shared secret.
#[derive(Debug, Clone, Copy)]
pub struct EbookProcessorAuth;

/// Either an admin user or the video processor secret; used by delete
/// endpoints the processor may call during cleanup.
#[derive(Debug, Clone)]
pub struct AdminOrVideoProcessor(pub Option<User>);

/// Either an admin user or the ebook processor secret.
#[derive(Debug, Clone)]
pub struct AdminOrEbookProcessor(pub Option<User>);

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthenticated("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthenticated("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::unauthenticated(
            "Authorization header must use Bearer token format",
        )),
    }
}

/// Decode an access token, load the referenced user, and enforce the token
/// version check. Shared by the user and admin extractors.
pub async fn user_from_token(token: &str) -> Result<User, ApiError> {
    let claims = auth::decode_access_token(token)?;

    let pool = manager::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("User not found"))?;

    if user.token_version != claims.ver {
        return Err(ApiError::token_expired());
    }

    Ok(user)
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = user_from_token(&token).await?;
        Ok(CurrentUser(user))
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = user_from_token(&token).await?;
        if !user.is_admin {
            tracing::warn!("Non-admin user {} hit an admin route", user.id);
            return Err(ApiError::forbidden());
        }
        Ok(AdminUser(user))
    }
}

fn check_processor_secret(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let token = bearer_token(headers)?;
    if !auth::secrets_match(&token, expected) {
        return Err(ApiError::forbidden());
    }
    Ok(())
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for VideoProcessorAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = &crate::config::config().security.video_processor_token;
        check_processor_secret(&parts.headers, expected)?;
        Ok(VideoProcessorAuth)
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for EbookProcessorAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = &crate::config::config().security.ebook_processor_token;
        check_processor_secret(&parts.headers, expected)?;
        Ok(EbookProcessorAuth)
    }
}

async fn admin_or_processor(parts: &Parts, expected: &str) -> Result<Option<User>, ApiError> {
    if check_processor_secret(&parts.headers, expected).is_ok() {
        return Ok(None);
    }

    let token = bearer_token(&parts.headers)?;
    let user = user_from_token(&token).await?;
    if !user.is_admin {
        return Err(ApiError::forbidden());
    }
    Ok(Some(user))
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AdminOrVideoProcessor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = &crate::config::config().security.video_processor_token;
        Ok(AdminOrVideoProcessor(admin_or_processor(parts, expected).await?))
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AdminOrEbookProcessor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = &crate::config::config().security.ebook_processor_token;
        Ok(AdminOrEbookProcessor(admin_or_processor(parts, expected).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_requires_scheme() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers_with("Basic abc")).is_err());
        assert!(bearer_token(&headers_with("Bearer ")).is_err());
        assert_eq!(bearer_token(&headers_with("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn processor_secret_must_match() {
        let headers = headers_with("Bearer processor-secret");
        assert!(check_processor_secret(&headers, "processor-secret").is_ok());
        assert!(check_processor_secret(&headers, "other-secret").is_err());
        // An empty configured secret never authenticates anything
        assert!(check_processor_secret(&headers_with("Bearer "), "").is_err());
    }
}
