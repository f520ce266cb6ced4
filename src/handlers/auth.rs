// Registration, logins (password, class code, Google, passwordless),
// password changes, and email verification.

use axum::Json;
use chrono::Duration;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, Claims, LoginLinkClaims};
use crate::config;
use crate::database::manager;
use crate::database::models::{user::SSO_PROVIDER_GOOGLE, Classroom, User};
use crate::error::{ApiError, ErrorCode};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::email;

#[derive(Debug, Deserialize, Validate)]
pub struct EmailPasswordCreds {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassCodeLogin {
    pub class_code: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub token: Option<String>,
    pub created_at: Option<String>,
    pub email_verified_at: Option<String>,
    pub is_new: Option<bool>,
    pub is_admin: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school: Option<String>,
    pub is_family_account: Option<bool>,
    pub is_teacher_account: Option<bool>,
}

impl UserResponse {
    pub fn from_user(user: &User, token: Option<String>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            token,
            created_at: Some(user.created_at.to_rfc3339()),
            email_verified_at: user.email_verified_at.map(|t| t.to_rfc3339()),
            is_new: None,
            is_admin: None,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            school: user.school.clone(),
            is_family_account: Some(user.is_family_account),
            is_teacher_account: Some(user.is_teacher_account),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClassCodeLoginResponse {
    pub token: String,
    pub class_code: String,
    pub class_id: Uuid,
    pub class_name: String,
    pub teacher_name: String,
}

#[derive(Debug, Serialize)]
pub struct EmailSuccess {
    pub message: String,
}

fn issue_token(user: &User) -> Result<String, ApiError> {
    Ok(auth::generate_access_token(&Claims::new(
        user.id,
        user.token_version,
    ))?)
}

/// POST /api/v1/auth/register
pub async fn register(Json(body): Json<EmailPasswordCreds>) -> ApiResult<UserResponse> {
    body.validate()?;
    let pool = manager::pool().await?;

    let hashed = auth::hash_password(&body.password)?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password) VALUES ($1, $2) RETURNING *",
    )
    .bind(&body.email)
    .bind(&hashed)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::validation(
            ErrorCode::DuplicateEntry,
            "This email is already registered with Wonderspaced.",
        ),
        _ => ApiError::from(e),
    })?;

    let token = issue_token(&user)?;
    Ok(ApiResponse::success(UserResponse::from_user(
        &user,
        Some(token),
    )))
}

/// POST /api/v1/auth/password-login
pub async fn password_login(Json(body): Json<EmailPasswordCreds>) -> ApiResult<UserResponse> {
    let pool = manager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| {
            ApiError::validation(
                ErrorCode::UnregisteredEmail,
                "Email hasn't been registered with us. Perhaps you want to sign up?",
            )
        })?;

    let password_ok = match &user.password {
        Some(hashed) => auth::verify_password(&body.password, hashed)?,
        None => false,
    };
    if !password_ok {
        return Err(ApiError::validation(
            ErrorCode::WrongPassword,
            "Wrong password. Please try again.",
        ));
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET last_login = now(), last_active = now() WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    let token = issue_token(&user)?;
    Ok(ApiResponse::success(UserResponse::from_user(
        &user,
        Some(token),
    )))
}

/// POST /api/v1/auth/class-code-login - students join through their
/// teacher's class code and act under the teacher's account.
pub async fn class_code_login(
    Json(body): Json<ClassCodeLogin>,
) -> ApiResult<ClassCodeLoginResponse> {
    let pool = manager::pool().await?;

    let classroom = sqlx::query_as::<_, Classroom>("SELECT * FROM classrooms WHERE code = $1")
        .bind(&body.class_code)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("No class has this code. Ask your teacher and try again.")
        })?;

    let teacher = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(classroom.user_id)
        .fetch_one(&pool)
        .await?;

    let token = issue_token(&teacher)?;
    let teacher_name = format!(
        "{} {}",
        teacher.first_name.as_deref().unwrap_or_default(),
        teacher.last_name.as_deref().unwrap_or_default()
    );

    Ok(ApiResponse::success(ClassCodeLoginResponse {
        token,
        class_code: classroom.code,
        class_id: classroom.id,
        class_name: classroom.name,
        teacher_name: teacher_name.trim().to_string(),
    }))
}

static GOOGLE_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    sub: String,
    email: String,
}

/// Validate a Google ID token against the tokeninfo endpoint and check the
/// audience matches one of our client ids.
async fn verify_google_token(id_token: &str) -> Result<GoogleTokenInfo, ApiError> {
    let response = GOOGLE_CLIENT
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Google tokeninfo request failed: {}", e);
            ApiError::internal_server_error()
        })?;

    if !response.status().is_success() {
        return Err(ApiError::unauthenticated("Invalid Google token"));
    }

    let info: GoogleTokenInfo = response.json().await.map_err(|e| {
        tracing::error!("Google tokeninfo decode failed: {}", e);
        ApiError::unauthenticated("Invalid Google token")
    })?;

    let allowed = &config::config().security.google_client_ids;
    if !allowed.iter().any(|id| id == &info.aud) {
        return Err(ApiError::unauthenticated("Invalid Google token"));
    }
    Ok(info)
}

/// POST /api/v1/auth/google - log in or sign up with a Google ID token.
/// Links a Google identity to the matching account on first use.
pub async fn google_auth(Json(body): Json<GoogleAuthRequest>) -> ApiResult<UserResponse> {
    let info = verify_google_token(&body.id_token).await?;
    let pool = manager::pool().await?;

    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&info.email)
        .fetch_optional(&pool)
        .await?;
    let is_new = existing.is_none();

    let user = match existing {
        Some(user) => {
            sqlx::query_as::<_, User>(
                "UPDATE users SET last_login = now(), last_active = now(), \
                 email_verified_at = COALESCE(email_verified_at, now()) \
                 WHERE id = $1 RETURNING *",
            )
            .bind(user.id)
            .fetch_one(&pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>(
                "INSERT INTO users (email, email_verified_at) VALUES ($1, now()) RETURNING *",
            )
            .bind(&info.email)
            .fetch_one(&pool)
            .await?
        }
    };

    sqlx::query(
        "INSERT INTO user_sso (user_id, provider, provider_id) VALUES ($1, $2, $3) \
         ON CONFLICT (provider, provider_id) DO NOTHING",
    )
    .bind(user.id)
    .bind(SSO_PROVIDER_GOOGLE)
    .bind(&info.sub)
    .execute(&pool)
    .await?;

    let token = issue_token(&user)?;
    let mut response = UserResponse::from_user(&user, Some(token));
    response.is_new = Some(is_new);
    Ok(ApiResponse::success(response))
}

/// POST /api/v1/auth/request-passwordless-login
pub async fn request_passwordless_login(
    Json(body): Json<SendEmailRequest>,
) -> ApiResult<EmailSuccess> {
    body.validate()?;
    let pool = manager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| {
            ApiError::validation(
                ErrorCode::UnregisteredEmail,
                "Email hasn't been registered with us. Perhaps you want to sign up?",
            )
        })?;

    let token = auth::generate_login_link_token(&LoginLinkClaims::new(user.email.clone()))?;
    let magic_link = email::login_link_url(&token);
    email::send_email(
        &user.email,
        "Passwordless Login",
        &email::passwordless_login_body(&magic_link),
    )
    .await?;

    Ok(ApiResponse::success(EmailSuccess {
        message: "Check your email for a login link.".to_string(),
    }))
}

/// POST /api/v1/auth/verify-passwordless-login - exchange a login-link
/// token for a normal session.
pub async fn verify_passwordless_login(
    Json(body): Json<VerifyTokenRequest>,
) -> ApiResult<UserResponse> {
    let claims = auth::decode_login_link_token(&body.token)?;
    let pool = manager::pool().await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET last_login = now(), last_active = now(), \
         email_verified_at = COALESCE(email_verified_at, now()) \
         WHERE email = $1 RETURNING *",
    )
    .bind(&claims.sub)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::unauthenticated("User not found"))?;

    let token = issue_token(&user)?;
    Ok(ApiResponse::success(UserResponse::from_user(
        &user,
        Some(token),
    )))
}

/// POST /api/v1/auth/change-password - bumps the token version so every
/// previously issued token is invalidated.
pub async fn change_password(
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<UserResponse> {
    body.validate()?;
    if body.password1 != body.password2 {
        return Err(ApiError::validation(
            ErrorCode::ValuesDontMatch,
            "Passwords don't match",
        ));
    }

    let pool = manager::pool().await?;
    let hashed = auth::hash_password(&body.password1)?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET password = $2, token_version = token_version + 1 \
         WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .bind(&hashed)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(UserResponse::from_user(&user, None)))
}

/// POST /api/v1/auth/request-email-verification
pub async fn request_email_verification(
    CurrentUser(user): CurrentUser,
) -> ApiResult<EmailSuccess> {
    if user.email_verified_at.is_some() {
        return Err(ApiError::validation(
            ErrorCode::AlreadyVerified,
            "Email already verified.",
        ));
    }

    let expiry_hours = config::config().security.email_verification_expiry_hours;
    let claims = Claims::with_expiry(
        user.id,
        user.token_version,
        Duration::hours(expiry_hours as i64),
    );
    let token = auth::generate_access_token(&claims)?;
    let magic_link = email::verify_email_link_url(&token);
    email::send_email(
        &user.email,
        "Email Verification",
        &email::email_verification_body(&magic_link),
    )
    .await?;

    Ok(ApiResponse::success(EmailSuccess {
        message: "Check your email for a verification link.".to_string(),
    }))
}

/// POST /api/v1/auth/verify-email - token arrives in the body, bounced off
/// the email link by the mobile app.
pub async fn verify_email(Json(body): Json<VerifyTokenRequest>) -> ApiResult<UserResponse> {
    let user = crate::middleware::auth::user_from_token(&body.token).await?;
    if user.email_verified_at.is_some() {
        return Err(ApiError::validation(
            ErrorCode::AlreadyVerified,
            "Email already verified.",
        ));
    }

    let pool = manager::pool().await?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET email_verified_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(UserResponse::from_user(&user, None)))
}
