// Account management: admin listing, profile-field updates, and the
// account-type teardown endpoints.

use axum::extract::Query;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::database::manager;
use crate::database::models::User;
use crate::error::{ApiError, ErrorCode};
use crate::handlers::auth::UserResponse;
use crate::middleware::{AdminUser, ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    pub is_family_account: Option<bool>,
    pub is_teacher_account: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school: Option<String>,
}

/// GET /api/v1/users - admin listing, newest first
pub async fn list_users(
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Vec<UserResponse>> {
    let pool = manager::pool().await?;
    let limit = query.limit.unwrap_or(10);

    let users = match query.is_admin {
        Some(is_admin) => {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE is_admin = $1 \
                 ORDER BY created_at DESC OFFSET $2 LIMIT $3",
            )
            .bind(is_admin)
            .bind(query.offset)
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users ORDER BY created_at DESC OFFSET $1 LIMIT $2",
            )
            .bind(query.offset)
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
    };

    let responses = users
        .iter()
        .map(|user| {
            let mut response = UserResponse::from_user(user, None);
            response.is_admin = Some(user.is_admin);
            response
        })
        .collect();
    Ok(ApiResponse::success(responses))
}

/// PATCH /api/v1/users - partial update. Changing email re-requires
/// verification, invalidates existing tokens, and unlinks SSO identities.
pub async fn update_user(
    CurrentUser(user): CurrentUser,
    Json(body): Json<UserUpdate>,
) -> ApiResult<UserResponse> {
    body.validate()?;
    let pool = manager::pool().await?;

    if let Some(email) = &body.email {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
                .bind(email)
                .bind(user.id)
                .fetch_one(&pool)
                .await?;
        if taken {
            return Err(ApiError::validation(
                ErrorCode::DuplicateEntry,
                "Someone else is using this email.",
            ));
        }

        sqlx::query(
            "UPDATE users SET email = $2, email_verified_at = NULL, \
             token_version = token_version + 1, updated_at = now() WHERE id = $1",
        )
        .bind(user.id)
        .bind(email)
        .execute(&pool)
        .await?;

        sqlx::query("DELETE FROM user_sso WHERE user_id = $1")
            .bind(user.id)
            .execute(&pool)
            .await?;
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET \
         first_name = COALESCE($2, first_name), \
         last_name = COALESCE($3, last_name), \
         school = COALESCE($4, school), \
         is_family_account = COALESCE($5, is_family_account), \
         is_teacher_account = COALESCE($6, is_teacher_account), \
         updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.school)
    .bind(body.is_family_account)
    .bind(body.is_teacher_account)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(UserResponse::from_user(&user, None)))
}

/// DELETE /api/v1/users - delete own account; the schema cascades to
/// profiles, classrooms, and everything beneath them.
pub async fn delete_user(CurrentUser(user): CurrentUser) -> ApiResult<()> {
    let pool = manager::pool().await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await?;
    Ok(ApiResponse::with_message((), "User deleted"))
}

/// DELETE /api/v1/users/family-account - drop the family flag and the
/// family (classroom-less) profiles under it.
pub async fn delete_family_account(CurrentUser(user): CurrentUser) -> ApiResult<()> {
    if !user.is_family_account {
        return Err(ApiError::validation(
            ErrorCode::ValidationError,
            "You don't have a family account",
        ));
    }

    let pool = manager::pool().await?;
    let mut tx = pool.begin().await.map_err(ApiError::from)?;
    sqlx::query("UPDATE users SET is_family_account = FALSE, updated_at = now() WHERE id = $1")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM profiles WHERE user_id = $1 AND classroom_id IS NULL")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await.map_err(ApiError::from)?;

    Ok(ApiResponse::with_message((), "Family account deleted"))
}

/// DELETE /api/v1/users/teacher-account - drop the teacher flag and the
/// user's classrooms (cascades to enrolled student profiles).
pub async fn delete_teacher_account(CurrentUser(user): CurrentUser) -> ApiResult<()> {
    if !user.is_teacher_account {
        return Err(ApiError::validation(
            ErrorCode::ValidationError,
            "You don't have a teacher account",
        ));
    }

    let pool = manager::pool().await?;
    let mut tx = pool.begin().await.map_err(ApiError::from)?;
    sqlx::query("UPDATE users SET is_teacher_account = FALSE, updated_at = now() WHERE id = $1")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM classrooms WHERE user_id = $1")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await.map_err(ApiError::from)?;

    Ok(ApiResponse::with_message((), "Teacher account deleted"))
}
