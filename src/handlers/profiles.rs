// Child profiles under family and teacher accounts.

use axum::extract::{Path, Query};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager;
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult, CurrentUser};
use crate::services::catalog::plain_tsquery;

#[derive(Debug, Deserialize)]
pub struct ProfileCreate {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub avatar_id: Option<Uuid>,
    pub classroom_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub avatar_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListProfilesQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub avatar_url: Option<String>,
    pub classroom_name: Option<String>,
}

const PROFILE_SELECT: &str = "SELECT p.id, p.first_name, p.last_name, p.date_of_birth, \
     a.url AS avatar_url, c.name AS classroom_name \
     FROM profiles p \
     LEFT JOIN avatars a ON a.id = p.avatar_id \
     LEFT JOIN classrooms c ON c.id = p.classroom_id";

/// POST /api/v1/profiles
pub async fn create_profile(
    CurrentUser(user): CurrentUser,
    Json(body): Json<ProfileCreate>,
) -> ApiResult<ProfileResponse> {
    let pool = manager::pool().await?;

    if let Some(avatar_id) = body.avatar_id {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM avatars WHERE id = $1)")
                .bind(avatar_id)
                .fetch_one(&pool)
                .await?;
        if !exists {
            return Err(ApiError::not_found("Avatar not found"));
        }
    }

    let (profile_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO profiles (user_id, first_name, last_name, date_of_birth, avatar_id, classroom_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(user.id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(body.date_of_birth)
    .bind(body.avatar_id)
    .bind(body.classroom_id)
    .fetch_one(&pool)
    .await?;

    let profile = sqlx::query_as::<_, ProfileResponse>(&format!(
        "{} WHERE p.id = $1",
        PROFILE_SELECT
    ))
    .bind(profile_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(profile))
}

/// GET /api/v1/profiles - the caller's family profiles (not enrolled in a
/// classroom)
pub async fn list_own_profiles(
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<ProfileResponse>> {
    let pool = manager::pool().await?;
    let profiles = sqlx::query_as::<_, ProfileResponse>(&format!(
        "{} WHERE p.user_id = $1 AND p.classroom_id IS NULL ORDER BY p.created_at",
        PROFILE_SELECT
    ))
    .bind(user.id)
    .fetch_all(&pool)
    .await?;
    Ok(ApiResponse::success(profiles))
}

/// GET /api/v1/profiles/all - admin listing with optional name search
/// ranked by the database's text-search functions.
pub async fn list_all_profiles(
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListProfilesQuery>,
) -> ApiResult<Vec<ProfileResponse>> {
    let pool = manager::pool().await?;
    let limit = query.limit.unwrap_or(10);

    let profiles = match query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) => {
            let tsquery = plain_tsquery(q);
            sqlx::query_as::<_, ProfileResponse>(&format!(
                "{} WHERE to_tsvector('english', p.first_name || ' ' || p.last_name) \
                 @@ to_tsquery('english', $1) \
                 ORDER BY ts_rank_cd(to_tsvector('english', p.first_name || ' ' || p.last_name), \
                 to_tsquery('english', $1)) DESC \
                 OFFSET $2 LIMIT $3",
                PROFILE_SELECT
            ))
            .bind(tsquery)
            .bind(query.offset)
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ProfileResponse>(&format!(
                "{} ORDER BY p.created_at DESC OFFSET $1 LIMIT $2",
                PROFILE_SELECT
            ))
            .bind(query.offset)
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
    };

    Ok(ApiResponse::success(profiles))
}

/// GET /api/v1/profiles/{id} - admin lookup
pub async fn get_profile(
    AdminUser(_admin): AdminUser,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<ProfileResponse> {
    let pool = manager::pool().await?;
    let profile = sqlx::query_as::<_, ProfileResponse>(&format!(
        "{} WHERE p.id = $1",
        PROFILE_SELECT
    ))
    .bind(profile_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(ApiResponse::success(profile))
}

/// PATCH /api/v1/profiles/{id} - owner only; a foreign profile reads as
/// not found rather than forbidden.
pub async fn update_profile(
    CurrentUser(user): CurrentUser,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<ProfileUpdate>,
) -> ApiResult<ProfileResponse> {
    let pool = manager::pool().await?;

    let (owned,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1 AND user_id = $2)",
    )
    .bind(profile_id)
    .bind(user.id)
    .fetch_one(&pool)
    .await?;
    if !owned {
        return Err(ApiError::not_found("Profile not found"));
    }

    if let Some(avatar_id) = body.avatar_id {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM avatars WHERE id = $1)")
                .bind(avatar_id)
                .fetch_one(&pool)
                .await?;
        if !exists {
            return Err(ApiError::not_found("Avatar not found"));
        }
    }

    sqlx::query(
        "UPDATE profiles SET \
         first_name = COALESCE($2, first_name), \
         last_name = COALESCE($3, last_name), \
         date_of_birth = COALESCE($4, date_of_birth), \
         avatar_id = COALESCE($5, avatar_id), \
         updated_at = now() \
         WHERE id = $1",
    )
    .bind(profile_id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(body.date_of_birth)
    .bind(body.avatar_id)
    .execute(&pool)
    .await?;

    let profile = sqlx::query_as::<_, ProfileResponse>(&format!(
        "{} WHERE p.id = $1",
        PROFILE_SELECT
    ))
    .bind(profile_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(profile))
}

/// DELETE /api/v1/profiles/{id} - owner only
pub async fn delete_profile(
    CurrentUser(user): CurrentUser,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<()> {
    let pool = manager::pool().await?;
    let result = sqlx::query("DELETE FROM profiles WHERE id = $1 AND user_id = $2")
        .bind(profile_id)
        .bind(user.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Profile not found"));
    }
    Ok(ApiResponse::with_message((), "Profile deleted"))
}
