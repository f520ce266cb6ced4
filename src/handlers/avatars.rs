// Avatar catalog: admin-managed image URLs profiles can pick from.

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::Avatar;
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult, CurrentUser};
use crate::services::object_store;

#[derive(Debug, Deserialize)]
pub struct AvatarsCreate {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub id: Uuid,
    pub url: String,
}

/// POST /api/v1/avatars - bulk insert of freshly uploaded avatar images
pub async fn create_avatars(
    AdminUser(_admin): AdminUser,
    Json(body): Json<AvatarsCreate>,
) -> ApiResult<Vec<AvatarResponse>> {
    let pool = manager::pool().await?;

    let mut uploaded = Vec::with_capacity(body.urls.len());
    for url in &body.urls {
        let avatar =
            sqlx::query_as::<_, Avatar>("INSERT INTO avatars (url) VALUES ($1) RETURNING *")
                .bind(url)
                .fetch_one(&pool)
                .await?;
        uploaded.push(AvatarResponse {
            id: avatar.id,
            url: avatar.url,
        });
    }

    Ok(ApiResponse::success(uploaded))
}

/// GET /api/v1/avatars
pub async fn list_avatars(CurrentUser(_user): CurrentUser) -> ApiResult<Vec<AvatarResponse>> {
    let pool = manager::pool().await?;
    let avatars = sqlx::query_as::<_, Avatar>("SELECT * FROM avatars ORDER BY created_at")
        .fetch_all(&pool)
        .await?;

    Ok(ApiResponse::success(
        avatars
            .into_iter()
            .map(|a| AvatarResponse { id: a.id, url: a.url })
            .collect(),
    ))
}

/// DELETE /api/v1/avatars/{id} - removes the stored image too
pub async fn delete_avatar(
    AdminUser(_admin): AdminUser,
    Path(avatar_id): Path<Uuid>,
) -> ApiResult<()> {
    let pool = manager::pool().await?;

    let avatar = sqlx::query_as::<_, Avatar>("SELECT * FROM avatars WHERE id = $1")
        .bind(avatar_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Avatar not found"))?;

    object_store::store().delete_object(&avatar.url).await?;

    sqlx::query("DELETE FROM avatars WHERE id = $1")
        .bind(avatar_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::with_message((), "Avatar deleted"))
}
