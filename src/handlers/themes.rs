// Theme tags: admin-managed labels with optional icons, attached to
// adventures through the join table.

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::Theme;
use crate::error::{ApiError, ErrorCode};
use crate::middleware::{AdminUser, ApiResponse, ApiResult, CurrentUser};
use crate::services::object_store;

#[derive(Debug, Deserialize)]
pub struct ThemeCreate {
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThemeSchema {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
}

impl From<Theme> for ThemeSchema {
    fn from(theme: Theme) -> Self {
        Self {
            id: theme.id,
            name: theme.name,
            icon: theme.icon,
        }
    }
}

/// POST /api/v1/themes - names are unique ignoring case
pub async fn create_theme(
    AdminUser(_admin): AdminUser,
    Json(body): Json<ThemeCreate>,
) -> ApiResult<ThemeSchema> {
    let pool = manager::pool().await?;

    let theme = sqlx::query_as::<_, Theme>(
        "INSERT INTO themes (name, icon) VALUES ($1, $2) RETURNING *",
    )
    .bind(&body.name)
    .bind(&body.icon)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::validation(
            ErrorCode::DuplicateEntry,
            "A theme with this name already exists.",
        ),
        _ => ApiError::from(e),
    })?;

    Ok(ApiResponse::success(theme.into()))
}

/// GET /api/v1/themes
pub async fn list_themes(CurrentUser(_user): CurrentUser) -> ApiResult<Vec<ThemeSchema>> {
    let pool = manager::pool().await?;
    let themes = sqlx::query_as::<_, Theme>("SELECT * FROM themes ORDER BY name")
        .fetch_all(&pool)
        .await?;
    Ok(ApiResponse::success(
        themes.into_iter().map(Into::into).collect(),
    ))
}

/// DELETE /api/v1/themes/{id} - drops the icon object and cascades the
/// adventure assignments
pub async fn delete_theme(
    AdminUser(_admin): AdminUser,
    Path(theme_id): Path<Uuid>,
) -> ApiResult<()> {
    let pool = manager::pool().await?;

    let theme = sqlx::query_as::<_, Theme>("SELECT * FROM themes WHERE id = $1")
        .bind(theme_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Theme not found"))?;

    if let Some(icon) = &theme.icon {
        object_store::delete_object_best_effort(icon).await;
    }

    sqlx::query("DELETE FROM themes WHERE id = $1")
        .bind(theme_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::with_message((), "Theme deleted"))
}
