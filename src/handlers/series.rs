// Series group adventures of one content kind (video or ebook).

use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::Series;
use crate::error::{ApiError, ErrorCode};
use crate::middleware::{AdminUser, ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct SeriesCreate {
    pub name: String,
    /// "video" or "ebook"
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ListSeriesQuery {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub id: Uuid,
    pub name: String,
    pub content: String,
}

impl From<Series> for SeriesResponse {
    fn from(series: Series) -> Self {
        Self {
            id: series.id,
            name: series.name,
            content: series.content,
        }
    }
}

/// POST /api/v1/series
pub async fn create_series(
    AdminUser(_admin): AdminUser,
    Json(body): Json<SeriesCreate>,
) -> ApiResult<SeriesResponse> {
    if !matches!(body.content.as_str(), "video" | "ebook") {
        return Err(ApiError::validation(
            ErrorCode::ValidationError,
            "Series content must be 'video' or 'ebook'",
        ));
    }

    let pool = manager::pool().await?;
    let series = sqlx::query_as::<_, Series>(
        "INSERT INTO series (name, content) VALUES ($1, $2) RETURNING *",
    )
    .bind(&body.name)
    .bind(&body.content)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(series.into()))
}

/// GET /api/v1/series - optional content-type filter
pub async fn list_series(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListSeriesQuery>,
) -> ApiResult<Vec<SeriesResponse>> {
    let pool = manager::pool().await?;

    let series = match &query.content {
        Some(content) => {
            sqlx::query_as::<_, Series>(
                "SELECT * FROM series WHERE content = $1 ORDER BY name",
            )
            .bind(content)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Series>("SELECT * FROM series ORDER BY name")
                .fetch_all(&pool)
                .await?
        }
    };

    Ok(ApiResponse::success(
        series.into_iter().map(Into::into).collect(),
    ))
}
