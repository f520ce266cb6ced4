// Videos-tab and ebooks-tab rails: discover-new, the themes that actually
// have content of that kind, and (for videos) the series list.

use axum::extract::Query;
use serde::{Deserialize, Serialize};

use crate::database::manager;
use crate::database::models::{Series, Theme};
use crate::handlers::series::SeriesResponse;
use crate::handlers::themes::ThemeSchema;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::catalog::{self, AdventurePreview, ListParams};

#[derive(Debug, Deserialize)]
pub struct TabQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverVideosResponse {
    pub videos: Vec<AdventurePreview>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverEbooksResponse {
    pub ebooks: Vec<AdventurePreview>,
}

#[derive(Debug, Serialize)]
pub struct TabThemesResponse {
    pub themes: Vec<ThemeSchema>,
}

#[derive(Debug, Serialize)]
pub struct TabSeriesResponse {
    pub series: Vec<SeriesResponse>,
}

fn list_params(query: &TabQuery) -> ListParams {
    ListParams {
        q: query.q.clone(),
        series: None,
        theme: None,
        offset: query.offset,
        limit: query.limit.unwrap_or(10),
    }
}

/// GET /api/v1/videos-tab/discover-new
pub async fn videos_discover_new(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<TabQuery>,
) -> ApiResult<DiscoverVideosResponse> {
    let pool = manager::pool().await?;
    let videos = catalog::list_new_videos(&pool, &list_params(&query)).await?;
    Ok(ApiResponse::success(DiscoverVideosResponse { videos }))
}

/// GET /api/v1/videos-tab/themes - themes with at least one video
/// adventure
pub async fn videos_themes(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<TabQuery>,
) -> ApiResult<TabThemesResponse> {
    let pool = manager::pool().await?;
    let themes = sqlx::query_as::<_, Theme>(
        "SELECT DISTINCT t.* FROM themes t \
         JOIN adventure_themes at ON at.theme_id = t.id \
         JOIN videos v ON v.adventure_id = at.adventure_id \
         ORDER BY t.name OFFSET $1 LIMIT $2",
    )
    .bind(query.offset)
    .bind(query.limit.unwrap_or(10))
    .fetch_all(&pool)
    .await?;
    Ok(ApiResponse::success(TabThemesResponse {
        themes: themes.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/videos-tab/series
pub async fn videos_series(CurrentUser(_user): CurrentUser) -> ApiResult<TabSeriesResponse> {
    let pool = manager::pool().await?;
    let series =
        sqlx::query_as::<_, Series>("SELECT * FROM series WHERE content = 'video' ORDER BY name")
            .fetch_all(&pool)
            .await?;
    Ok(ApiResponse::success(TabSeriesResponse {
        series: series.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/ebooks-tab/discover-new
pub async fn ebooks_discover_new(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<TabQuery>,
) -> ApiResult<DiscoverEbooksResponse> {
    let pool = manager::pool().await?;
    let ebooks = catalog::list_new_ebooks(&pool, &list_params(&query)).await?;
    Ok(ApiResponse::success(DiscoverEbooksResponse { ebooks }))
}

/// GET /api/v1/ebooks-tab/themes - themes with at least one ebook
/// adventure
pub async fn ebooks_themes(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<TabQuery>,
) -> ApiResult<TabThemesResponse> {
    let pool = manager::pool().await?;
    let themes = sqlx::query_as::<_, Theme>(
        "SELECT DISTINCT t.* FROM themes t \
         JOIN adventure_themes at ON at.theme_id = t.id \
         JOIN ebooks e ON e.adventure_id = at.adventure_id \
         ORDER BY t.name OFFSET $1 LIMIT $2",
    )
    .bind(query.offset)
    .bind(query.limit.unwrap_or(10))
    .fetch_all(&pool)
    .await?;
    Ok(ApiResponse::success(TabThemesResponse {
        themes: themes.into_iter().map(Into::into).collect(),
    }))
}
