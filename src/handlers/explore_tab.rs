// Explore tab rails: fresh videos and ebooks, the profile's in-progress
// row, and the DIY series.

use axum::extract::Query;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::catalog::{self, AdventurePreview, ListParams};
use crate::services::progress::{self, ExplorerFilter, ExplorerParams};

const DIY_SERIES_NAME: &str = "DIY";

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub q: Option<String>,
    pub profile_id: Option<Uuid>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ExploreVideosResponse {
    pub videos: Vec<AdventurePreview>,
}

#[derive(Debug, Serialize)]
pub struct ExploreEbooksResponse {
    pub ebooks: Vec<AdventurePreview>,
}

#[derive(Debug, Serialize)]
pub struct ExploreAdventuresResponse {
    pub adventures: Vec<AdventurePreview>,
}

fn list_params(query: &ExploreQuery) -> ListParams {
    ListParams {
        q: query.q.clone(),
        series: None,
        theme: None,
        offset: query.offset,
        limit: query.limit.unwrap_or(10),
    }
}

/// GET /api/v1/explore-tab/videos
pub async fn explore_videos(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ExploreQuery>,
) -> ApiResult<ExploreVideosResponse> {
    let pool = manager::pool().await?;
    let videos = catalog::list_new_videos(&pool, &list_params(&query)).await?;
    Ok(ApiResponse::success(ExploreVideosResponse { videos }))
}

/// GET /api/v1/explore-tab/ebooks
pub async fn explore_ebooks(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ExploreQuery>,
) -> ApiResult<ExploreEbooksResponse> {
    let pool = manager::pool().await?;
    let ebooks = catalog::list_new_ebooks(&pool, &list_params(&query)).await?;
    Ok(ApiResponse::success(ExploreEbooksResponse { ebooks }))
}

/// GET /api/v1/explore-tab/in-progress - empty without a profile_id
pub async fn explore_in_progress(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ExploreQuery>,
) -> ApiResult<ExploreAdventuresResponse> {
    let adventures = match query.profile_id {
        Some(profile_id) => {
            let pool = manager::pool().await?;
            progress::list_explorer_adventures(
                &pool,
                profile_id,
                ExplorerFilter::InProgress,
                &ExplorerParams {
                    q: query.q.clone(),
                    content_type: None,
                    offset: query.offset,
                    limit: query.limit.unwrap_or(10),
                },
            )
            .await?
        }
        None => vec![],
    };
    Ok(ApiResponse::success(ExploreAdventuresResponse { adventures }))
}

/// GET /api/v1/explore-tab/diys - adventures in the DIY series
pub async fn explore_diys(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ExploreQuery>,
) -> ApiResult<ExploreAdventuresResponse> {
    let pool = manager::pool().await?;
    let adventures =
        catalog::list_series_adventures(&pool, DIY_SERIES_NAME, &list_params(&query)).await?;
    Ok(ApiResponse::success(ExploreAdventuresResponse { adventures }))
}
