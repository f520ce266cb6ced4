// Per-profile library: in-progress, finished, and saved rails plus the
// achievement counts.

use axum::extract::Query;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::catalog::AdventurePreview;
use crate::services::progress::{self, ExplorerFilter, ExplorerParams};
use crate::services::stats::{self, ProfileStats};

#[derive(Debug, Deserialize)]
pub struct MyExplorerQuery {
    pub profile_id: Uuid,
    pub q: Option<String>,
    /// "video" or "ebook"
    pub content_type: Option<String>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MyExplorerResponse {
    pub adventures: Vec<AdventurePreview>,
}

async fn list(
    query: &MyExplorerQuery,
    filter: ExplorerFilter,
) -> Result<Vec<AdventurePreview>, ApiError> {
    let pool = manager::pool().await?;
    Ok(progress::list_explorer_adventures(
        &pool,
        query.profile_id,
        filter,
        &ExplorerParams {
            q: query.q.clone(),
            content_type: query.content_type.clone(),
            offset: query.offset,
            limit: query.limit.unwrap_or(10),
        },
    )
    .await?)
}

/// GET /api/v1/my-explorer-tab/in-progress
pub async fn in_progress(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<MyExplorerQuery>,
) -> ApiResult<MyExplorerResponse> {
    let adventures = list(&query, ExplorerFilter::InProgress).await?;
    Ok(ApiResponse::success(MyExplorerResponse { adventures }))
}

/// GET /api/v1/my-explorer-tab/finished
pub async fn finished(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<MyExplorerQuery>,
) -> ApiResult<MyExplorerResponse> {
    let adventures = list(&query, ExplorerFilter::Finished).await?;
    Ok(ApiResponse::success(MyExplorerResponse { adventures }))
}

/// GET /api/v1/my-explorer-tab/saved
pub async fn saved(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<MyExplorerQuery>,
) -> ApiResult<MyExplorerResponse> {
    let adventures = list(&query, ExplorerFilter::SavedForLater).await?;
    Ok(ApiResponse::success(MyExplorerResponse { adventures }))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub profile_id: Uuid,
}

/// GET /api/v1/my-explorer-tab/stats
pub async fn profile_stats(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<StatsQuery>,
) -> ApiResult<ProfileStats> {
    let pool = manager::pool().await?;
    let stats = stats::profile_stats(&pool, query.profile_id).await?;
    Ok(ApiResponse::success(stats))
}
