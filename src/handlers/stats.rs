// Admin stats: per-adventure engagement and a platform overview.

use axum::extract::Path;
use uuid::Uuid;

use crate::database::manager;
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::services::stats::{self, AdventureStats, OverviewStats};

/// GET /api/v1/stats/adventures/{id}
pub async fn adventure_stats(
    AdminUser(_admin): AdminUser,
    Path(adventure_id): Path<Uuid>,
) -> ApiResult<AdventureStats> {
    let pool = manager::pool().await?;

    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM adventures WHERE id = $1)")
            .bind(adventure_id)
            .fetch_one(&pool)
            .await?;
    if !exists {
        return Err(ApiError::not_found("Adventure not found"));
    }

    let stats = stats::adventure_stats(&pool, adventure_id).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/v1/stats/overview
pub async fn overview(AdminUser(_admin): AdminUser) -> ApiResult<OverviewStats> {
    let pool = manager::pool().await?;
    let stats = stats::overview_stats(&pool).await?;
    Ok(ApiResponse::success(stats))
}
