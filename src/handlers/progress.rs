// Playback/reading position updates on a progress row.

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::AdventureProgress;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub video_stopped_at: Option<i32>,
    pub last_page_read: Option<i32>,
    pub is_finished: Option<bool>,
    pub saved_for_later: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress_id: Uuid,
    pub video_stopped_at: Option<i32>,
    pub last_page_read: Option<i32>,
    pub is_finished: bool,
    pub saved_for_later: bool,
    pub finished_at: Option<String>,
}

/// PATCH /api/v1/progress/{id} - the row must belong to one of the
/// caller's profiles. Finishing stamps finished_at once.
pub async fn update_progress(
    CurrentUser(user): CurrentUser,
    Path(progress_id): Path<Uuid>,
    Json(body): Json<ProgressUpdate>,
) -> ApiResult<ProgressResponse> {
    let pool = manager::pool().await?;

    let (owned,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM adventure_progress ap \
         JOIN profiles p ON p.id = ap.profile_id \
         WHERE ap.id = $1 AND p.user_id = $2)",
    )
    .bind(progress_id)
    .bind(user.id)
    .fetch_one(&pool)
    .await?;
    if !owned {
        return Err(ApiError::not_found("Progress not found"));
    }

    let progress = sqlx::query_as::<_, AdventureProgress>(
        "UPDATE adventure_progress SET \
         video_stopped_at = COALESCE($2, video_stopped_at), \
         last_page_read = COALESCE($3, last_page_read), \
         is_finished = COALESCE($4, is_finished), \
         saved_for_later = COALESCE($5, saved_for_later), \
         finished_at = CASE \
             WHEN COALESCE($4, is_finished) AND finished_at IS NULL THEN now() \
             WHEN NOT COALESCE($4, is_finished) THEN NULL \
             ELSE finished_at END, \
         updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(progress_id)
    .bind(body.video_stopped_at)
    .bind(body.last_page_read)
    .bind(body.is_finished)
    .bind(body.saved_for_later)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(ProgressResponse {
        progress_id: progress.id,
        video_stopped_at: progress.video_stopped_at,
        last_page_read: progress.last_page_read,
        is_finished: progress.is_finished,
        saved_for_later: progress.saved_for_later,
        finished_at: progress.finished_at.map(|t| t.to_rfc3339()),
    }))
}
