// Video upload orchestration: admin creates the rows and hands off to the
// external transcoder; the transcoder reports back through the
// token-authenticated store-metadata callback.

use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::manager;
use crate::database::models::{Adventure, Video};
use crate::error::ApiError;
use crate::handlers::adventures::{create_adventure, delete_adventure};
use crate::middleware::{
    AdminOrVideoProcessor, AdminUser, ApiResponse, ApiResult, CurrentUser, VideoProcessorAuth,
};
use crate::services::catalog::{self, AdventurePreview, ListParams};
use crate::services::object_store::{self, folders};
use crate::services::{email, processing, push};

#[derive(Debug, Deserialize)]
pub struct VideoCreate {
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub series_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct VideoUpdate {
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub series_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct VariantMetadata {
    pub resolution: String,
    pub bitrate: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoStoreMetadata {
    pub video_id: Uuid,
    pub hls_url: String,
    pub duration: i32,
    #[serde(default)]
    pub variants: Vec<VariantMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub q: Option<String>,
    pub theme: Option<String>,
    pub series: Option<String>,
    #[serde(default)]
    pub videos_offset: i64,
    pub videos_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub adventure_id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub video_type: String,
    pub series: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<i32>,
    pub hls_url: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub videos: Vec<AdventurePreview>,
}

async fn series_name(
    pool: &sqlx::PgPool,
    series_id: Option<Uuid>,
) -> Result<Option<String>, ApiError> {
    match series_id {
        Some(id) => {
            let row: Option<(String,)> = sqlx::query_as("SELECT name FROM series WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
            Ok(row.map(|(name,)| name))
        }
        None => Ok(None),
    }
}

/// POST /api/v1/videos - create the adventure + video rows and trigger the
/// transcoding job. On failure the uploaded blobs and the partial rows are
/// cleaned up best-effort.
pub async fn upload_video(
    AdminUser(_admin): AdminUser,
    Json(body): Json<VideoCreate>,
) -> ApiResult<VideoResponse> {
    let pool = manager::pool().await?;

    let adventure =
        match create_adventure(&pool, &body.title, &body.thumbnail_url, Some(body.series_id)).await
        {
            Ok(adventure) => adventure,
            Err(e) => {
                tracing::error!("Error creating video adventure: {}", e);
                object_store::delete_object_best_effort(&body.thumbnail_url).await;
                object_store::delete_object_best_effort(&body.video_url).await;
                return Err(e.into());
            }
        };

    let video = sqlx::query_as::<_, Video>(
        "INSERT INTO videos (adventure_id) VALUES ($1) RETURNING *",
    )
    .bind(adventure.id)
    .fetch_one(&pool)
    .await?;

    if let Err(e) = processing::start_video_processing(video.id, &body.video_url).await {
        tracing::error!("Error starting video processing: {}", e);
        object_store::delete_object_best_effort(&body.thumbnail_url).await;
        object_store::delete_object_best_effort(&body.video_url).await;
        let _ = delete_adventure(&pool, adventure.id).await;
        return Err(e.into());
    }

    let series = series_name(&pool, adventure.series_id).await?;
    Ok(ApiResponse::success(VideoResponse {
        id: video.id,
        adventure_id: adventure.id,
        title: adventure.title,
        video_type: video.video_type,
        series,
        thumbnail: adventure.thumbnail,
        duration: None,
        hls_url: None,
        message: Some("Video processing started".to_string()),
    }))
}

/// POST /api/v1/videos/store-metadata - transcoder callback attaching the
/// HLS URL, duration, and rendition variants, then announcing the content.
pub async fn store_metadata(
    _processor: VideoProcessorAuth,
    Json(metadata): Json<VideoStoreMetadata>,
) -> ApiResult<VideoResponse> {
    let pool = manager::pool().await?;

    let video = sqlx::query_as::<_, Video>(
        "UPDATE videos SET hls_url = $2, duration = $3 WHERE id = $1 RETURNING *",
    )
    .bind(metadata.video_id)
    .bind(&metadata.hls_url)
    .bind(metadata.duration)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Video not found"))?;

    for variant in &metadata.variants {
        sqlx::query(
            "INSERT INTO video_variants (video_id, resolution, bitrate, url) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(video.id)
        .bind(&variant.resolution)
        .bind(&variant.bitrate)
        .bind(&variant.url)
        .execute(&pool)
        .await?;
    }

    let adventure = sqlx::query_as::<_, Adventure>("SELECT * FROM adventures WHERE id = $1")
        .bind(video.adventure_id)
        .fetch_one(&pool)
        .await?;

    push::notify_all_users_best_effort(
        "New Video Available!",
        &format!(
            "A new video titled '{}' is now available to watch.",
            adventure.title
        ),
    )
    .await;
    email::send_email_best_effort(
        &config::config().email.admin_address,
        "New Video Available!",
        &email::content_published_body("video", &adventure.title),
    )
    .await;

    tracing::info!("Metadata stored for video {}", metadata.video_id);

    let series = series_name(&pool, adventure.series_id).await?;
    Ok(ApiResponse::success(VideoResponse {
        id: video.id,
        adventure_id: adventure.id,
        title: adventure.title,
        video_type: video.video_type,
        series,
        thumbnail: adventure.thumbnail,
        duration: video.duration,
        hls_url: video.hls_url,
        message: None,
    }))
}

/// GET /api/v1/videos
pub async fn list_videos(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListVideosQuery>,
) -> ApiResult<VideosResponse> {
    let pool = manager::pool().await?;
    let videos = catalog::list_new_videos(
        &pool,
        &ListParams {
            q: query.q,
            series: query.series,
            theme: query.theme,
            offset: query.videos_offset,
            limit: query.videos_limit.unwrap_or(10),
        },
    )
    .await?;
    Ok(ApiResponse::success(VideosResponse { videos }))
}

/// PATCH /api/v1/videos/{id} - metadata update on the owning adventure;
/// replacing the thumbnail removes the old object.
pub async fn update_video(
    AdminUser(_admin): AdminUser,
    Path(video_id): Path<Uuid>,
    Json(body): Json<VideoUpdate>,
) -> ApiResult<VideoResponse> {
    let pool = manager::pool().await?;

    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if let Some(thumbnail_url) = &body.thumbnail_url {
        let old: (Option<String>,) =
            sqlx::query_as("SELECT thumbnail FROM adventures WHERE id = $1")
                .bind(video.adventure_id)
                .fetch_one(&pool)
                .await?;
        if let (Some(old_thumbnail),) = old {
            object_store::delete_object_best_effort(&old_thumbnail).await;
        }
        sqlx::query("UPDATE adventures SET thumbnail = $2, updated_at = now() WHERE id = $1")
            .bind(video.adventure_id)
            .bind(thumbnail_url)
            .execute(&pool)
            .await?;
    }

    let adventure = sqlx::query_as::<_, Adventure>(
        "UPDATE adventures SET \
         title = COALESCE($2, title), \
         series_id = COALESCE($3, series_id), \
         updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(video.adventure_id)
    .bind(&body.title)
    .bind(body.series_id)
    .fetch_one(&pool)
    .await?;

    let series = series_name(&pool, adventure.series_id).await?;
    Ok(ApiResponse::success(VideoResponse {
        id: video.id,
        adventure_id: adventure.id,
        title: adventure.title,
        video_type: video.video_type,
        series,
        thumbnail: adventure.thumbnail,
        duration: video.duration,
        hls_url: video.hls_url,
        message: None,
    }))
}

/// DELETE /api/v1/videos/{id} - admin or the processor cleaning up after a
/// failed run. Derived HLS objects and subtitles go first, then the parent
/// adventure (which cascades to the video row).
pub async fn delete_video(
    _auth: AdminOrVideoProcessor,
    Path(video_id): Path<Uuid>,
) -> ApiResult<()> {
    let pool = manager::pool().await?;

    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if video.hls_url.is_some() {
        let bucket = &config::config().storage.permanent_bucket;
        object_store::delete_prefix_best_effort(bucket, &format!("{}/{}", folders::HLS, video_id))
            .await;
    }
    if let Some(subtitle_url) = &video.subtitle_url {
        object_store::delete_object_best_effort(subtitle_url).await;
    }

    delete_adventure(&pool, video.adventure_id).await?;
    Ok(ApiResponse::with_message((), "Video deleted"))
}
