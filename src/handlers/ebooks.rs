// Ebook upload orchestration. The parser callback delivers page text and
// TTS audio per page; replacing the source file re-runs processing and
// swaps the page set out.

use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::manager;
use crate::database::models::{Adventure, Ebook, EbookPage};
use crate::error::ApiError;
use crate::handlers::adventures::{create_adventure, delete_adventure};
use crate::middleware::{
    AdminOrEbookProcessor, AdminUser, ApiResponse, ApiResult, CurrentUser, EbookProcessorAuth,
};
use crate::services::catalog::{self, AdventurePreview, ListParams};
use crate::services::files::bytes_to_mb;
use crate::services::object_store::{self, folders};
use crate::services::{email, processing, push};

#[derive(Debug, Deserialize)]
pub struct EbookCreate {
    pub ebook_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub series_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EbookUpdate {
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub series_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EbookUpdateFile {
    pub ebook_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PageMetadata {
    pub page_number: i32,
    pub text: String,
    pub tts_url: String,
}

#[derive(Debug, Deserialize)]
pub struct EbookStoreMetadata {
    pub ebook_id: Uuid,
    pub page_count: i32,
    pub extension: String,
    /// Source file size in bytes
    pub file_size: i64,
    pub pages: Vec<PageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ListEbooksQuery {
    pub q: Option<String>,
    pub theme: Option<String>,
    #[serde(default)]
    pub ebooks_offset: i64,
    pub ebooks_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EbookResponse {
    pub id: Uuid,
    pub adventure_id: Uuid,
    pub title: String,
    pub thumbnail: Option<String>,
    pub file_size: f64,
    pub url: Option<String>,
    pub format: Option<String>,
    pub read_aloud_supported: bool,
    pub page_count: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EbooksResponse {
    pub ebooks: Vec<AdventurePreview>,
}

fn ebook_response(ebook: &Ebook, adventure: &Adventure, message: Option<String>) -> EbookResponse {
    EbookResponse {
        id: ebook.id,
        adventure_id: adventure.id,
        title: adventure.title.clone(),
        thumbnail: adventure.thumbnail.clone(),
        file_size: adventure.file_size.map(bytes_to_mb).unwrap_or(0.0),
        url: ebook.url.clone(),
        format: ebook.format.clone(),
        read_aloud_supported: ebook.read_aloud_supported,
        page_count: ebook.page_count,
        message,
    }
}

/// POST /api/v1/ebooks - create the rows and queue parsing + TTS
/// generation. Failures clean up the uploaded blobs.
pub async fn upload_ebook(
    AdminUser(_admin): AdminUser,
    Json(body): Json<EbookCreate>,
) -> ApiResult<EbookResponse> {
    let pool = manager::pool().await?;

    let adventure =
        match create_adventure(&pool, &body.title, &body.thumbnail_url, body.series_id).await {
            Ok(adventure) => adventure,
            Err(e) => {
                tracing::error!("Error creating ebook adventure: {}", e);
                object_store::delete_object_best_effort(&body.thumbnail_url).await;
                object_store::delete_object_best_effort(&body.ebook_url).await;
                return Err(e.into());
            }
        };

    let ebook = sqlx::query_as::<_, Ebook>(
        "INSERT INTO ebooks (adventure_id, url) VALUES ($1, $2) RETURNING *",
    )
    .bind(adventure.id)
    .bind(&body.ebook_url)
    .fetch_one(&pool)
    .await?;

    if let Err(e) = processing::start_ebook_processing(ebook.id, &body.ebook_url).await {
        tracing::error!("Error starting ebook processing: {}", e);
        object_store::delete_object_best_effort(&body.thumbnail_url).await;
        object_store::delete_object_best_effort(&body.ebook_url).await;
        let _ = delete_adventure(&pool, adventure.id).await;
        return Err(e.into());
    }

    Ok(ApiResponse::success(ebook_response(
        &ebook,
        &adventure,
        Some("Ebook processing started".to_string()),
    )))
}

async fn store_pages(
    pool: &sqlx::PgPool,
    metadata: &EbookStoreMetadata,
) -> Result<(Ebook, Adventure), ApiError> {
    let ebook = sqlx::query_as::<_, Ebook>(
        "UPDATE ebooks SET page_count = $2, format = $3 WHERE id = $1 RETURNING *",
    )
    .bind(metadata.ebook_id)
    .bind(metadata.page_count)
    .bind(&metadata.extension)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("eBook not found"))?;

    let adventure = sqlx::query_as::<_, Adventure>(
        "UPDATE adventures SET file_size = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(ebook.adventure_id)
    .bind(metadata.file_size)
    .fetch_one(pool)
    .await?;

    for page in &metadata.pages {
        sqlx::query(
            "INSERT INTO ebook_pages (ebook_id, page_number, text, tts_url) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (ebook_id, page_number) \
             DO UPDATE SET text = EXCLUDED.text, tts_url = EXCLUDED.tts_url",
        )
        .bind(ebook.id)
        .bind(page.page_number)
        .bind(&page.text)
        .bind(&page.tts_url)
        .execute(pool)
        .await?;
    }

    Ok((ebook, adventure))
}

/// Delete the TTS objects named in a failed callback so storage doesn't
/// accumulate orphans.
async fn cleanup_callback_audio(metadata: &EbookStoreMetadata) {
    for page in &metadata.pages {
        object_store::delete_object_best_effort(&page.tts_url).await;
    }
}

/// POST /api/v1/ebooks/store-metadata/create - parser callback after a
/// fresh upload. A storage failure mid-write tears the adventure down to
/// avoid serving a half-ingested book.
pub async fn store_metadata_create(
    _processor: EbookProcessorAuth,
    Json(metadata): Json<EbookStoreMetadata>,
) -> ApiResult<EbookResponse> {
    let pool = manager::pool().await?;

    let (ebook, adventure) = match store_pages(&pool, &metadata).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Error storing eBook metadata: {}", e);
            cleanup_callback_audio(&metadata).await;
            if let Ok(Some(ebook)) =
                sqlx::query_as::<_, Ebook>("SELECT * FROM ebooks WHERE id = $1")
                    .bind(metadata.ebook_id)
                    .fetch_optional(&pool)
                    .await
            {
                if let Some(url) = &ebook.url {
                    object_store::delete_object_best_effort(url).await;
                }
                let _ = delete_adventure(&pool, ebook.adventure_id).await;
            }
            return Err(e);
        }
    };

    push::notify_all_users_best_effort(
        "New eBook Available!",
        &format!(
            "A new eBook titled '{}' is now available to read.",
            adventure.title
        ),
    )
    .await;
    email::send_email_best_effort(
        &config::config().email.admin_address,
        "New eBook Available!",
        &email::content_published_body("eBook", &adventure.title),
    )
    .await;

    Ok(ApiResponse::success(ebook_response(&ebook, &adventure, None)))
}

/// POST /api/v1/ebooks/store-metadata/update - parser callback after a
/// file replacement. Pages beyond the new page count are dropped and their
/// audio deleted.
pub async fn store_metadata_update(
    _processor: EbookProcessorAuth,
    Json(metadata): Json<EbookStoreMetadata>,
) -> ApiResult<EbookResponse> {
    let pool = manager::pool().await?;

    let old_pages = sqlx::query_as::<_, EbookPage>(
        "SELECT * FROM ebook_pages WHERE ebook_id = $1 ORDER BY page_number",
    )
    .bind(metadata.ebook_id)
    .fetch_all(&pool)
    .await?;

    let (ebook, adventure) = match store_pages(&pool, &metadata).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Error storing updated eBook metadata: {}", e);
            cleanup_callback_audio(&metadata).await;
            return Err(e);
        }
    };

    // Remove audio for pages the new file no longer has, and any stale
    // replaced audio objects
    let new_urls: std::collections::HashSet<&str> =
        metadata.pages.iter().map(|p| p.tts_url.as_str()).collect();
    for page in &old_pages {
        if !new_urls.contains(page.tts_url.as_str()) {
            object_store::delete_object_best_effort(&page.tts_url).await;
        }
    }
    sqlx::query("DELETE FROM ebook_pages WHERE ebook_id = $1 AND page_number > $2")
        .bind(ebook.id)
        .bind(metadata.page_count)
        .execute(&pool)
        .await?;

    email::send_email_best_effort(
        &config::config().email.admin_address,
        "eBook Updated!",
        &email::content_published_body("eBook", &adventure.title),
    )
    .await;

    Ok(ApiResponse::success(ebook_response(&ebook, &adventure, None)))
}

/// GET /api/v1/ebooks
pub async fn list_ebooks(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListEbooksQuery>,
) -> ApiResult<EbooksResponse> {
    let pool = manager::pool().await?;
    let ebooks = catalog::list_new_ebooks(
        &pool,
        &ListParams {
            q: query.q,
            series: None,
            theme: query.theme,
            offset: query.ebooks_offset,
            limit: query.ebooks_limit.unwrap_or(10),
        },
    )
    .await?;
    Ok(ApiResponse::success(EbooksResponse { ebooks }))
}

/// PATCH /api/v1/ebooks/{id} - metadata update on the owning adventure
pub async fn update_ebook(
    AdminUser(_admin): AdminUser,
    Path(ebook_id): Path<Uuid>,
    Json(body): Json<EbookUpdate>,
) -> ApiResult<EbookResponse> {
    let pool = manager::pool().await?;

    let ebook = sqlx::query_as::<_, Ebook>("SELECT * FROM ebooks WHERE id = $1")
        .bind(ebook_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("eBook not found"))?;

    if let Some(thumbnail_url) = &body.thumbnail_url {
        let old: (Option<String>,) =
            sqlx::query_as("SELECT thumbnail FROM adventures WHERE id = $1")
                .bind(ebook.adventure_id)
                .fetch_one(&pool)
                .await?;
        if let (Some(old_thumbnail),) = old {
            object_store::delete_object_best_effort(&old_thumbnail).await;
        }
        sqlx::query("UPDATE adventures SET thumbnail = $2, updated_at = now() WHERE id = $1")
            .bind(ebook.adventure_id)
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
    .bind(ebook.adventure_id)
    .bind(&body.title)
    .bind(body.series_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(ebook_response(&ebook, &adventure, None)))
}

/// PATCH /api/v1/ebooks/{id}/file - swap the source file and re-run
/// processing. The old file is deleted once the new URL is recorded.
pub async fn update_ebook_file(
    AdminUser(_admin): AdminUser,
    Path(ebook_id): Path<Uuid>,
    Json(body): Json<EbookUpdateFile>,
) -> ApiResult<EbookResponse> {
    let pool = manager::pool().await?;

    let existing = sqlx::query_as::<_, Ebook>("SELECT * FROM ebooks WHERE id = $1")
        .bind(ebook_id)
        .fetch_optional(&pool)
        .await?;
    let Some(existing) = existing else {
        object_store::delete_object_best_effort(&body.ebook_url).await;
        return Err(ApiError::not_found("eBook not found"));
    };
    let old_url = existing.url.clone();

    let ebook = sqlx::query_as::<_, Ebook>(
        "UPDATE ebooks SET url = $2 WHERE id = $1 RETURNING *",
    )
    .bind(ebook_id)
    .bind(&body.ebook_url)
    .fetch_one(&pool)
    .await?;

    if let Err(e) = processing::start_ebook_update(ebook.id, &body.ebook_url).await {
        tracing::error!("Error queueing ebook update: {}", e);
        object_store::delete_object_best_effort(&body.ebook_url).await;
        return Err(e.into());
    }

    if let Some(old_url) = old_url {
        tracing::info!("Deleting replaced eBook file: {}", old_url);
        object_store::delete_object_best_effort(&old_url).await;
    }

    let adventure = sqlx::query_as::<_, Adventure>("SELECT * FROM adventures WHERE id = $1")
        .bind(ebook.adventure_id)
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::success(ebook_response(&ebook, &adventure, None)))
}

/// DELETE /api/v1/ebooks/{id} - source file, TTS tree, then the adventure
pub async fn delete_ebook(
    _auth: AdminOrEbookProcessor,
    Path(ebook_id): Path<Uuid>,
) -> ApiResult<()> {
    let pool = manager::pool().await?;

    let ebook = sqlx::query_as::<_, Ebook>("SELECT * FROM ebooks WHERE id = $1")
        .bind(ebook_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("eBook not found"))?;

    if let Some(url) = &ebook.url {
        object_store::delete_object_best_effort(url).await;
    }
    let bucket = &config::config().storage.permanent_bucket;
    object_store::delete_prefix_best_effort(bucket, &format!("{}/{}", folders::TTS, ebook_id))
        .await;

    delete_adventure(&pool, ebook.adventure_id).await?;
    Ok(ApiResponse::with_message((), "eBook deleted"))
}
