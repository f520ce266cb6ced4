//! Dispatch to the external media processors. The handoff is
//! fire-and-forget: we POST the entity id and source URL, the processor
//! works asynchronously and reports back through the token-authenticated
//! store-metadata endpoints.

use once_cell::sync::Lazy;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Processor endpoint not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Processor dispatch failed with {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

static CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

async fn dispatch(
    url: &str,
    which: &'static str,
    bearer: &str,
    payload: serde_json::Value,
) -> Result<(), ProcessingError> {
    if url.is_empty() {
        return Err(ProcessingError::NotConfigured(which));
    }

    let response = CLIENT
        .post(url)
        .bearer_auth(bearer)
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProcessingError::UnexpectedStatus(response.status()));
    }
    Ok(())
}

/// Kick off transcoding for a freshly uploaded video.
pub async fn start_video_processing(video_id: Uuid, video_url: &str) -> Result<(), ProcessingError> {
    let config = config::config();
    dispatch(
        &config.processing.video_job_url,
        "video job",
        &config.security.video_processor_token,
        json!({ "video_id": video_id, "video_url": video_url }),
    )
    .await?;
    info!("Started video processing job for {}", video_id);
    Ok(())
}

/// Queue parsing + TTS generation for a freshly uploaded ebook.
pub async fn start_ebook_processing(ebook_id: Uuid, ebook_url: &str) -> Result<(), ProcessingError> {
    let config = config::config();
    dispatch(
        &config.processing.ebook_processing_url,
        "ebook processing",
        &config.security.ebook_processor_token,
        json!({ "ebook_id": ebook_id, "ebook_url": ebook_url }),
    )
    .await?;
    info!("Queued ebook processing for {}", ebook_id);
    Ok(())
}

/// Queue reprocessing after an ebook's source file is replaced.
pub async fn start_ebook_update(ebook_id: Uuid, ebook_url: &str) -> Result<(), ProcessingError> {
    let config = config::config();
    dispatch(
        &config.processing.ebook_update_url,
        "ebook update",
        &config.security.ebook_processor_token,
        json!({ "ebook_id": ebook_id, "ebook_url": ebook_url }),
    )
    .await?;
    info!("Queued ebook update for {}", ebook_id);
    Ok(())
}
