// Signed upload URLs. Clients PUT bytes straight to object storage; the
// API only validates the extension and hands out a presigned URL plus the
// durable public URL. Videos and quiz documents land in the temp bucket
// (the processors move or consume them); everything else is permanent.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::services::files::{
    generate_unique_filename, sanitize_filename, validate_file_extension, EBOOK_EXTENSIONS,
    IMAGE_EXTENSIONS, QUIZ_DOC_EXTENSIONS, VIDEO_EXTENSIONS,
};
use crate::services::object_store::{folders, store, UploadUrls};

#[derive(Debug, Deserialize)]
pub struct AdventureUploadRequest {
    pub filename: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailUploadRequest {
    pub thumbnail: String,
}

#[derive(Debug, Deserialize)]
pub struct FilenameUploadRequest {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeIconUploadRequest {
    pub icon_name: String,
}

#[derive(Debug, Serialize)]
pub struct VideoUploadUrls {
    pub video_upload_url: String,
    pub video_public_url: String,
    pub thumbnail_upload_url: String,
    pub thumbnail_public_url: String,
}

#[derive(Debug, Serialize)]
pub struct EbookUploadUrls {
    pub ebook_upload_url: String,
    pub ebook_public_url: String,
    pub thumbnail_upload_url: Option<String>,
    pub thumbnail_public_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThumbnailUploadUrls {
    pub thumbnail_upload_url: String,
    pub thumbnail_public_url: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarUploadUrls {
    pub avatar_upload_url: String,
    pub avatar_public_url: String,
}

#[derive(Debug, Serialize)]
pub struct ThemeIconUploadUrls {
    pub icon_upload_url: String,
    pub icon_public_url: String,
}

#[derive(Debug, Serialize)]
pub struct QuizUploadUrls {
    pub quiz_upload_url: String,
    pub quiz_public_url: String,
}

fn presign(bucket: &str, folder: &str, filename: &str) -> UploadUrls {
    let object_name = generate_unique_filename(&sanitize_filename(filename));
    store().presigned_upload(bucket, folder, &object_name)
}

fn thumbnail_urls(filename: &str) -> Result<UploadUrls, crate::error::ApiError> {
    validate_file_extension(filename, IMAGE_EXTENSIONS)?;
    let bucket = &config::config().storage.permanent_bucket;
    Ok(presign(bucket, folders::THUMBNAILS, filename))
}

/// POST /api/v1/upload-urls/video
pub async fn video_urls(
    AdminUser(_admin): AdminUser,
    Json(body): Json<AdventureUploadRequest>,
) -> ApiResult<VideoUploadUrls> {
    validate_file_extension(&body.filename, VIDEO_EXTENSIONS)?;
    let thumbnail = body.thumbnail.as_deref().unwrap_or_default();
    let thumbnail_urls = thumbnail_urls(thumbnail)?;

    let temp_bucket = &config::config().storage.temp_bucket;
    let video_urls = presign(temp_bucket, folders::VIDEOS, &body.filename);

    Ok(ApiResponse::success(VideoUploadUrls {
        video_upload_url: video_urls.upload_url,
        video_public_url: video_urls.public_url,
        thumbnail_upload_url: thumbnail_urls.upload_url,
        thumbnail_public_url: thumbnail_urls.public_url,
    }))
}

/// POST /api/v1/upload-urls/ebook - the thumbnail is optional here
pub async fn ebook_urls(
    AdminUser(_admin): AdminUser,
    Json(body): Json<AdventureUploadRequest>,
) -> ApiResult<EbookUploadUrls> {
    validate_file_extension(&body.filename, EBOOK_EXTENSIONS)?;
    let bucket = &config::config().storage.permanent_bucket;
    let ebook_urls = presign(bucket, folders::EBOOKS, &body.filename);

    let (thumbnail_upload_url, thumbnail_public_url) = match body.thumbnail.as_deref() {
        Some(thumbnail) if !thumbnail.is_empty() => {
            let urls = thumbnail_urls(thumbnail)?;
            (Some(urls.upload_url), Some(urls.public_url))
        }
        _ => (None, None),
    };

    Ok(ApiResponse::success(EbookUploadUrls {
        ebook_upload_url: ebook_urls.upload_url,
        ebook_public_url: ebook_urls.public_url,
        thumbnail_upload_url,
        thumbnail_public_url,
    }))
}

/// POST /api/v1/upload-urls/thumbnail
pub async fn thumbnail_upload_urls(
    AdminUser(_admin): AdminUser,
    Json(body): Json<ThumbnailUploadRequest>,
) -> ApiResult<ThumbnailUploadUrls> {
    let urls = thumbnail_urls(&body.thumbnail)?;
    Ok(ApiResponse::success(ThumbnailUploadUrls {
        thumbnail_upload_url: urls.upload_url,
        thumbnail_public_url: urls.public_url,
    }))
}

/// POST /api/v1/upload-urls/avatar
pub async fn avatar_urls(
    AdminUser(_admin): AdminUser,
    Json(body): Json<FilenameUploadRequest>,
) -> ApiResult<AvatarUploadUrls> {
    validate_file_extension(&body.filename, IMAGE_EXTENSIONS)?;
    let bucket = &config::config().storage.permanent_bucket;
    let urls = presign(bucket, folders::AVATARS, &body.filename);
    Ok(ApiResponse::success(AvatarUploadUrls {
        avatar_upload_url: urls.upload_url,
        avatar_public_url: urls.public_url,
    }))
}

/// POST /api/v1/upload-urls/theme-icon
pub async fn theme_icon_urls(
    AdminUser(_admin): AdminUser,
    Json(body): Json<ThemeIconUploadRequest>,
) -> ApiResult<ThemeIconUploadUrls> {
    validate_file_extension(&body.icon_name, IMAGE_EXTENSIONS)?;
    let bucket = &config::config().storage.permanent_bucket;
    let urls = presign(bucket, folders::THEME_ICONS, &body.icon_name);
    Ok(ApiResponse::success(ThemeIconUploadUrls {
        icon_upload_url: urls.upload_url,
        icon_public_url: urls.public_url,
    }))
}

/// POST /api/v1/upload-urls/quiz
pub async fn quiz_urls(
    AdminUser(_admin): AdminUser,
    Json(body): Json<FilenameUploadRequest>,
) -> ApiResult<QuizUploadUrls> {
    validate_file_extension(&body.filename, QUIZ_DOC_EXTENSIONS)?;
    let temp_bucket = &config::config().storage.temp_bucket;
    let urls = presign(temp_bucket, folders::QUIZZES, &body.filename);
    Ok(ApiResponse::success(QuizUploadUrls {
        quiz_upload_url: urls.upload_url,
        quiz_public_url: urls.public_url,
    }))
}
