//! Object storage client: presigned upload URLs, signed deletes, and
//! prefix cleanup for derived files (HLS renditions, TTS audio).

use chrono::Utc;
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{info, warn};

use crate::config;
use crate::services::signer::{self, Credentials};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object URL: {0}")]
    InvalidUrl(String),

    #[error("Object store returned {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Presigned upload URL plus the durable public URL the object will have
/// once the client finishes the PUT.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadUrls {
    pub upload_url: String,
    pub public_url: String,
}

/// Folder prefixes inside the buckets, one per asset kind.
pub mod folders {
    pub const THUMBNAILS: &str = "thumbnails";
    pub const AVATARS: &str = "avatars";
    pub const THEME_ICONS: &str = "theme-icons";
    pub const VIDEOS: &str = "videos";
    pub const EBOOKS: &str = "ebooks";
    pub const QUIZZES: &str = "quizzes";
    pub const HLS: &str = "hls";
    pub const TTS: &str = "tts";
}

pub struct ObjectStore {
    client: reqwest::Client,
}

static STORE: Lazy<ObjectStore> = Lazy::new(|| ObjectStore {
    client: reqwest::Client::new(),
});

pub fn store() -> &'static ObjectStore {
    &STORE
}

fn credentials() -> Credentials {
    let storage = &config::config().storage;
    Credentials {
        access_key_id: storage.access_key_id.clone(),
        secret_access_key: storage.secret_access_key.clone(),
    }
}

impl ObjectStore {
    /// Presign a PUT for `{folder}/{object_name}` in the given bucket.
    pub fn presigned_upload(&self, bucket: &str, folder: &str, object_name: &str) -> UploadUrls {
        let storage = &config::config().storage;
        let path = format!("/{}/{}/{}", bucket, folder, object_name);
        let upload_url = signer::presign_url(
            "PUT",
            &storage.endpoint,
            &path,
            &storage.region,
            &credentials(),
            storage.signed_url_expiry_secs,
            Utc::now(),
        );
        let public_url = format!("{}{}", storage.endpoint.trim_end_matches('/'), path);
        UploadUrls {
            upload_url,
            public_url,
        }
    }

    /// Delete one object identified by its public URL.
    pub async fn delete_object(&self, public_url: &str) -> Result<(), StorageError> {
        let storage = &config::config().storage;
        let path = object_path(&storage.endpoint, public_url)?;
        self.delete_path(&path).await
    }

    /// Delete every object under `prefix` in `bucket` (derived-file trees).
    pub async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<(), StorageError> {
        let storage = &config::config().storage;
        let query = format!(
            "list-type=2&prefix={}",
            signer::uri_encode(prefix, true)
        );
        let url = format!(
            "{}/{}?{}",
            storage.endpoint.trim_end_matches('/'),
            bucket,
            query
        );

        let mut request = self.client.get(&url);
        for (name, value) in signer::sign_headers(
            "GET",
            &storage.endpoint,
            &format!("/{}", bucket),
            &query,
            b"",
            "s3",
            &storage.region,
            &credentials(),
            Utc::now(),
        ) {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus(response.status()));
        }

        let body = response.text().await?;
        for key in parse_list_keys(&body) {
            self.delete_path(&format!("/{}/{}", bucket, key)).await?;
            info!("Deleted object {}/{}", bucket, key);
        }
        Ok(())
    }

    async fn delete_path(&self, path: &str) -> Result<(), StorageError> {
        let storage = &config::config().storage;
        let url = format!(
            "{}{}",
            storage.endpoint.trim_end_matches('/'),
            signer::uri_encode(path, false)
        );

        let mut request = self.client.delete(&url);
        for (name, value) in signer::sign_headers(
            "DELETE",
            &storage.endpoint,
            path,
            "",
            b"",
            "s3",
            &storage.region,
            &credentials(),
            Utc::now(),
        ) {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        // 404s are fine: cleanup paths retry and objects may already be gone
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::UnexpectedStatus(response.status()));
        }
        Ok(())
    }
}

/// Best-effort delete used on error-cleanup paths: log and move on.
pub async fn delete_object_best_effort(public_url: &str) {
    if let Err(e) = store().delete_object(public_url).await {
        warn!("Best-effort delete of {} failed: {}", public_url, e);
    }
}

pub async fn delete_prefix_best_effort(bucket: &str, prefix: &str) {
    if let Err(e) = store().delete_prefix(bucket, prefix).await {
        warn!("Best-effort prefix delete of {}/{} failed: {}", bucket, prefix, e);
    }
}

/// Extract `/bucket/key` from a public URL on our configured endpoint.
fn object_path(endpoint: &str, public_url: &str) -> Result<String, StorageError> {
    let base = endpoint.trim_end_matches('/');
    let rest = public_url
        .strip_prefix(base)
        .ok_or_else(|| StorageError::InvalidUrl(public_url.to_string()))?;
    // Expect at least /bucket/key
    if rest.trim_start_matches('/').splitn(2, '/').count() < 2 {
        return Err(StorageError::InvalidUrl(public_url.to_string()));
    }
    Ok(rest.to_string())
}

/// Pull the object keys out of a ListObjectsV2 XML body.
fn parse_list_keys(xml: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<Key>") {
        let after = &rest[start + 5..];
        match after.find("</Key>") {
            Some(end) => {
                keys.push(after[..end].to_string());
                rest = &after[end + 6..];
            }
            None => break,
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_requires_matching_endpoint() {
        let path =
            object_path("https://storage.example.com", "https://storage.example.com/bucket/a/b.png")
                .unwrap();
        assert_eq!(path, "/bucket/a/b.png");

        assert!(object_path("https://storage.example.com", "https://other.example.com/b/k").is_err());
        assert!(object_path("https://storage.example.com", "https://storage.example.com/bucket").is_err());
    }

    #[test]
    fn list_keys_are_extracted_in_order() {
        let xml = "<ListBucketResult><Contents><Key>hls/1/seg0.ts</Key></Contents>\
                   <Contents><Key>hls/1/seg1.ts</Key></Contents></ListBucketResult>";
        assert_eq!(parse_list_keys(xml), vec!["hls/1/seg0.ts", "hls/1/seg1.ts"]);
        assert!(parse_list_keys("<ListBucketResult></ListBucketResult>").is_empty());
    }
}
