use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// hls_url stays null until the processor callback lands; listings only
/// surface processed videos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub adventure_id: Uuid,
    pub video_type: String,
    pub hls_url: Option<String>,
    pub duration: Option<i32>,
    pub subtitle_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoVariant {
    pub id: Uuid,
    pub video_id: Uuid,
    pub resolution: String,
    pub bitrate: String,
    pub url: String,
}
