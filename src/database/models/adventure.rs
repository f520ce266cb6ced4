use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Generic content item. Owns at most one video and at most one ebook,
/// optionally belongs to a series, and carries theme tags through the
/// adventure_themes join table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Adventure {
    pub id: Uuid,
    pub title: String,
    pub thumbnail: Option<String>,
    /// Source file size in bytes, reported back by the processors
    pub file_size: Option<i64>,
    pub series_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
