use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ebook {
    pub id: Uuid,
    pub adventure_id: Uuid,
    pub url: Option<String>,
    pub format: Option<String>,
    pub page_count: Option<i32>,
    pub read_aloud_supported: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of parsed text plus its narrated audio, written by the
/// ebook processor callback.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EbookPage {
    pub id: Uuid,
    pub ebook_id: Uuid,
    pub page_number: i32,
    pub text: String,
    pub tts_url: String,
}
