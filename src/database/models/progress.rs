use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-profile, per-adventure consumption state. Created lazily on first
/// access; UNIQUE (profile_id, adventure_id) keeps concurrent first
/// requests from producing duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdventureProgress {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub adventure_id: Uuid,
    pub video_stopped_at: Option<i32>,
    pub last_page_read: Option<i32>,
    pub is_finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub saved_for_later: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
