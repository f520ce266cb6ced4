use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Series {
    pub id: Uuid,
    pub name: String,
    /// Which kind of adventures the series groups: "video" or "ebook"
    pub content: String,
    pub created_at: DateTime<Utc>,
}
