use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Avatar {
    pub id: Uuid,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
