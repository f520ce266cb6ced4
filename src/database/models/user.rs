use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Bcrypt hash; null for SSO-only accounts
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school: Option<String>,
    pub is_admin: bool,
    pub is_family_account: bool,
    pub is_teacher_account: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
    pub token_version: i32,
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linked single-sign-on identity (one row per provider account)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSso {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
}

pub const SSO_PROVIDER_GOOGLE: &str = "google";
