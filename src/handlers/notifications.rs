// Device token registration for push notifications.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::database::manager;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::push;

#[derive(Debug, Deserialize, Serialize)]
pub struct DeviceToken {
    pub token: String,
}

/// POST /api/v1/notifications/send-device-token - store the token on the
/// user and subscribe it to the broadcast topic.
pub async fn send_device_token(
    CurrentUser(user): CurrentUser,
    Json(body): Json<DeviceToken>,
) -> ApiResult<DeviceToken> {
    let pool = manager::pool().await?;

    sqlx::query("UPDATE users SET device_token = $2, updated_at = now() WHERE id = $1")
        .bind(user.id)
        .bind(&body.token)
        .execute(&pool)
        .await?;

    push::subscribe_to_all_users(&body.token).await?;

    Ok(ApiResponse::success(DeviceToken { token: body.token }))
}
