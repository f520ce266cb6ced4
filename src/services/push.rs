//! Push notification fan-out through the FCM HTTP API.

use once_cell::sync::Lazy;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config;

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";
const FCM_TOPIC_SUBSCRIBE_URL: &str = "https://iid.googleapis.com/iid/v1";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("FCM server key not configured")]
    NotConfigured,

    #[error("FCM returned {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

static CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

fn server_key() -> Result<&'static str, PushError> {
    let key = &config::config().push.fcm_server_key;
    if key.is_empty() {
        return Err(PushError::NotConfigured);
    }
    Ok(key)
}

/// Subscribe a device token to the all-users topic so broadcast sends
/// reach it.
pub async fn subscribe_to_all_users(device_token: &str) -> Result<(), PushError> {
    let topic = &config::config().push.all_users_topic;
    let url = format!(
        "{}/{}/rel/topics/{}",
        FCM_TOPIC_SUBSCRIBE_URL, device_token, topic
    );

    let response = CLIENT
        .post(&url)
        .header("Authorization", format!("key={}", server_key()?))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(PushError::UnexpectedStatus(response.status()));
    }
    info!("Subscribed device token to topic '{}'", topic);
    Ok(())
}

/// Send a notification to every user subscribed to the all-users topic.
pub async fn notify_all_users(title: &str, body: &str) -> Result<(), PushError> {
    let topic = &config::config().push.all_users_topic;
    let message = json!({
        "to": format!("/topics/{}", topic),
        "notification": { "title": title, "body": body },
    });

    let response = CLIENT
        .post(FCM_SEND_URL)
        .header("Authorization", format!("key={}", server_key()?))
        .json(&message)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(PushError::UnexpectedStatus(response.status()));
    }
    info!("Notification sent to topic '{}'", topic);
    Ok(())
}

/// New-content announcements must never fail the processor callback that
/// triggers them.
pub async fn notify_all_users_best_effort(title: &str, body: &str) {
    if let Err(e) = notify_all_users(title, body).await {
        warn!("Topic notification failed: {}", e);
    }
}
