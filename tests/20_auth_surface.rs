// Auth surface checks that need no database: missing/garbled tokens and
// request validation are rejected before any query runs.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_routes_reject_missing_tokens() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/themes", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], false);
    assert_eq!(body["error_code"], "UNAUTHENTICATED");
    assert!(body["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_garbage_tokens() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/videos", server.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error_code"], "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn processor_callbacks_reject_wrong_secrets() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/v1/videos/store-metadata", server.base_url))
        .bearer_auth("wrong-secret")
        .json(&json!({
            "video_id": "00000000-0000-0000-0000-000000000000",
            "hls_url": "https://example.com/hls/master.m3u8",
            "duration": 120
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error_code"], "RESOURCE_FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn registration_validates_the_request_body() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Bad email
    let res = client
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({"email": "not-an-email", "password": "longenough"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error_code"], "VALIDATION_ERROR");

    // Short password
    let res = client
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({"email": "kid@example.com", "password": "short"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/no-such-resource", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
