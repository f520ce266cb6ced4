mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(&server.base_url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], true);
    assert_eq!(body["data"]["name"], "Wonderspaced API");
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    // OK with a database, SERVICE_UNAVAILABLE without one; both are alive
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body["data"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_link_redirect_embeds_the_deep_link() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/v1/login-link?token=abc123",
            server.base_url
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let page = res.text().await?;
    assert!(page.contains("wonderspaced://open/passwordless-login?token=abc123"));
    Ok(())
}

#[tokio::test]
async fn verify_email_link_redirect_embeds_the_deep_link() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/v1/verify-email-link?token=xyz789",
            server.base_url
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let page = res.text().await?;
    assert!(page.contains("wonderspaced://open/verify-email?token=xyz789"));
    Ok(())
}
