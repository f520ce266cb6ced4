// End-to-end account flows against a real database. Skipped when
// DATABASE_URL is not configured.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn unique_email(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.com", tag, nanos)
}

async fn register(client: &reqwest::Client, base_url: &str, email: &str) -> Result<(String, Value)> {
    let res = client
        .post(format!("{}/api/v1/auth/register", base_url))
        .json(&json!({"email": email, "password": "hunter2hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], true);
    let token = body["data"]["token"]
        .as_str()
        .expect("registration returns a token")
        .to_string();
    Ok((token, body))
}

#[tokio::test]
async fn registration_rejects_duplicate_emails() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let email = unique_email("dupe");
    register(&client, &server.base_url, &email).await?;

    let res = client
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({"email": email, "password": "hunter2hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error_code"], "DUPLICATE_ENTRY");
    Ok(())
}

#[tokio::test]
async fn login_distinguishes_unknown_email_from_wrong_password() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let email = unique_email("login");
    register(&client, &server.base_url, &email).await?;

    let res = client
        .post(format!("{}/api/v1/auth/password-login", server.base_url))
        .json(&json!({"email": unique_email("nobody"), "password": "hunter2hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await?["error_code"], "UNREGISTERED_EMAIL");

    let res = client
        .post(format!("{}/api/v1/auth/password-login", server.base_url))
        .json(&json!({"email": email, "password": "wrongpassword"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await?["error_code"], "WRONG_PASSWORD");

    let res = client
        .post(format!("{}/api/v1/auth/password-login", server.base_url))
        .json(&json!({"email": email, "password": "hunter2hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await?["data"]["token"].is_string());
    Ok(())
}

#[tokio::test]
async fn admin_routes_reject_regular_users() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &server.base_url, &unique_email("nonadmin")).await?;

    let res = client
        .get(format!("{}/api/v1/users", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await?["error_code"], "RESOURCE_FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn changing_the_password_invalidates_old_tokens() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &server.base_url, &unique_email("rotate")).await?;

    // Mismatched confirmation is rejected
    let res = client
        .post(format!("{}/api/v1/auth/change-password", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"password1": "newpassword1", "password2": "different1"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await?["error_code"], "VALUES_DONT_MATCH");

    let res = client
        .post(format!("{}/api/v1/auth/change-password", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"password1": "newpassword1", "password2": "newpassword1"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // The old token's version no longer matches
    let res = client
        .patch(format!("{}/api/v1/users", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"first_name": "Ada"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?["error_code"], "TOKEN_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn profiles_belong_to_their_owner() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (owner_token, _) = register(&client, &server.base_url, &unique_email("owner")).await?;
    let (other_token, _) = register(&client, &server.base_url, &unique_email("other")).await?;

    let res = client
        .post(format!("{}/api/v1/profiles", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({
            "first_name": "Kofi",
            "last_name": "Mensah",
            "date_of_birth": "2017-03-14"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = res.json::<Value>().await?;
    let profile_id = profile["data"]["id"].as_str().unwrap().to_string();

    // The owner sees it in the family listing
    let res = client
        .get(format!("{}/api/v1/profiles", server.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await?;
    let listing = res.json::<Value>().await?;
    assert!(listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["id"] == profile_id.as_str()));

    // Another account cannot update it
    let res = client
        .patch(format!("{}/api/v1/profiles/{}", server.base_url, profile_id))
        .bearer_auth(&other_token)
        .json(&json!({"first_name": "Intruder"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The owner can delete it
    let res = client
        .delete(format!("{}/api/v1/profiles/{}", server.base_url, profile_id))
        .bearer_auth(&owner_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
