//! Transactional email through the SES-style SendEmail REST API, with V4
//! signed requests. Bodies are small inline HTML, matching the product's
//! magic-link and admin-notice emails.

use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config;
use crate::services::signer::{self, Credentials};

const SEND_PATH: &str = "/v2/email/outbound-emails";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email credentials not configured")]
    NotConfigured,

    #[error("Email API returned {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

static CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

pub async fn send_email(to_email: &str, subject: &str, body_html: &str) -> Result<(), EmailError> {
    let email = &config::config().email;
    if email.access_key_id.is_empty() || email.secret_access_key.is_empty() {
        return Err(EmailError::NotConfigured);
    }

    let payload = json!({
        "FromEmailAddress": email.from_address,
        "ReplyToAddresses": [email.reply_to_address],
        "Destination": { "ToAddresses": [to_email] },
        "Content": {
            "Simple": {
                "Subject": { "Data": subject },
                "Body": {
                    "Html": { "Data": body_html },
                    "Text": { "Data": "" },
                }
            }
        }
    });
    let body = serde_json::to_vec(&payload).expect("static email payload serializes");

    let credentials = Credentials {
        access_key_id: email.access_key_id.clone(),
        secret_access_key: email.secret_access_key.clone(),
    };
    let url = format!("{}{}", email.endpoint.trim_end_matches('/'), SEND_PATH);

    let mut request = CLIENT
        .post(&url)
        .header("content-type", "application/json")
        .body(body.clone());
    for (name, value) in signer::sign_headers(
        "POST",
        &email.endpoint,
        SEND_PATH,
        "",
        &body,
        "ses",
        &email.region,
        &credentials,
        Utc::now(),
    ) {
        request = request.header(name, value);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(EmailError::UnexpectedStatus(response.status()));
    }
    info!("Email '{}' sent to {}", subject, to_email);
    Ok(())
}

/// Admin notices about processor outcomes must never fail the callback.
pub async fn send_email_best_effort(to_email: &str, subject: &str, body_html: &str) {
    if let Err(e) = send_email(to_email, subject, body_html).await {
        warn!("Email '{}' to {} failed: {}", subject, to_email, e);
    }
}

pub fn login_link_url(token: &str) -> String {
    format!(
        "{}/api/v1/login-link?token={}",
        config::config().api.public_base_url.trim_end_matches('/'),
        token
    )
}

pub fn verify_email_link_url(token: &str) -> String {
    format!(
        "{}/api/v1/verify-email-link?token={}",
        config::config().api.public_base_url.trim_end_matches('/'),
        token
    )
}

pub fn passwordless_login_body(magic_link: &str) -> String {
    format!(
        "<p>Hi there,<p>\
         <p>You're receiving this email because you requested a passwordless login. \
         Tap the link below to log in without a password:</p>\
         <a href=\"{}\" style=\"color: blue; text-decoration: none;\">Login without password</a>\
         <p>Once you log in, you can change your password in Settings. The link expires in 30 minutes.</p>\
         <p>Stay wonderful,</p>\
         <p>The Wonderspaced Team.</p>",
        magic_link
    )
}

pub fn email_verification_body(magic_link: &str) -> String {
    format!(
        "<p>Hi there,<p>\
         <p>Tap the link below to verify your email:</p>\
         <a href=\"{}\" style=\"color: blue; text-decoration: none;\">Verify Email</a>\
         <p>The link expires in 24 hours.</p>\
         <p>Stay wonderful,</p>\
         <p>The Wonderspaced Team.</p>",
        magic_link
    )
}

pub fn content_published_body(kind: &str, title: &str) -> String {
    format!(
        "<p>Hi Edna,</p>\
         <p>The upload of the {kind} titled '{title}' was successful. \
         Users can now enjoy it on the Wonderspaced app.</p>\
         <p>Thanks for uploading.</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_links_point_at_redirect_endpoints() {
        let link = login_link_url("tok123");
        assert!(link.ends_with("/api/v1/login-link?token=tok123"));
        let verify = verify_email_link_url("tok456");
        assert!(verify.ends_with("/api/v1/verify-email-link?token=tok456"));
    }

    #[test]
    fn bodies_embed_the_link() {
        let body = passwordless_login_body("https://example.com/x");
        assert!(body.contains("https://example.com/x"));
        assert!(body.contains("expires in 30 minutes"));
    }
}
