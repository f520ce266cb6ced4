// Bare HTML bridges from email links to the mobile deep link scheme.

use axum::extract::Query;
use axum::response::Html;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

fn deep_link_page(deep_link: &str) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head>\n\
         <meta http-equiv=\"refresh\" content=\"0; URL={deep_link}\" />\n\
         </head>\n\
         <body>\n\
         <p>Redirecting...</p>\n\
         <script>\n\
         window.location.href = \"{deep_link}\";\n\
         </script>\n\
         </body>\n\
         </html>"
    ))
}

/// GET /api/v1/login-link
pub async fn login_link(Query(query): Query<TokenQuery>) -> Html<String> {
    deep_link_page(&format!(
        "wonderspaced://open/passwordless-login?token={}",
        query.token
    ))
}

/// GET /api/v1/verify-email-link
pub async fn verify_email_link(Query(query): Query<TokenQuery>) -> Html<String> {
    deep_link_page(&format!(
        "wonderspaced://open/verify-email?token={}",
        query.token
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_embeds_the_deep_link_twice() {
        let Html(page) = deep_link_page("wonderspaced://open/verify-email?token=abc");
        assert_eq!(
            page.matches("wonderspaced://open/verify-email?token=abc").count(),
            2
        );
    }
}
