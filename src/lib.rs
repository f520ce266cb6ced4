use axum::http::HeaderValue;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

/// Assemble the full application router. Route groups mirror the handler
/// modules; auth is enforced per-handler through the extractors, so public
/// and protected routes can live in the same tree.
pub fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(user_routes())
        .merge(classroom_routes())
        .merge(profile_routes())
        .merge(avatar_routes())
        .merge(adventure_routes())
        .merge(video_routes())
        .merge(ebook_routes())
        .merge(theme_routes())
        .merge(series_routes())
        .merge(progress_routes())
        .merge(quiz_routes())
        .merge(tab_routes())
        .merge(upload_routes())
        .merge(notification_routes())
        .merge(redirect_routes())
        .merge(stats_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_routes() -> Router {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/password-login", post(auth::password_login))
        .route("/api/v1/auth/class-code-login", post(auth::class_code_login))
        .route("/api/v1/auth/google", post(auth::google_auth))
        .route(
            "/api/v1/auth/request-passwordless-login",
            post(auth::request_passwordless_login),
        )
        .route(
            "/api/v1/auth/verify-passwordless-login",
            post(auth::verify_passwordless_login),
        )
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route(
            "/api/v1/auth/request-email-verification",
            post(auth::request_email_verification),
        )
        .route("/api/v1/auth/verify-email", post(auth::verify_email))
}

fn user_routes() -> Router {
    use axum::routing::delete;
    use handlers::users;

    Router::new()
        .route(
            "/api/v1/users",
            get(users::list_users)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/v1/users/family-account",
            delete(users::delete_family_account),
        )
        .route(
            "/api/v1/users/teacher-account",
            delete(users::delete_teacher_account),
        )
}

fn classroom_routes() -> Router {
    use handlers::classrooms;

    Router::new()
        .route(
            "/api/v1/classrooms",
            get(classrooms::list_classrooms)
                .post(classrooms::create_classroom)
                .delete(classrooms::delete_classrooms),
        )
        .route(
            "/api/v1/classrooms/:id",
            axum::routing::patch(classrooms::update_classroom),
        )
        .route(
            "/api/v1/classrooms/:id/students",
            get(classrooms::list_students),
        )
}

fn profile_routes() -> Router {
    use handlers::profiles;

    Router::new()
        .route(
            "/api/v1/profiles",
            get(profiles::list_own_profiles).post(profiles::create_profile),
        )
        .route("/api/v1/profiles/all", get(profiles::list_all_profiles))
        .route(
            "/api/v1/profiles/:id",
            get(profiles::get_profile)
                .patch(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
}

fn avatar_routes() -> Router {
    use axum::routing::delete;
    use handlers::avatars;

    Router::new()
        .route(
            "/api/v1/avatars",
            get(avatars::list_avatars).post(avatars::create_avatars),
        )
        .route("/api/v1/avatars/:id", delete(avatars::delete_avatar))
}

fn adventure_routes() -> Router {
    use axum::routing::post;
    use handlers::adventures;

    Router::new()
        .route("/api/v1/adventures/:id", get(adventures::get_adventure))
        .route(
            "/api/v1/adventures/:id/save-for-later",
            post(adventures::save_for_later),
        )
        .route(
            "/api/v1/adventures/assign-themes",
            post(adventures::assign_themes),
        )
        .route(
            "/api/v1/adventures/unassign-theme",
            post(adventures::unassign_theme),
        )
}

fn video_routes() -> Router {
    use axum::routing::post;
    use handlers::videos;

    Router::new()
        .route(
            "/api/v1/videos",
            get(videos::list_videos).post(videos::upload_video),
        )
        .route("/api/v1/videos/store-metadata", post(videos::store_metadata))
        .route(
            "/api/v1/videos/:id",
            axum::routing::patch(videos::update_video).delete(videos::delete_video),
        )
}

fn ebook_routes() -> Router {
    use axum::routing::{patch, post};
    use handlers::ebooks;

    Router::new()
        .route(
            "/api/v1/ebooks",
            get(ebooks::list_ebooks).post(ebooks::upload_ebook),
        )
        .route(
            "/api/v1/ebooks/store-metadata/create",
            post(ebooks::store_metadata_create),
        )
        .route(
            "/api/v1/ebooks/store-metadata/update",
            post(ebooks::store_metadata_update),
        )
        .route(
            "/api/v1/ebooks/:id",
            patch(ebooks::update_ebook).delete(ebooks::delete_ebook),
        )
        .route("/api/v1/ebooks/:id/file", patch(ebooks::update_ebook_file))
}

fn theme_routes() -> Router {
    use handlers::themes;

    Router::new()
        .route(
            "/api/v1/themes",
            get(themes::list_themes).post(themes::create_theme),
        )
        .route(
            "/api/v1/themes/:id",
            axum::routing::delete(themes::delete_theme),
        )
}

fn series_routes() -> Router {
    use handlers::series;

    Router::new().route(
        "/api/v1/series",
        get(series::list_series).post(series::create_series),
    )
}

fn progress_routes() -> Router {
    use axum::routing::patch;
    use handlers::progress;

    Router::new().route("/api/v1/progress/:id", patch(progress::update_progress))
}

fn quiz_routes() -> Router {
    use axum::routing::{patch, post};
    use handlers::{quiz_attempts, quizzes};

    Router::new()
        .route("/api/v1/quizzes", post(quizzes::create_quiz))
        .route(
            "/api/v1/quizzes/:id",
            axum::routing::delete(quizzes::delete_quiz),
        )
        .route(
            "/api/v1/quiz-attempts/:id/responses",
            post(quiz_attempts::record_response),
        )
        .route(
            "/api/v1/quiz-attempts/:id",
            patch(quiz_attempts::finish_attempt),
        )
}

fn tab_routes() -> Router {
    use handlers::{explore_tab, my_explorer_tab, tabs};

    Router::new()
        .route("/api/v1/explore-tab/videos", get(explore_tab::explore_videos))
        .route("/api/v1/explore-tab/ebooks", get(explore_tab::explore_ebooks))
        .route(
            "/api/v1/explore-tab/in-progress",
            get(explore_tab::explore_in_progress),
        )
        .route("/api/v1/explore-tab/diys", get(explore_tab::explore_diys))
        .route(
            "/api/v1/my-explorer-tab/in-progress",
            get(my_explorer_tab::in_progress),
        )
        .route(
            "/api/v1/my-explorer-tab/finished",
            get(my_explorer_tab::finished),
        )
        .route("/api/v1/my-explorer-tab/saved", get(my_explorer_tab::saved))
        .route(
            "/api/v1/my-explorer-tab/stats",
            get(my_explorer_tab::profile_stats),
        )
        .route(
            "/api/v1/videos-tab/discover-new",
            get(tabs::videos_discover_new),
        )
        .route("/api/v1/videos-tab/themes", get(tabs::videos_themes))
        .route("/api/v1/videos-tab/series", get(tabs::videos_series))
        .route(
            "/api/v1/ebooks-tab/discover-new",
            get(tabs::ebooks_discover_new),
        )
        .route("/api/v1/ebooks-tab/themes", get(tabs::ebooks_themes))
}

fn upload_routes() -> Router {
    use axum::routing::post;
    use handlers::uploads;

    Router::new()
        .route("/api/v1/upload-urls/video", post(uploads::video_urls))
        .route("/api/v1/upload-urls/ebook", post(uploads::ebook_urls))
        .route(
            "/api/v1/upload-urls/thumbnail",
            post(uploads::thumbnail_upload_urls),
        )
        .route("/api/v1/upload-urls/avatar", post(uploads::avatar_urls))
        .route(
            "/api/v1/upload-urls/theme-icon",
            post(uploads::theme_icon_urls),
        )
        .route("/api/v1/upload-urls/quiz", post(uploads::quiz_urls))
}

fn notification_routes() -> Router {
    use axum::routing::post;
    use handlers::notifications;

    Router::new().route(
        "/api/v1/notifications/send-device-token",
        post(notifications::send_device_token),
    )
}

fn redirect_routes() -> Router {
    use handlers::redirects;

    Router::new()
        .route("/api/v1/login-link", get(redirects::login_link))
        .route("/api/v1/verify-email-link", get(redirects::verify_email_link))
}

fn stats_routes() -> Router {
    use handlers::stats;

    Router::new()
        .route("/api/v1/stats/adventures/:id", get(stats::adventure_stats))
        .route("/api/v1/stats/overview", get(stats::overview))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "status": true,
        "message": "Request successful",
        "data": {
            "name": "Wonderspaced API",
            "version": version,
            "description": "Backend API for the Wonderspaced children's educational media platform",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": true,
                "message": "Request successful",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": false,
                "error_code": "INTERNAL_SERVER_ERROR",
                "message": "Service degraded",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
