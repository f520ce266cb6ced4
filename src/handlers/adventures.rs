// Adventure detail and theme assignment. Also home of the create/delete
// helpers the video and ebook upload flows share.

use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::{
    Adventure, AdventureProgress, AttemptStatus, Ebook, Quiz, QuizAttempt, QuizQuestion, Video,
};
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult, CurrentUser};
use crate::services::files::bytes_to_mb;
use crate::services::object_store;
use crate::services::{progress as progress_service, quiz as quiz_service};

/// Insert the shared adventure row for a new video or ebook upload.
pub async fn create_adventure(
    pool: &PgPool,
    title: &str,
    thumbnail_url: &str,
    series_id: Option<Uuid>,
) -> Result<Adventure, sqlx::Error> {
    sqlx::query_as::<_, Adventure>(
        "INSERT INTO adventures (title, thumbnail, series_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(title)
    .bind(thumbnail_url)
    .bind(series_id)
    .fetch_one(pool)
    .await
}

/// Delete an adventure row and its stored thumbnail. The schema cascades
/// to the video/ebook/quiz/progress rows beneath it.
pub async fn delete_adventure(pool: &PgPool, adventure_id: Uuid) -> Result<(), ApiError> {
    let adventure = sqlx::query_as::<_, Adventure>("SELECT * FROM adventures WHERE id = $1")
        .bind(adventure_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Adventure not found"))?;

    if let Some(thumbnail) = &adventure.thumbnail {
        object_store::delete_object_best_effort(thumbnail).await;
    }

    sqlx::query("DELETE FROM adventures WHERE id = $1")
        .bind(adventure_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct AdventureQuery {
    pub profile_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct QuestionSchema {
    pub id: Uuid,
    pub text: String,
    pub choices: Vec<String>,
    pub correct_answer: Vec<String>,
    pub timestamp_seconds: Option<i32>,
    pub question_type: String,
}

#[derive(Debug, Serialize)]
pub struct QuizSchema {
    pub id: Uuid,
    pub questions: Vec<QuestionSchema>,
}

#[derive(Debug, Serialize)]
pub struct EbookPageSchema {
    pub page_number: i32,
    pub tts_url: String,
}

#[derive(Debug, Serialize)]
pub struct OngoingAttemptSchema {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct AdventureResponse {
    pub id: Uuid,
    pub title: String,
    pub video_id: Option<Uuid>,
    pub ebook_id: Option<Uuid>,
    pub thumbnail: Option<String>,
    pub series: Option<String>,
    pub themes: Vec<String>,
    /// Source size in megabytes for client display
    pub size: f64,
    pub hls_url: Option<String>,
    pub duration: Option<i32>,
    pub ebook_url: Option<String>,
    pub ebook_format: Option<String>,
    pub tts_urls: Option<Vec<EbookPageSchema>>,
    pub quiz: Option<QuizSchema>,
    pub ongoing_attempt: Option<OngoingAttemptSchema>,
    pub has_completed_quiz: Option<bool>,
    pub progress_id: Option<Uuid>,
    pub is_finished: Option<bool>,
    pub finished_at: Option<String>,
    pub video_stopped_at: Option<i32>,
    pub last_page_read: Option<i32>,
    pub saved_for_later: Option<bool>,
}

async fn theme_names(pool: &PgPool, adventure_id: Uuid) -> Result<Vec<String>, ApiError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT t.name FROM adventure_themes at \
         JOIN themes t ON t.id = at.theme_id \
         WHERE at.adventure_id = $1 ORDER BY t.name",
    )
    .bind(adventure_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// GET /api/v1/adventures/{id} - full detail. Passing `profile_id` also
/// lazily creates the progress row (and quiz attempt when a quiz exists)
/// and reports consumption state.
pub async fn get_adventure(
    CurrentUser(_user): CurrentUser,
    Path(adventure_id): Path<Uuid>,
    Query(query): Query<AdventureQuery>,
) -> ApiResult<AdventureResponse> {
    let pool = manager::pool().await?;

    let adventure = sqlx::query_as::<_, Adventure>("SELECT * FROM adventures WHERE id = $1")
        .bind(adventure_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Adventure not found"))?;

    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE adventure_id = $1")
        .bind(adventure_id)
        .fetch_optional(&pool)
        .await?;
    let ebook = sqlx::query_as::<_, Ebook>("SELECT * FROM ebooks WHERE adventure_id = $1")
        .bind(adventure_id)
        .fetch_optional(&pool)
        .await?;

    let series: Option<(String,)> = match adventure.series_id {
        Some(series_id) => {
            sqlx::query_as("SELECT name FROM series WHERE id = $1")
                .bind(series_id)
                .fetch_optional(&pool)
                .await?
        }
        None => None,
    };

    let themes = theme_names(&pool, adventure_id).await?;

    let tts_urls = match &ebook {
        Some(ebook) => {
            let pages: Vec<(i32, String)> = sqlx::query_as(
                "SELECT page_number, tts_url FROM ebook_pages \
                 WHERE ebook_id = $1 ORDER BY page_number",
            )
            .bind(ebook.id)
            .fetch_all(&pool)
            .await?;
            Some(
                pages
                    .into_iter()
                    .map(|(page_number, tts_url)| EbookPageSchema {
                        page_number,
                        tts_url,
                    })
                    .collect::<Vec<_>>(),
            )
        }
        None => None,
    };

    let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE adventure_id = $1")
        .bind(adventure_id)
        .fetch_optional(&pool)
        .await?;
    let quiz_schema = match &quiz {
        Some(quiz) => {
            let questions = sqlx::query_as::<_, QuizQuestion>(
                "SELECT * FROM quiz_questions WHERE quiz_id = $1",
            )
            .bind(quiz.id)
            .fetch_all(&pool)
            .await?;
            Some(QuizSchema {
                id: quiz.id,
                questions: questions
                    .into_iter()
                    .map(|q| QuestionSchema {
                        id: q.id,
                        text: q.text,
                        choices: q.choices.0,
                        correct_answer: q.correct_answer.0,
                        timestamp_seconds: q.timestamp_seconds,
                        question_type: q.question_type,
                    })
                    .collect(),
            })
        }
        None => None,
    };

    // Profile-scoped state: progress row and quiz attempt, created lazily
    let mut progress: Option<AdventureProgress> = None;
    let mut ongoing_attempt: Option<QuizAttempt> = None;
    let mut has_completed_quiz: Option<bool> = None;
    if let Some(profile_id) = query.profile_id {
        progress = Some(progress_service::get_or_create(&pool, profile_id, adventure_id).await?);

        if let Some(quiz) = &quiz {
            let attempt = quiz_service::get_or_create_attempt(&pool, profile_id, quiz.id).await?;
            has_completed_quiz =
                Some(quiz_service::has_completed_quiz(&pool, profile_id, quiz.id).await?);
            if attempt.status == AttemptStatus::Ongoing.as_str() {
                ongoing_attempt = Some(attempt);
            }
        }
    }

    let response = AdventureResponse {
        id: adventure.id,
        title: adventure.title,
        video_id: video.as_ref().map(|v| v.id),
        ebook_id: ebook.as_ref().map(|e| e.id),
        thumbnail: adventure.thumbnail,
        series: series.map(|(name,)| name),
        themes,
        size: adventure.file_size.map(bytes_to_mb).unwrap_or(0.0),
        hls_url: video.as_ref().and_then(|v| v.hls_url.clone()),
        duration: video.as_ref().and_then(|v| v.duration),
        ebook_url: ebook.as_ref().and_then(|e| e.url.clone()),
        ebook_format: ebook.as_ref().and_then(|e| e.format.clone()),
        tts_urls,
        quiz: quiz_schema,
        ongoing_attempt: ongoing_attempt.map(|a| OngoingAttemptSchema {
            id: a.id,
            status: a.status,
        }),
        has_completed_quiz,
        progress_id: progress.as_ref().map(|p| p.id),
        is_finished: progress.as_ref().map(|p| p.is_finished),
        finished_at: progress
            .as_ref()
            .and_then(|p| p.finished_at.map(|t| t.to_rfc3339())),
        video_stopped_at: progress
            .as_ref()
            .and_then(|p| video.as_ref().and(p.video_stopped_at)),
        last_page_read: progress
            .as_ref()
            .and_then(|p| ebook.as_ref().and(p.last_page_read)),
        saved_for_later: progress.as_ref().map(|p| p.saved_for_later),
    };

    Ok(ApiResponse::success(response))
}

#[derive(Debug, Deserialize)]
pub struct AssignThemesRequest {
    pub adventure_id: Uuid,
    /// Desired theme set by name; assignment reconciles against it
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnassignThemeRequest {
    pub adventure_id: Uuid,
    pub theme_name: String,
}

#[derive(Debug, Serialize)]
pub struct AdventureThemesResponse {
    pub id: Uuid,
    pub themes: Vec<String>,
}

/// POST /api/v1/adventures/assign-themes - reconcile the adventure's
/// themes against the given names (case-insensitive). Unknown names are
/// skipped; themes not in the list are unassigned.
pub async fn assign_themes(
    AdminUser(_admin): AdminUser,
    Json(body): Json<AssignThemesRequest>,
) -> ApiResult<AdventureThemesResponse> {
    let pool = manager::pool().await?;

    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM adventures WHERE id = $1)")
            .bind(body.adventure_id)
            .fetch_one(&pool)
            .await?;
    if !exists {
        return Err(ApiError::not_found("Adventure not found"));
    }

    for name in &body.names {
        let theme_id: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM themes WHERE lower(name) = lower($1)")
                .bind(name)
                .fetch_optional(&pool)
                .await?;
        let Some((theme_id,)) = theme_id else {
            tracing::info!("Skipped non-existent theme: {}", name);
            continue;
        };

        sqlx::query(
            "INSERT INTO adventure_themes (adventure_id, theme_id) VALUES ($1, $2) \
             ON CONFLICT (adventure_id, theme_id) DO NOTHING",
        )
        .bind(body.adventure_id)
        .bind(theme_id)
        .execute(&pool)
        .await?;
    }

    // Drop assignments whose theme is no longer in the requested set
    sqlx::query(
        "DELETE FROM adventure_themes at USING themes t \
         WHERE at.theme_id = t.id AND at.adventure_id = $1 \
         AND lower(t.name) <> ALL(SELECT lower(n) FROM unnest($2::text[]) AS n)",
    )
    .bind(body.adventure_id)
    .bind(&body.names)
    .execute(&pool)
    .await?;

    let themes = theme_names(&pool, body.adventure_id).await?;
    Ok(ApiResponse::success(AdventureThemesResponse {
        id: body.adventure_id,
        themes,
    }))
}

/// POST /api/v1/adventures/unassign-theme
pub async fn unassign_theme(
    AdminUser(_admin): AdminUser,
    Json(body): Json<UnassignThemeRequest>,
) -> ApiResult<AdventureThemesResponse> {
    let pool = manager::pool().await?;

    let theme_id: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM themes WHERE lower(name) = lower($1)")
            .bind(&body.theme_name)
            .fetch_optional(&pool)
            .await?;
    let Some((theme_id,)) = theme_id else {
        return Err(ApiError::not_found("Theme not found"));
    };

    let result = sqlx::query(
        "DELETE FROM adventure_themes WHERE adventure_id = $1 AND theme_id = $2",
    )
    .bind(body.adventure_id)
    .bind(theme_id)
    .execute(&pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(
            "This adventure doesn't have the specified theme",
        ));
    }

    let themes = theme_names(&pool, body.adventure_id).await?;
    Ok(ApiResponse::success(AdventureThemesResponse {
        id: body.adventure_id,
        themes,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveForLaterRequest {
    pub profile_id: Uuid,
    pub save_for_later: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveForLaterResponse {
    pub progress_id: Uuid,
    pub saved_for_later: bool,
}

/// POST /api/v1/adventures/{id}/save-for-later
pub async fn save_for_later(
    CurrentUser(user): CurrentUser,
    Path(adventure_id): Path<Uuid>,
    Json(body): Json<SaveForLaterRequest>,
) -> ApiResult<SaveForLaterResponse> {
    let pool = manager::pool().await?;

    let (owned,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1 AND user_id = $2)",
    )
    .bind(body.profile_id)
    .bind(user.id)
    .fetch_one(&pool)
    .await?;
    if !owned {
        return Err(ApiError::not_found("Profile not found"));
    }

    let progress = progress_service::get_or_create(&pool, body.profile_id, adventure_id).await?;
    sqlx::query(
        "UPDATE adventure_progress SET saved_for_later = $2, updated_at = now() WHERE id = $1",
    )
    .bind(progress.id)
    .bind(body.save_for_later)
    .execute(&pool)
    .await?;

    Ok(ApiResponse::success(SaveForLaterResponse {
        progress_id: progress.id,
        saved_for_later: body.save_for_later,
    }))
}
