// Answer recording and attempt completion. Attempt rows are created
// lazily through the adventure detail endpoint.

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::{AttemptStatus, QuizAttempt, QuizQuestion};
use crate::error::{ApiError, ErrorCode};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::quiz as quiz_service;

#[derive(Debug, Deserialize)]
pub struct ResponseCreate {
    pub question_id: Uuid,
    #[serde(default)]
    pub answer: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseResult {
    pub question_id: Uuid,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub status: String,
    pub finished_at: Option<String>,
    pub correct_count: i64,
    pub response_count: i64,
}

/// The attempt must belong to one of the caller's profiles.
async fn owned_attempt(
    pool: &sqlx::PgPool,
    attempt_id: Uuid,
    user_id: Uuid,
) -> Result<QuizAttempt, ApiError> {
    sqlx::query_as::<_, QuizAttempt>(
        "SELECT qa.* FROM quiz_attempts qa \
         JOIN profiles p ON p.id = qa.profile_id \
         WHERE qa.id = $1 AND p.user_id = $2",
    )
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Quiz attempt not found"))
}

/// POST /api/v1/quiz-attempts/{id}/responses - record (or replace) one
/// answer on an ongoing attempt, graded against the answer key.
pub async fn record_response(
    CurrentUser(user): CurrentUser,
    Path(attempt_id): Path<Uuid>,
    Json(body): Json<ResponseCreate>,
) -> ApiResult<ResponseResult> {
    let pool = manager::pool().await?;
    let attempt = owned_attempt(&pool, attempt_id, user.id).await?;

    if attempt.status != AttemptStatus::Ongoing.as_str() {
        return Err(ApiError::validation(
            ErrorCode::ValidationError,
            "This quiz attempt is already finished.",
        ));
    }

    let question = sqlx::query_as::<_, QuizQuestion>(
        "SELECT * FROM quiz_questions WHERE id = $1 AND quiz_id = $2",
    )
    .bind(body.question_id)
    .bind(attempt.quiz_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Question not found"))?;

    let response =
        quiz_service::record_response(&pool, attempt.id, &question, &body.answer).await?;

    Ok(ApiResponse::success(ResponseResult {
        question_id: question.id,
        is_correct: response.is_correct,
    }))
}

/// PATCH /api/v1/quiz-attempts/{id} - finish the attempt and return the
/// score so far.
pub async fn finish_attempt(
    CurrentUser(user): CurrentUser,
    Path(attempt_id): Path<Uuid>,
) -> ApiResult<AttemptResponse> {
    let pool = manager::pool().await?;
    let attempt = owned_attempt(&pool, attempt_id, user.id).await?;

    if attempt.status != AttemptStatus::Ongoing.as_str() {
        return Err(ApiError::validation(
            ErrorCode::ValidationError,
            "This quiz attempt is already finished.",
        ));
    }

    let attempt = quiz_service::finish_attempt(&pool, attempt.id).await?;

    let (response_count, correct_count): (i64, i64) = sqlx::query_as(
        "SELECT count(*), count(*) FILTER (WHERE is_correct) \
         FROM quiz_responses WHERE attempt_id = $1",
    )
    .bind(attempt.id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(AttemptResponse {
        id: attempt.id,
        quiz_id: attempt.quiz_id,
        status: attempt.status,
        finished_at: attempt.finished_at.map(|t| t.to_rfc3339()),
        correct_count,
        response_count,
    }))
}
