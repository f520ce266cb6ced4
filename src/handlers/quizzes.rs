// Quiz authoring: admins attach one quiz (with its questions) per
// adventure.

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::{Quiz, QuizQuestion};
use crate::error::{ApiError, ErrorCode};
use crate::handlers::adventures::{QuestionSchema, QuizSchema};
use crate::middleware::{AdminUser, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct QuestionCreate {
    pub text: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub correct_answer: Vec<String>,
    pub timestamp_seconds: Option<i32>,
    #[serde(default = "default_question_type")]
    pub question_type: String,
}

fn default_question_type() -> String {
    "multiple-choice".to_string()
}

#[derive(Debug, Deserialize)]
pub struct QuizCreate {
    pub adventure_id: Uuid,
    pub questions: Vec<QuestionCreate>,
}

#[derive(Debug, Serialize)]
pub struct QuizCreateResponse {
    pub adventure_id: Uuid,
    #[serde(flatten)]
    pub quiz: QuizSchema,
}

/// POST /api/v1/quizzes
pub async fn create_quiz(
    AdminUser(_admin): AdminUser,
    Json(body): Json<QuizCreate>,
) -> ApiResult<QuizCreateResponse> {
    let pool = manager::pool().await?;

    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM adventures WHERE id = $1)")
            .bind(body.adventure_id)
            .fetch_one(&pool)
            .await?;
    if !exists {
        return Err(ApiError::not_found("Adventure not found"));
    }

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    let quiz = sqlx::query_as::<_, Quiz>(
        "INSERT INTO quizzes (adventure_id) VALUES ($1) RETURNING *",
    )
    .bind(body.adventure_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::validation(
            ErrorCode::DuplicateEntry,
            "This adventure already has a quiz.",
        ),
        _ => ApiError::from(e),
    })?;

    let mut questions = Vec::with_capacity(body.questions.len());
    for question in &body.questions {
        let inserted = sqlx::query_as::<_, QuizQuestion>(
            "INSERT INTO quiz_questions \
             (quiz_id, text, question_type, choices, correct_answer, timestamp_seconds) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(quiz.id)
        .bind(&question.text)
        .bind(&question.question_type)
        .bind(SqlJson(question.choices.clone()))
        .bind(SqlJson(question.correct_answer.clone()))
        .bind(question.timestamp_seconds)
        .fetch_one(&mut *tx)
        .await?;
        questions.push(inserted);
    }

    tx.commit().await.map_err(ApiError::from)?;

    Ok(ApiResponse::success(QuizCreateResponse {
        adventure_id: body.adventure_id,
        quiz: QuizSchema {
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
        },
    }))
}

/// DELETE /api/v1/quizzes/{id} - cascades questions, attempts, responses
pub async fn delete_quiz(
    AdminUser(_admin): AdminUser,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<()> {
    let pool = manager::pool().await?;

    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Quiz not found"));
    }

    tracing::info!("Quiz deleted: {}", quiz_id);
    Ok(ApiResponse::with_message((), "Quiz deleted"))
}
