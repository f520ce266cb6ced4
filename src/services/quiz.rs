//! Quiz attempts: lazy per-profile attempt rows, response grading, and
//! completion checks.

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AttemptStatus, QuizAttempt, QuizQuestion, QuizResponse};

/// Get or create the attempt row for a profile/quiz pair. Backed by
/// UNIQUE (profile_id, quiz_id), so concurrent first requests converge on
/// one row.
pub async fn get_or_create_attempt(
    pool: &PgPool,
    profile_id: Uuid,
    quiz_id: Uuid,
) -> Result<QuizAttempt, DatabaseError> {
    sqlx::query(
        "INSERT INTO quiz_attempts (profile_id, quiz_id) VALUES ($1, $2) \
         ON CONFLICT (profile_id, quiz_id) DO NOTHING",
    )
    .bind(profile_id)
    .bind(quiz_id)
    .execute(pool)
    .await?;

    let attempt = sqlx::query_as::<_, QuizAttempt>(
        "SELECT * FROM quiz_attempts WHERE profile_id = $1 AND quiz_id = $2",
    )
    .bind(profile_id)
    .bind(quiz_id)
    .fetch_one(pool)
    .await?;

    Ok(attempt)
}

pub async fn has_completed_quiz(
    pool: &PgPool,
    profile_id: Uuid,
    quiz_id: Uuid,
) -> Result<bool, DatabaseError> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM quiz_attempts \
         WHERE profile_id = $1 AND quiz_id = $2 AND status = $3)",
    )
    .bind(profile_id)
    .bind(quiz_id)
    .bind(AttemptStatus::Finished.as_str())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// An answer is correct when it matches the question's answer set exactly,
/// ignoring order.
pub fn grade_answer(question: &QuizQuestion, answer: &[String]) -> bool {
    let mut expected: Vec<&str> = question.correct_answer.0.iter().map(|s| s.as_str()).collect();
    let mut given: Vec<&str> = answer.iter().map(|s| s.as_str()).collect();
    expected.sort_unstable();
    given.sort_unstable();
    !expected.is_empty() && expected == given
}

/// Record one answer on an ongoing attempt, replacing any earlier answer
/// to the same question.
pub async fn record_response(
    pool: &PgPool,
    attempt_id: Uuid,
    question: &QuizQuestion,
    answer: &[String],
) -> Result<QuizResponse, DatabaseError> {
    let is_correct = grade_answer(question, answer);
    let response = sqlx::query_as::<_, QuizResponse>(
        "INSERT INTO quiz_responses (attempt_id, question_id, answer, is_correct) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (attempt_id, question_id) \
         DO UPDATE SET answer = EXCLUDED.answer, is_correct = EXCLUDED.is_correct \
         RETURNING *",
    )
    .bind(attempt_id)
    .bind(question.id)
    .bind(sqlx::types::Json(answer.to_vec()))
    .bind(is_correct)
    .fetch_one(pool)
    .await?;
    Ok(response)
}

pub async fn finish_attempt(pool: &PgPool, attempt_id: Uuid) -> Result<QuizAttempt, DatabaseError> {
    let attempt = sqlx::query_as::<_, QuizAttempt>(
        "UPDATE quiz_attempts SET status = $2, finished_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(attempt_id)
    .bind(AttemptStatus::Finished.as_str())
    .fetch_one(pool)
    .await?;
    Ok(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn question(correct: &[&str]) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            text: "What was Grandma's surname?".to_string(),
            question_type: "multiple-choice".to_string(),
            choices: Json(vec!["Afram".to_string(), "Fordwor".to_string()]),
            correct_answer: Json(correct.iter().map(|s| s.to_string()).collect()),
            timestamp_seconds: None,
        }
    }

    #[test]
    fn grading_ignores_answer_order() {
        let q = question(&["Afram", "Fordwor"]);
        assert!(grade_answer(
            &q,
            &["Fordwor".to_string(), "Afram".to_string()]
        ));
    }

    #[test]
    fn grading_rejects_partial_and_wrong_answers() {
        let q = question(&["Afram"]);
        assert!(!grade_answer(&q, &["Fordwor".to_string()]));
        assert!(!grade_answer(&q, &[]));
        assert!(!grade_answer(
            &q,
            &["Afram".to_string(), "Fordwor".to_string()]
        ));
    }

    #[test]
    fn empty_answer_key_never_grades_correct() {
        let q = question(&[]);
        assert!(!grade_answer(&q, &[]));
    }
}
