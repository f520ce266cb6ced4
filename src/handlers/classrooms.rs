// Classroom management for teacher accounts. Class codes are short random
// strings students type in to join.

use axum::extract::Path;
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::{Classroom, User};
use crate::error::ApiError;
use crate::handlers::profiles::ProfileResponse;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

const CLASS_CODE_LENGTH: usize = 7;
const CLASS_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Deserialize)]
pub struct ClassroomCreate {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassroomUpdate {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassroomDelete {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ClassroomResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub student_count: i64,
}

pub fn generate_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLASS_CODE_LENGTH)
        .map(|_| CLASS_CODE_CHARSET[rng.gen_range(0..CLASS_CODE_CHARSET.len())] as char)
        .collect()
}

fn require_teacher(user: &User) -> Result<(), ApiError> {
    if !user.is_teacher_account {
        return Err(ApiError::forbidden_with_message(
            "Only teacher accounts can manage classrooms.",
        ));
    }
    Ok(())
}

async fn owned_classroom(
    pool: &PgPool,
    classroom_id: Uuid,
    user_id: Uuid,
) -> Result<Classroom, ApiError> {
    sqlx::query_as::<_, Classroom>("SELECT * FROM classrooms WHERE id = $1 AND user_id = $2")
        .bind(classroom_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Classroom not found"))
}

/// POST /api/v1/classrooms - the generated code retries on the rare
/// collision with an existing classroom.
pub async fn create_classroom(
    CurrentUser(user): CurrentUser,
    Json(body): Json<ClassroomCreate>,
) -> ApiResult<ClassroomResponse> {
    require_teacher(&user)?;
    let pool = manager::pool().await?;

    let mut attempts = 0;
    let classroom = loop {
        let code = generate_class_code();
        let inserted = sqlx::query_as::<_, Classroom>(
            "INSERT INTO classrooms (user_id, name, code) VALUES ($1, $2, $3) \
             ON CONFLICT (code) DO NOTHING RETURNING *",
        )
        .bind(user.id)
        .bind(&body.name)
        .bind(&code)
        .fetch_optional(&pool)
        .await?;

        if let Some(classroom) = inserted {
            break classroom;
        }
        attempts += 1;
        if attempts >= 5 {
            tracing::error!("Failed to generate a unique class code after {} tries", attempts);
            return Err(ApiError::internal_server_error());
        }
    };

    Ok(ApiResponse::success(ClassroomResponse {
        id: classroom.id,
        name: classroom.name,
        code: classroom.code,
        student_count: 0,
    }))
}

/// GET /api/v1/classrooms - the caller's classrooms with enrolment counts
pub async fn list_classrooms(
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<ClassroomResponse>> {
    require_teacher(&user)?;
    let pool = manager::pool().await?;

    let classrooms = sqlx::query_as::<_, ClassroomResponse>(
        "SELECT c.id, c.name, c.code, count(p.id) AS student_count \
         FROM classrooms c \
         LEFT JOIN profiles p ON p.classroom_id = c.id \
         WHERE c.user_id = $1 \
         GROUP BY c.id, c.name, c.code \
         ORDER BY c.created_at",
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(classrooms))
}

/// GET /api/v1/classrooms/{id}/students
pub async fn list_students(
    CurrentUser(user): CurrentUser,
    Path(classroom_id): Path<Uuid>,
) -> ApiResult<Vec<ProfileResponse>> {
    require_teacher(&user)?;
    let pool = manager::pool().await?;
    owned_classroom(&pool, classroom_id, user.id).await?;

    let students = sqlx::query_as::<_, ProfileResponse>(
        "SELECT p.id, p.first_name, p.last_name, p.date_of_birth, \
         a.url AS avatar_url, c.name AS classroom_name \
         FROM profiles p \
         LEFT JOIN avatars a ON a.id = p.avatar_id \
         LEFT JOIN classrooms c ON c.id = p.classroom_id \
         WHERE p.classroom_id = $1 \
         ORDER BY p.last_name, p.first_name",
    )
    .bind(classroom_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(students))
}

/// PATCH /api/v1/classrooms/{id} - rename
pub async fn update_classroom(
    CurrentUser(user): CurrentUser,
    Path(classroom_id): Path<Uuid>,
    Json(body): Json<ClassroomUpdate>,
) -> ApiResult<ClassroomResponse> {
    require_teacher(&user)?;
    let pool = manager::pool().await?;
    owned_classroom(&pool, classroom_id, user.id).await?;

    let classroom = sqlx::query_as::<_, Classroom>(
        "UPDATE classrooms SET name = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(classroom_id)
    .bind(&body.name)
    .fetch_one(&pool)
    .await?;

    let (student_count,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM profiles WHERE classroom_id = $1")
            .bind(classroom_id)
            .fetch_one(&pool)
            .await?;

    Ok(ApiResponse::success(ClassroomResponse {
        id: classroom.id,
        name: classroom.name,
        code: classroom.code,
        student_count,
    }))
}

/// DELETE /api/v1/classrooms - bulk delete; silently skips ids the caller
/// does not own.
pub async fn delete_classrooms(
    CurrentUser(user): CurrentUser,
    Json(body): Json<ClassroomDelete>,
) -> ApiResult<()> {
    require_teacher(&user)?;
    let pool = manager::pool().await?;

    sqlx::query("DELETE FROM classrooms WHERE user_id = $1 AND id = ANY($2)")
        .bind(user.id)
        .bind(&body.ids)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::with_message((), "Classrooms deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_are_seven_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = generate_class_code();
            assert_eq!(code.len(), CLASS_CODE_LENGTH);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }
}
