//! Count queries behind the admin stats endpoints and the my-explorer
//! profile stats rail.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::AttemptStatus;

#[derive(Debug, Clone, Serialize)]
pub struct AdventureStats {
    pub views: i64,
    pub completions: i64,
    pub saved_for_later: i64,
    pub quiz_attempts_started: i64,
    pub quiz_attempts_completed: i64,
    pub average_watch_time: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileStats {
    pub adventures_done: i64,
    pub videos_watched: i64,
    pub ebooks_read: i64,
    pub quizzes_done: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    pub users: i64,
    pub family_accounts: i64,
    pub teacher_accounts: i64,
    pub profiles: i64,
    pub classrooms: i64,
    pub adventures: i64,
    pub videos: i64,
    pub ebooks: i64,
    pub quizzes: i64,
}

async fn count(pool: &PgPool, sql: &str, bind: Option<Uuid>) -> Result<i64, DatabaseError> {
    let query = sqlx::query_as::<_, (i64,)>(sql);
    let (n,) = match bind {
        Some(id) => query.bind(id).fetch_one(pool).await?,
        None => query.fetch_one(pool).await?,
    };
    Ok(n)
}

/// A view is any progress row with a playback or reading position.
pub async fn adventure_stats(
    pool: &PgPool,
    adventure_id: Uuid,
) -> Result<AdventureStats, DatabaseError> {
    let views = count(
        pool,
        "SELECT count(*) FROM adventure_progress \
         WHERE adventure_id = $1 \
         AND (last_page_read IS NOT NULL OR video_stopped_at IS NOT NULL)",
        Some(adventure_id),
    )
    .await?;

    let completions = count(
        pool,
        "SELECT count(*) FROM adventure_progress WHERE adventure_id = $1 AND is_finished",
        Some(adventure_id),
    )
    .await?;

    let saved_for_later = count(
        pool,
        "SELECT count(*) FROM adventure_progress WHERE adventure_id = $1 AND saved_for_later",
        Some(adventure_id),
    )
    .await?;

    let quiz_attempts_started = count(
        pool,
        "SELECT count(*) FROM quiz_attempts qa \
         JOIN quizzes q ON q.id = qa.quiz_id WHERE q.adventure_id = $1",
        Some(adventure_id),
    )
    .await?;

    let (quiz_attempts_completed,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM quiz_attempts qa \
         JOIN quizzes q ON q.id = qa.quiz_id \
         WHERE q.adventure_id = $1 AND qa.status = $2",
    )
    .bind(adventure_id)
    .bind(AttemptStatus::Finished.as_str())
    .fetch_one(pool)
    .await?;

    let (average_watch_time,): (Option<f64>,) = sqlx::query_as(
        "SELECT avg(video_stopped_at)::float8 FROM adventure_progress \
         WHERE adventure_id = $1 AND video_stopped_at IS NOT NULL",
    )
    .bind(adventure_id)
    .fetch_one(pool)
    .await?;

    Ok(AdventureStats {
        views,
        completions,
        saved_for_later,
        quiz_attempts_started,
        quiz_attempts_completed,
        average_watch_time,
    })
}

pub async fn profile_stats(pool: &PgPool, profile_id: Uuid) -> Result<ProfileStats, DatabaseError> {
    let adventures_done = count(
        pool,
        "SELECT count(*) FROM adventure_progress \
         WHERE profile_id = $1 AND finished_at IS NOT NULL",
        Some(profile_id),
    )
    .await?;

    let videos_watched = count(
        pool,
        "SELECT count(*) FROM adventure_progress \
         WHERE profile_id = $1 AND finished_at IS NOT NULL AND video_stopped_at IS NOT NULL",
        Some(profile_id),
    )
    .await?;

    let ebooks_read = count(
        pool,
        "SELECT count(*) FROM adventure_progress \
         WHERE profile_id = $1 AND finished_at IS NOT NULL AND last_page_read IS NOT NULL",
        Some(profile_id),
    )
    .await?;

    let (quizzes_done,): (i64,) = sqlx::query_as(
        "SELECT count(DISTINCT quiz_id) FROM quiz_attempts \
         WHERE profile_id = $1 AND status = $2",
    )
    .bind(profile_id)
    .bind(AttemptStatus::Finished.as_str())
    .fetch_one(pool)
    .await?;

    Ok(ProfileStats {
        adventures_done,
        videos_watched,
        ebooks_read,
        quizzes_done,
    })
}

pub async fn overview_stats(pool: &PgPool) -> Result<OverviewStats, DatabaseError> {
    Ok(OverviewStats {
        users: count(pool, "SELECT count(*) FROM users", None).await?,
        family_accounts: count(pool, "SELECT count(*) FROM users WHERE is_family_account", None)
            .await?,
        teacher_accounts: count(pool, "SELECT count(*) FROM users WHERE is_teacher_account", None)
            .await?,
        profiles: count(pool, "SELECT count(*) FROM profiles", None).await?,
        classrooms: count(pool, "SELECT count(*) FROM classrooms", None).await?,
        adventures: count(pool, "SELECT count(*) FROM adventures", None).await?,
        videos: count(pool, "SELECT count(*) FROM videos", None).await?,
        ebooks: count(pool, "SELECT count(*) FROM ebooks", None).await?,
        quizzes: count(pool, "SELECT count(*) FROM quizzes", None).await?,
    })
}
