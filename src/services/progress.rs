//! Adventure progress: lazy creation on first access plus the my-explorer
//! listing queries over progress rows.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::AdventureProgress;
use crate::services::catalog::{prefix_tsquery, AdventurePreview};

/// Get or create the progress row for a profile/adventure pair. The unique
/// constraint plus ON CONFLICT DO NOTHING keeps concurrent first requests
/// from creating duplicates; the follow-up select returns whichever row won.
pub async fn get_or_create(
    pool: &PgPool,
    profile_id: Uuid,
    adventure_id: Uuid,
) -> Result<AdventureProgress, DatabaseError> {
    sqlx::query(
        "INSERT INTO adventure_progress (profile_id, adventure_id) VALUES ($1, $2) \
         ON CONFLICT (profile_id, adventure_id) DO NOTHING",
    )
    .bind(profile_id)
    .bind(adventure_id)
    .execute(pool)
    .await?;

    let progress = sqlx::query_as::<_, AdventureProgress>(
        "SELECT * FROM adventure_progress WHERE profile_id = $1 AND adventure_id = $2",
    )
    .bind(profile_id)
    .bind(adventure_id)
    .fetch_one(pool)
    .await?;

    Ok(progress)
}

/// Which slice of a profile's progress rows a listing wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerFilter {
    /// Started (has a position) but not finished
    InProgress,
    Finished,
    SavedForLater,
}

#[derive(Debug, Clone, Default)]
pub struct ExplorerParams {
    pub q: Option<String>,
    /// "video" or "ebook"
    pub content_type: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

pub async fn list_explorer_adventures(
    pool: &PgPool,
    profile_id: Uuid,
    filter: ExplorerFilter,
    params: &ExplorerParams,
) -> Result<Vec<AdventurePreview>, DatabaseError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT a.id, a.title, a.thumbnail, s.name AS series, \
         v.id AS video_id, e.id AS ebook_id, a.created_at \
         FROM adventure_progress ap \
         JOIN adventures a ON a.id = ap.adventure_id \
         LEFT JOIN series s ON s.id = a.series_id \
         LEFT JOIN videos v ON v.adventure_id = a.id \
         LEFT JOIN ebooks e ON e.adventure_id = a.id \
         WHERE ap.profile_id = ",
    );
    qb.push_bind(profile_id);

    match filter {
        ExplorerFilter::InProgress => {
            qb.push(
                " AND (ap.last_page_read IS NOT NULL OR ap.video_stopped_at IS NOT NULL) \
                 AND NOT ap.is_finished",
            );
        }
        ExplorerFilter::Finished => {
            qb.push(" AND ap.is_finished");
        }
        ExplorerFilter::SavedForLater => {
            qb.push(" AND ap.saved_for_later");
        }
    }

    match params.content_type.as_deref() {
        Some("video") => {
            qb.push(" AND v.id IS NOT NULL");
        }
        Some("ebook") => {
            qb.push(" AND e.id IS NOT NULL");
        }
        _ => {}
    }

    match params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) => {
            let tsquery = prefix_tsquery(q);
            qb.push(" AND a.search_vector @@ to_tsquery('english', ");
            qb.push_bind(tsquery.clone());
            qb.push(") ORDER BY ts_rank_cd(a.search_vector, to_tsquery('english', ");
            qb.push_bind(tsquery);
            qb.push(")) DESC, a.title ASC");
        }
        None => {
            qb.push(" ORDER BY ap.updated_at DESC OFFSET ");
            qb.push_bind(params.offset);
            qb.push(" LIMIT ");
            qb.push_bind(params.limit);
        }
    }

    Ok(qb.build_query_as::<AdventurePreview>().fetch_all(pool).await?)
}
