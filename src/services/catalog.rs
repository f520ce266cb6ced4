//! Catalog listing queries. Free-text search uses the database's native
//! text-search ranking over the adventure search vector; pagination and
//! search are mutually exclusive in the same query, matching the product's
//! listing behaviour.

use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Compact listing row shared by every catalog surface.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdventurePreview {
    pub id: Uuid,
    pub title: String,
    pub thumbnail: Option<String>,
    pub series: Option<String>,
    pub video_id: Option<Uuid>,
    pub ebook_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub q: Option<String>,
    pub series: Option<String>,
    pub theme: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

/// Build a prefix-matching tsquery string: each word becomes `word:*`,
/// joined with `&`.
pub fn prefix_tsquery(q: &str) -> String {
    q.split_whitespace()
        .map(|word| format!("{}:*", word))
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Plain AND-joined tsquery for whole-word search surfaces.
pub fn plain_tsquery(q: &str) -> String {
    q.split_whitespace().collect::<Vec<_>>().join(" & ")
}

fn push_theme_filter(qb: &mut QueryBuilder<'_, Postgres>, theme: &str) {
    qb.push(
        " AND EXISTS (SELECT 1 FROM adventure_themes at \
         JOIN themes t ON t.id = at.theme_id \
         WHERE at.adventure_id = a.id AND lower(t.name) = lower(",
    );
    qb.push_bind(theme.to_string());
    qb.push("))");
}

/// Either rank by search relevance or paginate by recency, never both.
fn push_search_or_pagination(
    qb: &mut QueryBuilder<'_, Postgres>,
    q: &Option<String>,
    offset: i64,
    limit: i64,
) {
    match q {
        Some(q) if !q.trim().is_empty() => {
            let tsquery = prefix_tsquery(q);
            qb.push(" AND a.search_vector @@ to_tsquery('english', ");
            qb.push_bind(tsquery.clone());
            qb.push(") ORDER BY ts_rank_cd(a.search_vector, to_tsquery('english', ");
            qb.push_bind(tsquery);
            qb.push(")) DESC, a.title ASC");
        }
        _ => {
            qb.push(" ORDER BY a.created_at DESC OFFSET ");
            qb.push_bind(offset);
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
    }
}

/// Processed videos (hls_url present), newest first, with optional series,
/// theme, and search filters.
pub async fn list_new_videos(
    pool: &PgPool,
    params: &ListParams,
) -> Result<Vec<AdventurePreview>, DatabaseError> {
    let mut qb = QueryBuilder::new(
        "SELECT a.id, a.title, a.thumbnail, s.name AS series, \
         v.id AS video_id, NULL::uuid AS ebook_id, a.created_at \
         FROM videos v \
         JOIN adventures a ON a.id = v.adventure_id \
         LEFT JOIN series s ON s.id = a.series_id \
         WHERE v.hls_url IS NOT NULL",
    );

    if let Some(series) = &params.series {
        qb.push(" AND lower(s.name) = lower(");
        qb.push_bind(series.to_string());
        qb.push(")");
    }
    if let Some(theme) = &params.theme {
        push_theme_filter(&mut qb, theme);
    }
    push_search_or_pagination(&mut qb, &params.q, params.offset, params.limit);

    Ok(qb.build_query_as::<AdventurePreview>().fetch_all(pool).await?)
}

/// Processed ebooks (source url present), same filter surface minus series.
pub async fn list_new_ebooks(
    pool: &PgPool,
    params: &ListParams,
) -> Result<Vec<AdventurePreview>, DatabaseError> {
    let mut qb = QueryBuilder::new(
        "SELECT a.id, a.title, a.thumbnail, s.name AS series, \
         NULL::uuid AS video_id, e.id AS ebook_id, a.created_at \
         FROM ebooks e \
         JOIN adventures a ON a.id = e.adventure_id \
         LEFT JOIN series s ON s.id = a.series_id \
         WHERE e.url IS NOT NULL AND e.page_count IS NOT NULL",
    );

    if let Some(theme) = &params.theme {
        push_theme_filter(&mut qb, theme);
    }
    push_search_or_pagination(&mut qb, &params.q, params.offset, params.limit);

    Ok(qb.build_query_as::<AdventurePreview>().fetch_all(pool).await?)
}

/// Adventures in a named series ("DIY" backs the explore-tab DIY rail).
/// Unknown series yields an empty list rather than an error.
pub async fn list_series_adventures(
    pool: &PgPool,
    series_name: &str,
    params: &ListParams,
) -> Result<Vec<AdventurePreview>, DatabaseError> {
    let series_id: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM series WHERE lower(name) = lower($1)")
            .bind(series_name)
            .fetch_optional(pool)
            .await?;
    let Some((series_id,)) = series_id else {
        tracing::warn!("Series not found: {}", series_name);
        return Ok(vec![]);
    };

    let mut qb = QueryBuilder::new(
        "SELECT a.id, a.title, a.thumbnail, s.name AS series, \
         v.id AS video_id, e.id AS ebook_id, a.created_at \
         FROM adventures a \
         JOIN series s ON s.id = a.series_id \
         LEFT JOIN videos v ON v.adventure_id = a.id \
         LEFT JOIN ebooks e ON e.adventure_id = a.id \
         WHERE a.series_id = ",
    );
    qb.push_bind(series_id);

    // This rail searches plain words over titles rather than prefixes
    if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let tsquery = plain_tsquery(q);
        qb.push(" AND a.search_vector @@ to_tsquery('english', ");
        qb.push_bind(tsquery.clone());
        qb.push(") ORDER BY ts_rank_cd(a.search_vector, to_tsquery('english', ");
        qb.push_bind(tsquery);
        qb.push(")) DESC, a.title ASC");
    } else {
        qb.push(" ORDER BY a.created_at DESC OFFSET ");
        qb.push_bind(params.offset);
        qb.push(" LIMIT ");
        qb.push_bind(params.limit);
    }

    Ok(qb.build_query_as::<AdventurePreview>().fetch_all(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_tsquery_marks_every_word() {
        assert_eq!(prefix_tsquery("space dinosaurs"), "space:* & dinosaurs:*");
        assert_eq!(prefix_tsquery("  moon  "), "moon:*");
        assert_eq!(prefix_tsquery(""), "");
    }

    #[test]
    fn plain_tsquery_joins_words() {
        assert_eq!(plain_tsquery("grandma picnic day"), "grandma & picnic & day");
    }
}
