//! Queries for the `trends` table, including grouped image counts and
//! full-text search with a substring fallback.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{DbError, Page};

/// Trend listing row with per-polarity image counts.
///
/// All three counts come from the same grouped query; a trend with no images
/// reports explicit zeros.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendSummaryRow {
    pub id: i64,
    pub trend_id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_hash: Option<String>,
    pub image_count: i64,
    pub positive_image_count: i64,
    pub negative_image_count: i64,
}

/// Full trend row for detail views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendDetailRow {
    pub id: i64,
    pub trend_id: String,
    pub vertical_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row returned by the full-text search over trend descriptions.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FulltextRow {
    pub id: i64,
    pub trend_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Optional filters for trend listing. All supplied filters combine with AND;
/// `query` is OR-ed across trend name and description.
#[derive(Debug, Clone, Default)]
pub struct TrendFilters<'a> {
    pub vertical_id: Option<i64>,
    /// Case-insensitive substring match on the parent vertical name.
    pub vertical_name: Option<&'a str>,
    pub category_id: Option<i64>,
    /// Case-insensitive substring match on the ancestor category name.
    pub category_name: Option<&'a str>,
    pub geo_zone: Option<&'a str>,
    /// Case-insensitive substring match on trend name OR description.
    pub query: Option<&'a str>,
    /// `Some(true)`: at least one image; `Some(false)`: exactly zero.
    pub has_images: Option<bool>,
    /// Restricts to trends with at least one image of this polarity. Applied
    /// to the joined image rows before grouping, so the counts reflect only
    /// that polarity.
    pub image_type: Option<&'a str>,
}

/// Lists trends with grouped image counts in a single round trip.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trends(
    pool: &PgPool,
    filters: TrendFilters<'_>,
    page: Page,
) -> Result<Vec<TrendSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSummaryRow>(
        "SELECT t.id, t.trend_id, t.name, t.description, t.image_hash, \
                COUNT(ti.id) AS image_count, \
                COUNT(ti.id) FILTER (WHERE ti.image_type = 'positive') AS positive_image_count, \
                COUNT(ti.id) FILTER (WHERE ti.image_type = 'negative') AS negative_image_count \
         FROM trends t \
         JOIN verticals v ON v.id = t.vertical_id \
         JOIN categories c ON c.id = v.category_id \
         LEFT JOIN trend_images ti ON ti.trend_id = t.id \
         WHERE ($1::BIGINT IS NULL OR t.vertical_id = $1) \
           AND ($2::TEXT IS NULL OR v.name ILIKE '%' || $2 || '%') \
           AND ($3::BIGINT IS NULL OR v.category_id = $3) \
           AND ($4::TEXT IS NULL OR c.name ILIKE '%' || $4 || '%') \
           AND ($5::TEXT IS NULL OR v.geo_zone = $5) \
           AND ($6::TEXT IS NULL OR t.name ILIKE '%' || $6 || '%' \
                                 OR t.description ILIKE '%' || $6 || '%') \
           AND ($7::TEXT IS NULL OR ti.image_type = $7) \
         GROUP BY t.id \
         HAVING ($8::BOOLEAN IS NULL OR (COUNT(ti.id) > 0) = $8) \
         ORDER BY t.name ASC, t.id ASC \
         LIMIT $9 OFFSET $10",
    )
    .bind(filters.vertical_id)
    .bind(filters.vertical_name)
    .bind(filters.category_id)
    .bind(filters.category_name)
    .bind(filters.geo_zone)
    .bind(filters.query)
    .bind(filters.image_type)
    .bind(filters.has_images)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a trend by numeric id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_trend(pool: &PgPool, id: i64) -> Result<Option<TrendDetailRow>, DbError> {
    let row = sqlx::query_as::<_, TrendDetailRow>(
        "SELECT id, trend_id, vertical_id, name, description, image_hash, \
                created_at, updated_at \
         FROM trends \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Full-text search over trend descriptions.
///
/// Attempts a native `tsvector` match first; any database error from that
/// query triggers a silent fallback to the same case-insensitive substring
/// semantics used by the list filters. Only a failure of the fallback itself
/// is surfaced.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the fallback query fails.
pub async fn fulltext_search(
    pool: &PgPool,
    q: &str,
    limit: i64,
) -> Result<Vec<FulltextRow>, DbError> {
    let native = sqlx::query_as::<_, FulltextRow>(
        "SELECT id, trend_id, name, description \
         FROM trends \
         WHERE to_tsvector('english', COALESCE(description, '')) @@ plainto_tsquery('english', $1) \
         ORDER BY name ASC, id ASC \
         LIMIT $2",
    )
    .bind(q)
    .bind(limit)
    .fetch_all(pool)
    .await;

    match native {
        Ok(rows) => Ok(rows),
        Err(e) => {
            tracing::debug!(error = %e, "native full-text search failed; using substring fallback");
            let rows = sqlx::query_as::<_, FulltextRow>(
                "SELECT id, trend_id, name, description \
                 FROM trends \
                 WHERE description ILIKE '%' || $1 || '%' \
                 ORDER BY name ASC, id ASC \
                 LIMIT $2",
            )
            .bind(q)
            .bind(limit)
            .fetch_all(pool)
            .await?;
            Ok(rows)
        }
    }
}

/// Matches trends against a merged keyword set: a trend qualifies when any
/// keyword is a substring of its name or description, or of its ancestor
/// vertical or category name. Keywords are bound as a text array so the SQL
/// stays static regardless of how many the caller supplies.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_trends_by_keywords(
    pool: &PgPool,
    keywords: &[String],
    limit: i64,
) -> Result<Vec<TrendSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSummaryRow>(
        "SELECT t.id, t.trend_id, t.name, t.description, t.image_hash, \
                COUNT(ti.id) AS image_count, \
                COUNT(ti.id) FILTER (WHERE ti.image_type = 'positive') AS positive_image_count, \
                COUNT(ti.id) FILTER (WHERE ti.image_type = 'negative') AS negative_image_count \
         FROM trends t \
         JOIN verticals v ON v.id = t.vertical_id \
         JOIN categories c ON c.id = v.category_id \
         LEFT JOIN trend_images ti ON ti.trend_id = t.id \
         WHERE EXISTS ( \
             SELECT 1 FROM unnest($1::TEXT[]) AS kw \
             WHERE t.name ILIKE '%' || kw || '%' \
                OR t.description ILIKE '%' || kw || '%' \
                OR v.name ILIKE '%' || kw || '%' \
                OR c.name ILIKE '%' || kw || '%' \
         ) \
         GROUP BY t.id \
         ORDER BY t.name ASC, t.id ASC \
         LIMIT $2",
    )
    .bind(keywords)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
