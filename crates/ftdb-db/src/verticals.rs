//! Queries for the `verticals` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{DbError, Page};

/// Vertical listing row with denormalized category name and derived trend count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerticalSummaryRow {
    pub id: i64,
    pub vertical_id: String,
    pub category_id: i64,
    pub category_name: String,
    pub name: String,
    pub geo_zone: String,
    pub trend_count: i64,
}

/// Full vertical row with category context, for detail views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerticalDetailRow {
    pub id: i64,
    pub vertical_id: String,
    pub category_id: i64,
    pub category_name: String,
    pub category_description: Option<String>,
    pub name: String,
    pub geo_zone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub trend_count: i64,
}

/// Optional filters for vertical listing. All supplied filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct VerticalFilters<'a> {
    /// Exact match on the short geo code (e.g. "US").
    pub geo_zone: Option<&'a str>,
    pub category_id: Option<i64>,
    /// Case-insensitive substring match on the parent category name.
    pub category_name: Option<&'a str>,
    /// Case-insensitive substring match on the vertical name.
    pub query: Option<&'a str>,
}

/// Lists verticals with trend counts and category names in one grouped query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_verticals(
    pool: &PgPool,
    filters: VerticalFilters<'_>,
    page: Page,
) -> Result<Vec<VerticalSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, VerticalSummaryRow>(
        "SELECT v.id, v.vertical_id, v.category_id, c.name AS category_name, \
                v.name, v.geo_zone, COUNT(t.id) AS trend_count \
         FROM verticals v \
         JOIN categories c ON c.id = v.category_id \
         LEFT JOIN trends t ON t.vertical_id = v.id \
         WHERE ($1::TEXT IS NULL OR v.geo_zone = $1) \
           AND ($2::BIGINT IS NULL OR v.category_id = $2) \
           AND ($3::TEXT IS NULL OR c.name ILIKE '%' || $3 || '%') \
           AND ($4::TEXT IS NULL OR v.name ILIKE '%' || $4 || '%') \
         GROUP BY v.id, c.name \
         ORDER BY v.name ASC, v.id ASC \
         LIMIT $5 OFFSET $6",
    )
    .bind(filters.geo_zone)
    .bind(filters.category_id)
    .bind(filters.category_name)
    .bind(filters.query)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a vertical by numeric id with category context and trend count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_vertical(pool: &PgPool, id: i64) -> Result<Option<VerticalDetailRow>, DbError> {
    let row = sqlx::query_as::<_, VerticalDetailRow>(
        "SELECT v.id, v.vertical_id, v.category_id, c.name AS category_name, \
                c.description AS category_description, v.name, v.geo_zone, \
                v.created_at, v.updated_at, COUNT(t.id) AS trend_count \
         FROM verticals v \
         JOIN categories c ON c.id = v.category_id \
         LEFT JOIN trends t ON t.vertical_id = v.id \
         WHERE v.id = $1 \
         GROUP BY v.id, c.name, c.description",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the distinct set of geo zone codes, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_geo_zones(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let zones = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT geo_zone FROM verticals ORDER BY geo_zone ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(zones)
}
