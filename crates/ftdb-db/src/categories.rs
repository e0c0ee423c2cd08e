//! Queries for the `categories` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{DbError, Page};

/// A category with its derived vertical count.
///
/// `vertical_count` is recomputed from current `verticals` rows in the same
/// round trip; it is never stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vertical_count: i64,
}

/// Lists categories ordered by name (id as tie-break), with vertical counts.
///
/// `query` is a case-insensitive substring match against the category name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(
    pool: &PgPool,
    query: Option<&str>,
    page: Page,
) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name, c.description, c.created_at, c.updated_at, \
                COUNT(v.id) AS vertical_count \
         FROM categories c \
         LEFT JOIN verticals v ON v.category_id = c.id \
         WHERE ($1::TEXT IS NULL OR c.name ILIKE '%' || $1 || '%') \
         GROUP BY c.id \
         ORDER BY c.name ASC, c.id ASC \
         LIMIT $2 OFFSET $3",
    )
    .bind(query)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single category by numeric id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name, c.description, c.created_at, c.updated_at, \
                COUNT(v.id) AS vertical_count \
         FROM categories c \
         LEFT JOIN verticals v ON v.category_id = c.id \
         WHERE c.id = $1 \
         GROUP BY c.id",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
