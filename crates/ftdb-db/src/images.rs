//! Queries for the `trend_images` table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{DbError, Page};

/// A row from the `trend_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub trend_id: i64,
    pub image_type: String,
    pub md5_hash: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for image listing.
#[derive(Debug, Clone, Default)]
pub struct ImageFilters<'a> {
    pub trend_id: Option<i64>,
    pub image_type: Option<&'a str>,
}

/// Total image count plus a per-polarity breakdown.
#[derive(Debug, Clone)]
pub struct ImageStats {
    pub total_images: i64,
    pub by_type: BTreeMap<String, i64>,
}

/// Lists images ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_images(
    pool: &PgPool,
    filters: ImageFilters<'_>,
    page: Page,
) -> Result<Vec<ImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ImageRow>(
        "SELECT id, trend_id, image_type, md5_hash, description, created_at, updated_at \
         FROM trend_images \
         WHERE ($1::BIGINT IS NULL OR trend_id = $1) \
           AND ($2::TEXT IS NULL OR image_type = $2) \
         ORDER BY id ASC \
         LIMIT $3 OFFSET $4",
    )
    .bind(filters.trend_id)
    .bind(filters.image_type)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches an image by numeric id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_image(pool: &PgPool, id: i64) -> Result<Option<ImageRow>, DbError> {
    let row = sqlx::query_as::<_, ImageRow>(
        "SELECT id, trend_id, image_type, md5_hash, description, created_at, updated_at \
         FROM trend_images \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the total image count and a grouped count per polarity.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn image_stats(pool: &PgPool) -> Result<ImageStats, DbError> {
    let total_images =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM trend_images")
            .fetch_one(pool)
            .await?;

    let by_type = sqlx::query_as::<_, (String, i64)>(
        "SELECT image_type, COUNT(*) FROM trend_images GROUP BY image_type",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    Ok(ImageStats {
        total_images,
        by_type,
    })
}
