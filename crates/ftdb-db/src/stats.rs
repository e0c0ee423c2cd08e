//! Catalog-wide aggregate statistics and health introspection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Global aggregate counts across every resource type.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub total_categories: i64,
    pub total_verticals: i64,
    pub total_trends: i64,
    pub total_images: i64,
    pub total_products: i64,
    /// Category name -> vertical count.
    pub categories: BTreeMap<String, i64>,
    /// Geo zone -> vertical count.
    pub geo_zones: BTreeMap<String, i64>,
    /// Image type -> image count.
    pub image_types: BTreeMap<String, i64>,
    /// Product type -> product count.
    pub product_types: BTreeMap<String, i64>,
    /// Top-10 brands by product count; ties resolved by first-seen row id.
    pub top_brands: Vec<(String, i64)>,
    /// Availability status -> product count.
    pub by_availability: BTreeMap<String, i64>,
}

/// Database details reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct HealthInfo {
    pub version: String,
    pub server_time: DateTime<Utc>,
    pub table_counts: BTreeMap<String, i64>,
}

/// Computes the global statistics described by `GET /api/v1/stats`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the grouped queries fail.
pub async fn global_stats(pool: &PgPool) -> Result<GlobalStats, DbError> {
    // Totals in one round trip.
    let (total_categories, total_verticals, total_trends, total_images, total_products) =
        sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM categories), \
                    (SELECT COUNT(*) FROM verticals), \
                    (SELECT COUNT(*) FROM trends), \
                    (SELECT COUNT(*) FROM trend_images), \
                    (SELECT COUNT(*) FROM products)",
        )
        .fetch_one(pool)
        .await?;

    let categories: BTreeMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT c.name, COUNT(v.id) FROM categories c \
         LEFT JOIN verticals v ON v.category_id = c.id \
         GROUP BY c.name",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let geo_zones: BTreeMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT geo_zone, COUNT(*) FROM verticals GROUP BY geo_zone",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let image_types: BTreeMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT image_type, COUNT(*) FROM trend_images GROUP BY image_type",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let product_types: BTreeMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT product_type, COUNT(*) FROM products \
         WHERE product_type IS NOT NULL GROUP BY product_type",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let top_brands = sqlx::query_as::<_, (String, i64)>(
        "SELECT brand, COUNT(*) AS product_count FROM products \
         WHERE brand IS NOT NULL \
         GROUP BY brand \
         ORDER BY product_count DESC, MIN(id) ASC \
         LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    let by_availability: BTreeMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT availability_status, COUNT(*) FROM products GROUP BY availability_status",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    Ok(GlobalStats {
        total_categories,
        total_verticals,
        total_trends,
        total_images,
        total_products,
        categories,
        geo_zones,
        image_types,
        product_types,
        top_brands,
        by_availability,
    })
}

/// Collects database version, server time, and per-table row counts for the
/// health endpoint.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn health_info(pool: &PgPool) -> Result<HealthInfo, DbError> {
    let (version, server_time) =
        sqlx::query_as::<_, (String, DateTime<Utc>)>("SELECT version(), NOW()")
            .fetch_one(pool)
            .await?;

    let (categories, verticals, trends, trend_images, products) =
        sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM categories), \
                    (SELECT COUNT(*) FROM verticals), \
                    (SELECT COUNT(*) FROM trends), \
                    (SELECT COUNT(*) FROM trend_images), \
                    (SELECT COUNT(*) FROM products)",
        )
        .fetch_one(pool)
        .await?;

    let mut table_counts = BTreeMap::new();
    table_counts.insert("categories".to_string(), categories);
    table_counts.insert("verticals".to_string(), verticals);
    table_counts.insert("trends".to_string(), trends);
    table_counts.insert("trend_images".to_string(), trend_images);
    table_counts.insert("products".to_string(), products);

    Ok(HealthInfo {
        version,
        server_time,
        table_counts,
    })
}
