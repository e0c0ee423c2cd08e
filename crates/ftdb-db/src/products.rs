//! Queries for the `products` table, including the row-level operations used
//! by bulk ingestion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use crate::{DbError, Page};

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub product_id: String,
    pub trend_id: i64,
    pub name: String,
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub gender: String,
    pub season: Option<String>,
    pub availability_status: String,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for product listing. All supplied filters combine with
/// AND; `query` is OR-ed across name, description, and brand. Price bounds
/// are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters<'a> {
    pub query: Option<&'a str>,
    pub trend_id: Option<i64>,
    pub product_type: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub availability_status: Option<&'a str>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub category_id: Option<i64>,
    /// Case-insensitive substring match on the ancestor category name.
    pub category_name: Option<&'a str>,
}

/// Fields for inserting one product row. `product_id` has already been
/// resolved (caller-supplied or derived); unset `currency`, `gender`, and
/// `availability_status` fall back to the column defaults.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: String,
    pub trend_id: i64,
    pub name: String,
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub gender: Option<String>,
    pub season: Option<String>,
    pub availability_status: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
}

/// Global product statistics.
#[derive(Debug, Clone)]
pub struct ProductStats {
    pub total_products: i64,
    pub by_type: BTreeMap<String, i64>,
    /// Top-10 brands by product count; ties resolved by first-seen row id.
    pub top_brands: Vec<(String, i64)>,
    pub by_availability: BTreeMap<String, i64>,
}

const PRODUCT_COLUMNS: &str = "id, product_id, trend_id, name, product_type, description, brand, \
     price, currency, color, size, material, gender, season, availability_status, \
     image_url, product_url, created_at, updated_at";

/// Lists products ordered by name (id as tie-break).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: ProductFilters<'_>,
    page: Page,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT p.id, p.product_id, p.trend_id, p.name, p.product_type, p.description, \
                p.brand, p.price, p.currency, p.color, p.size, p.material, p.gender, \
                p.season, p.availability_status, p.image_url, p.product_url, \
                p.created_at, p.updated_at \
         FROM products p \
         JOIN trends t ON t.id = p.trend_id \
         JOIN verticals v ON v.id = t.vertical_id \
         JOIN categories c ON c.id = v.category_id \
         WHERE ($1::TEXT IS NULL OR p.name ILIKE '%' || $1 || '%' \
                               OR p.description ILIKE '%' || $1 || '%' \
                               OR p.brand ILIKE '%' || $1 || '%') \
           AND ($2::BIGINT IS NULL OR p.trend_id = $2) \
           AND ($3::TEXT IS NULL OR p.product_type = $3) \
           AND ($4::TEXT IS NULL OR p.brand = $4) \
           AND ($5::TEXT IS NULL OR p.gender = $5) \
           AND ($6::TEXT IS NULL OR p.availability_status = $6) \
           AND ($7::NUMERIC IS NULL OR p.price >= $7) \
           AND ($8::NUMERIC IS NULL OR p.price <= $8) \
           AND ($9::BIGINT IS NULL OR v.category_id = $9) \
           AND ($10::TEXT IS NULL OR c.name ILIKE '%' || $10 || '%') \
         ORDER BY p.name ASC, p.id ASC \
         LIMIT $11 OFFSET $12",
    )
    .bind(filters.query)
    .bind(filters.trend_id)
    .bind(filters.product_type)
    .bind(filters.brand)
    .bind(filters.gender)
    .bind(filters.availability_status)
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(filters.category_id)
    .bind(filters.category_name)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a product by numeric id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns whether a product with this external `product_id` exists.
///
/// Accepts any executor so that bulk ingestion can run it inside its
/// transaction and observe rows inserted earlier in the same batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_exists<'e, E>(executor: E, product_id: &str) -> Result<bool, DbError>
where
    E: PgExecutor<'e>,
{
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE product_id = $1)",
    )
    .bind(product_id)
    .fetch_one(executor)
    .await?;

    Ok(exists)
}

/// Inserts a single product row, returning its internal id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on constraint violations (duplicate
/// `product_id`, invalid `trend_id` foreign key) or other failures; bulk
/// ingestion catches these per row.
pub async fn insert_product<'e, E>(executor: E, product: &NewProduct) -> Result<i64, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (product_id, trend_id, name, product_type, description, brand, price, \
              currency, color, size, material, gender, season, availability_status, \
              image_url, product_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, \
                 COALESCE($8, 'USD'), $9, $10, $11, COALESCE($12, 'unisex'), $13, \
                 COALESCE($14, 'in_stock'), $15, $16) \
         RETURNING id",
    )
    .bind(&product.product_id)
    .bind(product.trend_id)
    .bind(&product.name)
    .bind(&product.product_type)
    .bind(&product.description)
    .bind(&product.brand)
    .bind(product.price)
    .bind(&product.currency)
    .bind(&product.color)
    .bind(&product.size)
    .bind(&product.material)
    .bind(&product.gender)
    .bind(&product.season)
    .bind(&product.availability_status)
    .bind(&product.image_url)
    .bind(&product.product_url)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Computes product statistics: totals, type and availability breakdowns,
/// and the top-10 brands by product count (ties broken by first-seen row id).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the grouped queries fail.
pub async fn product_stats(pool: &PgPool) -> Result<ProductStats, DbError> {
    let total_products = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    let by_type = sqlx::query_as::<_, (String, i64)>(
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

    let by_availability = sqlx::query_as::<_, (String, i64)>(
        "SELECT availability_status, COUNT(*) FROM products GROUP BY availability_status",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    Ok(ProductStats {
        total_products,
        by_type,
        top_brands,
        by_availability,
    })
}
