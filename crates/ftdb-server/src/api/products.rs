use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Acquire;

use ftdb_core::derive_product_id;

use super::params::{
    parse_availability, parse_bool, parse_decimal, parse_gender, parse_i64, parse_limit,
    parse_offset, parse_path_id,
};
use super::{map_db_error, ApiError, AppState, BrandCount};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    product_id: String,
    trend_id: i64,
    name: String,
    product_type: Option<String>,
    description: Option<String>,
    brand: Option<String>,
    price: Option<Decimal>,
    currency: String,
    color: Option<String>,
    size: Option<String>,
    material: Option<String>,
    gender: String,
    season: Option<String>,
    availability_status: String,
    image_url: Option<String>,
    product_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ftdb_db::ProductRow> for ProductItem {
    fn from(row: ftdb_db::ProductRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            trend_id: row.trend_id,
            name: row.name,
            product_type: row.product_type,
            description: row.description,
            brand: row.brand,
            price: row.price,
            currency: row.currency,
            color: row.color,
            size: row.size,
            material: row.material,
            gender: row.gender,
            season: row.season,
            availability_status: row.availability_status,
            image_url: row.image_url,
            product_url: row.product_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub query: Option<String>,
    pub trend_id: Option<String>,
    pub product_type: Option<String>,
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub availability_status: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductStatsResponse {
    total_products: i64,
    by_type: BTreeMap<String, i64>,
    top_brands: Vec<BrandCount>,
    by_availability: BTreeMap<String, i64>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductItem>>, ApiError> {
    let page = ftdb_db::Page {
        limit: parse_limit(query.limit.as_deref())?,
        offset: parse_offset(query.offset.as_deref())?,
    };
    let filters = ftdb_db::ProductFilters {
        query: query.query.as_deref(),
        trend_id: parse_i64("trend_id", query.trend_id.as_deref())?,
        product_type: query.product_type.as_deref(),
        brand: query.brand.as_deref(),
        gender: parse_gender(query.gender.as_deref())?,
        availability_status: parse_availability(query.availability_status.as_deref())?,
        min_price: parse_decimal("min_price", query.min_price.as_deref())?,
        max_price: parse_decimal("max_price", query.max_price.as_deref())?,
        category_id: parse_i64("category_id", query.category_id.as_deref())?,
        category_name: query.category_name.as_deref(),
    };

    let rows = ftdb_db::list_products(&state.pool, filters, page)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(rows.into_iter().map(ProductItem::from).collect()))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductItem>, ApiError> {
    let id = parse_path_id(&id)?;

    let row = ftdb_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    Ok(Json(row.into()))
}

pub(super) async fn product_stats(
    State(state): State<AppState>,
) -> Result<Json<ProductStatsResponse>, ApiError> {
    let stats = ftdb_db::product_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(ProductStatsResponse {
        total_products: stats.total_products,
        by_type: stats.by_type,
        top_brands: stats
            .top_brands
            .into_iter()
            .map(|(brand, product_count)| BrandCount {
                brand,
                product_count,
            })
            .collect(),
        by_availability: stats.by_availability,
    }))
}

// ---------------------------------------------------------------------------
// Bulk ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct BulkUploadRequest {
    pub products: Vec<BulkProductRow>,
    /// Requests enrichment for rows carrying an `image_url`. Clients may
    /// also pass `?analyze=true`; either form enables it.
    #[serde(default)]
    pub analyze: Option<bool>,
}

/// One inbound product record. `product_id` is optional (derived from the
/// name and row position when absent); `trend_id` and `name` are validated
/// per row rather than by the deserializer so a bad row reports its index
/// instead of failing the whole request.
#[derive(Debug, Deserialize)]
pub(super) struct BulkProductRow {
    pub product_id: Option<String>,
    pub trend_id: Option<i64>,
    pub name: Option<String>,
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

#[derive(Debug, Deserialize)]
pub(super) struct BulkQuery {
    pub analyze: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RowAnalysis {
    row: usize,
    product_id: String,
    analysis: ftdb_vision::AnalysisResult,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkUploadResponse {
    uploaded_count: i64,
    skipped_count: i64,
    error_count: i64,
    /// Row-indexed messages, or `null` when the batch was clean.
    errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analyzed_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis_results: Option<Vec<RowAnalysis>>,
}

/// Ingests a batch of products with per-row partial failure.
///
/// Rows are processed in order inside one transaction; each insert runs
/// under a savepoint so a constraint violation poisons only its own row.
/// Duplicate detection queries through the same transaction and therefore
/// sees rows inserted earlier in the batch. Only a commit failure makes the
/// batch all-or-nothing.
pub(super) async fn bulk_upload(
    State(state): State<AppState>,
    Query(query): Query<BulkQuery>,
    payload: Result<Json<BulkUploadRequest>, JsonRejection>,
) -> Result<Json<BulkUploadResponse>, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::validation(format!("invalid request body: {e}"), "products"))?;
    let analyze = parse_bool("analyze", query.analyze.as_deref())?.unwrap_or(false)
        || request.analyze.unwrap_or(false);

    let mut tx = state.pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "failed to open bulk upload transaction");
        ApiError::new("batch_failure", "failed to begin batch transaction")
    })?;

    let mut uploaded_count = 0;
    let mut skipped_count = 0;
    let mut error_count = 0;
    let mut errors: Vec<String> = Vec::new();
    let mut analyzed_count = 0;
    let mut analysis_results: Vec<RowAnalysis> = Vec::new();

    for (index, row) in request.products.iter().enumerate() {
        let row_number = index + 1;

        let Some(name) = row.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            errors.push(format!("Row {row_number}: name is required"));
            error_count += 1;
            continue;
        };
        let Some(trend_id) = row.trend_id else {
            errors.push(format!("Row {row_number}: trend_id is required"));
            error_count += 1;
            continue;
        };

        let product_id = row
            .product_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| derive_product_id(name, row_number), ToOwned::to_owned);

        match ftdb_db::product_exists(&mut *tx, &product_id).await {
            Ok(true) => {
                skipped_count += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                errors.push(format!("Row {row_number}: {e}"));
                error_count += 1;
                continue;
            }
        }

        let mut description = row.description.clone().filter(|d| !d.trim().is_empty());
        let mut material = row.material.clone().filter(|m| !m.trim().is_empty());

        if analyze {
            if let Some(image_url) = row
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
            {
                let hint = row.product_type.as_deref().unwrap_or(name);
                match state.analyzer.analyze_url(image_url, hint).await {
                    Ok(analysis) => {
                        analyzed_count += 1;
                        if description.is_none() {
                            description.clone_from(&analysis.description);
                        }
                        if material.is_none() {
                            material = analysis.material_summary();
                        }
                        analysis_results.push(RowAnalysis {
                            row: row_number,
                            product_id: product_id.clone(),
                            analysis,
                        });
                    }
                    // Non-fatal: the row is still persisted.
                    Err(e) => {
                        errors.push(format!("Row {row_number}: image analysis failed: {e}"));
                    }
                }
            }
        }

        let new_product = ftdb_db::NewProduct {
            product_id,
            trend_id,
            name: name.to_string(),
            product_type: row.product_type.clone(),
            description,
            brand: row.brand.clone(),
            price: row.price,
            currency: row.currency.clone(),
            color: row.color.clone(),
            size: row.size.clone(),
            material,
            gender: row.gender.clone(),
            season: row.season.clone(),
            availability_status: row.availability_status.clone(),
            image_url: row.image_url.clone(),
            product_url: row.product_url.clone(),
        };

        // Savepoint: a failed insert aborts only this row, not the batch
        // transaction.
        let mut savepoint = tx.begin().await.map_err(|e| {
            tracing::error!(error = %e, "failed to open row savepoint");
            ApiError::new("batch_failure", "batch transaction failed")
        })?;
        match ftdb_db::insert_product(&mut *savepoint, &new_product).await {
            Ok(_) => {
                savepoint.commit().await.map_err(|e| {
                    tracing::error!(error = %e, "failed to release row savepoint");
                    ApiError::new("batch_failure", "batch transaction failed")
                })?;
                uploaded_count += 1;
            }
            Err(e) => {
                if let Err(rollback_err) = savepoint.rollback().await {
                    tracing::error!(error = %rollback_err, "failed to roll back row savepoint");
                    return Err(ApiError::new("batch_failure", "batch transaction failed"));
                }
                errors.push(format!("Row {row_number}: {e}"));
                error_count += 1;
            }
        }
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "bulk upload commit failed; batch rolled back");
        ApiError::new("batch_failure", "batch commit failed; no rows were persisted")
    })?;

    Ok(Json(BulkUploadResponse {
        uploaded_count,
        skipped_count,
        error_count,
        errors: (!errors.is_empty()).then_some(errors),
        analyzed_count: analyze.then_some(analyzed_count),
        analysis_results: analyze.then_some(analysis_results),
    }))
}
