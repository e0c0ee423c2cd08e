mod analysis;
mod categories;
mod images;
mod params;
mod products;
mod trends;
mod verticals;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id;

pub const API_VERSION: &str = "1.0.0";

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub analyzer: Arc<ftdb_vision::Analyzer>,
}

/// Structured error body: `{"error": {"code", "message", "field?"}}`.
///
/// The code selects the HTTP status; `field` names the offending input for
/// validation errors so clients can surface it next to the right form field.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                field: None,
            },
        }
    }

    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: "validation_error".to_string(),
                message: message.into(),
                field: Some(field.into()),
            },
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("not_found", format!("{resource} not found"))
    }

    /// External provider or download failure on the standalone analysis path.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new("upstream_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::UNPROCESSABLE_ENTITY,
            "not_found" => StatusCode::NOT_FOUND,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(error: &ftdb_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new("internal_error", "database query failed")
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/categories/", get(categories::list_categories))
        .route("/api/v1/categories/{id}", get(categories::get_category))
        .route("/api/v1/verticals/", get(verticals::list_verticals))
        .route(
            "/api/v1/verticals/search/geo-zones",
            get(verticals::list_geo_zones),
        )
        .route("/api/v1/verticals/{id}", get(verticals::get_vertical))
        .route("/api/v1/trends/", get(trends::list_trends))
        .route(
            "/api/v1/trends/search/fulltext",
            get(trends::fulltext_search),
        )
        .route("/api/v1/trends/{id}", get(trends::get_trend))
        .route("/api/v1/images/", get(images::list_images))
        .route("/api/v1/images/stats/summary", get(images::image_stats))
        .route("/api/v1/images/{id}", get(images::get_image))
        .route("/api/v1/products/", get(products::list_products))
        .route(
            "/api/v1/products/stats/summary",
            get(products::product_stats),
        )
        .route("/api/v1/products/bulk", post(products::bulk_upload))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route(
            "/api/v1/analysis/analyseProduct",
            post(analysis::analyse_product),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(cors_origins))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    endpoints: BTreeMap<&'static str, &'static str>,
}

async fn root() -> Json<ServiceInfo> {
    let mut endpoints = BTreeMap::new();
    endpoints.insert("health", "/health");
    endpoints.insert("stats", "/api/v1/stats");
    endpoints.insert("categories", "/api/v1/categories/");
    endpoints.insert("verticals", "/api/v1/verticals/");
    endpoints.insert("geo_zones", "/api/v1/verticals/search/geo-zones");
    endpoints.insert("trends", "/api/v1/trends/");
    endpoints.insert("trend_fulltext", "/api/v1/trends/search/fulltext");
    endpoints.insert("images", "/api/v1/images/");
    endpoints.insert("image_stats", "/api/v1/images/stats/summary");
    endpoints.insert("products", "/api/v1/products/");
    endpoints.insert("product_stats", "/api/v1/products/stats/summary");
    endpoints.insert("product_bulk_upload", "/api/v1/products/bulk");
    endpoints.insert("analyse_product", "/api/v1/analysis/analyseProduct");

    Json(ServiceInfo {
        name: "Fashion Trends API",
        version: API_VERSION,
        endpoints,
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    api_version: &'static str,
    database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum DatabaseHealth {
    Ok {
        status: &'static str,
        version: String,
        server_time: DateTime<Utc>,
        table_counts: BTreeMap<String, i64>,
    },
    Error {
        status: &'static str,
        error: String,
    },
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match ftdb_db::health_info(&state.pool).await {
        Ok(info) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                api_version: API_VERSION,
                database: DatabaseHealth::Ok {
                    status: "ok",
                    version: info.version,
                    server_time: info.server_time,
                    table_counts: info.table_counts,
                },
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    api_version: API_VERSION,
                    database: DatabaseHealth::Error {
                        status: "error",
                        error: e.to_string(),
                    },
                }),
            )
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct BrandCount {
    pub brand: String,
    pub product_count: i64,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    total_categories: i64,
    total_verticals: i64,
    total_trends: i64,
    total_images: i64,
    total_products: i64,
    categories: BTreeMap<String, i64>,
    geo_zones: BTreeMap<String, i64>,
    image_types: BTreeMap<String, i64>,
    product_types: BTreeMap<String, i64>,
    /// Ordered by product count descending; JSON objects would not preserve
    /// that ordering, so this is an array.
    top_brands: Vec<BrandCount>,
    by_availability: BTreeMap<String, i64>,
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = ftdb_db::global_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(StatsResponse {
        total_categories: stats.total_categories,
        total_verticals: stats.total_verticals,
        total_trends: stats.total_trends,
        total_images: stats.total_images,
        total_products: stats.total_products,
        categories: stats.categories,
        geo_zones: stats.geo_zones,
        image_types: stats.image_types,
        product_types: stats.product_types,
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
