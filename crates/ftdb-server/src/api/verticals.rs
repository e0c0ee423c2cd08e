use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::{parse_bool, parse_i64, parse_limit, parse_offset, parse_path_id};
use super::trends::TrendSummary;
use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct VerticalItem {
    id: i64,
    vertical_id: String,
    category_id: i64,
    category_name: String,
    name: String,
    geo_zone: String,
    trend_count: i64,
}

impl From<ftdb_db::VerticalSummaryRow> for VerticalItem {
    fn from(row: ftdb_db::VerticalSummaryRow) -> Self {
        Self {
            id: row.id,
            vertical_id: row.vertical_id,
            category_id: row.category_id,
            category_name: row.category_name,
            name: row.name,
            geo_zone: row.geo_zone,
            trend_count: row.trend_count,
        }
    }
}

/// Detail shape; `trends` is present only when `include_trends=true`.
#[derive(Debug, Serialize)]
pub(super) struct VerticalDetail {
    id: i64,
    vertical_id: String,
    category_id: i64,
    category_name: String,
    category_description: Option<String>,
    name: String,
    geo_zone: String,
    trend_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trends: Option<Vec<TrendSummary>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerticalQuery {
    pub geo_zone: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub query: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerticalDetailQuery {
    pub include_trends: Option<String>,
}

pub(super) async fn list_verticals(
    State(state): State<AppState>,
    Query(query): Query<VerticalQuery>,
) -> Result<Json<Vec<VerticalItem>>, ApiError> {
    let page = ftdb_db::Page {
        limit: parse_limit(query.limit.as_deref())?,
        offset: parse_offset(query.offset.as_deref())?,
    };
    let filters = ftdb_db::VerticalFilters {
        geo_zone: query.geo_zone.as_deref(),
        category_id: parse_i64("category_id", query.category_id.as_deref())?,
        category_name: query.category_name.as_deref(),
        query: query.query.as_deref(),
    };

    let rows = ftdb_db::list_verticals(&state.pool, filters, page)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(rows.into_iter().map(VerticalItem::from).collect()))
}

pub(super) async fn get_vertical(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VerticalDetailQuery>,
) -> Result<Json<VerticalDetail>, ApiError> {
    let id = parse_path_id(&id)?;
    let include_trends =
        parse_bool("include_trends", query.include_trends.as_deref())?.unwrap_or(false);

    let row = ftdb_db::get_vertical(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("Vertical"))?;

    let trends = if include_trends {
        let filters = ftdb_db::TrendFilters {
            vertical_id: Some(id),
            ..ftdb_db::TrendFilters::default()
        };
        let page = ftdb_db::Page {
            limit: 1000,
            offset: 0,
        };
        let rows = ftdb_db::list_trends(&state.pool, filters, page)
            .await
            .map_err(|e| map_db_error(&e))?;
        Some(rows.into_iter().map(TrendSummary::from).collect())
    } else {
        None
    };

    Ok(Json(VerticalDetail {
        id: row.id,
        vertical_id: row.vertical_id,
        category_id: row.category_id,
        category_name: row.category_name,
        category_description: row.category_description,
        name: row.name,
        geo_zone: row.geo_zone,
        trend_count: row.trend_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
        trends,
    }))
}

pub(super) async fn list_geo_zones(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let zones = ftdb_db::list_geo_zones(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(zones))
}
