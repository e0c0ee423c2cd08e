use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::{parse_i64, parse_image_type, parse_limit, parse_offset, parse_path_id};
use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ImageItem {
    id: i64,
    trend_id: i64,
    image_type: String,
    md5_hash: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ftdb_db::ImageRow> for ImageItem {
    fn from(row: ftdb_db::ImageRow) -> Self {
        Self {
            id: row.id,
            trend_id: row.trend_id,
            image_type: row.image_type,
            md5_hash: row.md5_hash,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageQuery {
    pub trend_id: Option<String>,
    pub image_type: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageStatsResponse {
    total_images: i64,
    by_type: BTreeMap<String, i64>,
}

pub(super) async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<Vec<ImageItem>>, ApiError> {
    let page = ftdb_db::Page {
        limit: parse_limit(query.limit.as_deref())?,
        offset: parse_offset(query.offset.as_deref())?,
    };
    let filters = ftdb_db::ImageFilters {
        trend_id: parse_i64("trend_id", query.trend_id.as_deref())?,
        image_type: parse_image_type(query.image_type.as_deref())?,
    };

    let rows = ftdb_db::list_images(&state.pool, filters, page)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(rows.into_iter().map(ImageItem::from).collect()))
}

pub(super) async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageItem>, ApiError> {
    let id = parse_path_id(&id)?;

    let row = ftdb_db::get_image(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("Image"))?;

    Ok(Json(row.into()))
}

pub(super) async fn image_stats(
    State(state): State<AppState>,
) -> Result<Json<ImageStatsResponse>, ApiError> {
    let stats = ftdb_db::image_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(ImageStatsResponse {
        total_images: stats.total_images,
        by_type: stats.by_type,
    }))
}
