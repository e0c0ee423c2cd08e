use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::images::ImageItem;
use super::params::{
    parse_bool, parse_fulltext_limit, parse_i64, parse_image_type, parse_limit, parse_offset,
    parse_path_id,
};
use super::{map_db_error, ApiError, AppState};

const PREVIEW_CHARS: usize = 200;

/// Listing shape with derived image counts. Also reused for nesting under
/// vertical detail and for keyword-matched trends on the analysis endpoint.
#[derive(Debug, Serialize)]
pub(super) struct TrendSummary {
    id: i64,
    trend_id: String,
    name: String,
    description: Option<String>,
    image_hash: Option<String>,
    image_count: i64,
    positive_image_count: i64,
    negative_image_count: i64,
}

impl From<ftdb_db::TrendSummaryRow> for TrendSummary {
    fn from(row: ftdb_db::TrendSummaryRow) -> Self {
        Self {
            id: row.id,
            trend_id: row.trend_id,
            name: row.name,
            description: row.description,
            image_hash: row.image_hash,
            image_count: row.image_count,
            positive_image_count: row.positive_image_count,
            negative_image_count: row.negative_image_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TrendDetail {
    id: i64,
    trend_id: String,
    vertical_id: i64,
    name: String,
    description: Option<String>,
    image_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<ImageItem>>,
}

#[derive(Debug, Serialize)]
pub(super) struct FulltextItem {
    id: i64,
    trend_id: String,
    name: String,
    description_preview: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendQuery {
    pub vertical_id: Option<String>,
    pub vertical_name: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub geo_zone: Option<String>,
    pub query: Option<String>,
    pub has_images: Option<String>,
    pub image_type: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendDetailQuery {
    pub include_images: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FulltextQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
}

pub(super) async fn list_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<TrendSummary>>, ApiError> {
    let page = ftdb_db::Page {
        limit: parse_limit(query.limit.as_deref())?,
        offset: parse_offset(query.offset.as_deref())?,
    };
    let filters = ftdb_db::TrendFilters {
        vertical_id: parse_i64("vertical_id", query.vertical_id.as_deref())?,
        vertical_name: query.vertical_name.as_deref(),
        category_id: parse_i64("category_id", query.category_id.as_deref())?,
        category_name: query.category_name.as_deref(),
        geo_zone: query.geo_zone.as_deref(),
        query: query.query.as_deref(),
        has_images: parse_bool("has_images", query.has_images.as_deref())?,
        image_type: parse_image_type(query.image_type.as_deref())?,
    };

    let rows = ftdb_db::list_trends(&state.pool, filters, page)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(rows.into_iter().map(TrendSummary::from).collect()))
}

pub(super) async fn get_trend(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TrendDetailQuery>,
) -> Result<Json<TrendDetail>, ApiError> {
    let id = parse_path_id(&id)?;
    let include_images =
        parse_bool("include_images", query.include_images.as_deref())?.unwrap_or(false);

    let row = ftdb_db::get_trend(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("Trend"))?;

    let images = if include_images {
        let filters = ftdb_db::ImageFilters {
            trend_id: Some(id),
            image_type: None,
        };
        let page = ftdb_db::Page {
            limit: 1000,
            offset: 0,
        };
        let rows = ftdb_db::list_images(&state.pool, filters, page)
            .await
            .map_err(|e| map_db_error(&e))?;
        Some(rows.into_iter().map(ImageItem::from).collect())
    } else {
        None
    };

    Ok(Json(TrendDetail {
        id: row.id,
        trend_id: row.trend_id,
        vertical_id: row.vertical_id,
        name: row.name,
        description: row.description,
        image_hash: row.image_hash,
        created_at: row.created_at,
        updated_at: row.updated_at,
        images,
    }))
}

pub(super) async fn fulltext_search(
    State(state): State<AppState>,
    Query(query): Query<FulltextQuery>,
) -> Result<Json<Vec<FulltextItem>>, ApiError> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("q is required", "q"))?;
    let limit = parse_fulltext_limit(query.limit.as_deref())?;

    let rows = ftdb_db::fulltext_search(&state.pool, q, limit)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| FulltextItem {
                id: row.id,
                trend_id: row.trend_id,
                name: row.name,
                description_preview: row.description.as_deref().map(preview),
            })
            .collect(),
    ))
}

fn preview(description: &str) -> String {
    if description.chars().count() <= PREVIEW_CHARS {
        return description.to_string();
    }
    let truncated: String = description.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_descriptions_pass_through_unchanged() {
        assert_eq!(preview("chunky soles"), "chunky soles");
    }

    #[test]
    fn long_descriptions_are_truncated_with_ellipsis() {
        let long = "x".repeat(250);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(300);
        let shown = preview(&long);
        assert!(shown.starts_with('é'));
        assert!(shown.ends_with("..."));
    }
}
