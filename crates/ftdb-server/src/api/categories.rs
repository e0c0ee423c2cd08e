use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::{parse_limit, parse_offset, parse_path_id};
use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    id: i64,
    name: String,
    description: Option<String>,
    vertical_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ftdb_db::CategoryRow> for CategoryItem {
    fn from(row: ftdb_db::CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            vertical_count: row.vertical_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Raw strings so out-of-range values produce a 422 with the offending field
// instead of the framework's default rejection.
#[derive(Debug, Deserialize)]
pub(super) struct CategoryQuery {
    pub query: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryItem>>, ApiError> {
    let page = ftdb_db::Page {
        limit: parse_limit(query.limit.as_deref())?,
        offset: parse_offset(query.offset.as_deref())?,
    };

    let rows = ftdb_db::list_categories(&state.pool, query.query.as_deref(), page)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(rows.into_iter().map(CategoryItem::from).collect()))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryItem>, ApiError> {
    let id = parse_path_id(&id)?;

    let row = ftdb_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    Ok(Json(row.into()))
}
