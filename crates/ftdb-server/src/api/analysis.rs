use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use ftdb_vision::{expand_types, merge_keywords, AnalysisResult};

use super::trends::TrendSummary;
use super::{map_db_error, ApiError, AppState};

const MATCH_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyseProductRequest {
    pub url: Option<String>,
    /// Comma/whitespace separated product types, e.g. "sneakers, running shoes".
    pub types: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyseProductResponse {
    analysis: AnalysisResult,
    keywords: Vec<String>,
    matching_trends: Vec<TrendSummary>,
}

/// Analyzes a product image and recommends matching trends.
///
/// Unlike bulk enrichment, a download or provider failure here is a
/// request-level error: there is no partial result to fall back to.
pub(super) async fn analyse_product(
    State(state): State<AppState>,
    payload: Result<Json<AnalyseProductRequest>, JsonRejection>,
) -> Result<Json<AnalyseProductResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::validation(format!("invalid request body: {e}"), "body"))?;

    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::validation("url is required", "url"))?;
    let types = request.types.as_deref().unwrap_or("");
    let user_keywords = expand_types(types);

    let analysis = state.analyzer.analyze_url(url, types).await.map_err(|e| {
        tracing::warn!(error = %e, url, "image analysis failed");
        ApiError::upstream(format!("image analysis failed: {e}"))
    })?;

    let keywords = merge_keywords(&user_keywords, &analysis);

    let matching_trends = if keywords.is_empty() {
        Vec::new()
    } else {
        ftdb_db::search_trends_by_keywords(&state.pool, &keywords, MATCH_LIMIT)
            .await
            .map_err(|e| map_db_error(&e))?
            .into_iter()
            .map(TrendSummary::from)
            .collect()
    };

    Ok(Json(AnalyseProductResponse {
        analysis,
        keywords,
        matching_trends,
    }))
}
