//! Keyword expansion for analysis-assisted trend search.

use std::collections::HashSet;

use crate::types::AnalysisResult;

/// Splits a caller-supplied product-types string on commas and whitespace.
#[must_use]
pub fn expand_types(types: &str) -> Vec<String> {
    types
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Merges caller keywords with the category, attributes, and style tags from
/// an analysis, deduplicating case-insensitively while preserving first-seen
/// order.
#[must_use]
pub fn merge_keywords(user_keywords: &[String], analysis: &AnalysisResult) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    let mut push = |keyword: &str| {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return;
        }
        if seen.insert(trimmed.to_lowercase()) {
            merged.push(trimmed.to_owned());
        }
    };

    for kw in user_keywords {
        push(kw);
    }
    if let Some(category) = &analysis.category {
        push(category);
    }
    for attr in &analysis.attributes {
        push(attr);
    }
    for tag in &analysis.style_tags {
        push(tag);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            category: Some("sneakers".to_string()),
            attributes: vec!["low-top".to_string(), "lace-up".to_string()],
            style_tags: vec!["athletic".to_string(), "Sneakers".to_string()],
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn expand_types_splits_on_commas_and_whitespace() {
        assert_eq!(
            expand_types("sneakers, running shoes"),
            vec!["sneakers", "running", "shoes"]
        );
        assert!(expand_types("  ,  ").is_empty());
    }

    #[test]
    fn merge_keywords_preserves_first_seen_order() {
        let user = vec!["retro".to_string(), "sneakers".to_string()];
        let merged = merge_keywords(&user, &analysis());
        assert_eq!(
            merged,
            vec!["retro", "sneakers", "low-top", "lace-up", "athletic"]
        );
    }

    #[test]
    fn merge_keywords_dedupes_case_insensitively() {
        let merged = merge_keywords(&[], &analysis());
        // "Sneakers" from style_tags collides with the category.
        assert_eq!(merged, vec!["sneakers", "low-top", "lace-up", "athletic"]);
    }

    #[test]
    fn merge_keywords_with_empty_analysis_keeps_user_terms() {
        let user = vec!["chelsea".to_string()];
        let merged = merge_keywords(&user, &AnalysisResult::default());
        assert_eq!(merged, vec!["chelsea"]);
    }
}
