use serde::{Deserialize, Serialize};

/// Structured attributes reported for one analyzed image.
///
/// When the live provider's reply cannot be parsed as JSON, the raw text is
/// preserved in `raw_response` and the structured fields stay at their
/// defaults rather than being discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub style_tags: Vec<String>,
    pub description: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AnalysisResult {
    /// First two reported materials joined for the product `material` field.
    #[must_use]
    pub fn material_summary(&self) -> Option<String> {
        if self.materials.is_empty() {
            return None;
        }
        Some(
            self.materials
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
