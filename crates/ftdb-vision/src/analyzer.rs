//! Analyzer backends: deterministic demo bundles and the live provider client.

use std::time::Duration;

use base64::Engine;
use reqwest::{Client, Url};
use serde_json::json;

use ftdb_core::VisionMode;

use crate::error::VisionError;
use crate::types::AnalysisResult;

const DEFAULT_BASE_URL: &str = "https://vision.internal.example.com/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

enum Backend {
    Demo,
    Live { api_key: String, base_url: Url },
}

/// Image-analysis capability, fixed to one backend at construction.
///
/// Use [`Analyzer::demo`] for the canned backend or [`Analyzer::live`] to
/// point at the external provider (or a mock server in tests).
pub struct Analyzer {
    client: Client,
    backend: Backend,
}

impl Analyzer {
    /// Builds the demo backend. No provider is contacted; image downloads
    /// still go over the network with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the HTTP client cannot be built.
    pub fn demo(timeout_secs: u64) -> Result<Self, VisionError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            backend: Backend::Demo,
        })
    }

    /// Builds the live backend against the given provider base URL
    /// (`None` uses the built-in default).
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the HTTP client cannot be built, or
    /// [`VisionError::Provider`] if `base_url` is not a valid URL.
    pub fn live(
        api_key: &str,
        timeout_secs: u64,
        base_url: Option<&str>,
    ) -> Result<Self, VisionError> {
        let raw = base_url.unwrap_or(DEFAULT_BASE_URL);
        // Ensure exactly one trailing slash so join() appends instead of replacing.
        let normalised = format!("{}/", raw.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| VisionError::Provider(format!("invalid base URL '{raw}': {e}")))?;

        Ok(Self {
            client: build_client(timeout_secs)?,
            backend: Backend::Live {
                api_key: api_key.to_owned(),
                base_url,
            },
        })
    }

    /// Builds the analyzer described by the application config.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Provider`] if live mode is configured without
    /// an API key, or the construction errors of [`Analyzer::demo`] /
    /// [`Analyzer::live`].
    pub fn from_app_config(config: &ftdb_core::AppConfig) -> Result<Self, VisionError> {
        match config.vision_mode {
            VisionMode::Demo => Self::demo(config.vision_timeout_secs),
            VisionMode::Live => {
                let api_key = config.vision_api_key.as_deref().ok_or_else(|| {
                    VisionError::Provider("live mode requires FTDB_VISION_API_KEY".to_string())
                })?;
                Self::live(
                    api_key,
                    config.vision_timeout_secs,
                    config.vision_base_url.as_deref(),
                )
            }
        }
    }

    /// Downloads an image, returning its bytes and declared content type.
    ///
    /// # Errors
    ///
    /// - [`VisionError::Http`] on network failure or timeout.
    /// - [`VisionError::DownloadFailed`] on a non-success status.
    /// - [`VisionError::NotAnImage`] when the content type is not `image/*`.
    pub async fn fetch_image(&self, url: &str) -> Result<(Vec<u8>, String), VisionError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();

        if !content_type.starts_with("image/") {
            return Err(VisionError::NotAnImage(content_type));
        }

        let bytes = response.bytes().await?.to_vec();
        Ok((bytes, content_type))
    }

    /// Analyzes image bytes with the configured backend.
    ///
    /// # Errors
    ///
    /// Demo mode is infallible once constructed. Live mode returns
    /// [`VisionError::Http`] on network failure and
    /// [`VisionError::Provider`] on a provider-level error.
    pub async fn analyze(
        &self,
        image: &[u8],
        content_type: &str,
        hint: &str,
    ) -> Result<AnalysisResult, VisionError> {
        match &self.backend {
            Backend::Demo => Ok(demo_bundle(hint)),
            Backend::Live { api_key, base_url } => {
                self.analyze_live(api_key, base_url, image, content_type, hint)
                    .await
            }
        }
    }

    /// Downloads the image at `url` and analyzes it in one step.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Analyzer::fetch_image`] and
    /// [`Analyzer::analyze`].
    pub async fn analyze_url(&self, url: &str, hint: &str) -> Result<AnalysisResult, VisionError> {
        let (bytes, content_type) = self.fetch_image(url).await?;
        self.analyze(&bytes, &content_type, hint).await
    }

    async fn analyze_live(
        &self,
        api_key: &str,
        base_url: &Url,
        image: &[u8],
        content_type: &str,
        hint: &str,
    ) -> Result<AnalysisResult, VisionError> {
        let url = base_url
            .join("v1/analyze")
            .map_err(|e| VisionError::Provider(format!("invalid analyze URL: {e}")))?;

        let body = json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
            "content_type": content_type,
            "context": hint,
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(VisionError::Provider(format!(
                "provider returned status {status}: {text}"
            )));
        }

        Ok(parse_analysis_text(&text))
    }
}

fn build_client(timeout_secs: u64) -> Result<Client, VisionError> {
    let timeout = if timeout_secs == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        timeout_secs
    };
    Client::builder()
        .timeout(Duration::from_secs(timeout))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("ftdb/0.1 (catalog-enrichment)")
        .build()
        .map_err(VisionError::from)
}

/// Parse a provider reply into an [`AnalysisResult`].
///
/// Providers sometimes wrap their JSON in prose; the first balanced `{...}`
/// span is extracted and parsed in that case. When no parseable JSON is
/// found, the raw text is preserved on a default result instead of being
/// discarded.
fn parse_analysis_text(text: &str) -> AnalysisResult {
    if let Ok(result) = serde_json::from_str::<AnalysisResult>(text) {
        return result;
    }

    if let Some(block) = extract_json_block(text) {
        if let Ok(result) = serde_json::from_str::<AnalysisResult>(block) {
            return result;
        }
    }

    tracing::debug!("provider reply was not structured JSON; keeping raw text");
    AnalysisResult {
        raw_response: Some(text.to_owned()),
        ..AnalysisResult::default()
    }
}

/// Returns the first balanced `{...}` span in `text`, tracking string
/// literals and escapes so braces inside strings do not unbalance the scan.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Canned attribute bundles for demo mode, keyed by coarse keyword matches
/// against the lowercased product-type hint.
fn demo_bundle(hint: &str) -> AnalysisResult {
    let hint = hint.to_lowercase();

    if hint.contains("sneaker") || hint.contains("shoe") {
        AnalysisResult {
            category: Some("sneakers".to_string()),
            attributes: vec![
                "low-top".to_string(),
                "lace-up".to_string(),
                "cushioned sole".to_string(),
            ],
            materials: vec!["mesh".to_string(), "rubber".to_string()],
            style_tags: vec!["athletic".to_string(), "streetwear".to_string()],
            description: Some(
                "Athletic sneaker with a breathable mesh upper and cushioned sole".to_string(),
            ),
            confidence: Some(0.92),
            raw_response: None,
        }
    } else if hint.contains("boot") {
        AnalysisResult {
            category: Some("boots".to_string()),
            attributes: vec![
                "ankle-height".to_string(),
                "lug sole".to_string(),
                "pull tab".to_string(),
            ],
            materials: vec!["leather".to_string(), "rubber".to_string()],
            style_tags: vec!["workwear".to_string(), "rugged".to_string()],
            description: Some(
                "Ankle boot with a leather upper and rugged lug sole".to_string(),
            ),
            confidence: Some(0.9),
            raw_response: None,
        }
    } else if hint.contains("dress") {
        AnalysisResult {
            category: Some("dresses".to_string()),
            attributes: vec![
                "midi".to_string(),
                "fitted waist".to_string(),
                "sleeveless".to_string(),
            ],
            materials: vec!["polyester".to_string(), "elastane".to_string()],
            style_tags: vec!["evening".to_string(), "minimal".to_string()],
            description: Some("Sleeveless midi dress with a fitted waist".to_string()),
            confidence: Some(0.91),
            raw_response: None,
        }
    } else {
        AnalysisResult {
            category: Some("apparel".to_string()),
            attributes: vec!["solid color".to_string()],
            materials: vec!["cotton".to_string()],
            style_tags: vec!["casual".to_string()],
            description: Some("General apparel item".to_string()),
            confidence: Some(0.5),
            raw_response: None,
        }
    }
}
