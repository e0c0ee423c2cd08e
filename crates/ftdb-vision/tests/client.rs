//! Integration tests for `Analyzer` HTTP behavior using wiremock mocks.

use ftdb_vision::{Analyzer, VisionError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::test]
async fn fetch_image_returns_bytes_and_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shoe.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(PNG_BYTES),
        )
        .mount(&server)
        .await;

    let analyzer = Analyzer::demo(30).expect("analyzer construction should not fail");
    let (bytes, content_type) = analyzer
        .fetch_image(&format!("{}/shoe.png", server.uri()))
        .await
        .expect("download should succeed");

    assert_eq!(bytes, PNG_BYTES);
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn fetch_image_rejects_non_image_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let analyzer = Analyzer::demo(30).expect("analyzer");
    let result = analyzer
        .fetch_image(&format!("{}/page.html", server.uri()))
        .await;

    assert!(
        matches!(result, Err(VisionError::NotAnImage(ref ct)) if ct == "text/html"),
        "expected NotAnImage, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_image_surfaces_http_status_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let analyzer = Analyzer::demo(30).expect("analyzer");
    let result = analyzer
        .fetch_image(&format!("{}/missing.jpg", server.uri()))
        .await;

    assert!(
        matches!(result, Err(VisionError::DownloadFailed { status: 404 })),
        "expected DownloadFailed(404), got: {result:?}"
    );
}

#[tokio::test]
async fn demo_analyze_never_contacts_a_provider() {
    let analyzer = Analyzer::demo(30).expect("analyzer");
    let result = analyzer
        .analyze(PNG_BYTES, "image/png", "chelsea boots")
        .await
        .expect("demo analysis is infallible");

    assert_eq!(result.category.as_deref(), Some("boots"));
    assert!(result.confidence.is_some());
}

#[tokio::test]
async fn live_analyze_parses_structured_reply() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "category": "sneakers",
        "attributes": ["low-top"],
        "materials": ["mesh", "rubber"],
        "style_tags": ["athletic"],
        "description": "White low-top sneaker",
        "confidence": 0.87
    });

    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let analyzer =
        Analyzer::live("test-key", 30, Some(&server.uri())).expect("analyzer construction");
    let result = analyzer
        .analyze(PNG_BYTES, "image/png", "sneakers")
        .await
        .expect("analysis should succeed");

    assert_eq!(result.category.as_deref(), Some("sneakers"));
    assert_eq!(result.materials, vec!["mesh", "rubber"]);
    assert_eq!(result.confidence, Some(0.87));
}

#[tokio::test]
async fn live_analyze_extracts_json_embedded_in_prose() {
    let server = MockServer::start().await;

    let reply = "Here is what I found: {\"category\": \"dresses\", \"confidence\": 0.75} hope it helps";

    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string(reply),
        )
        .mount(&server)
        .await;

    let analyzer =
        Analyzer::live("test-key", 30, Some(&server.uri())).expect("analyzer construction");
    let result = analyzer
        .analyze(PNG_BYTES, "image/png", "dress")
        .await
        .expect("analysis should succeed");

    assert_eq!(result.category.as_deref(), Some("dresses"));
    assert_eq!(result.confidence, Some(0.75));
}

#[tokio::test]
async fn live_analyze_preserves_unparseable_reply_as_raw() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("unable to analyze this image"),
        )
        .mount(&server)
        .await;

    let analyzer =
        Analyzer::live("test-key", 30, Some(&server.uri())).expect("analyzer construction");
    let result = analyzer
        .analyze(PNG_BYTES, "image/png", "sneakers")
        .await
        .expect("raw replies are preserved, not errors");

    assert!(result.category.is_none());
    assert_eq!(
        result.raw_response.as_deref(),
        Some("unable to analyze this image")
    );
}

#[tokio::test]
async fn live_analyze_maps_provider_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let analyzer =
        Analyzer::live("test-key", 30, Some(&server.uri())).expect("analyzer construction");
    let result = analyzer.analyze(PNG_BYTES, "image/png", "sneakers").await;

    assert!(
        matches!(result, Err(VisionError::Provider(_))),
        "expected Provider error, got: {result:?}"
    );
}

#[tokio::test]
async fn analyze_url_chains_download_and_analysis() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/boot.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(PNG_BYTES),
        )
        .mount(&server)
        .await;

    let analyzer = Analyzer::demo(30).expect("analyzer");
    let result = analyzer
        .analyze_url(&format!("{}/boot.jpg", server.uri()), "boots")
        .await
        .expect("analysis should succeed");

    assert_eq!(result.category.as_deref(), Some("boots"));
}
