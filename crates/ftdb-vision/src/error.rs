use thiserror::Error;

/// Errors surfaced by the image-analysis capability.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Network or TLS failure from the underlying HTTP client, including
    /// timeouts on image download or the provider call.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The image URL responded with a non-success status.
    #[error("image download failed with status {status}")]
    DownloadFailed { status: u16 },

    /// The downloaded resource did not declare an image content type.
    #[error("URL did not return an image (content type: {0})")]
    NotAnImage(String),

    /// The analysis provider rejected the request or returned an error body.
    #[error("analysis provider error: {0}")]
    Provider(String),
}
