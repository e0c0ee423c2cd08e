//! Image-analysis capability for product enrichment and trend matching.
//!
//! Two backends sit behind one [`Analyzer`] value, chosen once at process
//! configuration time: a deterministic demo mode that returns canned
//! attribute bundles keyed by the product-type hint, and a live mode that
//! delegates to an external multimodal provider and parses its reply as
//! structured JSON.

mod analyzer;
mod error;
mod keywords;
mod types;

pub use analyzer::Analyzer;
pub use error::VisionError;
pub use keywords::{expand_types, merge_keywords};
pub use types::AnalysisResult;
