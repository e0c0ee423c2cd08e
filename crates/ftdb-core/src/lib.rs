use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

mod app_config;
mod config;
mod product_id;
mod types;

pub use app_config::{AppConfig, Environment, VisionMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use product_id::derive_product_id;
pub use types::{AvailabilityStatus, Gender, ImageType};
