pub mod app_config;
pub mod config;
pub mod records;
pub mod seeds;
pub mod storefronts;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{ProductRecord, VariantRecord};
pub use seeds::load_category_seeds;
pub use storefronts::{load_storefronts, StorefrontConfig, StorefrontsFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read storefronts file {path}: {source}")]
    StorefrontsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse storefronts file: {0}")]
    StorefrontsFileParse(#[from] serde_yaml::Error),

    #[error("failed to read category seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
