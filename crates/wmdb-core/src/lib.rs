use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod groups;
pub mod listing;
pub mod platforms;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use groups::WatchGroup;
pub use listing::{make_group_key, slugify, Condition, Listing, SearchOptions, SearchQuery};
pub use platforms::{load_platforms, PlatformConfig, PlatformKind, PlatformsFile};

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read platforms file at {path}: {source}")]
    PlatformsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse platforms file: {0}")]
    PlatformsFileParse(#[from] serde_yaml::Error),

    #[error("invalid platforms config: {0}")]
    Validation(String),
}
