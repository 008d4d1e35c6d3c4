use model::error::ResolutionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the sink configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
