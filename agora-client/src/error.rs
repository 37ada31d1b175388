//! Error types at the application boundary.

use crate::config::ConfigError;
use agora_core::AgoraError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Agora(#[from] AgoraError),
    #[error("Failed to init telemetry: {0}")]
    Telemetry(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
