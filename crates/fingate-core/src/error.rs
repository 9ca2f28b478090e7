//! Shared error type for the gateway crates.
//!
//! `GatewayError` is the canonical error type returned by configuration loading and by
//! any code that doesn't belong to the OAuth subsystem (which has its own, richer
//! `fingate_auth::AuthError`). It follows the same hierarchical, `#[from]`-heavy shape
//! used throughout this workspace.

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn missing_env(key: impl Into<String>) -> Self {
        Self::MissingEnv(key.into())
    }
}
