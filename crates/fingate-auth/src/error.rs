use thiserror::Error;

/// Authorization and authentication errors surfaced by the OAuth subsystem.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid_client: {0}")]
    InvalidClient(String),

    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    #[error("invalid_target: {0}")]
    InvalidTarget(String),

    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    #[error("unauthorized_client: {0}")]
    UnauthorizedClient(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token not found")]
    TokenNotFound,

    #[error("invalid audience: expected {expected}, got {actual}")]
    InvalidAudience { expected: String, actual: String },

    #[error("ssrf rejected: {0}")]
    SsrfRejected(String),

    #[error("metadata fetch failed: {0}")]
    MetadataFetchFailed(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("jwt error: {source}")]
    Jwt {
        #[from]
        source: jsonwebtoken::errors::Error,
    },

    #[error("network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid url: {source}")]
    Url {
        #[from]
        source: url::ParseError,
    },
}

impl AuthError {
    /// The RFC 6749/6750 `error` code this variant maps onto on the wire.
    pub fn oauth_code(&self) -> &'static str {
        match self {
            AuthError::InvalidClient(_) => "invalid_client",
            AuthError::InvalidGrant(_) => "invalid_grant",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::InvalidTarget(_) => "invalid_target",
            AuthError::InvalidScope(_) => "invalid_scope",
            AuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            AuthError::UnauthorizedClient(_) => "unauthorized_client",
            AuthError::Unauthorized(_) => "unauthorized",
            AuthError::TokenExpired | AuthError::TokenNotFound => "invalid_token",
            AuthError::InvalidAudience { .. } => "invalid_token",
            AuthError::SsrfRejected(_) | AuthError::MetadataFetchFailed(_) => "invalid_client",
            AuthError::Storage(_) => "server_error",
            AuthError::Jwt { .. } => "invalid_token",
            AuthError::Network { .. } => "server_error",
            AuthError::Serialization { .. } => "server_error",
            AuthError::Url { .. } => "invalid_client",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::Storage(_) | AuthError::Network { .. } | AuthError::Serialization { .. } => 500,
            AuthError::InvalidClient(_)
            | AuthError::UnauthorizedClient(_)
            | AuthError::Unauthorized(_) => 401,
            _ => 400,
        }
    }
}
