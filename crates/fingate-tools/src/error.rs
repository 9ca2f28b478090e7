//! Error type for tool argument validation and invocation failures.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}
