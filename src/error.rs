//! Error types shared by the backend, tool and agent layers.

use thiserror::Error;

/// Failures that make the model stream unusable. Fatal for the current turn.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("model endpoint unreachable: {0}")]
    Unavailable(String),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream read failed: {0}")]
    Stream(String),

    #[error("stream buffer exceeded {0} bytes")]
    BufferOverflow(usize),

    #[error("model '{0}' is not installed on the server")]
    ModelNotFound(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Unavailable(err.to_string())
    }
}

/// Failures at the tool dispatch boundary. Always converted into a failure
/// result before reaching the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool {0} is disabled by configuration")]
    Disabled(String),
}

/// Failures that end an agent run early.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("prompt rendering failed: {0}")]
    Prompt(String),
}
