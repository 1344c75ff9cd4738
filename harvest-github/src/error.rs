//! Error types for GitHub operations

use serde_json::Value;
use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local failure (storage, config, repository list)
    #[error(transparent)]
    Core(#[from] harvest_core::Error),

    /// The request never got a usable answer: connection, timeout or 5xx.
    /// Retried before it is surfaced.
    #[error("GitHub transport error: {0}")]
    Transport(String),

    /// Non-retryable HTTP status
    #[error("GitHub API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response carried an `errors` payload, kept as the API sent it
    #[error("GraphQL errors: {}", Value::Array(.0.clone()))]
    GraphQl(Vec<Value>),

    /// Repository does not exist or is not visible to the token
    #[error("Repository {0} not found or not accessible")]
    RepositoryNotFound(String),

    /// Comment query for a node id that is not a discussion
    #[error("Discussion {0} not found")]
    DiscussionNotFound(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
