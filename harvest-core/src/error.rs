//! Error types for harvest

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for harvest operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API token could be found
    #[error("GitHub API token not found. Set {0} or add a token to the secrets file")]
    MissingToken(String),

    /// The repository list file could not be read
    #[error("Could not open/read repository list {}: {source}", .path.display())]
    RepositoryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of the repository list is malformed
    #[error("Invalid repository list line {line}: {content:?}. Expected '<owner> <name>'")]
    RepositoryLine { line: usize, content: String },

    /// Repository reference could not be parsed
    #[error("Invalid repository reference: {0}. Expected owner/name")]
    InvalidRepository(String),

    /// A stored record could not be exported
    #[error("Cannot export {}: {reason}", .path.display())]
    Export { path: PathBuf, reason: String },
}
