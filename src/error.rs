//! Error taxonomy shared by the repository, feed service, wizard and API.

use thiserror::Error;

/// Errors produced while working with the news feed
#[derive(Error, Debug)]
pub enum FeedError {
    /// Bad user input (empty title, malformed identifier)
    #[error("Validation error: {0}")]
    Validation(String),
    /// The requested item or media does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// Required configuration is missing
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Database backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
    /// Stored JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Upstream messaging provider unreachable or timed out
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl FeedError {
    /// Returns true for errors caused by the user's input rather than the system
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// Convenience alias used across the crate
pub type FeedResult<T> = Result<T, FeedError>;
