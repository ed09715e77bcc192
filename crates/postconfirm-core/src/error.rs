//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A pattern rule could not be compiled.
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// Action text that is not one of the known actions.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Handler failure not covered by the other variants.
    #[error("Handler error: {0}")]
    Handler(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
