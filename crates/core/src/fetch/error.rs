//! Error types for artifact downloads and version lookups.

use thiserror::Error;

/// Errors that can occur while talking to a download server.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered but the payload did not have the expected shape.
    #[error("Unexpected catalog response from {url}: {reason}")]
    Catalog { url: String, reason: String },

    /// The requested version has no published builds.
    #[error("No builds published for version {version}")]
    NoBuilds { version: String },
}

/// Type alias for Result with FetchError.
pub type FetchResult<T> = Result<T, FetchError>;
