//! Error types for provisioning operations.

use crate::fetch::FetchError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Errors that can occur while preparing server directories.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A backend jar is missing and no version was given to download.
    #[error("No server version selected")]
    NoVersion,

    /// Requested heap size is outside the accepted range.
    #[error("Invalid max RAM {value} GB (expected 1-64)")]
    InvalidRam { value: u32 },

    /// A required template file was not found in embedded assets.
    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    /// Failed to create a directory.
    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("Failed to write file {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Download or catalog lookup failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
