//! Error types for the settings store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting settings.
///
/// Reading never fails: a missing or corrupt file is treated as empty.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to write the settings file.
    #[error("Failed to write settings file at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the settings map.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A typed setter was given a value outside its accepted range.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Type alias for Result with SettingsError.
pub type SettingsResult<T> = Result<T, SettingsError>;
