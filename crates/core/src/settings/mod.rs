//! Persistent key/value settings.
//!
//! Settings live in a small JSON object on disk (`config.json` by default).

pub mod error;
pub mod store;

pub use error::{SettingsError, SettingsResult};
pub use store::SettingsStore;
