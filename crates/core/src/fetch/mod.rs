//! Server artifact downloads.
//!
//! The [`ArtifactSource`] trait hides where jars come from so provisioning
//! can be tested without network access. [`PaperApiClient`] is the real
//! implementation.

pub mod error;
pub mod paper_api;

use async_trait::async_trait;

pub use error::{FetchError, FetchResult};
pub use paper_api::PaperApiClient;

/// Catalog of backend versions plus the download endpoints for both jars.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Published backend versions, newest first.
    async fn list_versions(&self) -> FetchResult<Vec<String>>;

    /// Latest build number for `version`.
    async fn resolve_latest(&self, version: &str) -> FetchResult<u32>;

    /// Download the body at `url`.
    async fn download(&self, url: &str) -> FetchResult<Vec<u8>>;

    /// Download URL of a backend jar.
    fn backend_jar_url(&self, version: &str, build: u32) -> String;

    /// Download URL of the proxy jar.
    fn proxy_jar_url(&self) -> String;
}
