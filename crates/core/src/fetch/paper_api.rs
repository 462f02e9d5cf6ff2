//! PaperMC v2 API client.

use super::error::{FetchError, FetchResult};
use super::ArtifactSource;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub const PAPER_API_BASE: &str = "https://api.papermc.io/v2/projects/paper";
pub const BUNGEECORD_JAR_URL: &str =
    "https://ci.md-5.net/job/BungeeCord/lastSuccessfulBuild/artifact/bootstrap/target/BungeeCord.jar";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("craftctl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    builds: Vec<u32>,
}

/// Talks to the PaperMC download API and the BungeeCord CI server.
#[derive(Debug, Clone)]
pub struct PaperApiClient {
    http: reqwest::Client,
    api_base: String,
    proxy_url: String,
}

impl PaperApiClient {
    pub fn new() -> FetchResult<Self> {
        Self::with_endpoints(PAPER_API_BASE, BUNGEECORD_JAR_URL)
    }

    /// Client against alternative endpoints (mirrors, local test servers).
    pub fn with_endpoints(api_base: impl Into<String>, proxy_url: impl Into<String>) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            proxy_url: proxy_url.into(),
        })
    }

    async fn get_json(&self, url: &str) -> FetchResult<Value> {
        debug!(%url, "fetching catalog");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

fn parse_versions(url: &str, body: Value) -> FetchResult<Vec<String>> {
    let project: ProjectResponse = serde_json::from_value(body).map_err(|e| FetchError::Catalog {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    // The API lists oldest first.
    Ok(project.versions.into_iter().rev().collect())
}

fn parse_latest_build(url: &str, version: &str, body: Value) -> FetchResult<u32> {
    let details: VersionResponse = serde_json::from_value(body).map_err(|e| FetchError::Catalog {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    details
        .builds
        .last()
        .copied()
        .ok_or_else(|| FetchError::NoBuilds {
            version: version.to_string(),
        })
}

#[async_trait]
impl ArtifactSource for PaperApiClient {
    async fn list_versions(&self) -> FetchResult<Vec<String>> {
        let url = self.api_base.clone();
        let body = self.get_json(&url).await?;
        parse_versions(&url, body)
    }

    async fn resolve_latest(&self, version: &str) -> FetchResult<u32> {
        let url = format!("{}/versions/{}", self.api_base, version);
        let body = self.get_json(&url).await?;
        parse_latest_build(&url, version, body)
    }

    async fn download(&self, url: &str) -> FetchResult<Vec<u8>> {
        info!(%url, "downloading");
        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(%url, size = bytes.len(), "download finished");
        Ok(bytes.to_vec())
    }

    fn backend_jar_url(&self, version: &str, build: u32) -> String {
        format!(
            "{base}/versions/{version}/builds/{build}/downloads/paper-{version}-{build}.jar",
            base = self.api_base
        )
    }

    fn proxy_jar_url(&self) -> String {
        self.proxy_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_versions_are_newest_first() {
        let body = json!({ "project_id": "paper", "versions": ["1.19.4", "1.20.1", "1.20.4"] });
        let versions = parse_versions("u", body).unwrap();
        assert_eq!(versions, vec!["1.20.4", "1.20.1", "1.19.4"]);
    }

    #[test]
    fn test_missing_versions_field_is_catalog_error() {
        let result = parse_versions("u", json!({ "project_id": "paper" }));
        assert!(matches!(result, Err(FetchError::Catalog { .. })));
    }

    #[test]
    fn test_latest_build_is_last_entry() {
        let body = json!({ "version": "1.20.4", "builds": [3, 17, 499] });
        assert_eq!(parse_latest_build("u", "1.20.4", body).unwrap(), 499);
    }

    #[test]
    fn test_empty_builds() {
        let result = parse_latest_build("u", "1.21", json!({ "builds": [] }));
        assert!(matches!(result, Err(FetchError::NoBuilds { version }) if version == "1.21"));
    }

    #[test]
    fn test_jar_urls() {
        let client = PaperApiClient::new().unwrap();
        assert_eq!(
            client.backend_jar_url("1.20.4", 499),
            "https://api.papermc.io/v2/projects/paper/versions/1.20.4/builds/499/downloads/paper-1.20.4-499.jar"
        );
        assert_eq!(client.proxy_jar_url(), BUNGEECORD_JAR_URL);
    }

    #[tokio::test]
    #[cfg(feature = "integration-tests")]
    async fn test_live_catalog_resolves_a_build() {
        let client = PaperApiClient::new().unwrap();

        let versions = client.list_versions().await.unwrap();
        assert!(!versions.is_empty());

        let build = client.resolve_latest(&versions[0]).await.unwrap();
        assert!(build > 0);
    }
}
