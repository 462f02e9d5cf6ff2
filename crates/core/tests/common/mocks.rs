//! Mock collaborators for the supervisor and provisioning.

use async_trait::async_trait;
use cc_core::fetch::{ArtifactSource, FetchError, FetchResult};
use cc_core::supervisor::{OsSignaller, Signaller};
use std::io;
use std::sync::Mutex;
use tokio::process::Child;

/// Signaller that records every request.
///
/// With `deliver` set, requests are forwarded to the OS; otherwise they are
/// only recorded, which simulates a process that survives the signal.
#[derive(Debug, Default)]
pub struct RecordingSignaller {
    deliver: bool,
    sent: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingSignaller {
    pub fn delivering() -> Self {
        Self {
            deliver: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn swallowing() -> Self {
        Self::default()
    }

    /// Names that received a terminate request, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Signaller for RecordingSignaller {
    fn terminate(&self, name: &str, child: &mut Child) -> io::Result<()> {
        self.sent.lock().unwrap().push(name.to_string());
        if self.deliver {
            OsSignaller.terminate(name, child)
        } else {
            Ok(())
        }
    }
}

/// Offline artifact source.
///
/// Downloads return a small body naming the URL; URLs listed in
/// `failing_urls` fail.
#[derive(Debug)]
pub struct MockSource {
    pub versions: Vec<String>,
    pub latest_build: u32,
    pub failing_urls: Vec<String>,
    downloads: Mutex<Vec<String>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self {
            versions: vec!["1.20.4".to_string(), "1.20.1".to_string()],
            latest_build: 499,
            failing_urls: Vec::new(),
            downloads: Mutex::new(Vec::new()),
        }
    }
}

#[allow(dead_code)]
impl MockSource {
    pub fn failing(urls: &[&str]) -> Self {
        Self {
            failing_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSource for MockSource {
    async fn list_versions(&self) -> FetchResult<Vec<String>> {
        Ok(self.versions.clone())
    }

    async fn resolve_latest(&self, version: &str) -> FetchResult<u32> {
        if self.versions.iter().any(|v| v == version) {
            Ok(self.latest_build)
        } else {
            Err(FetchError::NoBuilds {
                version: version.to_string(),
            })
        }
    }

    async fn download(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.failing_urls.iter().any(|u| u == url) {
            return Err(FetchError::Catalog {
                url: url.to_string(),
                reason: "offline".to_string(),
            });
        }
        Ok(format!("jar from {url}").into_bytes())
    }

    fn backend_jar_url(&self, version: &str, build: u32) -> String {
        format!("mock://paper/{version}/{build}")
    }

    fn proxy_jar_url(&self) -> String {
        "mock://proxy".to_string()
    }
}
