//! Where the bundle's product version comes from.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;

use crate::http::HttpClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn current_version(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    version: String,
}

#[derive(Debug, Deserialize)]
struct ProjectDocument {
    info: ProjectInfo,
}

/// Reads the latest released version of a project from the PyPI JSON API.
pub struct PypiVersionSource {
    http: HttpClient,
    url: String,
}

impl PypiVersionSource {
    pub fn new(http: HttpClient, index_url: &str, project: &str) -> Self {
        Self {
            http,
            url: format!("{}/pypi/{}/json", index_url.trim_end_matches('/'), project),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VersionSource for PypiVersionSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn current_version(&self) -> Result<String> {
        let document: ProjectDocument = self
            .http
            .get_json(&self.url)
            .await
            .with_context(|| format!("Failed to query package index at {}", self.url))?;

        let version = document.info.version.trim().to_string();
        if version.is_empty() {
            bail!("Package index returned an empty version from {}", self.url);
        }
        info!("Latest released version is {}", version);
        Ok(version)
    }
}

/// A version given on the command line or in the configuration file.
pub struct FixedVersion(pub String);

#[async_trait]
impl VersionSource for FixedVersion {
    async fn current_version(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    #[tokio::test]
    async fn test_pypi_version_source() {
        // --- Setup ---
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/hyperspy/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"info": {"name": "hyperspy", "version": "0.8.1"}, "releases": {}}"#)
            .create_async()
            .await;

        let source = PypiVersionSource::new(
            HttpClient::new(Client::new()),
            &format!("{}/", server.url()),
            "hyperspy",
        );

        // --- Execute & Verify ---
        assert_eq!(source.url(), format!("{}/pypi/hyperspy/json", server.url()));
        assert_eq!(source.current_version().await.unwrap(), "0.8.1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pypi_version_source_unknown_project() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/pypi/nope/json")
            .with_status(404)
            .create_async()
            .await;

        let source = PypiVersionSource::new(HttpClient::new(Client::new()), &server.url(), "nope");
        let err = source.current_version().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to query package index"));
    }

    #[tokio::test]
    async fn test_pypi_version_source_missing_version_field() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/pypi/hyperspy/json")
            .with_status(200)
            .with_body(r#"{"info": {}}"#)
            .create_async()
            .await;

        let source =
            PypiVersionSource::new(HttpClient::new(Client::new()), &server.url(), "hyperspy");
        assert!(source.current_version().await.is_err());
    }

    #[tokio::test]
    async fn test_fixed_version() {
        let source = FixedVersion("0.8.1".into());
        assert_eq!(source.current_version().await.unwrap(), "0.8.1");
    }
}
