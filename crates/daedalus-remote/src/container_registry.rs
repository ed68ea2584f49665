//! Container-registry clients.
//!
//! The reconciler consumes container registries through the
//! [`ContainerRegistryClient`] capability: list the tags of an image
//! repository together with their digests. Quay.io and Docker Hub
//! implementations are provided; tests substitute fakes.

use crate::config::{build_http_client, ClientConfig};
use crate::error::RemoteError;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

/// One tag of an upstream image repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTag {
    /// Tag name.
    pub name: String,

    /// Image digest the tag points at.
    pub image_id: Option<String>,

    /// When the tag was last pushed, if the registry reports it.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Capability to read tag listings from a container registry.
#[async_trait]
pub trait ContainerRegistryClient: Send + Sync {
    /// Lists all tags of `organization/repository`.
    ///
    /// An existing repository with no tags returns an empty list; a
    /// missing repository is an upstream error.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached or rejects the
    /// request.
    async fn list_tags(
        &self,
        organization: &str,
        repository: &str,
    ) -> Result<Vec<RegistryTag>, RemoteError>;
}

/// Quay.io API client.
#[derive(Debug)]
pub struct QuayClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl QuayClient {
    const DEFAULT_BASE_URL: &'static str = "https://quay.io/api/v1";

    /// Creates a client. Public repositories need no token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig, token: Option<String>) -> Result<Self, RemoteError> {
        Ok(Self {
            base_url: config.base_url_or(Self::DEFAULT_BASE_URL),
            http: build_http_client(config)?,
            token,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    RemoteError::Http {
                        status: 0,
                        message: "Invalid token".to_string(),
                    }
                })?,
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl ContainerRegistryClient for QuayClient {
    async fn list_tags(
        &self,
        organization: &str,
        repository: &str,
    ) -> Result<Vec<RegistryTag>, RemoteError> {
        let url = format!(
            "{}/repository/{organization}/{repository}/tag/?onlyActiveTags=true",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Http {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        #[derive(Deserialize)]
        struct Tag {
            name: String,
            manifest_digest: Option<String>,
            last_modified: Option<String>,
        }

        #[derive(Deserialize)]
        struct TagList {
            tags: Vec<Tag>,
        }

        let list: TagList = response.json().await?;
        Ok(list
            .tags
            .into_iter()
            .map(|t| RegistryTag {
                name: t.name,
                image_id: t.manifest_digest,
                last_modified: t
                    .last_modified
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
                    .map(|d| d.with_timezone(&Utc)),
            })
            .collect())
    }
}

/// Docker Hub API client.
#[derive(Debug)]
pub struct DockerHubClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl DockerHubClient {
    const DEFAULT_BASE_URL: &'static str = "https://hub.docker.com/v2";

    /// Creates a client. Private repositories need username/token
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        config: &ClientConfig,
        credentials: Option<(String, String)>,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            base_url: config.base_url_or(Self::DEFAULT_BASE_URL),
            http: build_http_client(config)?,
            credentials,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();
        if let Some((username, password)) = &self.credentials {
            let encoded = base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{password}"));
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|_| {
                    RemoteError::Http {
                        status: 0,
                        message: "Invalid credentials".to_string(),
                    }
                })?,
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl ContainerRegistryClient for DockerHubClient {
    async fn list_tags(
        &self,
        organization: &str,
        repository: &str,
    ) -> Result<Vec<RegistryTag>, RemoteError> {
        let url = format!(
            "{}/repositories/{organization}/{repository}/tags?page_size=100",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            // Docker Hub reports repositories with no pushes as missing
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(RemoteError::Http {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        #[derive(Deserialize)]
        struct Tag {
            name: String,
            digest: Option<String>,
            last_updated: Option<DateTime<Utc>>,
        }

        #[derive(Deserialize)]
        struct Page {
            results: Vec<Tag>,
        }

        let page: Page = response.json().await?;
        Ok(page
            .results
            .into_iter()
            .map(|t| RegistryTag {
                name: t.name,
                image_id: t.digest,
                last_modified: t.last_updated,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quay_client_creation() {
        let client = QuayClient::new(&ClientConfig::new(), None).unwrap();
        assert_eq!(client.base_url, "https://quay.io/api/v1");
        assert!(client.auth_headers().unwrap().is_empty());
    }

    #[test]
    fn test_quay_bearer_header() {
        let client = QuayClient::new(&ClientConfig::new(), Some("tok".to_string())).unwrap();
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn test_dockerhub_basic_header() {
        let client = DockerHubClient::new(
            &ClientConfig::new(),
            Some(("user".to_string(), "pass".to_string())),
        )
        .unwrap();
        let headers = client.auth_headers().unwrap();
        let value = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(value.starts_with("Basic "));
    }
}
