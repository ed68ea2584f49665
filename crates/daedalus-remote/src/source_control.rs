//! Source-control clients.
//!
//! The reconciler consumes source control through the
//! [`SourceControlClient`] capability: list the references of a
//! repository and fetch file contents at a reference. GitHub and
//! Bitbucket implementations are provided; tests substitute fakes.

use crate::config::{build_http_client, ClientConfig};
use crate::error::RemoteError;
use crate::token::{Provider, TokenStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daedalus_core::ReferenceType;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

/// A branch or tag of an upstream repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitReference {
    /// Reference name, e.g. `master` or `1.0`.
    pub name: String,

    /// Whether the reference is a branch or a tag.
    pub reference_type: ReferenceType,

    /// Commit the reference currently points at.
    pub commit_id: Option<String>,

    /// When the referenced commit was made, if the provider reports it.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Capability to read repositories from a source-control provider.
#[async_trait]
pub trait SourceControlClient: Send + Sync {
    /// The provider this client talks to.
    fn provider(&self) -> Provider;

    /// Lists all branches and tags of a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or rejects the
    /// request.
    async fn list_references(&self, repository: &str) -> Result<Vec<GitReference>, RemoteError>;

    /// Fetches a file's content at a reference.
    ///
    /// Returns `Ok(None)` when the file does not exist at that reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or rejects the
    /// request.
    async fn file_content(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Option<String>, RemoteError>;
}

fn bearer_headers(token: &str) -> Result<HeaderMap, RemoteError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| RemoteError::Http {
            status: 0,
            message: "Invalid token".to_string(),
        })?,
    );
    Ok(headers)
}

async fn error_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        RemoteError::RateLimited { message }
    } else {
        RemoteError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

/// GitHub REST API client.
#[derive(Debug)]
pub struct GitHubClient {
    base_url: String,
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.github.com";

    /// Creates a client using the GitHub credential from the token store.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingToken`] when no GitHub credential is
    /// linked, or an error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig, tokens: &TokenStore) -> Result<Self, RemoteError> {
        let token = tokens.require(Provider::GitHub)?.to_string();
        Ok(Self {
            base_url: config.base_url_or(Self::DEFAULT_BASE_URL),
            http: build_http_client(config)?,
            token,
        })
    }

    async fn list_refs_page(
        &self,
        repository: &str,
        kind: ReferenceType,
    ) -> Result<Vec<GitReference>, RemoteError> {
        let segment = match kind {
            ReferenceType::Branch => "branches",
            ReferenceType::Tag => "tags",
        };
        let url = format!(
            "{}/repos/{repository}/{segment}?per_page=100",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .headers(bearer_headers(&self.token)?)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        #[derive(Deserialize)]
        struct RefCommit {
            sha: String,
        }

        #[derive(Deserialize)]
        struct Ref {
            name: String,
            commit: RefCommit,
        }

        let refs: Vec<Ref> = response.json().await?;
        Ok(refs
            .into_iter()
            .map(|r| GitReference {
                name: r.name,
                reference_type: kind,
                commit_id: Some(r.commit.sha),
                last_modified: None,
            })
            .collect())
    }
}

#[async_trait]
impl SourceControlClient for GitHubClient {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    async fn list_references(&self, repository: &str) -> Result<Vec<GitReference>, RemoteError> {
        let mut references = self
            .list_refs_page(repository, ReferenceType::Branch)
            .await?;
        references.extend(self.list_refs_page(repository, ReferenceType::Tag).await?);
        tracing::debug!(repository, count = references.len(), "Listed GitHub references");
        Ok(references)
    }

    async fn file_content(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Option<String>, RemoteError> {
        let trimmed = path.trim_start_matches('/');
        let url = format!(
            "{}/repos/{repository}/contents/{trimmed}?ref={reference}",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .headers(bearer_headers(&self.token)?)
            .header(ACCEPT, "application/vnd.github.raw+json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(Some(response.text().await?))
    }
}

/// Bitbucket Cloud API client.
#[derive(Debug)]
pub struct BitbucketClient {
    base_url: String,
    http: reqwest::Client,
    token: String,
}

impl BitbucketClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.bitbucket.org/2.0";

    /// Creates a client using the Bitbucket credential from the token store.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingToken`] when no Bitbucket credential
    /// is linked, or an error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig, tokens: &TokenStore) -> Result<Self, RemoteError> {
        let token = tokens.require(Provider::Bitbucket)?.to_string();
        Ok(Self {
            base_url: config.base_url_or(Self::DEFAULT_BASE_URL),
            http: build_http_client(config)?,
            token,
        })
    }

    async fn list_refs_kind(
        &self,
        repository: &str,
        kind: ReferenceType,
    ) -> Result<Vec<GitReference>, RemoteError> {
        let segment = match kind {
            ReferenceType::Branch => "branches",
            ReferenceType::Tag => "tags",
        };
        let url = format!(
            "{}/repositories/{repository}/refs/{segment}?pagelen=100",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .headers(bearer_headers(&self.token)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        #[derive(Deserialize)]
        struct Target {
            hash: String,
            date: Option<DateTime<Utc>>,
        }

        #[derive(Deserialize)]
        struct Ref {
            name: String,
            target: Target,
        }

        #[derive(Deserialize)]
        struct Page {
            values: Vec<Ref>,
        }

        let page: Page = response.json().await?;
        Ok(page
            .values
            .into_iter()
            .map(|r| GitReference {
                name: r.name,
                reference_type: kind,
                commit_id: Some(r.target.hash),
                last_modified: r.target.date,
            })
            .collect())
    }
}

#[async_trait]
impl SourceControlClient for BitbucketClient {
    fn provider(&self) -> Provider {
        Provider::Bitbucket
    }

    async fn list_references(&self, repository: &str) -> Result<Vec<GitReference>, RemoteError> {
        let mut references = self
            .list_refs_kind(repository, ReferenceType::Branch)
            .await?;
        references.extend(self.list_refs_kind(repository, ReferenceType::Tag).await?);
        tracing::debug!(
            repository,
            count = references.len(),
            "Listed Bitbucket references"
        );
        Ok(references)
    }

    async fn file_content(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Option<String>, RemoteError> {
        let trimmed = path.trim_start_matches('/');
        let url = format!(
            "{}/repositories/{repository}/src/{reference}/{trimmed}",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .headers(bearer_headers(&self.token)?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(Some(response.text().await?))
    }
}
