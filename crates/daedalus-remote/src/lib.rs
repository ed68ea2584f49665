//! # Daedalus Remote
//!
//! Upstream clients for the Daedalus registry: source control (GitHub,
//! Bitbucket) and container registries (Quay.io, Docker Hub).
//!
//! The reconciliation engine consumes these through the
//! [`SourceControlClient`] and [`ContainerRegistryClient`] capability
//! traits, so the engine itself never depends on a concrete provider and
//! tests can substitute in-memory fakes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daedalus_remote::{ClientConfig, GitHubClient, Provider, TokenStore};
//! use daedalus_remote::SourceControlClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokens = TokenStore::new().with_token(Provider::GitHub, "gho_...");
//!     let client = GitHubClient::new(&ClientConfig::new(), &tokens)?;
//!
//!     let references = client.list_references("octocat/hello-world").await?;
//!     println!("{} references", references.len());
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod container_registry;
mod error;
mod source_control;
mod token;

pub use config::ClientConfig;
pub use container_registry::{
    ContainerRegistryClient, DockerHubClient, QuayClient, RegistryTag,
};
pub use error::RemoteError;
pub use source_control::{BitbucketClient, GitHubClient, GitReference, SourceControlClient};
pub use token::{Provider, TokenStore};
