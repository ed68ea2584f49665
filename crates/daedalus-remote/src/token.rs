//! Credential storage for upstream providers.

use crate::error::RemoteError;
use std::collections::HashMap;

/// Upstream services a credential can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// GitHub source control.
    GitHub,
    /// Bitbucket source control.
    Bitbucket,
    /// Quay.io container registry.
    QuayIo,
    /// Docker Hub container registry.
    DockerHub,
}

impl Provider {
    /// Hostname the provider's credentials are keyed by.
    #[must_use]
    pub const fn host(self) -> &'static str {
        match self {
            Self::GitHub => "github.com",
            Self::Bitbucket => "bitbucket.org",
            Self::QuayIo => "quay.io",
            Self::DockerHub => "registry.hub.docker.com",
        }
    }
}

/// Per-provider credentials for one user.
///
/// A refresh needs the credential for the entry's source-control provider
/// before any mutation starts; a missing credential aborts the whole
/// operation up front.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    tokens: HashMap<Provider, String>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a credential for a provider.
    #[must_use]
    pub fn with_token(mut self, provider: Provider, token: impl Into<String>) -> Self {
        self.tokens.insert(provider, token.into());
        self
    }

    /// Removes a provider's credential.
    pub fn remove(&mut self, provider: Provider) {
        self.tokens.remove(&provider);
    }

    /// Looks up a provider's credential.
    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&str> {
        self.tokens.get(&provider).map(String::as_str)
    }

    /// Returns the credential for a provider, or the contract error for a
    /// missing source-control token.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingToken`] if no credential is linked.
    pub fn require(&self, provider: Provider) -> Result<&str, RemoteError> {
        self.get(provider).ok_or(RemoteError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        let store = TokenStore::new().with_token(Provider::GitHub, "gho_abc123");
        assert_eq!(store.require(Provider::GitHub).unwrap(), "gho_abc123");
    }

    #[test]
    fn test_require_missing_uses_contract_message() {
        let store = TokenStore::new();
        let err = store.require(Provider::GitHub).unwrap_err();
        assert!(err.to_string().contains("No GitHub or Google token found"));
    }

    #[test]
    fn test_remove() {
        let mut store = TokenStore::new().with_token(Provider::Bitbucket, "secret");
        store.remove(Provider::Bitbucket);
        assert!(store.get(Provider::Bitbucket).is_none());
    }
}
