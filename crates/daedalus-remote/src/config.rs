//! Configuration for remote clients.

use std::time::Duration;

/// Configuration shared by the HTTP clients in this crate.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Base URL override, for tests or self-hosted installations.
    pub base_url: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration with default timeout and user agent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("daedalus-remote/{}", env!("CARGO_PKG_VERSION")),
            base_url: None,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Overrides the provider's base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolves the effective base URL given the provider default.
    #[must_use]
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| default.to_string())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the HTTP client the remote clients share their settings through.
pub(crate) fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, crate::error::RemoteError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| crate::error::RemoteError::ConnectionFailed {
            url: config.base_url.clone().unwrap_or_default(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("daedalus-remote/"));
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_base_url_override() {
        let config = ClientConfig::new().with_base_url("http://localhost:8080");
        assert_eq!(
            config.base_url_or("https://api.github.com"),
            "http://localhost:8080"
        );

        let config = ClientConfig::new();
        assert_eq!(
            config.base_url_or("https://api.github.com"),
            "https://api.github.com"
        );
    }
}
