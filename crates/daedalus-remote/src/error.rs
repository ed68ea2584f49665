//! Error types for remote client operations.

use thiserror::Error;

/// Errors that can occur while talking to upstream services.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No credential is linked for the provider a repository needs.
    #[error("No GitHub or Google token found, refresh canceled")]
    MissingToken,

    /// Failed to reach the upstream service.
    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Upstream returned an error status.
    #[error("Upstream returned {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// Upstream throttled the request.
    #[error("Upstream rate limit exceeded: {message}")]
    RateLimited {
        /// Upstream-provided detail.
        message: String,
    },

    /// Response body did not parse.
    #[error("Failed to decode upstream response: {source}")]
    Decode {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The requested URL could not be constructed.
    #[error("Invalid upstream URL: {url}")]
    InvalidUrl {
        /// The malformed URL.
        url: String,
    },
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else {
            Self::Http {
                status: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode { source: err }
    }
}
