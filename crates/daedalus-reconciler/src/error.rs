//! Error type for reconciler operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by reconciler operations.
///
/// Domain rule violations and upstream client failures pass through with
/// their own messages; callers at an HTTP boundary can map either to a
/// status code with [`Error::status_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] daedalus_core::Error),

    /// An upstream client failed.
    #[error(transparent)]
    Remote(#[from] daedalus_remote::RemoteError),
}

impl From<daedalus_core::ValidationErrors> for Error {
    fn from(errors: daedalus_core::ValidationErrors) -> Self {
        Self::Domain(errors.into())
    }
}

impl Error {
    /// HTTP-style status code for the boundary layer: 400 for validation
    /// and policy violations, 404 for missing entries/versions/files, 429
    /// for upstream throttling, 502 for other upstream failures.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        use daedalus_core::Error as Domain;
        use daedalus_remote::RemoteError as Remote;

        match self {
            Self::Domain(
                Domain::EntryNotFound
                | Domain::VersionNotFound { .. }
                | Domain::VersionFileNotFound { .. },
            ) => 404,
            Self::Domain(_) | Self::Remote(Remote::MissingToken) => 400,
            Self::Remote(Remote::RateLimited { .. }) => 429,
            Self::Remote(_) => 502,
        }
    }
}
