//! Error types for Daedalus domain rules.
//!
//! Message text is part of the contract: callers (and the original
//! integration suite this service is tested against) assert on message
//! substrings, so the `#[error]` strings here are stable.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by Daedalus domain rules.
#[derive(Error, Debug)]
pub enum Error {
    /// An entry path had too few segments to name a registry and organization.
    #[error("Entry path '{path}' is malformed")]
    MalformedPath {
        /// The offending path string.
        path: String,
    },

    /// A public entry was registered on a private-only registry.
    #[error("The registry {registry} is a private only registry, the tool must be private")]
    PrivateOnlyRegistry {
        /// Display name of the registry.
        registry: String,
    },

    /// An update tried to flip a private-only registry entry to public.
    #[error("The registry {registry} is private only, cannot set tool to public")]
    PrivateOnlyRegistryUpdate {
        /// Display name of the registry.
        registry: String,
    },

    /// A tool with a private Amazon ECR docker path was set to public.
    #[error("The private Amazon ECR tool cannot be set to public.")]
    PrivateEcrToPublic,

    /// A tool with a public Amazon ECR docker path was set to private.
    #[error("The public Amazon ECR tool cannot be set to private.")]
    PublicEcrToPrivate,

    /// A custom docker path was missing or did not match the registry's domain.
    #[error("The provided registry is not valid")]
    InvalidRegistryPath {
        /// The rejected path, if one was supplied.
        path: Option<String>,
    },

    /// Publishing an entry with zero valid versions.
    #[error("Repository does not meet requirements to publish.")]
    NoValidVersions,

    /// The upstream container-registry repository has no tags at all.
    #[error("Repository {path} has no tags.")]
    NoTags {
        /// Canonical path of the repository.
        path: String,
    },

    /// Registering a private tool without a maintainer email.
    #[error("Tool maintainer email is required for private tools")]
    MissingMaintainerEmail,

    /// A published entry was made private with no email anywhere.
    #[error("A published, private tool must have either an tool author email or tool maintainer email set up")]
    MissingEmail,

    /// The canonical entry path collides with an existing entry.
    #[error("{kind} {path} already exists.")]
    DuplicatePath {
        /// "Tool" or "Workflow".
        kind: &'static str,
        /// Canonical path of the existing entry.
        path: String,
    },

    /// The requested default version is hidden.
    #[error("You can not set the default version to a hidden version.")]
    HiddenDefault,

    /// A version patch tried to hide the current default version.
    #[error("You cannot hide the default version.")]
    HideDefault,

    /// No entry exists with the given identity.
    #[error("Entry not found")]
    EntryNotFound,

    /// No version with the given name belongs to the entry.
    #[error("Version {version} does not exist for this entry")]
    VersionNotFound {
        /// Requested version name.
        version: String,
    },

    /// A test parameter file was not attached to the version.
    #[error("Test parameter file {path} does not exist for version {version}")]
    VersionFileNotFound {
        /// Requested file path.
        path: String,
        /// Version name.
        version: String,
    },

    /// A hosted-only operation was invoked on a mirrored entry.
    #[error("cannot modify non-hosted entries this way")]
    NotHosted,

    /// Refresh was invoked on a hosted entry, which has no upstream.
    #[error("cannot refresh hosted entries, they have no upstream source")]
    HostedRefresh,

    /// Input validation failed.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_only_message_names_registry() {
        let err = Error::PrivateOnlyRegistryUpdate {
            registry: "Seven Bridges".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "The registry Seven Bridges is private only, cannot set tool to public"
        );
    }

    #[test]
    fn test_duplicate_path_message() {
        let err = Error::DuplicatePath {
            kind: "Tool",
            path: "public.ecr.aws/abcd1234/foo/bar".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tool public.ecr.aws/abcd1234/foo/bar already exists."
        );
    }

    #[test]
    fn test_ecr_visibility_messages() {
        assert_eq!(
            Error::PrivateEcrToPublic.to_string(),
            "The private Amazon ECR tool cannot be set to public."
        );
        assert_eq!(
            Error::PublicEcrToPrivate.to_string(),
            "The public Amazon ECR tool cannot be set to private."
        );
    }

    #[test]
    fn test_guard_messages() {
        assert_eq!(
            Error::HiddenDefault.to_string(),
            "You can not set the default version to a hidden version."
        );
        assert_eq!(
            Error::HideDefault.to_string(),
            "You cannot hide the default version."
        );
    }

    #[test]
    fn test_no_tags_message() {
        let err = Error::NoTags {
            path: "quay.io/testorg/nobuildsatall".to_string(),
        };
        assert!(err.to_string().contains("has no tags."));
    }
}
