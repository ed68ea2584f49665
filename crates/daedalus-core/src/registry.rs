//! Container registry policy table.
//!
//! Each supported registry carries a static policy record: whether its
//! repositories are public, private or either, whether a custom docker
//! path must be supplied at registration, and the default docker path when
//! one exists. Visibility checks for Amazon ECR are path-driven because
//! public and private ECR repositories live on distinct domains.

use crate::error::Error;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Supported container registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Registry {
    /// Quay.io.
    QuayIo,
    /// Docker Hub.
    DockerHub,
    /// GitLab container registry.
    Gitlab,
    /// Amazon ECR, public or private depending on the docker path.
    AmazonEcr,
    /// Seven Bridges, private only, custom docker path required.
    SevenBridges,
}

/// Repository visibility a registry permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryVisibility {
    /// Only public repositories.
    PublicOnly,
    /// Only private repositories.
    PrivateOnly,
    /// Both public and private repositories.
    Either,
}

/// Static policy record for one registry.
#[derive(Debug, Clone, Copy)]
pub struct RegistryDescriptor {
    /// Visibility the registry permits.
    pub visibility: RegistryVisibility,

    /// Whether registration must supply a custom docker path.
    pub requires_custom_docker_path: bool,

    /// Default docker path, when the registry has a fixed one.
    pub default_docker_path: Option<&'static str>,
}

static POLICY_TABLE: Lazy<HashMap<Registry, RegistryDescriptor>> = Lazy::new(|| {
    HashMap::from([
        (
            Registry::QuayIo,
            RegistryDescriptor {
                visibility: RegistryVisibility::Either,
                requires_custom_docker_path: false,
                default_docker_path: Some("quay.io"),
            },
        ),
        (
            Registry::DockerHub,
            RegistryDescriptor {
                visibility: RegistryVisibility::Either,
                requires_custom_docker_path: false,
                default_docker_path: Some("registry.hub.docker.com"),
            },
        ),
        (
            Registry::Gitlab,
            RegistryDescriptor {
                visibility: RegistryVisibility::Either,
                requires_custom_docker_path: false,
                default_docker_path: Some("registry.gitlab.com"),
            },
        ),
        (
            Registry::AmazonEcr,
            RegistryDescriptor {
                visibility: RegistryVisibility::Either,
                requires_custom_docker_path: false,
                default_docker_path: Some("public.ecr.aws"),
            },
        ),
        (
            Registry::SevenBridges,
            RegistryDescriptor {
                visibility: RegistryVisibility::PrivateOnly,
                requires_custom_docker_path: true,
                default_docker_path: None,
            },
        ),
    ])
});

impl Registry {
    /// Returns the policy record for this registry.
    #[must_use]
    pub fn descriptor(self) -> &'static RegistryDescriptor {
        &POLICY_TABLE[&self]
    }

    /// Human-readable registry name, used in error messages.
    #[must_use]
    pub const fn friendly_name(self) -> &'static str {
        match self {
            Self::QuayIo => "Quay.io",
            Self::DockerHub => "Docker Hub",
            Self::Gitlab => "GitLab",
            Self::AmazonEcr => "Amazon ECR",
            Self::SevenBridges => "Seven Bridges",
        }
    }

    /// Returns the docker path an entry on this registry should use.
    ///
    /// Falls back to the registry default when no custom path was given.
    #[must_use]
    pub fn effective_docker_path(self, custom: Option<&str>) -> Option<String> {
        custom
            .map(ToString::to_string)
            .or_else(|| self.descriptor().default_docker_path.map(ToString::to_string))
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.friendly_name())
    }
}

/// Returns true if the path names a private Amazon ECR repository
/// (`*.dkr.ecr.*.amazonaws.com`).
#[must_use]
pub fn is_private_ecr_path(path: &str) -> bool {
    let host = path.split('/').next().unwrap_or(path);
    host.contains(".dkr.ecr.") && host.ends_with(".amazonaws.com")
}

/// Returns true if the path names a public Amazon ECR repository
/// (`public.ecr.aws`).
#[must_use]
pub fn is_public_ecr_path(path: &str) -> bool {
    path == "public.ecr.aws" || path.starts_with("public.ecr.aws/")
}

fn is_seven_bridges_path(path: &str) -> bool {
    path == "images.sbgenomics.com" || path.ends_with("-images.sbgenomics.com")
}

/// Validates a custom docker path against the registry's expected domain.
///
/// # Errors
///
/// Returns [`Error::InvalidRegistryPath`] if the registry requires a custom
/// path and none was supplied, if the supplied path does not match the
/// registry's domain pattern, or if a custom path was supplied for a
/// registry with a fixed path.
pub fn validate_docker_path(registry: Registry, path: Option<&str>) -> Result<(), Error> {
    let descriptor = registry.descriptor();

    let Some(path) = path else {
        if descriptor.requires_custom_docker_path {
            return Err(Error::InvalidRegistryPath { path: None });
        }
        return Ok(());
    };

    let accepted = match registry {
        Registry::SevenBridges => is_seven_bridges_path(path),
        Registry::AmazonEcr => is_public_ecr_path(path) || is_private_ecr_path(path),
        // Fixed-path registries only accept their own path.
        Registry::QuayIo | Registry::DockerHub | Registry::Gitlab => {
            descriptor.default_docker_path == Some(path)
        }
    };

    if accepted {
        Ok(())
    } else {
        Err(Error::InvalidRegistryPath {
            path: Some(path.to_string()),
        })
    }
}

/// Checks that the requested privacy setting is allowed for the registry
/// and docker path.
///
/// `is_update` selects the message for flipping an existing entry rather
/// than registering a new one.
///
/// # Errors
///
/// Returns a visibility error when a private-only registry entry is set to
/// public, or when the requested privacy contradicts an Amazon ECR path's
/// domain.
pub fn check_private_access(
    registry: Registry,
    docker_path: Option<&str>,
    private_access: bool,
    is_update: bool,
) -> Result<(), Error> {
    match registry.descriptor().visibility {
        RegistryVisibility::PrivateOnly if !private_access => {
            if is_update {
                return Err(Error::PrivateOnlyRegistryUpdate {
                    registry: registry.friendly_name().to_string(),
                });
            }
            return Err(Error::PrivateOnlyRegistry {
                registry: registry.friendly_name().to_string(),
            });
        }
        RegistryVisibility::PublicOnly if private_access => {
            return Err(Error::PublicEcrToPrivate);
        }
        _ => {}
    }

    if registry == Registry::AmazonEcr {
        if let Some(path) = docker_path {
            if is_private_ecr_path(path) && !private_access {
                return Err(Error::PrivateEcrToPublic);
            }
            if is_public_ecr_path(path) && private_access {
                return Err(Error::PublicEcrToPrivate);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table_covers_every_registry() {
        for registry in [
            Registry::QuayIo,
            Registry::DockerHub,
            Registry::Gitlab,
            Registry::AmazonEcr,
            Registry::SevenBridges,
        ] {
            let _ = registry.descriptor();
        }
    }

    #[test]
    fn test_seven_bridges_is_private_only() {
        let err = check_private_access(Registry::SevenBridges, Some("images.sbgenomics.com"), false, false)
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("The registry Seven Bridges is a private only registry"));

        let err = check_private_access(Registry::SevenBridges, Some("images.sbgenomics.com"), false, true)
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("The registry Seven Bridges is private only, cannot set tool to public"));

        check_private_access(Registry::SevenBridges, Some("images.sbgenomics.com"), true, false)
            .unwrap();
    }

    #[test]
    fn test_seven_bridges_path_patterns() {
        validate_docker_path(Registry::SevenBridges, Some("images.sbgenomics.com")).unwrap();
        validate_docker_path(Registry::SevenBridges, Some("test-images.sbgenomics.com")).unwrap();

        // missing the dash separator
        let err =
            validate_docker_path(Registry::SevenBridges, Some("testimages.sbgenomics.com")).unwrap_err();
        assert!(err.to_string().contains("The provided registry is not valid"));

        // path is required at all
        let err = validate_docker_path(Registry::SevenBridges, None).unwrap_err();
        assert!(err.to_string().contains("The provided registry is not valid"));
    }

    #[test]
    fn test_ecr_path_domains() {
        assert!(is_public_ecr_path("public.ecr.aws"));
        assert!(is_public_ecr_path("public.ecr.aws/ubuntu/ubuntu"));
        assert!(!is_public_ecr_path("test.dkr.ecr.us-east-1.amazonaws.com"));

        assert!(is_private_ecr_path("test.dkr.ecr.us-east-1.amazonaws.com"));
        assert!(!is_private_ecr_path("public.ecr.aws"));
        assert!(!is_private_ecr_path("dkr.ecr.amazonaws.com.evil.example"));
    }

    #[test]
    fn test_ecr_privacy_must_match_path_domain() {
        let err = check_private_access(
            Registry::AmazonEcr,
            Some("test.dkr.ecr.us-east-1.amazonaws.com"),
            false,
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The private Amazon ECR tool cannot be set to public."
        );

        let err = check_private_access(
            Registry::AmazonEcr,
            Some("public.ecr.aws/ubuntu/ubuntu"),
            true,
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The public Amazon ECR tool cannot be set to private."
        );

        check_private_access(Registry::AmazonEcr, Some("public.ecr.aws"), false, false).unwrap();
        check_private_access(
            Registry::AmazonEcr,
            Some("test.dkr.ecr.us-east-1.amazonaws.com"),
            true,
            true,
        )
        .unwrap();
    }

    #[test]
    fn test_fixed_path_registries_reject_foreign_paths() {
        validate_docker_path(Registry::QuayIo, None).unwrap();
        validate_docker_path(Registry::QuayIo, Some("quay.io")).unwrap();
        assert!(validate_docker_path(Registry::QuayIo, Some("example.com")).is_err());
    }

    #[test]
    fn test_effective_docker_path() {
        assert_eq!(
            Registry::AmazonEcr.effective_docker_path(None).as_deref(),
            Some("public.ecr.aws")
        );
        assert_eq!(
            Registry::AmazonEcr
                .effective_docker_path(Some("test.dkr.ecr.us-east-1.amazonaws.com"))
                .as_deref(),
            Some("test.dkr.ecr.us-east-1.amazonaws.com")
        );
        assert_eq!(Registry::SevenBridges.effective_docker_path(None), None);
    }

    #[test]
    fn test_registry_display() {
        assert_eq!(Registry::SevenBridges.to_string(), "Seven Bridges");
        assert_eq!(Registry::AmazonEcr.to_string(), "Amazon ECR");
    }

    #[test]
    fn test_registry_serialization() {
        let json = serde_json::to_string(&Registry::QuayIo).unwrap();
        assert_eq!(json, "\"QUAY_IO\"");
        let back: Registry = serde_json::from_str("\"SEVEN_BRIDGES\"").unwrap();
        assert_eq!(back, Registry::SevenBridges);
    }
}
