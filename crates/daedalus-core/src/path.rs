//! Entry path parsing.
//!
//! An entry path names an entry as `registry/organization/repository`,
//! optionally followed by an entry name. Some registries (Amazon ECR)
//! allow slashes inside repository names, which makes
//! `org/repo-part-1/repo-part-2` and `org/repo/entry-name` ambiguous.
//! The parser resolves by position only: the caller states whether the
//! last segment is an entry name. Colliding identities are caught later
//! by duplicate-path detection, not by the parser.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed entry path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPath {
    /// Registry or source-control host, e.g. `quay.io` or `github.com`.
    pub registry: String,

    /// Organization or namespace.
    pub organization: String,

    /// Repository name. May itself contain slashes.
    pub repository: String,

    /// Optional entry name distinguishing multiple entries in one repository.
    pub entry_name: Option<String>,
}

impl EntryPath {
    /// Creates a path with no entry name.
    #[must_use]
    pub fn new(
        registry: impl Into<String>,
        organization: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            organization: organization.into(),
            repository: repository.into(),
            entry_name: None,
        }
    }

    /// Sets the entry name.
    #[must_use]
    pub fn with_entry_name(mut self, entry_name: impl Into<String>) -> Self {
        self.entry_name = Some(entry_name.into());
        self
    }

    /// Returns the canonical slash-joined path, including the entry name.
    ///
    /// Two entries whose canonical paths are equal are the same identity,
    /// regardless of whether the trailing segment was spelled as part of a
    /// slash-bearing repository name or as an explicit entry name.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Returns the path without the entry name.
    #[must_use]
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.registry, self.organization, self.repository
        )
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry_name {
            Some(name) => write!(
                f,
                "{}/{}/{}/{}",
                self.registry, self.organization, self.repository, name
            ),
            None => write!(
                f,
                "{}/{}/{}",
                self.registry, self.organization, self.repository
            ),
        }
    }
}

/// Splits an entry path into its registry, organization, repository and
/// entry-name components.
///
/// The first segment is the registry and the second the organization. If
/// `has_entry_name` is true and more than one segment remains, the last
/// remaining segment is the entry name and everything before it joins into
/// the repository name. With a single remaining segment the entry name
/// stays `None`; there is no ambiguity for single-segment repositories.
///
/// # Examples
///
/// ```
/// use daedalus_core::path::split_path;
///
/// let path = split_path("registry/org/repo-part-1/repo-part-2/entry-name", true).unwrap();
/// assert_eq!(path.repository, "repo-part-1/repo-part-2");
/// assert_eq!(path.entry_name.as_deref(), Some("entry-name"));
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedPath`] if fewer than two segments are present.
pub fn split_path(path: &str, has_entry_name: bool) -> Result<EntryPath, Error> {
    let segments: Vec<&str> = path.split('/').collect();

    if segments.len() < 2 || segments.iter().take(2).any(|s| s.is_empty()) {
        return Err(Error::MalformedPath {
            path: path.to_string(),
        });
    }

    let registry = segments[0];
    let organization = segments[1];
    let rest = &segments[2..];

    let (repository, entry_name) = if has_entry_name && rest.len() > 1 {
        (
            rest[..rest.len() - 1].join("/"),
            Some(rest[rest.len() - 1].to_string()),
        )
    } else {
        (rest.join("/"), None)
    };

    Ok(EntryPath {
        registry: registry.to_string(),
        organization: organization.to_string(),
        repository,
        entry_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_entry_name() {
        let path = split_path("registry/org/repo", false).unwrap();
        assert_eq!(path.registry, "registry");
        assert_eq!(path.organization, "org");
        assert_eq!(path.repository, "repo");
        assert_eq!(path.entry_name, None);
    }

    #[test]
    fn test_split_multi_segment_repository() {
        let path = split_path("registry/org/repo-part-1/repo-part-2", false).unwrap();
        assert_eq!(path.repository, "repo-part-1/repo-part-2");
        assert_eq!(path.entry_name, None);

        // Amazon ECR allows repository names with more than one slash
        let path = split_path("registry/org/repo-part-1/repo-part-2/repo-part-3", false).unwrap();
        assert_eq!(path.repository, "repo-part-1/repo-part-2/repo-part-3");
        assert_eq!(path.entry_name, None);
    }

    #[test]
    fn test_split_single_segment_never_an_entry_name() {
        // hasEntryName on a single remaining segment must not consume the repo
        let path = split_path("registry/org/repo", true).unwrap();
        assert_eq!(path.repository, "repo");
        assert_eq!(path.entry_name, None);
    }

    #[test]
    fn test_split_with_entry_name() {
        let path = split_path("registry/org/repo/entry-name", true).unwrap();
        assert_eq!(path.repository, "repo");
        assert_eq!(path.entry_name.as_deref(), Some("entry-name"));

        let path = split_path("registry/org/repo-part-1/repo-part-2/entry-name", true).unwrap();
        assert_eq!(path.repository, "repo-part-1/repo-part-2");
        assert_eq!(path.entry_name.as_deref(), Some("entry-name"));

        let path = split_path(
            "registry/org/repo-part-1/repo-part-2/repo-part-3/entry-name",
            true,
        )
        .unwrap();
        assert_eq!(path.repository, "repo-part-1/repo-part-2/repo-part-3");
        assert_eq!(path.entry_name.as_deref(), Some("entry-name"));
    }

    #[test]
    fn test_split_too_few_segments() {
        let result = split_path("registry", false);
        assert!(matches!(result, Err(Error::MalformedPath { .. })));

        let result = split_path("", false);
        assert!(matches!(result, Err(Error::MalformedPath { .. })));
    }

    #[test]
    fn test_canonical_display() {
        let path = EntryPath::new("public.ecr.aws", "abcd1234", "foo/bar");
        assert_eq!(path.canonical(), "public.ecr.aws/abcd1234/foo/bar");

        let named = path.clone().with_entry_name("tool-name");
        assert_eq!(named.canonical(), "public.ecr.aws/abcd1234/foo/bar/tool-name");
        assert_eq!(named.repository_path(), "public.ecr.aws/abcd1234/foo/bar");
    }

    #[test]
    fn test_colliding_spellings_share_canonical_path() {
        let slash = EntryPath::new("public.ecr.aws", "abcd1234", "foo/bar");
        let named = EntryPath::new("public.ecr.aws", "abcd1234", "foo").with_entry_name("bar");
        assert_eq!(slash.canonical(), named.canonical());
    }
}
