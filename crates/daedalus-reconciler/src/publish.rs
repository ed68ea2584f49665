//! Publish eligibility.

use daedalus_core::{EntryGraph, Error};

/// Checks whether an entry may be published.
///
/// # Errors
///
/// Returns [`Error::NoValidVersions`] when no version is valid, and
/// [`Error::MissingEmail`] when a private tool has no contact email
/// anywhere.
pub fn can_publish(graph: &EntryGraph) -> Result<(), Error> {
    if graph.valid_version_count() == 0 {
        return Err(Error::NoValidVersions);
    }

    if graph.entry.private_access() && graph.entry.effective_email().is_none() {
        return Err(Error::MissingEmail);
    }

    Ok(())
}

/// Applies a publish-state change, checking eligibility when publishing.
///
/// Returns true if the published flag actually changed.
///
/// # Errors
///
/// Propagates [`can_publish`] errors when `desired` is true.
pub fn apply_publish(graph: &mut EntryGraph, desired: bool) -> Result<bool, Error> {
    if desired {
        can_publish(graph)?;
    }

    if graph.entry.is_published == desired {
        return Ok(false);
    }

    graph.entry.is_published = desired;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{
        Entry, EntryGraph, EntryId, EntryMode, EntryPath, ReferenceType, Registry, ToolDetails,
    };

    fn tool_graph(private_access: bool) -> EntryGraph {
        EntryGraph::new(Entry::tool(
            EntryId(1),
            EntryPath::new("quay.io", "testorg", "testtool"),
            EntryMode::ManualImagePath,
            ToolDetails {
                registry: Registry::QuayIo,
                docker_path: None,
                private_access,
                tool_maintainer_email: None,
                author_email: None,
                default_cwl_path: "/tool.cwl".to_string(),
                default_wdl_path: "/tool.wdl".to_string(),
                default_dockerfile_path: "/Dockerfile".to_string(),
                default_cwl_test_path: None,
                default_wdl_test_path: None,
            },
        ))
    }

    fn add_valid_version(graph: &mut EntryGraph, name: &str) {
        let id = graph.add_version(name, name, ReferenceType::Tag);
        if let Some(version) = graph.version_mut(id) {
            version.valid = true;
        }
    }

    #[test]
    fn test_no_versions_cannot_publish() {
        let graph = tool_graph(false);
        let err = can_publish(&graph).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Repository does not meet requirements to publish."
        );
    }

    #[test]
    fn test_invalid_versions_cannot_publish() {
        let mut graph = tool_graph(false);
        graph.add_version("latest", "master", ReferenceType::Tag);
        assert!(can_publish(&graph).is_err());
    }

    #[test]
    fn test_one_valid_version_publishes() {
        let mut graph = tool_graph(false);
        add_valid_version(&mut graph, "latest");

        assert!(apply_publish(&mut graph, true).unwrap());
        assert!(graph.entry.is_published);

        // repeating the same state is a no-op
        assert!(!apply_publish(&mut graph, true).unwrap());
    }

    #[test]
    fn test_private_tool_needs_email() {
        let mut graph = tool_graph(true);
        add_valid_version(&mut graph, "latest");

        let err = can_publish(&graph).unwrap_err();
        assert!(err.to_string().contains("tool maintainer email set up"));

        // an author email discovered in the descriptor suffices
        graph.entry.tool_mut().unwrap().author_email = Some("author@example.com".to_string());
        can_publish(&graph).unwrap();
    }

    #[test]
    fn test_unpublish_never_checks_eligibility() {
        let mut graph = tool_graph(true);
        graph.entry.is_published = true;
        assert!(apply_publish(&mut graph, false).unwrap());
        assert!(!graph.entry.is_published);
    }
}
