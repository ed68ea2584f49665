//! Guards over default-version, visibility and privacy transitions.
//!
//! Two invariants can never both hold in stored state: the default
//! version is never hidden, and a hidden version is never made default.
//! A combined update that hides the old default and designates a new one
//! applies the default change first, so hiding the now-non-default
//! version succeeds.

use daedalus_core::{registry, EntryGraph, Error, ValidationError, ValidationErrors, VersionPatch};

/// Designates a version as the entry's default, marking it user-chosen.
///
/// # Errors
///
/// Returns [`Error::VersionNotFound`] for an unknown name and
/// [`Error::HiddenDefault`] for a hidden version.
pub fn set_default_version(graph: &mut EntryGraph, name: &str) -> Result<(), Error> {
    let version = graph
        .version_by_name(name)
        .ok_or_else(|| Error::VersionNotFound {
            version: name.to_string(),
        })?;

    if version.hidden {
        return Err(Error::HiddenDefault);
    }

    graph.entry.default_version = Some(name.to_string());
    graph.entry.default_set_by_user = true;
    Ok(())
}

/// Applies version patches, optionally changing the default version in
/// the same call.
///
/// The default change is applied before the patches are evaluated, so a
/// request that both hides the previous default and designates a new one
/// is legal. Changing a descriptor path raises the version's dirty bit.
///
/// Returns the names of the patched versions.
///
/// # Errors
///
/// Returns [`Error::VersionNotFound`] for an unknown version,
/// [`Error::HiddenDefault`] for a hidden new default, and
/// [`Error::HideDefault`] when a patch hides the (post-change) default.
pub fn apply_update(
    graph: &mut EntryGraph,
    new_default: Option<&str>,
    patches: &[VersionPatch],
) -> Result<Vec<String>, Error> {
    if let Some(name) = new_default {
        set_default_version(graph, name)?;
    }

    // Validate every patch against the post-default state before mutating
    // anything, so a rejected request leaves the graph untouched.
    for patch in patches {
        let version =
            graph
                .version_by_name(&patch.name)
                .ok_or_else(|| Error::VersionNotFound {
                    version: patch.name.clone(),
                })?;

        if patch.hidden == Some(true)
            && graph.entry.default_version.as_deref() == Some(version.name.as_str())
        {
            return Err(Error::HideDefault);
        }
    }

    let mut touched = Vec::with_capacity(patches.len());
    for patch in patches {
        if let Some(version) = graph.version_by_name_mut(&patch.name) {
            if let Some(hidden) = patch.hidden {
                version.hidden = hidden;
            }
            if patch.touches_paths() {
                version.dirty_bit = true;
                if let Some(path) = &patch.cwl_path {
                    version.cwl_path = Some(path.clone());
                }
                if let Some(path) = &patch.wdl_path {
                    version.wdl_path = Some(path.clone());
                }
                if let Some(path) = &patch.workflow_path {
                    version.workflow_path = Some(path.clone());
                }
            }
            touched.push(version.name.clone());
        }
    }

    Ok(touched)
}

/// Flips a tool's private access, enforcing registry policy and the
/// published-entry email rule.
///
/// # Errors
///
/// Returns a registry visibility error when the registry forbids the
/// transition, [`Error::MissingEmail`] when a published entry goes
/// private with no contact email, and a validation error for workflows,
/// which carry no registry-level privacy.
pub fn set_private_access(graph: &mut EntryGraph, private_access: bool) -> Result<(), Error> {
    let entry = &graph.entry;
    let Some(tool) = entry.as_tool() else {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::constraint(
            "private_access",
            "only tools carry registry-level privacy",
        ));
        return Err(errors.into());
    };

    if tool.private_access == private_access {
        return Ok(());
    }

    let docker_path = tool.registry.effective_docker_path(tool.docker_path.as_deref());
    registry::check_private_access(tool.registry, docker_path.as_deref(), private_access, true)?;

    if private_access && entry.is_published && entry.effective_email().is_none() {
        return Err(Error::MissingEmail);
    }

    if let Some(tool) = graph.entry.tool_mut() {
        tool.private_access = private_access;
    }
    Ok(())
}
