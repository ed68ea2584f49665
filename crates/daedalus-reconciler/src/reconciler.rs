//! The version reconciliation algorithm.
//!
//! [`VersionReconciler::reconcile`] diffs a snapshot of upstream state
//! against a persisted [`EntryGraph`]: remote references missing locally
//! become new versions, local versions whose reference disappeared are
//! deleted, surviving versions refetch their files, validity is
//! recomputed from the primary descriptor, and an unset default version
//! is filled by policy. The reconciler is synchronous; the service layer
//! assembles snapshots from the upstream clients.

use daedalus_core::{
    DescriptorType, EntryGraph, EntryKind, Error, FileType, ReferenceType, Version, VersionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A file fetched from upstream at one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Role of the file.
    pub file_type: FileType,

    /// Repository-absolute path the file was fetched from.
    pub path: String,

    /// File content.
    pub content: String,
}

impl RemoteFile {
    /// Creates a remote file, normalizing the path to be absolute.
    #[must_use]
    pub fn new(file_type: FileType, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_type,
            path: absolute(&path.into()),
            content: content.into(),
        }
    }
}

/// One upstream reference (or registry tag) with its fetched files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVersion {
    /// Version name.
    pub name: String,

    /// Git reference backing the version.
    pub reference: String,

    /// Whether the reference is a branch or a tag.
    pub reference_type: ReferenceType,

    /// Commit the reference points at.
    pub commit_id: Option<String>,

    /// Upstream modification time.
    pub last_modified: Option<DateTime<Utc>>,

    /// Image digest, for container tags.
    pub image_id: Option<String>,

    /// Files fetched at this reference, keyed by type and absolute path.
    pub files: Vec<RemoteFile>,
}

impl RemoteVersion {
    /// Creates a snapshot version with no files.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        reference: impl Into<String>,
        reference_type: ReferenceType,
    ) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            reference_type,
            commit_id: None,
            last_modified: None,
            image_id: None,
            files: Vec::new(),
        }
    }

    /// Adds a fetched file.
    #[must_use]
    pub fn with_file(mut self, file: RemoteFile) -> Self {
        self.files.push(file);
        self
    }

    /// Sets the commit id.
    #[must_use]
    pub fn with_commit_id(mut self, commit_id: impl Into<String>) -> Self {
        self.commit_id = Some(commit_id.into());
        self
    }

    /// Sets the image digest.
    #[must_use]
    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    fn file_at(&self, file_type: FileType, path: &str) -> Option<&RemoteFile> {
        let path = absolute(path);
        self.files
            .iter()
            .find(|f| f.file_type == file_type && f.path == path)
    }
}

/// Upstream state of one entry at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    /// All remote versions.
    pub versions: Vec<RemoteVersion>,

    /// The repository's default branch, if the provider reports one.
    pub default_branch: Option<String>,
}

impl RemoteSnapshot {
    /// Creates a snapshot from versions.
    #[must_use]
    pub fn new(versions: Vec<RemoteVersion>) -> Self {
        Self {
            versions,
            default_branch: None,
        }
    }

    /// Sets the default branch.
    #[must_use]
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }
}

/// Policy for picking a default version automatically.
///
/// The preference order is configurable; the stock order favors
/// `master`, then `main`, then `latest`, then the upstream default
/// branch, then the most recently modified valid version.
#[derive(Debug, Clone)]
pub struct DefaultVersionPolicy {
    preferred: Vec<String>,
}

impl Default for DefaultVersionPolicy {
    fn default() -> Self {
        Self {
            preferred: ["master", "main", "latest"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DefaultVersionPolicy {
    /// Creates a policy with a custom preference order.
    #[must_use]
    pub fn with_preferred<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            preferred: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Picks a default among the valid, visible versions of the graph.
    #[must_use]
    pub fn select(&self, graph: &EntryGraph, default_branch: Option<&str>) -> Option<String> {
        let candidates: Vec<&Version> =
            graph.versions().filter(|v| v.valid && !v.hidden).collect();

        for name in &self.preferred {
            if candidates.iter().any(|v| v.name == *name) {
                return Some(name.clone());
            }
        }

        if let Some(branch) = default_branch {
            if candidates.iter().any(|v| v.name == branch) {
                return Some(branch.to_string());
            }
        }

        candidates
            .iter()
            .max_by_key(|v| v.last_modified)
            .map(|v| v.name.clone())
    }
}

/// What one reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Names of versions created.
    pub added: Vec<String>,

    /// Names of versions deleted because their reference disappeared.
    pub deleted: Vec<String>,

    /// Default version assigned by policy during this pass, if any.
    pub default_assigned: Option<String>,
}

/// Diffs remote snapshots against persisted entry graphs.
#[derive(Debug, Clone, Default)]
pub struct VersionReconciler {
    policy: DefaultVersionPolicy,
}

impl VersionReconciler {
    /// Creates a reconciler with the given default-version policy.
    #[must_use]
    pub const fn new(policy: DefaultVersionPolicy) -> Self {
        Self { policy }
    }

    /// Reconciles the whole graph against the snapshot.
    ///
    /// Idempotent up to upstream changes: running it twice against the
    /// same snapshot leaves the graph identical after the second pass.
    pub fn reconcile(&self, graph: &mut EntryGraph, snapshot: &RemoteSnapshot) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        let remote_names: HashSet<&str> =
            snapshot.versions.iter().map(|v| v.name.as_str()).collect();

        // Local versions whose reference no longer exists upstream are
        // deleted together with their file associations. Removing the
        // designated default clears the entry's default version.
        let orphans: Vec<VersionId> = graph
            .versions()
            .filter(|v| !remote_names.contains(v.name.as_str()))
            .map(|v| v.id)
            .collect();
        for id in orphans {
            if let Some(version) = graph.remove_version(id) {
                tracing::debug!(version = %version.name, "Deleted orphaned version");
                summary.deleted.push(version.name);
            }
        }

        for remote in &snapshot.versions {
            if graph.version_by_name(&remote.name).is_none() {
                summary.added.push(remote.name.clone());
            }
            Self::apply_remote_version(graph, remote);
        }

        summary.default_assigned = self.assign_default(graph, snapshot);
        summary
    }

    /// Reconciles a single version against the snapshot, leaving its
    /// siblings untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if the snapshot has no version
    /// with that name.
    pub fn reconcile_version(
        &self,
        graph: &mut EntryGraph,
        snapshot: &RemoteSnapshot,
        name: &str,
    ) -> Result<(), Error> {
        let remote = snapshot
            .versions
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| Error::VersionNotFound {
                version: name.to_string(),
            })?;

        Self::apply_remote_version(graph, remote);
        self.assign_default(graph, snapshot);
        Ok(())
    }

    /// Creates or updates one version from its remote counterpart.
    fn apply_remote_version(graph: &mut EntryGraph, remote: &RemoteVersion) {
        let id = match graph.version_by_name(&remote.name).map(|v| v.id) {
            Some(id) => id,
            None => graph.add_version(&remote.name, &remote.reference, remote.reference_type),
        };

        let defaults = entry_default_paths(graph);

        if let Some(version) = graph.version_mut(id) {
            version.reference = remote.reference.clone();
            version.reference_type = remote.reference_type;
            version.commit_id = remote.commit_id.clone();
            version.last_modified = remote.last_modified;
            if remote.image_id.is_some() {
                version.image_id = remote.image_id.clone();
            }

            // A dirty version keeps its user-chosen paths; everything else
            // tracks the entry-level defaults.
            if !version.dirty_bit {
                version.cwl_path = defaults.cwl.clone();
                version.wdl_path = defaults.wdl.clone();
                version.workflow_path = defaults.workflow.clone();
            }
        }

        Self::apply_files(graph, id, remote);
        Self::compute_validity(graph, id, remote);
    }

    /// Refetches the files of one version from the snapshot.
    fn apply_files(graph: &mut EntryGraph, id: VersionId, remote: &RemoteVersion) {
        let Some(version) = graph.version(id) else {
            return;
        };

        // Descriptors at the version's effective paths.
        let mut wanted: Vec<(FileType, String)> = Vec::new();
        for descriptor in graph.entry.descriptor_types() {
            if let Some(path) = version_descriptor_path(version, descriptor) {
                wanted.push((descriptor.file_type(), path));
            }
        }

        // Dockerfile for tools.
        if let EntryKind::Tool(details) = &graph.entry.kind {
            wanted.push((
                FileType::Dockerfile,
                details.default_dockerfile_path.clone(),
            ));
        }

        for (file_type, path) in wanted {
            if let Some(file) = remote.file_at(file_type, &path) {
                graph.upsert_file(id, file_type, file.path.clone(), file.content.clone());
            }
        }

        // Test parameter files: everything already attached to the version
        // is refetched, and the entry-level default paths are picked up.
        // Attached files that vanished upstream are detached.
        let mut test_paths: Vec<(FileType, String)> = graph
            .files_for_version(id)
            .filter(|f| f.file_type.is_test_parameter())
            .map(|f| (f.file_type, f.absolute_path.clone()))
            .collect();
        for descriptor in graph.entry.descriptor_types() {
            if let (Some(file_type), Some(path)) = (
                descriptor.test_parameter_file_type(),
                graph.entry.default_test_parameter_path(descriptor),
            ) {
                let path = absolute(path);
                if !test_paths.iter().any(|(t, p)| *t == file_type && *p == path) {
                    test_paths.push((file_type, path));
                }
            }
        }

        for (file_type, path) in test_paths {
            match remote.file_at(file_type, &path) {
                Some(file) => {
                    graph.upsert_file(id, file_type, file.path.clone(), file.content.clone());
                }
                None => {
                    graph.detach_file(id, file_type, &path);
                }
            }
        }
    }

    /// A version is valid iff a primary descriptor parses at its
    /// effective path.
    fn compute_validity(graph: &mut EntryGraph, id: VersionId, remote: &RemoteVersion) {
        let Some(version) = graph.version(id) else {
            return;
        };

        let mut valid = false;
        for descriptor in graph.entry.descriptor_types() {
            if let Some(path) = version_descriptor_path(version, descriptor) {
                if let Some(file) = remote.file_at(descriptor.file_type(), &path) {
                    if descriptor.validate_content(&file.content) {
                        valid = true;
                        break;
                    }
                }
            }
        }

        if let Some(version) = graph.version_mut(id) {
            version.valid = valid;
        }
    }

    /// Fills an unset default version by policy. A default explicitly set
    /// by a user is never replaced.
    fn assign_default(&self, graph: &mut EntryGraph, snapshot: &RemoteSnapshot) -> Option<String> {
        if graph.entry.default_version.is_some() {
            return None;
        }

        let selected = self
            .policy
            .select(graph, snapshot.default_branch.as_deref())?;
        tracing::debug!(version = %selected, "Automatically selected default version");
        graph.entry.default_version = Some(selected.clone());
        graph.entry.default_set_by_user = false;
        Some(selected)
    }
}

struct DefaultPaths {
    cwl: Option<String>,
    wdl: Option<String>,
    workflow: Option<String>,
}

fn entry_default_paths(graph: &EntryGraph) -> DefaultPaths {
    match &graph.entry.kind {
        EntryKind::Tool(details) => DefaultPaths {
            cwl: Some(details.default_cwl_path.clone()),
            wdl: Some(details.default_wdl_path.clone()),
            workflow: None,
        },
        EntryKind::Workflow(details) => DefaultPaths {
            cwl: None,
            wdl: None,
            workflow: Some(details.default_workflow_path.clone()),
        },
    }
}

fn version_descriptor_path(version: &Version, descriptor: DescriptorType) -> Option<String> {
    match descriptor {
        DescriptorType::Cwl => version.cwl_path.clone().or_else(|| version.workflow_path.clone()),
        DescriptorType::Wdl => version.wdl_path.clone().or_else(|| version.workflow_path.clone()),
        DescriptorType::Nextflow => version.workflow_path.clone(),
    }
}

fn absolute(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{
        Entry, EntryId, EntryMode, EntryPath, Registry, ToolDetails, WorkflowDetails,
    };

    const VALID_CWL: &str = "cwlVersion: v1.0\nclass: Workflow";
    const INVALID_CWL: &str = "not: a descriptor";

    fn workflow_graph() -> EntryGraph {
        EntryGraph::new(Entry::workflow(
            EntryId(1),
            EntryPath::new("github.com", "testorg", "hello-workflow"),
            EntryMode::Auto,
            WorkflowDetails {
                descriptor_type: DescriptorType::Cwl,
                default_workflow_path: "/workflow.cwl".to_string(),
                default_test_parameter_path: None,
            },
        ))
    }

    fn tool_graph() -> EntryGraph {
        EntryGraph::new(Entry::tool(
            EntryId(1),
            EntryPath::new("quay.io", "testorg", "testtool"),
            EntryMode::ManualImagePath,
            ToolDetails {
                registry: Registry::QuayIo,
                docker_path: None,
                private_access: false,
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

    fn branch(name: &str, content: &str) -> RemoteVersion {
        RemoteVersion::new(name, name, ReferenceType::Branch)
            .with_file(RemoteFile::new(FileType::Cwl, "/workflow.cwl", content))
    }

    #[test]
    fn test_creates_missing_versions_clean() {
        let mut graph = workflow_graph();
        let snapshot = RemoteSnapshot::new(vec![branch("master", VALID_CWL)]);

        let summary = VersionReconciler::default().reconcile(&mut graph, &snapshot);

        assert_eq!(summary.added, vec!["master"]);
        let version = graph.version_by_name("master").unwrap();
        assert!(!version.dirty_bit);
        assert!(version.valid);
        assert_eq!(version.workflow_path.as_deref(), Some("/workflow.cwl"));
    }

    #[test]
    fn test_deletes_orphaned_versions() {
        let mut graph = workflow_graph();
        let reconciler = VersionReconciler::default();
        reconciler.reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("master", VALID_CWL), branch("dev", VALID_CWL)]),
        );
        assert_eq!(graph.version_count(), 2);

        // dev disappears upstream
        let summary =
            reconciler.reconcile(&mut graph, &RemoteSnapshot::new(vec![branch("master", VALID_CWL)]));
        assert_eq!(summary.deleted, vec!["dev"]);
        assert_eq!(graph.version_count(), 1);
        assert_eq!(graph.file_count(), 1);
    }

    #[test]
    fn test_deleting_default_version_clears_default() {
        let mut graph = workflow_graph();
        let reconciler = VersionReconciler::default();
        reconciler.reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("master", VALID_CWL)]),
        );
        assert_eq!(graph.entry.default_version.as_deref(), Some("master"));

        let summary = reconciler.reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("dev", VALID_CWL)]),
        );
        assert_eq!(summary.deleted, vec!["master"]);
        // policy refills from what remains
        assert_eq!(graph.entry.default_version.as_deref(), Some("dev"));
        assert_eq!(summary.default_assigned.as_deref(), Some("dev"));
    }

    #[test]
    fn test_idempotent_without_upstream_changes() {
        let mut graph = workflow_graph();
        let snapshot = RemoteSnapshot::new(vec![branch("master", VALID_CWL), branch("dev", INVALID_CWL)]);
        let reconciler = VersionReconciler::default();

        reconciler.reconcile(&mut graph, &snapshot);
        let first = graph.clone();
        let summary = reconciler.reconcile(&mut graph, &snapshot);

        assert!(summary.added.is_empty());
        assert!(summary.deleted.is_empty());
        assert_eq!(graph, first);
    }

    #[test]
    fn test_dirty_version_keeps_overridden_paths() {
        let mut graph = workflow_graph();
        let reconciler = VersionReconciler::default();
        reconciler.reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("master", VALID_CWL), branch("dev", VALID_CWL)]),
        );

        // user overrides master's path
        {
            let version = graph.version_by_name_mut("master").unwrap();
            version.workflow_path = Some("/custom.cwl".to_string());
            version.dirty_bit = true;
        }

        // entry default changes, then refresh
        graph.entry.workflow_mut().unwrap().default_workflow_path = "/clean.cwl".to_string();
        let snapshot = RemoteSnapshot::new(vec![
            RemoteVersion::new("master", "master", ReferenceType::Branch)
                .with_file(RemoteFile::new(FileType::Cwl, "/custom.cwl", VALID_CWL)),
            RemoteVersion::new("dev", "dev", ReferenceType::Branch)
                .with_file(RemoteFile::new(FileType::Cwl, "/clean.cwl", VALID_CWL)),
        ]);
        reconciler.reconcile(&mut graph, &snapshot);

        assert_eq!(
            graph.version_by_name("master").unwrap().workflow_path.as_deref(),
            Some("/custom.cwl")
        );
        assert!(graph.version_by_name("master").unwrap().dirty_bit);
        assert_eq!(
            graph.version_by_name("dev").unwrap().workflow_path.as_deref(),
            Some("/clean.cwl")
        );
        assert!(!graph.version_by_name("dev").unwrap().dirty_bit);
    }

    #[test]
    fn test_invalid_descriptor_marks_version_invalid() {
        let mut graph = workflow_graph();
        VersionReconciler::default().reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("master", INVALID_CWL)]),
        );
        assert!(!graph.version_by_name("master").unwrap().valid);

        // missing descriptor entirely
        VersionReconciler::default().reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![RemoteVersion::new(
                "master",
                "master",
                ReferenceType::Branch,
            )]),
        );
        assert!(!graph.version_by_name("master").unwrap().valid);
    }

    #[test]
    fn test_tool_valid_if_either_descriptor_parses() {
        let mut graph = tool_graph();
        let snapshot = RemoteSnapshot::new(vec![RemoteVersion::new(
            "latest",
            "master",
            ReferenceType::Tag,
        )
        .with_file(RemoteFile::new(FileType::Cwl, "/tool.cwl", INVALID_CWL))
        .with_file(RemoteFile::new(
            FileType::Wdl,
            "/tool.wdl",
            "version 1.0\ntask hello {\n}",
        ))
        .with_file(RemoteFile::new(FileType::Dockerfile, "/Dockerfile", "FROM scratch"))]);

        VersionReconciler::default().reconcile(&mut graph, &snapshot);

        let version = graph.version_by_name("latest").unwrap();
        assert!(version.valid);
        // the Dockerfile is attached alongside the descriptors
        assert!(graph
            .files_for_version(version.id)
            .any(|f| f.file_type == FileType::Dockerfile));
    }

    #[test]
    fn test_user_set_default_survives_refresh() {
        let mut graph = workflow_graph();
        let reconciler = VersionReconciler::default();
        let snapshot =
            RemoteSnapshot::new(vec![branch("master", VALID_CWL), branch("test", VALID_CWL)]);
        reconciler.reconcile(&mut graph, &snapshot);
        assert_eq!(graph.entry.default_version.as_deref(), Some("master"));

        // user explicitly overrides
        graph.entry.default_version = Some("test".to_string());
        graph.entry.default_set_by_user = true;

        reconciler.reconcile(&mut graph, &snapshot);
        assert_eq!(graph.entry.default_version.as_deref(), Some("test"));
        assert!(graph.entry.default_set_by_user);
    }

    #[test]
    fn test_default_policy_preference_order() {
        let policy = DefaultVersionPolicy::default();
        let mut graph = workflow_graph();
        VersionReconciler::new(policy.clone()).reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("latest", VALID_CWL), branch("master", VALID_CWL)]),
        );
        assert_eq!(graph.entry.default_version.as_deref(), Some("master"));

        // hidden and invalid versions are never candidates
        let mut graph = workflow_graph();
        let snapshot =
            RemoteSnapshot::new(vec![branch("master", INVALID_CWL), branch("latest", VALID_CWL)]);
        VersionReconciler::new(policy).reconcile(&mut graph, &snapshot);
        assert_eq!(graph.entry.default_version.as_deref(), Some("latest"));
    }

    #[test]
    fn test_default_policy_falls_back_to_default_branch() {
        let mut graph = workflow_graph();
        let snapshot = RemoteSnapshot::new(vec![branch("trunk", VALID_CWL), branch("dev", VALID_CWL)])
            .with_default_branch("trunk");
        VersionReconciler::default().reconcile(&mut graph, &snapshot);
        assert_eq!(graph.entry.default_version.as_deref(), Some("trunk"));
    }

    #[test]
    fn test_no_default_when_nothing_valid() {
        let mut graph = workflow_graph();
        VersionReconciler::default().reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("master", INVALID_CWL)]),
        );
        assert_eq!(graph.entry.default_version, None);
    }

    #[test]
    fn test_test_parameter_files_follow_upstream() {
        let mut graph = workflow_graph();
        graph.entry.workflow_mut().unwrap().default_test_parameter_path =
            Some("/test.json".to_string());
        let reconciler = VersionReconciler::default();

        // first refresh finds the default test file
        let with_test = RemoteSnapshot::new(vec![branch("master", VALID_CWL).with_file(
            RemoteFile::new(FileType::CwlTestJson, "/test.json", "{}"),
        )]);
        reconciler.reconcile(&mut graph, &with_test);
        let master = graph.version_by_name("master").unwrap().id;
        assert!(graph
            .files_for_version(master)
            .any(|f| f.file_type == FileType::CwlTestJson));

        // refreshing again does not duplicate it
        reconciler.reconcile(&mut graph, &with_test);
        assert_eq!(
            graph
                .files_for_version(master)
                .filter(|f| f.file_type == FileType::CwlTestJson)
                .count(),
            1
        );

        // the file vanishing upstream detaches it
        let without_test = RemoteSnapshot::new(vec![branch("master", VALID_CWL)]);
        reconciler.reconcile(&mut graph, &without_test);
        assert!(!graph
            .files_for_version(master)
            .any(|f| f.file_type == FileType::CwlTestJson));
    }

    #[test]
    fn test_reconcile_version_touches_only_that_version() {
        let mut graph = workflow_graph();
        let reconciler = VersionReconciler::default();
        reconciler.reconcile(
            &mut graph,
            &RemoteSnapshot::new(vec![branch("master", VALID_CWL), branch("dev", INVALID_CWL)]),
        );

        // dev becomes valid upstream; a single-version refresh of master
        // must not pick that up
        let snapshot =
            RemoteSnapshot::new(vec![branch("master", VALID_CWL), branch("dev", VALID_CWL)]);
        reconciler
            .reconcile_version(&mut graph, &snapshot, "master")
            .unwrap();
        assert!(!graph.version_by_name("dev").unwrap().valid);

        let err = reconciler
            .reconcile_version(&mut graph, &snapshot, "missing")
            .unwrap_err();
        assert!(err.to_string().contains("does not exist for this entry"));
    }
}
