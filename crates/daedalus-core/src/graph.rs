//! The entry aggregate: an entry, its version arena and its source files.
//!
//! Persistence loads and saves whole graphs, which makes every operation
//! all-or-nothing: mutate a loaded copy, save on success, drop it on
//! failure. Versions are kept in an arena keyed by id with insertion
//! order tracked on the side; source files carry their version
//! associations themselves, so nothing holds back-pointers.

use crate::entry::Entry;
use crate::source_file::{FileType, SourceFile, SourceFileId};
use crate::version::{ReferenceType, Version, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An entry together with its versions and source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryGraph {
    /// The entry record.
    pub entry: Entry,

    versions: BTreeMap<VersionId, Version>,
    version_order: Vec<VersionId>,
    files: BTreeMap<SourceFileId, SourceFile>,
    next_version_id: u64,
    next_file_id: u64,
}

impl EntryGraph {
    /// Creates a graph with no versions or files.
    #[must_use]
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            versions: BTreeMap::new(),
            version_order: Vec::new(),
            files: BTreeMap::new(),
            next_version_id: 1,
            next_file_id: 1,
        }
    }

    /// Adds a version, allocating its id.
    pub fn add_version(
        &mut self,
        name: impl Into<String>,
        reference: impl Into<String>,
        reference_type: ReferenceType,
    ) -> VersionId {
        let id = VersionId(self.next_version_id);
        self.next_version_id += 1;
        self.versions
            .insert(id, Version::new(id, name, reference, reference_type));
        self.version_order.push(id);
        id
    }

    /// Removes a version, its file associations, and any file left with no
    /// associations. Clears the entry's default version if it pointed at
    /// the removed version.
    ///
    /// Returns the removed version, or `None` if the id was unknown.
    pub fn remove_version(&mut self, id: VersionId) -> Option<Version> {
        let version = self.versions.remove(&id)?;
        self.version_order.retain(|v| *v != id);

        self.files.retain(|_, file| {
            file.version_ids.remove(&id);
            !file.version_ids.is_empty()
        });

        if self.entry.default_version.as_deref() == Some(version.name.as_str()) {
            self.entry.default_version = None;
            self.entry.default_set_by_user = false;
        }

        Some(version)
    }

    /// Looks up a version by id.
    #[must_use]
    pub fn version(&self, id: VersionId) -> Option<&Version> {
        self.versions.get(&id)
    }

    /// Looks up a version by id, mutably.
    pub fn version_mut(&mut self, id: VersionId) -> Option<&mut Version> {
        self.versions.get_mut(&id)
    }

    /// Looks up a version by name.
    #[must_use]
    pub fn version_by_name(&self, name: &str) -> Option<&Version> {
        self.versions.values().find(|v| v.name == name)
    }

    /// Looks up a version by name, mutably.
    pub fn version_by_name_mut(&mut self, name: &str) -> Option<&mut Version> {
        self.versions.values_mut().find(|v| v.name == name)
    }

    /// Iterates versions in insertion order.
    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.version_order
            .iter()
            .filter_map(|id| self.versions.get(id))
    }

    /// Ids of all versions, in insertion order.
    #[must_use]
    pub fn version_ids(&self) -> Vec<VersionId> {
        self.version_order.clone()
    }

    /// Number of versions.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Number of versions with `valid = true`.
    #[must_use]
    pub fn valid_version_count(&self) -> usize {
        self.versions.values().filter(|v| v.valid).count()
    }

    /// The designated default version record, if one is set and present.
    #[must_use]
    pub fn default_version(&self) -> Option<&Version> {
        self.entry
            .default_version
            .as_deref()
            .and_then(|name| self.version_by_name(name))
    }

    /// Adds or updates a file association for a version.
    ///
    /// A file is identified within a version by its type and absolute
    /// path: refreshing the same path updates content in place instead of
    /// accumulating duplicates. Returns the file id.
    pub fn upsert_file(
        &mut self,
        version_id: VersionId,
        file_type: FileType,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> SourceFileId {
        let path = path.into();
        let content = content.into();
        let absolute_path = if path.starts_with('/') {
            path.clone()
        } else {
            format!("/{path}")
        };

        // Same path already attached to this version: refresh the content.
        if let Some(file) = self.files.values_mut().find(|f| {
            f.file_type == file_type && f.absolute_path == absolute_path && f.belongs_to(version_id)
        }) {
            file.content = content;
            return file.id;
        }

        // Identical blob attached to a sibling version: share it.
        if let Some(file) = self.files.values_mut().find(|f| {
            f.file_type == file_type && f.absolute_path == absolute_path && f.content == content
        }) {
            file.version_ids.insert(version_id);
            return file.id;
        }

        let id = SourceFileId(self.next_file_id);
        self.next_file_id += 1;
        self.files.insert(
            id,
            SourceFile::new(id, file_type, path, content, version_id),
        );
        id
    }

    /// Associates an existing file with another version.
    ///
    /// Returns false if the file id is unknown.
    pub fn associate_file(&mut self, file_id: SourceFileId, version_id: VersionId) -> bool {
        match self.files.get_mut(&file_id) {
            Some(file) => {
                file.version_ids.insert(version_id);
                true
            }
            None => false,
        }
    }

    /// Detaches the file with the given type and absolute path from a
    /// version, dropping the file entirely if no associations remain.
    ///
    /// Returns true if an association was removed.
    pub fn detach_file(
        &mut self,
        version_id: VersionId,
        file_type: FileType,
        absolute_path: &str,
    ) -> bool {
        let Some(id) = self
            .files
            .values()
            .find(|f| {
                f.file_type == file_type
                    && f.absolute_path == absolute_path
                    && f.belongs_to(version_id)
            })
            .map(|f| f.id)
        else {
            return false;
        };

        if let Some(file) = self.files.get_mut(&id) {
            file.version_ids.remove(&version_id);
            if file.version_ids.is_empty() {
                self.files.remove(&id);
            }
        }
        true
    }

    /// Files associated with a version, in id order.
    pub fn files_for_version(&self, version_id: VersionId) -> impl Iterator<Item = &SourceFile> {
        self.files
            .values()
            .filter(move |f| f.belongs_to(version_id))
    }

    /// All files in the graph, in id order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Number of distinct files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryId, EntryMode, WorkflowDetails};
    use crate::descriptor::DescriptorType;
    use crate::path::EntryPath;

    fn sample_graph() -> EntryGraph {
        let entry = Entry::workflow(
            EntryId(1),
            EntryPath::new("github.com", "testorg", "hello-workflow"),
            EntryMode::Auto,
            WorkflowDetails {
                descriptor_type: DescriptorType::Cwl,
                default_workflow_path: "/workflow.cwl".to_string(),
                default_test_parameter_path: None,
            },
        );
        EntryGraph::new(entry)
    }

    #[test]
    fn test_add_and_lookup_versions() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);
        let v1 = graph.add_version("1.0", "1.0", ReferenceType::Tag);

        assert_eq!(graph.version_count(), 2);
        assert_eq!(graph.version(master).unwrap().name, "master");
        assert_eq!(graph.version_by_name("1.0").unwrap().id, v1);
        assert!(graph.version_by_name("missing").is_none());

        let names: Vec<_> = graph.versions().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["master", "1.0"]);
    }

    #[test]
    fn test_remove_version_cascades_file_associations() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);
        let dev = graph.add_version("dev", "dev", ReferenceType::Branch);

        // shared blob and a version-private blob
        let shared = graph.upsert_file(master, FileType::Cwl, "/workflow.cwl", "shared");
        graph.associate_file(shared, dev);
        graph.upsert_file(master, FileType::CwlTestJson, "/test.json", "{}");

        assert_eq!(graph.file_count(), 2);

        graph.remove_version(master);
        assert_eq!(graph.version_count(), 1);
        // the private file is gone, the shared one survives on `dev`
        assert_eq!(graph.file_count(), 1);
        assert!(graph.files().all(|f| f.belongs_to(dev)));
    }

    #[test]
    fn test_remove_default_version_clears_default() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);
        graph.entry.default_version = Some("master".to_string());
        graph.entry.default_set_by_user = true;

        graph.remove_version(master);
        assert_eq!(graph.entry.default_version, None);
        assert!(!graph.entry.default_set_by_user);
    }

    #[test]
    fn test_upsert_file_updates_in_place() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);

        let first = graph.upsert_file(master, FileType::Cwl, "/workflow.cwl", "old");
        let second = graph.upsert_file(master, FileType::Cwl, "/workflow.cwl", "new");

        assert_eq!(first, second);
        assert_eq!(graph.file_count(), 1);
        assert_eq!(
            graph.files_for_version(master).next().unwrap().content,
            "new"
        );
    }

    #[test]
    fn test_upsert_file_shares_identical_blob() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);
        let dev = graph.add_version("dev", "dev", ReferenceType::Branch);

        let a = graph.upsert_file(master, FileType::Cwl, "/workflow.cwl", "same");
        let b = graph.upsert_file(dev, FileType::Cwl, "/workflow.cwl", "same");

        assert_eq!(a, b);
        assert_eq!(graph.file_count(), 1);
    }

    #[test]
    fn test_detach_file_drops_orphans() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);
        graph.upsert_file(master, FileType::CwlTestJson, "/test.json", "{}");

        assert!(!graph.detach_file(master, FileType::CwlTestJson, "/missing.json"));
        assert!(graph.detach_file(master, FileType::CwlTestJson, "/test.json"));
        assert_eq!(graph.file_count(), 0);
    }

    #[test]
    fn test_valid_version_count() {
        let mut graph = sample_graph();
        let master = graph.add_version("master", "master", ReferenceType::Branch);
        graph.add_version("dev", "dev", ReferenceType::Branch);
        assert_eq!(graph.valid_version_count(), 0);

        graph.version_mut(master).unwrap().valid = true;
        assert_eq!(graph.valid_version_count(), 1);
    }
}
