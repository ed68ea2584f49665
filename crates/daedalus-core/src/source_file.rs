//! Source files fetched from upstream or authored through the hosted API.

use crate::version::VersionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier for a source file within an entry graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourceFileId(pub u64);

/// The role a source file plays for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    /// Primary CWL descriptor.
    Cwl,
    /// Primary WDL descriptor.
    Wdl,
    /// Nextflow configuration.
    NextflowConfig,
    /// Dockerfile of a tool.
    Dockerfile,
    /// CWL test parameter file.
    CwlTestJson,
    /// WDL test parameter file.
    WdlTestJson,
}

impl FileType {
    /// Returns true for test parameter file types.
    #[must_use]
    pub const fn is_test_parameter(self) -> bool {
        matches!(self, Self::CwlTestJson | Self::WdlTestJson)
    }
}

/// A content blob associated with one or more versions of an entry.
///
/// Files carry the association set themselves; versions hold no
/// back-pointers. A file with an empty association set is an orphan and is
/// dropped by the owning graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Identifier within the owning entry graph.
    pub id: SourceFileId,

    /// Role of this file.
    pub file_type: FileType,

    /// Path as referenced by the descriptor or registration.
    pub path: String,

    /// Repository-absolute path.
    pub absolute_path: String,

    /// File content.
    pub content: String,

    /// Versions this file is associated with.
    pub version_ids: BTreeSet<VersionId>,
}

impl SourceFile {
    /// Creates a file associated with a single version.
    #[must_use]
    pub fn new(
        id: SourceFileId,
        file_type: FileType,
        path: impl Into<String>,
        content: impl Into<String>,
        version_id: VersionId,
    ) -> Self {
        let path = path.into();
        let absolute_path = if path.starts_with('/') {
            path.clone()
        } else {
            format!("/{path}")
        };
        Self {
            id,
            file_type,
            path,
            absolute_path,
            content: content.into(),
            version_ids: BTreeSet::from([version_id]),
        }
    }

    /// Returns true if the file is associated with the given version.
    #[must_use]
    pub fn belongs_to(&self, version_id: VersionId) -> bool {
        self.version_ids.contains(&version_id)
    }
}
