//! Versions of an entry: tags for tools, workflow versions for workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a version within an entry graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionId(pub u64);

/// Kind of source-control reference a version points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    /// A branch head.
    Branch,
    /// An immutable tag.
    Tag,
}

/// One revision of an entry, bound to a source-control reference.
///
/// Versions are created and deleted only by refresh or by explicit version
/// operations. The dirty bit records that a user overrode this version's
/// descriptor paths; refresh never rewrites the paths of a dirty version,
/// so the flag also marks divergence from the entry-level defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Identifier within the owning entry graph.
    pub id: VersionId,

    /// Display name (tag name or branch-derived name).
    pub name: String,

    /// Git reference the version tracks.
    pub reference: String,

    /// Whether the reference is a branch or a tag.
    pub reference_type: ReferenceType,

    /// True if the primary descriptor parsed at this reference.
    pub valid: bool,

    /// Hidden versions are omitted from public listings and can never be
    /// the default.
    pub hidden: bool,

    /// True once a user overrode this version's descriptor paths.
    pub dirty_bit: bool,

    /// CWL descriptor path for this version.
    pub cwl_path: Option<String>,

    /// WDL descriptor path for this version.
    pub wdl_path: Option<String>,

    /// Workflow descriptor path (workflows only).
    pub workflow_path: Option<String>,

    /// Upstream modification time of the reference.
    pub last_modified: Option<DateTime<Utc>>,

    /// Commit the reference resolved to at last refresh.
    pub commit_id: Option<String>,

    /// Container image digest (tools only).
    pub image_id: Option<String>,
}

impl Version {
    /// Creates a version with the given identity, clean and visible.
    #[must_use]
    pub fn new(
        id: VersionId,
        name: impl Into<String>,
        reference: impl Into<String>,
        reference_type: ReferenceType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            reference: reference.into(),
            reference_type,
            valid: false,
            hidden: false,
            dirty_bit: false,
            cwl_path: None,
            wdl_path: None,
            workflow_path: None,
            last_modified: None,
            commit_id: None,
            image_id: None,
        }
    }

    /// Sets the descriptor paths.
    #[must_use]
    pub fn with_paths(
        mut self,
        cwl_path: Option<String>,
        wdl_path: Option<String>,
        workflow_path: Option<String>,
    ) -> Self {
        self.cwl_path = cwl_path;
        self.wdl_path = wdl_path;
        self.workflow_path = workflow_path;
        self
    }

    /// Sets the image digest.
    #[must_use]
    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }
}

/// A caller-supplied patch to one version, applied by `update_versions`.
///
/// `None` fields are left unchanged. Changing any descriptor path raises
/// the version's dirty bit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPatch {
    /// Name of the version to patch.
    pub name: String,

    /// New hidden flag.
    pub hidden: Option<bool>,

    /// New CWL descriptor path.
    pub cwl_path: Option<String>,

    /// New WDL descriptor path.
    pub wdl_path: Option<String>,

    /// New workflow descriptor path.
    pub workflow_path: Option<String>,
}

impl VersionPatch {
    /// Creates an empty patch for the named version.
    #[must_use]
    pub fn for_version(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the hidden flag.
    #[must_use]
    pub const fn hide(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Overrides the CWL descriptor path.
    #[must_use]
    pub fn with_cwl_path(mut self, path: impl Into<String>) -> Self {
        self.cwl_path = Some(path.into());
        self
    }

    /// Overrides the WDL descriptor path.
    #[must_use]
    pub fn with_wdl_path(mut self, path: impl Into<String>) -> Self {
        self.wdl_path = Some(path.into());
        self
    }

    /// Overrides the workflow descriptor path.
    #[must_use]
    pub fn with_workflow_path(mut self, path: impl Into<String>) -> Self {
        self.workflow_path = Some(path.into());
        self
    }

    /// Returns true if the patch changes any descriptor path.
    #[must_use]
    pub const fn touches_paths(&self) -> bool {
        self.cwl_path.is_some() || self.wdl_path.is_some() || self.workflow_path.is_some()
    }
}
