//! Entries: registered tools and workflows.

use crate::descriptor::DescriptorType;
use crate::path::EntryPath;
use crate::registry::Registry;
use crate::validation::{Validate, ValidationError, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier for a persisted entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntryId(pub u64);

/// How an entry's content reaches the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryMode {
    /// Discovered automatically from linked accounts.
    Auto,
    /// Registered manually against an image path.
    ManualImagePath,
    /// Authored directly through the hosted API; no upstream exists.
    Hosted,
}

/// Tool-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDetails {
    /// Container registry hosting the image.
    pub registry: Registry,

    /// Custom docker path, for registries that take one.
    pub docker_path: Option<String>,

    /// Whether the image repository is private.
    pub private_access: bool,

    /// Maintainer email, required for private tools unless the descriptor
    /// supplies an author email.
    pub tool_maintainer_email: Option<String>,

    /// Author email discovered in descriptor metadata.
    pub author_email: Option<String>,

    /// Entry-level default CWL descriptor path.
    pub default_cwl_path: String,

    /// Entry-level default WDL descriptor path.
    pub default_wdl_path: String,

    /// Entry-level default Dockerfile path.
    pub default_dockerfile_path: String,

    /// Entry-level default CWL test parameter file path.
    pub default_cwl_test_path: Option<String>,

    /// Entry-level default WDL test parameter file path.
    pub default_wdl_test_path: Option<String>,
}

/// Workflow-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDetails {
    /// Descriptor language of the workflow.
    pub descriptor_type: DescriptorType,

    /// Entry-level default descriptor path.
    pub default_workflow_path: String,

    /// Entry-level default test parameter file path.
    pub default_test_parameter_path: Option<String>,
}

/// Kind-specific payload of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// A containerized tool.
    Tool(ToolDetails),
    /// A workflow mirrored from source control or hosted.
    Workflow(WorkflowDetails),
}

/// A registered tool or workflow.
///
/// Shared fields live here; tool/workflow specifics live in [`EntryKind`].
/// The reconciler operates on the shared surface only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Persistent identifier.
    pub id: EntryId,

    /// Identity path: registry, organization, repository, entry name.
    pub path: EntryPath,

    /// How content reaches the registry.
    pub mode: EntryMode,

    /// Git URL of the backing source-control repository.
    pub git_url: Option<String>,

    /// Whether the entry is visible to the public.
    pub is_published: bool,

    /// Name of the default version, if one is designated.
    pub default_version: Option<String>,

    /// True when the default version was chosen explicitly by a user, in
    /// which case refresh never replaces it.
    pub default_set_by_user: bool,

    /// Last time any state-changing operation touched the entry.
    pub last_updated: DateTime<Utc>,

    /// Users who starred the entry.
    pub starred_by: BTreeSet<String>,

    /// Tool- or workflow-specific fields.
    pub kind: EntryKind,
}

impl Entry {
    /// Creates a tool entry.
    #[must_use]
    pub fn tool(id: EntryId, path: EntryPath, mode: EntryMode, details: ToolDetails) -> Self {
        Self {
            id,
            path,
            mode,
            git_url: None,
            is_published: false,
            default_version: None,
            default_set_by_user: false,
            last_updated: Utc::now(),
            starred_by: BTreeSet::new(),
            kind: EntryKind::Tool(details),
        }
    }

    /// Creates a workflow entry.
    #[must_use]
    pub fn workflow(
        id: EntryId,
        path: EntryPath,
        mode: EntryMode,
        details: WorkflowDetails,
    ) -> Self {
        Self {
            id,
            path,
            mode,
            git_url: None,
            is_published: false,
            default_version: None,
            default_set_by_user: false,
            last_updated: Utc::now(),
            starred_by: BTreeSet::new(),
            kind: EntryKind::Workflow(details),
        }
    }

    /// Sets the git URL.
    #[must_use]
    pub fn with_git_url(mut self, git_url: impl Into<String>) -> Self {
        self.git_url = Some(git_url.into());
        self
    }

    /// "Tool" or "Workflow", used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self.kind {
            EntryKind::Tool(_) => "Tool",
            EntryKind::Workflow(_) => "Workflow",
        }
    }

    /// Returns true for hosted entries.
    #[must_use]
    pub fn is_hosted(&self) -> bool {
        self.mode == EntryMode::Hosted
    }

    /// Tool details, if this entry is a tool.
    #[must_use]
    pub const fn as_tool(&self) -> Option<&ToolDetails> {
        match &self.kind {
            EntryKind::Tool(details) => Some(details),
            EntryKind::Workflow(_) => None,
        }
    }

    /// Mutable tool details, if this entry is a tool.
    pub fn tool_mut(&mut self) -> Option<&mut ToolDetails> {
        match &mut self.kind {
            EntryKind::Tool(details) => Some(details),
            EntryKind::Workflow(_) => None,
        }
    }

    /// Workflow details, if this entry is a workflow.
    #[must_use]
    pub const fn as_workflow(&self) -> Option<&WorkflowDetails> {
        match &self.kind {
            EntryKind::Workflow(details) => Some(details),
            EntryKind::Tool(_) => None,
        }
    }

    /// Mutable workflow details, if this entry is a workflow.
    pub fn workflow_mut(&mut self) -> Option<&mut WorkflowDetails> {
        match &mut self.kind {
            EntryKind::Workflow(details) => Some(details),
            EntryKind::Tool(_) => None,
        }
    }

    /// Whether the entry's upstream repository is private. Workflows are
    /// never private at the registry level.
    #[must_use]
    pub fn private_access(&self) -> bool {
        self.as_tool().is_some_and(|t| t.private_access)
    }

    /// Best available contact email: the maintainer email, else the author
    /// email discovered in descriptor metadata.
    #[must_use]
    pub fn effective_email(&self) -> Option<&str> {
        self.as_tool().and_then(|t| {
            t.tool_maintainer_email
                .as_deref()
                .filter(|e| !e.is_empty())
                .or_else(|| t.author_email.as_deref().filter(|e| !e.is_empty()))
        })
    }

    /// Descriptor languages this entry carries versions for.
    #[must_use]
    pub fn descriptor_types(&self) -> Vec<DescriptorType> {
        match &self.kind {
            EntryKind::Tool(_) => vec![DescriptorType::Cwl, DescriptorType::Wdl],
            EntryKind::Workflow(details) => vec![details.descriptor_type],
        }
    }

    /// Entry-level default descriptor path for the given language.
    #[must_use]
    pub fn default_descriptor_path(&self, descriptor: DescriptorType) -> Option<&str> {
        match &self.kind {
            EntryKind::Tool(details) => match descriptor {
                DescriptorType::Cwl => Some(details.default_cwl_path.as_str()),
                DescriptorType::Wdl => Some(details.default_wdl_path.as_str()),
                DescriptorType::Nextflow => None,
            },
            EntryKind::Workflow(details) => (details.descriptor_type == descriptor)
                .then_some(details.default_workflow_path.as_str()),
        }
    }

    /// Entry-level default test parameter path for the given language.
    #[must_use]
    pub fn default_test_parameter_path(&self, descriptor: DescriptorType) -> Option<&str> {
        match &self.kind {
            EntryKind::Tool(details) => match descriptor {
                DescriptorType::Cwl => details.default_cwl_test_path.as_deref(),
                DescriptorType::Wdl => details.default_wdl_test_path.as_deref(),
                DescriptorType::Nextflow => None,
            },
            EntryKind::Workflow(details) => (details.descriptor_type == descriptor)
                .then_some(details.default_test_parameter_path.as_deref())
                .flatten(),
        }
    }
}

fn check_email(field: &str, email: &str, errors: &mut ValidationErrors) {
    if !email.is_empty() && !email.contains('@') {
        errors.add(ValidationError::format(
            field,
            "must be a well-formed email address",
        ));
    }
}

impl Validate for Entry {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.path.organization.is_empty() {
            errors.add(ValidationError::empty("path.organization"));
        }
        if self.path.repository.is_empty() {
            errors.add(ValidationError::empty("path.repository"));
        }
        if let Some(name) = &self.path.entry_name {
            if name.is_empty() {
                errors.add(ValidationError::empty("path.entry_name"));
            }
        }

        if let Some(tool) = self.as_tool() {
            if let Some(email) = &tool.tool_maintainer_email {
                check_email("tool_maintainer_email", email, &mut errors);
            }
            if tool.private_access && self.is_published && self.effective_email().is_none() {
                errors.add(ValidationError::constraint(
                    "tool_maintainer_email",
                    "a published, private tool must have a contact email",
                ));
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tool() -> Entry {
        Entry::tool(
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
        )
    }

    #[test]
    fn test_type_name() {
        assert_eq!(sample_tool().type_name(), "Tool");
    }

    #[test]
    fn test_effective_email_prefers_maintainer() {
        let mut entry = sample_tool();
        assert_eq!(entry.effective_email(), None);

        entry.tool_mut().unwrap().author_email = Some("author@example.com".to_string());
        assert_eq!(entry.effective_email(), Some("author@example.com"));

        entry.tool_mut().unwrap().tool_maintainer_email =
            Some("maintainer@example.com".to_string());
        assert_eq!(entry.effective_email(), Some("maintainer@example.com"));
    }

    #[test]
    fn test_effective_email_ignores_empty_strings() {
        let mut entry = sample_tool();
        entry.tool_mut().unwrap().tool_maintainer_email = Some(String::new());
        assert_eq!(entry.effective_email(), None);
    }

    #[test]
    fn test_validate_published_private_tool_needs_email() {
        let mut entry = sample_tool();
        entry.tool_mut().unwrap().private_access = true;
        entry.is_published = true;
        assert!(!entry.is_valid());

        entry.tool_mut().unwrap().author_email = Some("author@example.com".to_string());
        assert!(entry.is_valid());
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        let mut entry = sample_tool();
        entry.tool_mut().unwrap().tool_maintainer_email = Some("not-an-email".to_string());
        assert!(!entry.is_valid());
    }

    #[test]
    fn test_validate_rejects_empty_path_parts() {
        let mut entry = sample_tool();
        entry.path.repository = String::new();
        assert!(!entry.is_valid());
    }

    #[test]
    fn test_default_descriptor_path() {
        let entry = sample_tool();
        assert_eq!(
            entry.default_descriptor_path(DescriptorType::Cwl),
            Some("/tool.cwl")
        );
        assert_eq!(
            entry.default_descriptor_path(DescriptorType::Nextflow),
            None
        );
    }
}
