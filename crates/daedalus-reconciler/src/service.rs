//! The entry service: the operation surface callers drive.
//!
//! Every operation loads an aggregate from the store, mutates the copy,
//! and saves it back only on success, so failures leave stored state
//! untouched. Refreshes of one entry are serialized through a per-entry
//! lock; different entries proceed concurrently.

use crate::error::Result;
use crate::guard;
use crate::publish;
use crate::reconciler::{
    DefaultVersionPolicy, RemoteFile, RemoteSnapshot, RemoteVersion, VersionReconciler,
};
use crate::store::EntryStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use daedalus_audit::{AuditLogger, EntryEvent};
use daedalus_core::{
    registry, DescriptorType, Entry, EntryGraph, EntryId, EntryMode, EntryPath, Error, FileType,
    Registry, ReferenceType, ToolDetails, Validate, ValidationError, ValidationErrors,
    VersionPatch, WorkflowDetails,
};
use daedalus_remote::{
    ContainerRegistryClient, GitReference, Provider, RemoteError, SourceControlClient,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Host under which hosted entries are addressed.
pub const HOSTED_HOST: &str = "daedalus.org";

/// Registration request for a manually added tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRegistration {
    /// Container registry hosting the image.
    pub registry: Registry,
    /// Organization / namespace on the registry.
    pub organization: String,
    /// Repository name; may contain slashes on Amazon ECR.
    pub repository: String,
    /// Optional entry name distinguishing entries in one repository.
    pub entry_name: Option<String>,
    /// Git URL of the backing source repository.
    pub git_url: String,
    /// Default CWL descriptor path.
    pub default_cwl_path: String,
    /// Default WDL descriptor path.
    pub default_wdl_path: String,
    /// Default Dockerfile path.
    pub default_dockerfile_path: String,
    /// Git reference backing the registered version.
    pub git_reference: String,
    /// Name of the registered version.
    pub version_name: String,
    /// Whether the image repository is private.
    pub private_access: bool,
    /// Maintainer email, required for private tools.
    pub tool_maintainer_email: Option<String>,
    /// Custom docker path, for registries that take one.
    pub custom_docker_path: Option<String>,
    /// Default CWL test parameter file path.
    pub default_cwl_test_path: Option<String>,
    /// Default WDL test parameter file path.
    pub default_wdl_test_path: Option<String>,
}

/// Registration request for a workflow mirrored from source control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRegistration {
    /// Source-control host, e.g. `github.com`.
    pub source_control: String,
    /// Organization on the source-control host.
    pub organization: String,
    /// Repository name.
    pub repository: String,
    /// Optional entry name.
    pub entry_name: Option<String>,
    /// Descriptor language of the workflow.
    pub descriptor_type: DescriptorType,
    /// Default descriptor path.
    pub default_workflow_path: String,
    /// Default test parameter file path.
    pub default_test_parameter_path: Option<String>,
}

/// Partial update of entry-level fields. `None` fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    /// New git URL.
    pub git_url: Option<String>,
    /// New default version; applied before any other change.
    pub default_version: Option<String>,
    /// New privacy flag (tools only).
    pub private_access: Option<bool>,
    /// New maintainer email (tools only).
    pub tool_maintainer_email: Option<String>,
    /// New default CWL descriptor path (tools only).
    pub default_cwl_path: Option<String>,
    /// New default WDL descriptor path (tools only).
    pub default_wdl_path: Option<String>,
    /// New default workflow descriptor path (workflows only).
    pub default_workflow_path: Option<String>,
    /// New default CWL test parameter path (tools only).
    pub default_cwl_test_path: Option<String>,
    /// New default WDL test parameter path (tools only).
    pub default_wdl_test_path: Option<String>,
}

/// A file submitted through the hosted API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedFile {
    /// Role of the file.
    pub file_type: FileType,
    /// Path of the file.
    pub path: String,
    /// File content.
    pub content: String,
}

/// The operation surface over entries: refresh, publish, registration,
/// version updates, hosted editing, test parameter files and stars.
pub struct EntryService {
    store: Arc<dyn EntryStore>,
    source_control: HashMap<Provider, Arc<dyn SourceControlClient>>,
    container_registries: HashMap<Registry, Arc<dyn ContainerRegistryClient>>,
    reconciler: VersionReconciler,
    audit: AuditLogger,
    locks: Mutex<HashMap<EntryId, Arc<Mutex<()>>>>,
}

impl EntryService {
    /// Creates a service over a store, with no upstream clients.
    #[must_use]
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            source_control: HashMap::new(),
            container_registries: HashMap::new(),
            reconciler: VersionReconciler::new(DefaultVersionPolicy::default()),
            audit: AuditLogger::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a source-control client. Its absence for a needed
    /// provider surfaces as the missing-credential error.
    #[must_use]
    pub fn with_source_control(
        mut self,
        provider: Provider,
        client: Arc<dyn SourceControlClient>,
    ) -> Self {
        self.source_control.insert(provider, client);
        self
    }

    /// Registers a container-registry client.
    #[must_use]
    pub fn with_container_registry(
        mut self,
        registry: Registry,
        client: Arc<dyn ContainerRegistryClient>,
    ) -> Self {
        self.container_registries.insert(registry, client);
        self
    }

    /// Replaces the default-version selection policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DefaultVersionPolicy) -> Self {
        self.reconciler = VersionReconciler::new(policy);
        self
    }

    /// Sets the audit logger.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    async fn entry_lock(&self, id: EntryId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    fn record(&self, event: &EntryEvent) {
        if let Err(e) = self.audit.record(event) {
            tracing::warn!(error = %e, "Failed to record audit event");
        }
    }

    /// Refreshes an entry against its upstream, reconciling versions and
    /// files. The whole refresh is atomic: on any failure the stored
    /// entry is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the missing-credential error when no client is linked for
    /// the entry's source-control provider, [`Error::HostedRefresh`] for
    /// hosted entries, and upstream errors verbatim.
    pub async fn refresh(&self, entry_id: EntryId, initiator: &str) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        if graph.entry.is_hosted() {
            return Err(Error::HostedRefresh.into());
        }

        let snapshot = self.assemble_snapshot(&graph).await?;
        let summary = self.reconciler.reconcile(&mut graph, &snapshot);
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        tracing::info!(
            entry = %graph.entry.path,
            added = summary.added.len(),
            deleted = summary.deleted.len(),
            "Refreshed entry"
        );
        self.record(&EntryEvent::refreshed(
            &graph.entry.path.canonical(),
            initiator,
            summary.added.len(),
            summary.deleted.len(),
        ));

        Ok(graph)
    }

    /// Refreshes a single version of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] when the version is unknown
    /// locally or upstream, plus everything [`Self::refresh`] can return.
    pub async fn refresh_version(
        &self,
        entry_id: EntryId,
        version_name: &str,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        if graph.entry.is_hosted() {
            return Err(Error::HostedRefresh.into());
        }
        if graph.version_by_name(version_name).is_none() {
            return Err(Error::VersionNotFound {
                version: version_name.to_string(),
            }
            .into());
        }

        let snapshot = self.assemble_snapshot(&graph).await?;
        self.reconciler
            .reconcile_version(&mut graph, &snapshot, version_name)?;
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(
            &EntryEvent::version_modified(&graph.entry.path.canonical(), initiator, version_name),
        );
        Ok(graph)
    }

    /// Publishes or unpublishes an entry.
    ///
    /// # Errors
    ///
    /// Propagates publish-eligibility errors when publishing.
    pub async fn publish(
        &self,
        entry_id: EntryId,
        desired: bool,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        let changed = publish::apply_publish(&mut graph, desired)?;
        if changed {
            graph.entry.last_updated = Utc::now();
            self.store.save(graph.clone()).await?;

            let path = graph.entry.path.canonical();
            tracing::info!(entry = %path, published = desired, "Changed publish state");
            if desired {
                self.record(&EntryEvent::published(&path, initiator));
            } else {
                self.record(&EntryEvent::unpublished(&path, initiator));
            }
        }
        Ok(graph)
    }

    /// Designates the default version of an entry.
    ///
    /// # Errors
    ///
    /// Propagates the default-version guard errors.
    pub async fn update_default_version(
        &self,
        entry_id: EntryId,
        version_name: &str,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        guard::set_default_version(&mut graph, version_name)?;
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(
            &EntryEvent::version_modified(&graph.entry.path.canonical(), initiator, version_name),
        );
        Ok(graph)
    }

    /// Applies version patches (hide/unhide, path overrides).
    ///
    /// # Errors
    ///
    /// Propagates the visibility guard errors.
    pub async fn update_versions(
        &self,
        entry_id: EntryId,
        patches: &[VersionPatch],
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        let touched = guard::apply_update(&mut graph, None, patches)?;
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        for name in touched {
            self.record(&EntryEvent::version_modified(
                &graph.entry.path.canonical(),
                initiator,
                &name,
            ));
        }
        Ok(graph)
    }

    /// Applies entry-level updates: default version first, then privacy,
    /// then the remaining fields.
    ///
    /// # Errors
    ///
    /// Propagates guard and validation errors; nothing is stored when any
    /// part fails.
    pub async fn update_entry(
        &self,
        entry_id: EntryId,
        update: &EntryUpdate,
        _initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;

        if let Some(name) = &update.default_version {
            guard::set_default_version(&mut graph, name)?;
        }
        if let Some(email) = &update.tool_maintainer_email {
            if let Some(tool) = graph.entry.tool_mut() {
                tool.tool_maintainer_email = Some(email.clone());
            }
        }
        if let Some(private_access) = update.private_access {
            guard::set_private_access(&mut graph, private_access)?;
        }
        if let Some(git_url) = &update.git_url {
            graph.entry.git_url = Some(git_url.clone());
        }
        if let Some(tool) = graph.entry.tool_mut() {
            if let Some(path) = &update.default_cwl_path {
                tool.default_cwl_path = path.clone();
            }
            if let Some(path) = &update.default_wdl_path {
                tool.default_wdl_path = path.clone();
            }
            if let Some(path) = &update.default_cwl_test_path {
                tool.default_cwl_test_path = Some(path.clone());
            }
            if let Some(path) = &update.default_wdl_test_path {
                tool.default_wdl_test_path = Some(path.clone());
            }
        }
        if let Some(workflow) = graph.entry.workflow_mut() {
            if let Some(path) = &update.default_workflow_path {
                workflow.default_workflow_path = path.clone();
            }
        }

        graph.entry.validate()?;
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;
        Ok(graph)
    }

    /// Manually registers a tool against a container-registry image.
    ///
    /// # Errors
    ///
    /// Returns registry policy errors, [`Error::DuplicatePath`] when the
    /// canonical path collides with an existing entry (in either the
    /// slash-path or entry-name spelling), and [`Error::NoTags`] when the
    /// image repository has no tags.
    pub async fn manual_register_tool(
        &self,
        registration: &ToolRegistration,
        initiator: &str,
    ) -> Result<EntryGraph> {
        registry::validate_docker_path(
            registration.registry,
            registration.custom_docker_path.as_deref(),
        )?;
        registry::check_private_access(
            registration.registry,
            registration
                .registry
                .effective_docker_path(registration.custom_docker_path.as_deref())
                .as_deref(),
            registration.private_access,
            false,
        )?;
        if registration.private_access && registration.tool_maintainer_email.is_none() {
            return Err(Error::MissingMaintainerEmail.into());
        }

        let docker_host = registration
            .registry
            .effective_docker_path(registration.custom_docker_path.as_deref())
            .and_then(|p| p.split('/').next().map(String::from))
            .ok_or(Error::InvalidRegistryPath { path: None })?;

        let mut path = EntryPath::new(
            docker_host,
            registration.organization.clone(),
            registration.repository.clone(),
        );
        if let Some(name) = &registration.entry_name {
            path = path.with_entry_name(name.clone());
        }

        let entry = Entry::tool(
            EntryId(0),
            path,
            EntryMode::ManualImagePath,
            ToolDetails {
                registry: registration.registry,
                docker_path: registration.custom_docker_path.clone(),
                private_access: registration.private_access,
                tool_maintainer_email: registration.tool_maintainer_email.clone(),
                author_email: None,
                default_cwl_path: registration.default_cwl_path.clone(),
                default_wdl_path: registration.default_wdl_path.clone(),
                default_dockerfile_path: registration.default_dockerfile_path.clone(),
                default_cwl_test_path: registration.default_cwl_test_path.clone(),
                default_wdl_test_path: registration.default_wdl_test_path.clone(),
            },
        )
        .with_git_url(registration.git_url.clone());
        entry.validate()?;

        self.ensure_unique_path(&entry).await?;

        let mut graph = EntryGraph::new(entry);
        let snapshot = self.assemble_snapshot(&graph).await?;
        if self
            .container_registries
            .contains_key(&registration.registry)
            && snapshot.versions.is_empty()
        {
            return Err(Error::NoTags {
                path: graph.entry.path.canonical(),
            }
            .into());
        }

        let fallback = RemoteSnapshot::new(vec![RemoteVersion::new(
            registration.version_name.clone(),
            registration.git_reference.clone(),
            ReferenceType::Tag,
        )]);
        let snapshot = if snapshot.versions.is_empty() {
            self.attach_files(&graph, fallback).await?
        } else {
            snapshot
        };

        self.reconciler.reconcile(&mut graph, &snapshot);
        let id = self.store.insert(graph).await?;
        let graph = self.store.load(id).await?;

        self.record(&EntryEvent::registered(
            &graph.entry.path.canonical(),
            initiator,
        ));
        Ok(graph)
    }

    /// Manually registers a workflow mirrored from source control.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePath`] on a canonical path collision and
    /// upstream errors from the initial refresh.
    pub async fn manual_register_workflow(
        &self,
        registration: &WorkflowRegistration,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let mut path = EntryPath::new(
            registration.source_control.clone(),
            registration.organization.clone(),
            registration.repository.clone(),
        );
        if let Some(name) = &registration.entry_name {
            path = path.with_entry_name(name.clone());
        }

        let git_url = format!(
            "git@{}:{}/{}.git",
            registration.source_control, registration.organization, registration.repository
        );
        let entry = Entry::workflow(
            EntryId(0),
            path,
            EntryMode::Auto,
            WorkflowDetails {
                descriptor_type: registration.descriptor_type,
                default_workflow_path: registration.default_workflow_path.clone(),
                default_test_parameter_path: registration.default_test_parameter_path.clone(),
            },
        )
        .with_git_url(git_url);
        entry.validate()?;

        self.ensure_unique_path(&entry).await?;

        let mut graph = EntryGraph::new(entry);
        let snapshot = self.assemble_snapshot(&graph).await?;
        self.reconciler.reconcile(&mut graph, &snapshot);
        let id = self.store.insert(graph).await?;
        let graph = self.store.load(id).await?;

        self.record(&EntryEvent::registered(
            &graph.entry.path.canonical(),
            initiator,
        ));
        Ok(graph)
    }

    /// Creates a hosted workflow, authored through the API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePath`] when the name is taken.
    pub async fn create_hosted_workflow(
        &self,
        organization: &str,
        name: &str,
        descriptor_type: DescriptorType,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let path = EntryPath::new(HOSTED_HOST, organization, name);
        let entry = Entry::workflow(
            EntryId(0),
            path,
            EntryMode::Hosted,
            WorkflowDetails {
                descriptor_type,
                default_workflow_path: hosted_descriptor_path(descriptor_type),
                default_test_parameter_path: None,
            },
        );
        entry.validate()?;
        self.ensure_unique_path(&entry).await?;

        let id = self.store.insert(EntryGraph::new(entry)).await?;
        let graph = self.store.load(id).await?;
        self.record(&EntryEvent::registered(
            &graph.entry.path.canonical(),
            initiator,
        ));
        Ok(graph)
    }

    /// Creates a hosted tool under a container-registry path.
    ///
    /// # Errors
    ///
    /// Returns registry path errors and [`Error::DuplicatePath`] when the
    /// canonical path collides in either spelling.
    pub async fn create_hosted_tool(
        &self,
        tool_registry: Registry,
        custom_docker_path: Option<&str>,
        organization: &str,
        repository: &str,
        entry_name: Option<&str>,
        initiator: &str,
    ) -> Result<EntryGraph> {
        registry::validate_docker_path(tool_registry, custom_docker_path)?;

        let docker_host = tool_registry
            .effective_docker_path(custom_docker_path)
            .and_then(|p| p.split('/').next().map(String::from))
            .ok_or(Error::InvalidRegistryPath { path: None })?;
        let private_access = registry::is_private_ecr_path(&docker_host)
            || tool_registry == Registry::SevenBridges;

        let mut path = EntryPath::new(docker_host, organization, repository);
        if let Some(name) = entry_name {
            path = path.with_entry_name(name);
        }

        let entry = Entry::tool(
            EntryId(0),
            path,
            EntryMode::Hosted,
            ToolDetails {
                registry: tool_registry,
                docker_path: custom_docker_path.map(String::from),
                private_access,
                tool_maintainer_email: None,
                author_email: None,
                default_cwl_path: hosted_descriptor_path(DescriptorType::Cwl),
                default_wdl_path: hosted_descriptor_path(DescriptorType::Wdl),
                default_dockerfile_path: "/Dockerfile".to_string(),
                default_cwl_test_path: None,
                default_wdl_test_path: None,
            },
        );
        entry.validate()?;
        self.ensure_unique_path(&entry).await?;

        let id = self.store.insert(EntryGraph::new(entry)).await?;
        let graph = self.store.load(id).await?;
        self.record(&EntryEvent::registered(
            &graph.entry.path.canonical(),
            initiator,
        ));
        Ok(graph)
    }

    /// Snapshots a new version of a hosted entry from the submitted
    /// files. The new version is named with the next integer and becomes
    /// the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHosted`] for mirrored entries.
    pub async fn edit_hosted(
        &self,
        entry_id: EntryId,
        files: &[HostedFile],
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        if !graph.entry.is_hosted() {
            return Err(Error::NotHosted.into());
        }

        let name = next_hosted_version_name(&graph);
        let version_id = graph.add_version(&name, &name, ReferenceType::Tag);

        for file in files {
            graph.upsert_file(version_id, file.file_type, file.path.clone(), file.content.clone());
        }

        let valid = graph.entry.descriptor_types().iter().any(|descriptor| {
            files
                .iter()
                .filter(|f| f.file_type == descriptor.file_type())
                .any(|f| descriptor.validate_content(&f.content))
        });

        let tool_paths = graph
            .entry
            .as_tool()
            .map(|t| (t.default_cwl_path.clone(), t.default_wdl_path.clone()));
        let workflow_path = graph
            .entry
            .as_workflow()
            .map(|w| w.default_workflow_path.clone());
        if let Some(version) = graph.version_mut(version_id) {
            version.valid = valid;
            if let Some((cwl_path, wdl_path)) = tool_paths {
                version.cwl_path = Some(cwl_path);
                version.wdl_path = Some(wdl_path);
            }
            if let Some(path) = workflow_path {
                version.workflow_path = Some(path);
            }
        }

        // The newest hosted version becomes the default.
        graph.entry.default_version = Some(name.clone());
        graph.entry.default_set_by_user = false;
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(&EntryEvent::version_added(
            &graph.entry.path.canonical(),
            initiator,
            &name,
        ));
        Ok(graph)
    }

    /// Deletes one version of a hosted entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHosted`] for mirrored entries and
    /// [`Error::VersionNotFound`] for an unknown version.
    pub async fn delete_hosted_version(
        &self,
        entry_id: EntryId,
        version_name: &str,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        if !graph.entry.is_hosted() {
            return Err(Error::NotHosted.into());
        }

        let id = graph
            .version_by_name(version_name)
            .map(|v| v.id)
            .ok_or_else(|| Error::VersionNotFound {
                version: version_name.to_string(),
            })?;
        graph.remove_version(id);
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(&EntryEvent::version_deleted(
            &graph.entry.path.canonical(),
            initiator,
            version_name,
        ));
        Ok(graph)
    }

    /// Manually adds a version tag to a non-hosted tool. The tag picks up
    /// the entry's default paths and is validated on the next refresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHosted`] mirrored appropriately for hosted
    /// entries and [`Error::DuplicatePath`]-style duplicates as a
    /// validation error.
    pub async fn add_version_tag(
        &self,
        entry_id: EntryId,
        name: &str,
        reference: &str,
        image_id: Option<&str>,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        if graph.entry.is_hosted() {
            return Err(Error::NotHosted.into());
        }
        if graph.version_by_name(name).is_some() {
            let mut errors = ValidationErrors::new();
            errors.add(ValidationError::constraint(
                "name",
                format!("version {name} already exists"),
            ));
            return Err(Error::from(errors).into());
        }

        let defaults: Vec<(DescriptorType, Option<String>)> = graph
            .entry
            .descriptor_types()
            .into_iter()
            .map(|d| (d, graph.entry.default_descriptor_path(d).map(String::from)))
            .collect();
        let id = graph.add_version(name, reference, ReferenceType::Tag);
        if let Some(version) = graph.version_mut(id) {
            for (descriptor, path) in defaults {
                match descriptor {
                    DescriptorType::Cwl => version.cwl_path = path,
                    DescriptorType::Wdl => version.wdl_path = path,
                    DescriptorType::Nextflow => version.workflow_path = path,
                }
            }
            if let Some(image_id) = image_id {
                version.image_id = Some(image_id.to_string());
            }
        }
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(&EntryEvent::version_added(
            &graph.entry.path.canonical(),
            initiator,
            name,
        ));
        Ok(graph)
    }

    /// Deletes a manually added version tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] for an unknown version.
    pub async fn delete_version_tag(
        &self,
        entry_id: EntryId,
        name: &str,
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        let id = graph
            .version_by_name(name)
            .map(|v| v.id)
            .ok_or_else(|| Error::VersionNotFound {
                version: name.to_string(),
            })?;
        graph.remove_version(id);
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(&EntryEvent::version_deleted(
            &graph.entry.path.canonical(),
            initiator,
            name,
        ));
        Ok(graph)
    }

    /// Attaches test parameter files to a version. Contents are fetched
    /// on the next refresh; paths that do not exist upstream are detached
    /// then.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] for an unknown version and a
    /// validation error for descriptor languages without test parameter
    /// files.
    pub async fn add_test_parameter_files(
        &self,
        entry_id: EntryId,
        version_name: &str,
        descriptor_type: DescriptorType,
        paths: &[String],
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        let file_type = test_parameter_type(descriptor_type)?;
        let version_id = graph
            .version_by_name(version_name)
            .map(|v| v.id)
            .ok_or_else(|| Error::VersionNotFound {
                version: version_name.to_string(),
            })?;

        for path in paths {
            graph.upsert_file(version_id, file_type, path.clone(), String::new());
        }
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(&EntryEvent::version_modified(
            &graph.entry.path.canonical(),
            initiator,
            version_name,
        ));
        Ok(graph)
    }

    /// Detaches test parameter files from a version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionFileNotFound`] if any named path is not
    /// attached; nothing is changed in that case.
    pub async fn delete_test_parameter_files(
        &self,
        entry_id: EntryId,
        version_name: &str,
        descriptor_type: DescriptorType,
        paths: &[String],
        initiator: &str,
    ) -> Result<EntryGraph> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        let file_type = test_parameter_type(descriptor_type)?;
        let version_id = graph
            .version_by_name(version_name)
            .map(|v| v.id)
            .ok_or_else(|| Error::VersionNotFound {
                version: version_name.to_string(),
            })?;

        // Check everything first so a bad path changes nothing.
        for path in paths {
            let absolute = absolute(path);
            let attached = graph
                .files_for_version(version_id)
                .any(|f| f.file_type == file_type && f.absolute_path == absolute);
            if !attached {
                return Err(Error::VersionFileNotFound {
                    path: path.clone(),
                    version: version_name.to_string(),
                }
                .into());
            }
        }
        for path in paths {
            graph.detach_file(version_id, file_type, &absolute(path));
        }
        graph.entry.last_updated = Utc::now();
        self.store.save(graph.clone()).await?;

        self.record(&EntryEvent::version_modified(
            &graph.entry.path.canonical(),
            initiator,
            version_name,
        ));
        Ok(graph)
    }

    /// Stars or unstars an entry. Returns true if the star set changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] for an unknown entry.
    pub async fn star_entry(&self, entry_id: EntryId, user: &str, star: bool) -> Result<bool> {
        let lock = self.entry_lock(entry_id).await;
        let _guard = lock.lock().await;

        let mut graph = self.store.load(entry_id).await?;
        let changed = if star {
            graph.entry.starred_by.insert(user.to_string())
        } else {
            graph.entry.starred_by.remove(user)
        };

        if changed {
            self.store.save(graph.clone()).await?;
            let path = graph.entry.path.canonical();
            if star {
                self.record(&EntryEvent::starred(&path, user));
            } else {
                self.record(&EntryEvent::unstarred(&path, user));
            }
        }
        Ok(changed)
    }

    /// Looks up an entry by its canonical path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] when nothing matches.
    pub async fn entry_by_path(&self, path: &str) -> Result<EntryGraph> {
        match self.store.find_by_path(path, false).await? {
            Some(id) => self.store.load(id).await,
            None => Err(Error::EntryNotFound.into()),
        }
    }

    /// Looks up a published entry by its canonical path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] when nothing published matches.
    pub async fn published_entry_by_path(&self, path: &str) -> Result<EntryGraph> {
        match self.store.find_by_path(path, true).await? {
            Some(id) => self.store.load(id).await,
            None => Err(Error::EntryNotFound.into()),
        }
    }

    async fn ensure_unique_path(&self, entry: &Entry) -> Result<()> {
        let canonical = entry.path.canonical();
        if self.store.find_by_path(&canonical, false).await?.is_some() {
            return Err(Error::DuplicatePath {
                kind: entry.type_name(),
                path: canonical,
            }
            .into());
        }
        Ok(())
    }

    fn source_control_client(
        &self,
        provider: Provider,
    ) -> std::result::Result<&Arc<dyn SourceControlClient>, RemoteError> {
        self.source_control
            .get(&provider)
            .ok_or(RemoteError::MissingToken)
    }

    /// Builds the upstream snapshot for an entry: version seeds from the
    /// container registry (tools) or the reference list (workflows), then
    /// file contents fetched per version.
    async fn assemble_snapshot(&self, graph: &EntryGraph) -> Result<RemoteSnapshot> {
        let (provider, repository) = git_target(&graph.entry)?;
        let client = self.source_control_client(provider)?;
        let references = client.list_references(&repository).await?;

        let seeds: Vec<RemoteVersion> = if let Some(tool) = graph.entry.as_tool() {
            if let Some(registry_client) = self.container_registries.get(&tool.registry) {
                let tags = registry_client
                    .list_tags(&graph.entry.path.organization, &graph.entry.path.repository)
                    .await?;
                tags.into_iter()
                    .map(|tag| {
                        let (reference, reference_type) = match_reference(&references, &tag.name);
                        let mut version = RemoteVersion::new(tag.name, reference, reference_type);
                        version.image_id = tag.image_id;
                        version.last_modified = tag.last_modified;
                        version
                    })
                    .collect()
            } else {
                // No registry listing available: keep the known versions
                // and refetch their files.
                graph
                    .versions()
                    .map(|v| {
                        let mut version =
                            RemoteVersion::new(&v.name, &v.reference, v.reference_type);
                        version.image_id = v.image_id.clone();
                        version.last_modified = v.last_modified;
                        version
                    })
                    .collect()
            }
        } else {
            references
                .iter()
                .map(|r| {
                    let mut version = RemoteVersion::new(&r.name, &r.name, r.reference_type);
                    version.commit_id = r.commit_id.clone();
                    version.last_modified = r.last_modified;
                    version
                })
                .collect()
        };

        self.attach_files(graph, RemoteSnapshot::new(seeds)).await
    }

    /// Fetches descriptor, Dockerfile and test-parameter contents for
    /// every version in the snapshot.
    async fn attach_files(
        &self,
        graph: &EntryGraph,
        mut snapshot: RemoteSnapshot,
    ) -> Result<RemoteSnapshot> {
        let (provider, repository) = git_target(&graph.entry)?;
        let client = self.source_control_client(provider)?;
        let repo = repository.as_str();

        let candidates = candidate_paths(graph);
        for version in &mut snapshot.versions {
            let fetches = candidates.iter().map(|(file_type, path)| {
                let reference = version.reference.clone();
                async move {
                    let result = client.file_content(repo, &reference, path).await;
                    (*file_type, path.clone(), result)
                }
            });

            let results = futures::future::join_all(fetches).await;
            for (file_type, path, result) in results {
                match result {
                    Ok(Some(content)) => {
                        version.files.push(RemoteFile::new(file_type, path, content));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // One unreadable file invalidates the version, not
                        // the whole refresh.
                        tracing::warn!(
                            version = %version.name,
                            path = %path,
                            error = %e,
                            "Failed to fetch file during refresh"
                        );
                    }
                }
            }
        }
        Ok(snapshot)
    }
}

/// All file paths a refresh should attempt per version: entry defaults,
/// per-version overrides, and attached test parameter files.
fn candidate_paths(graph: &EntryGraph) -> Vec<(FileType, String)> {
    let mut candidates: Vec<(FileType, String)> = Vec::new();
    let mut push = |file_type: FileType, path: String| {
        let path = absolute(&path);
        if !candidates
            .iter()
            .any(|(t, p)| *t == file_type && *p == path)
        {
            candidates.push((file_type, path));
        }
    };

    for descriptor in graph.entry.descriptor_types() {
        if let Some(path) = graph.entry.default_descriptor_path(descriptor) {
            push(descriptor.file_type(), path.to_string());
        }
        if let Some(path) = graph.entry.default_test_parameter_path(descriptor) {
            if let Some(file_type) = descriptor.test_parameter_file_type() {
                push(file_type, path.to_string());
            }
        }
    }

    if let Some(tool) = graph.entry.as_tool() {
        push(FileType::Dockerfile, tool.default_dockerfile_path.clone());
    }

    for version in graph.versions() {
        for path in [&version.cwl_path, &version.wdl_path, &version.workflow_path]
            .into_iter()
            .flatten()
        {
            for descriptor in graph.entry.descriptor_types() {
                push(descriptor.file_type(), path.clone());
            }
        }
    }

    for file in graph.files() {
        if file.file_type.is_test_parameter() {
            push(file.file_type, file.absolute_path.clone());
        }
    }

    candidates
}

fn match_reference(references: &[GitReference], name: &str) -> (String, ReferenceType) {
    references
        .iter()
        .find(|r| r.name == name)
        .map_or_else(
            || (name.to_string(), ReferenceType::Tag),
            |r| (r.name.clone(), r.reference_type),
        )
}

fn git_target(entry: &Entry) -> std::result::Result<(Provider, String), Error> {
    if entry.as_tool().is_some() {
        let git_url = entry.git_url.as_deref().ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add(ValidationError::empty("git_url"));
            Error::from(errors)
        })?;
        let (host, repository) = parse_git_url(git_url).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add(ValidationError::format(
                "git_url",
                "unrecognized git URL format",
            ));
            Error::from(errors)
        })?;
        let provider = provider_for_host(&host)?;
        Ok((provider, repository))
    } else {
        let provider = provider_for_host(&entry.path.registry)?;
        Ok((
            provider,
            format!("{}/{}", entry.path.organization, entry.path.repository),
        ))
    }
}

fn provider_for_host(host: &str) -> std::result::Result<Provider, Error> {
    match host {
        "github.com" => Ok(Provider::GitHub),
        "bitbucket.org" => Ok(Provider::Bitbucket),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.add(ValidationError::format(
                "source_control",
                format!("unsupported source control host '{host}'"),
            ));
            Err(errors.into())
        }
    }
}

/// Parses `git@host:org/repo.git` and `https://host/org/repo.git` forms
/// into `(host, org/repo)`.
fn parse_git_url(url: &str) -> Option<(String, String)> {
    if let Some(rest) = url.strip_prefix("git@") {
        let (host, path) = rest.split_once(':')?;
        return Some((host.to_string(), path.trim_end_matches(".git").to_string()));
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = rest.split_once('/')?;
    Some((host.to_string(), path.trim_end_matches(".git").to_string()))
}

fn hosted_descriptor_path(descriptor: DescriptorType) -> String {
    match descriptor {
        DescriptorType::Cwl => "/workflow.cwl".to_string(),
        DescriptorType::Wdl => "/workflow.wdl".to_string(),
        DescriptorType::Nextflow => "/nextflow.config".to_string(),
    }
}

fn next_hosted_version_name(graph: &EntryGraph) -> String {
    let next = graph
        .versions()
        .filter_map(|v| v.name.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    next.to_string()
}

fn test_parameter_type(descriptor: DescriptorType) -> std::result::Result<FileType, Error> {
    descriptor.test_parameter_file_type().ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::constraint(
            "descriptor_type",
            format!("{descriptor} has no test parameter files"),
        ));
        errors.into()
    })
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

    #[test]
    fn test_parse_git_url_scp_form() {
        let (host, repo) =
            parse_git_url("git@github.com:testorg/whalesay-tool.git").unwrap();
        assert_eq!(host, "github.com");
        assert_eq!(repo, "testorg/whalesay-tool");
    }

    #[test]
    fn test_parse_git_url_https_form() {
        let (host, repo) = parse_git_url("https://bitbucket.org/testorg/repo").unwrap();
        assert_eq!(host, "bitbucket.org");
        assert_eq!(repo, "testorg/repo");
    }

    #[test]
    fn test_parse_git_url_rejects_garbage() {
        assert!(parse_git_url("not a url").is_none());
    }

    #[test]
    fn test_provider_for_host() {
        assert_eq!(provider_for_host("github.com").unwrap(), Provider::GitHub);
        assert_eq!(
            provider_for_host("bitbucket.org").unwrap(),
            Provider::Bitbucket
        );
        assert!(provider_for_host("gitlab.example.com").is_err());
    }

    #[test]
    fn test_hosted_descriptor_paths() {
        assert_eq!(hosted_descriptor_path(DescriptorType::Cwl), "/workflow.cwl");
        assert_eq!(
            hosted_descriptor_path(DescriptorType::Nextflow),
            "/nextflow.config"
        );
    }

    #[test]
    fn test_test_parameter_type_for_nextflow_is_an_error() {
        assert!(test_parameter_type(DescriptorType::Cwl).is_ok());
        assert!(test_parameter_type(DescriptorType::Nextflow).is_err());
    }
}
