//! # Daedalus Reconciler
//!
//! The entry refresh and version reconciliation engine of the Daedalus
//! registry.
//!
//! [`EntryService`] is the operation surface: refresh, publish,
//! registration, version updates, hosted editing, test parameter files
//! and stars. It is constructed from capabilities (an [`EntryStore`]
//! for persistence, source-control and container-registry clients from
//! `daedalus-remote`, an audit logger from `daedalus-audit`), so the
//! engine stays independent of any concrete provider or storage.
//!
//! The diffing itself lives in [`VersionReconciler`]: remote references
//! become versions, orphaned versions are deleted, user-overridden
//! (dirty) versions keep their descriptor paths, validity is recomputed
//! from descriptor parses, and an unset default version is filled by
//! [`DefaultVersionPolicy`].
//!
//! Every operation is atomic over the stored aggregate: the store hands
//! out a copy and replaces it on save, and failures never save. Refreshes
//! of one entry are serialized by a per-entry lock; distinct entries
//! refresh concurrently.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod guard;
mod publish;
mod reconciler;
mod service;
mod store;

pub use error::{Error, Result};
pub use guard::{apply_update, set_default_version, set_private_access};
pub use publish::{apply_publish, can_publish};
pub use reconciler::{
    DefaultVersionPolicy, ReconcileSummary, RemoteFile, RemoteSnapshot, RemoteVersion,
    VersionReconciler,
};
pub use service::{
    EntryService, EntryUpdate, HostedFile, ToolRegistration, WorkflowRegistration, HOSTED_HOST,
};
pub use store::{EntryStore, InMemoryEntryStore};
