//! # Daedalus Core
//!
//! Core types and domain rules for the Daedalus tool and workflow
//! registry. This crate provides the data model shared across the
//! platform:
//!
//! - [`Entry`] - A registered tool or workflow, keyed by its
//!   registry/organization/repository path
//! - [`Version`] - One revision of an entry, bound to a source-control
//!   reference
//! - [`SourceFile`] - A content blob associated with one or more versions
//! - [`EntryGraph`] - The aggregate persistence works with
//! - [`Registry`] - The container-registry policy table
//! - [`path::split_path`] - The entry path parser
//!
//! Domain rules that need no I/O live here: registry visibility policy,
//! docker-path validation, descriptor validity checks and input
//! validation. The reconciliation engine building on these types lives in
//! `daedalus-reconciler`.
//!
//! ## Example
//!
//! ```rust
//! use daedalus_core::path::split_path;
//!
//! // Amazon ECR repository names may contain slashes; the parser
//! // resolves the entry name by position.
//! let path = split_path("public.ecr.aws/abcd1234/foo/bar", true).unwrap();
//! assert_eq!(path.repository, "foo");
//! assert_eq!(path.entry_name.as_deref(), Some("bar"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod descriptor;
pub mod entry;
pub mod error;
pub mod graph;
pub mod path;
pub mod registry;
pub mod source_file;
pub mod validation;
pub mod version;


// Re-export main types at crate root
pub use descriptor::DescriptorType;
pub use entry::{Entry, EntryId, EntryKind, EntryMode, ToolDetails, WorkflowDetails};
pub use error::{Error, Result};
pub use graph::EntryGraph;
pub use path::{split_path, EntryPath};
pub use registry::{Registry, RegistryDescriptor, RegistryVisibility};
pub use source_file::{FileType, SourceFile, SourceFileId};
pub use validation::{Validate, ValidationError, ValidationErrors};
pub use version::{ReferenceType, Version, VersionId, VersionPatch};
