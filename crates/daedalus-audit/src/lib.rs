//! # Daedalus Audit
//!
//! Append-only audit events for the Daedalus registry.
//!
//! Every state-changing entry operation (register, publish, refresh,
//! version add/modify/delete, star) produces an [`EntryEvent`] that the
//! [`AuditLogger`] dispatches to its configured backends. Audit failures
//! never fail the operation that produced the event.
//!
//! ## Example
//!
//! ```rust
//! use daedalus_audit::{AuditLogger, EntryEvent, TracingBackend};
//! use std::sync::Arc;
//!
//! let logger = AuditLogger::new().with_backend(Arc::new(TracingBackend::new()));
//!
//! let event = EntryEvent::published("quay.io/testorg/testtool", "user@example.com");
//! logger.record(&event).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod event;
pub mod logger;

pub use event::{AuditEvent, EntryEvent, EntryEventType, EventOutcome, EventSeverity};
pub use logger::{AuditLogger, InMemoryBackend, LoggerBackend, LoggerError, TracingBackend};
