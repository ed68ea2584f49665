//! Audit logger with pluggable backends.

use crate::event::{AuditEvent, EventSeverity};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Errors that can occur during audit logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Serialization error
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Destination for serialized audit events.
pub trait LoggerBackend: Send + Sync + Debug {
    /// Writes one serialized event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be written.
    fn write(&self, event_json: &str) -> Result<(), LoggerError>;

    /// Returns the backend name for identification.
    fn name(&self) -> &'static str;
}

/// Dispatches audit events to configured backends.
///
/// Backend failures are logged and swallowed: an audit sink outage must
/// not fail the domain operation that produced the event.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger {
    backends: Vec<Arc<dyn LoggerBackend>>,
    min_severity: EventSeverity,
}

impl AuditLogger {
    /// Creates a logger with no backends. Events are dropped until a
    /// backend is added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn LoggerBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Drops events below the given severity.
    #[must_use]
    pub const fn with_min_severity(mut self, min_severity: EventSeverity) -> Self {
        self.min_severity = min_severity;
        self
    }

    /// Returns the number of configured backends.
    #[must_use]
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Records an audit event to all configured backends.
    ///
    /// # Errors
    ///
    /// Returns an error only if the event cannot be serialized; backend
    /// write failures are logged and do not propagate.
    pub fn record<E: AuditEvent>(&self, event: &E) -> Result<(), LoggerError> {
        if event.severity() < self.min_severity {
            return Ok(());
        }

        let json = serde_json::to_string(event)?;

        for backend in &self.backends {
            if let Err(e) = backend.write(&json) {
                error!(backend = backend.name(), error = %e, "Failed to write audit event");
            }
        }

        Ok(())
    }
}

/// Backend that emits events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingBackend;

impl TracingBackend {
    /// Creates a new tracing backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LoggerBackend for TracingBackend {
    fn write(&self, event_json: &str) -> Result<(), LoggerError> {
        // Failures and denials log at warn so they stand out in service logs
        let value: serde_json::Value = serde_json::from_str(event_json)?;
        match value.get("outcome").and_then(|v| v.as_str()) {
            Some("failure" | "denied") => warn!(audit_event = %event_json, "Audit event"),
            _ => info!(audit_event = %event_json, "Audit event"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// In-memory backend for testing.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    events: std::sync::Mutex<Vec<String>>,
}

impl InMemoryBackend {
    /// Creates a new in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or_default()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LoggerBackend for InMemoryBackend {
    fn write(&self, event_json: &str) -> Result<(), LoggerError> {
        self.events
            .lock()
            .map_err(|_| LoggerError::Backend("event buffer poisoned".to_string()))?
            .push(event_json.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
