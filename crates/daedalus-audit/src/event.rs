//! Audit event definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::{Timestamp, Uuid};

/// Generates a new v7 UUID for audit events.
fn new_event_id() -> Uuid {
    let ts = Timestamp::now(uuid::NoContext);
    Uuid::new_v7(ts)
}

/// Severity level for audit events.
///
/// Ordered: `Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    /// Informational event
    #[default]
    Info,
    /// Warning event
    Warning,
    /// Error event
    Error,
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded
    Success,
    /// Operation failed
    Failure,
    /// Operation was rejected by a domain rule
    Denied,
}

/// Base trait for all audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type identifier.
    fn event_type(&self) -> &'static str;

    /// Returns the event severity.
    fn severity(&self) -> EventSeverity;

    /// Returns the event timestamp.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Returns the correlation ID for request tracing.
    fn correlation_id(&self) -> Option<&str>;
}

/// Types of entry lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryEventType {
    /// Entry was registered
    RegisterEntry,
    /// Entry was published
    PublishEntry,
    /// Entry was unpublished
    UnpublishEntry,
    /// Entry was refreshed against its upstream
    RefreshEntry,
    /// A version was added to the entry
    AddVersionToEntry,
    /// A version of the entry was modified
    ModifyVersionOfEntry,
    /// A version was deleted from the entry
    DeleteVersionOfEntry,
    /// Entry was starred by a user
    StarEntry,
    /// Entry was unstarred by a user
    UnstarEntry,
}

/// An append-only record of a state-changing entry operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Type of entry event
    pub event_type: EntryEventType,

    /// Canonical path of the entry
    pub entry_path: String,

    /// Version the event concerns, if any
    pub version: Option<String>,

    /// User who triggered the event
    pub initiator: String,

    /// Event outcome
    pub outcome: EventOutcome,

    /// Additional details
    pub details: Option<String>,

    /// Correlation ID for tracing
    pub correlation_id: Option<String>,
}

impl EntryEvent {
    fn new(event_type: EntryEventType, entry_path: &str, initiator: &str) -> Self {
        Self {
            id: new_event_id(),
            timestamp: Utc::now(),
            event_type,
            entry_path: entry_path.to_string(),
            version: None,
            initiator: initiator.to_string(),
            outcome: EventOutcome::Success,
            details: None,
            correlation_id: None,
        }
    }

    /// Creates an entry registered event.
    #[must_use]
    pub fn registered(entry_path: &str, initiator: &str) -> Self {
        Self::new(EntryEventType::RegisterEntry, entry_path, initiator)
    }

    /// Creates an entry published event.
    #[must_use]
    pub fn published(entry_path: &str, initiator: &str) -> Self {
        Self::new(EntryEventType::PublishEntry, entry_path, initiator)
    }

    /// Creates an entry unpublished event.
    #[must_use]
    pub fn unpublished(entry_path: &str, initiator: &str) -> Self {
        Self::new(EntryEventType::UnpublishEntry, entry_path, initiator)
    }

    /// Creates an entry refreshed event.
    #[must_use]
    pub fn refreshed(entry_path: &str, initiator: &str, added: usize, deleted: usize) -> Self {
        Self::new(EntryEventType::RefreshEntry, entry_path, initiator)
            .with_details(&format!("{added} versions added, {deleted} deleted"))
    }

    /// Creates a version added event.
    #[must_use]
    pub fn version_added(entry_path: &str, initiator: &str, version: &str) -> Self {
        Self::new(EntryEventType::AddVersionToEntry, entry_path, initiator).with_version(version)
    }

    /// Creates a version modified event.
    #[must_use]
    pub fn version_modified(entry_path: &str, initiator: &str, version: &str) -> Self {
        Self::new(EntryEventType::ModifyVersionOfEntry, entry_path, initiator)
            .with_version(version)
    }

    /// Creates a version deleted event.
    #[must_use]
    pub fn version_deleted(entry_path: &str, initiator: &str, version: &str) -> Self {
        Self::new(EntryEventType::DeleteVersionOfEntry, entry_path, initiator)
            .with_version(version)
    }

    /// Creates a starred event.
    #[must_use]
    pub fn starred(entry_path: &str, initiator: &str) -> Self {
        Self::new(EntryEventType::StarEntry, entry_path, initiator)
    }

    /// Creates an unstarred event.
    #[must_use]
    pub fn unstarred(entry_path: &str, initiator: &str) -> Self {
        Self::new(EntryEventType::UnstarEntry, entry_path, initiator)
    }

    /// Sets the version the event concerns.
    #[must_use]
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Sets the outcome.
    #[must_use]
    pub const fn with_outcome(mut self, outcome: EventOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Sets additional details.
    #[must_use]
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// Sets the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: &str) -> Self {
        self.correlation_id = Some(id.to_string());
        self
    }
}

impl AuditEvent for EntryEvent {
    fn event_type(&self) -> &'static str {
        match self.event_type {
            EntryEventType::RegisterEntry => "entry.registered",
            EntryEventType::PublishEntry => "entry.published",
            EntryEventType::UnpublishEntry => "entry.unpublished",
            EntryEventType::RefreshEntry => "entry.refreshed",
            EntryEventType::AddVersionToEntry => "entry.version_added",
            EntryEventType::ModifyVersionOfEntry => "entry.version_modified",
            EntryEventType::DeleteVersionOfEntry => "entry.version_deleted",
            EntryEventType::StarEntry => "entry.starred",
            EntryEventType::UnstarEntry => "entry.unstarred",
        }
    }

    fn severity(&self) -> EventSeverity {
        match self.outcome {
            EventOutcome::Success => EventSeverity::Info,
            EventOutcome::Failure | EventOutcome::Denied => EventSeverity::Warning,
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_event() {
        let event = EntryEvent::published("quay.io/testorg/testtool", "user@example.com");

        assert_eq!(event.event_type, EntryEventType::PublishEntry);
        assert_eq!(event.entry_path, "quay.io/testorg/testtool");
        assert_eq!(event.initiator, "user@example.com");
        assert_eq!(event.outcome, EventOutcome::Success);
        assert_eq!(AuditEvent::event_type(&event), "entry.published");
    }

    #[test]
    fn test_version_events_carry_the_version() {
        let event =
            EntryEvent::version_added("quay.io/testorg/testtool", "user@example.com", "masterTest");
        assert_eq!(event.version.as_deref(), Some("masterTest"));

        let event = EntryEvent::version_deleted(
            "quay.io/testorg/testtool",
            "user@example.com",
            "masterTest",
        );
        assert_eq!(AuditEvent::event_type(&event), "entry.version_deleted");
    }

    #[test]
    fn test_refreshed_event_details() {
        let event = EntryEvent::refreshed("github.com/testorg/wf", "user@example.com", 2, 1);
        assert_eq!(
            event.details.as_deref(),
            Some("2 versions added, 1 deleted")
        );
    }

    #[test]
    fn test_denied_outcome_is_warning() {
        let event = EntryEvent::published("quay.io/testorg/testtool", "user@example.com")
            .with_outcome(EventOutcome::Denied);
        assert_eq!(event.severity(), EventSeverity::Warning);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(EventSeverity::Info < EventSeverity::Warning);
        assert!(EventSeverity::Warning < EventSeverity::Error);
    }

    #[test]
    fn test_event_serialization() {
        let event = EntryEvent::starred("quay.io/testorg/testtool", "user@example.com")
            .with_correlation_id("req-123");
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"event_type\":\"STAR_ENTRY\""));
        assert!(json.contains("\"entry_path\":\"quay.io/testorg/testtool\""));
        assert!(json.contains("\"correlation_id\":\"req-123\""));
    }
}
