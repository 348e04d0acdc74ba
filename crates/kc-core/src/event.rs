//! Audit event model.
//!
//! Structured events for authentication attempts and for administrative
//! changes to flow definitions.
//!
//! Every event carries a v7 id, a UTC timestamp, its type and outcome.
//! Realm, user and attempt are set when known; the affected resources
//! travel as key-value details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Authentication events
    /// Flow evaluation reached a success verdict.
    Login,
    /// Flow evaluation reached a failure verdict or a configuration error.
    LoginError,
    /// Flow evaluation suspended on a challenge.
    LoginChallenge,

    // Flow events
    /// Flow created.
    FlowCreated,
    /// Flow updated.
    FlowUpdated,
    /// Flow deleted.
    FlowDeleted,
    /// Flow copied under a new alias.
    FlowCopied,
    /// Flow bound to a realm purpose.
    FlowBound,

    // Execution events
    /// Execution added to a flow.
    ExecutionCreated,
    /// Execution requirement or priority changed.
    ExecutionUpdated,
    /// Execution removed.
    ExecutionDeleted,

    // Authenticator config events
    /// Authenticator config created and bound.
    AuthenticatorConfigCreated,
    /// Authenticator config updated.
    AuthenticatorConfigUpdated,
    /// Authenticator config deleted.
    AuthenticatorConfigDeleted,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event (ISO 8601).
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Realm ID where the event occurred.
    pub realm_id: Option<Uuid>,

    /// User ID associated with the event.
    pub user_id: Option<Uuid>,

    /// Authentication attempt the event belongs to.
    pub attempt_id: Option<Uuid>,

    /// Error message (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Looks up a detail value by key.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    realm_id: Option<Uuid>,
    user_id: Option<Uuid>,
    attempt_id: Option<Uuid>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            realm_id: None,
            user_id: None,
            attempt_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the realm ID.
    #[must_use]
    pub const fn realm(mut self, realm_id: Uuid) -> Self {
        self.realm_id = Some(realm_id);
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub const fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Ties the event to an authentication attempt.
    #[must_use]
    pub const fn attempt(mut self, attempt_id: Uuid) -> Self {
        self.attempt_id = Some(attempt_id);
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            realm_id: self.realm_id,
            user_id: self.user_id,
            attempt_id: self.attempt_id,
            error: self.error,
            details: self.details,
        }
    }
}
