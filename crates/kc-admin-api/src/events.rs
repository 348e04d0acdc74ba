//! Admin event logging for the flow management API.
//!
//! Provides structured audit logging for administrative operations.
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - AU-2: Event Logging
//! - AU-3: Content of Audit Records
//! - AU-12: Audit Generation

use std::future::Future;

use kc_core::event::{Event, EventBuilder, EventType};
use parking_lot::RwLock;
use uuid::Uuid;

// ============================================================================
// Event Logger Trait
// ============================================================================

/// Trait for logging admin events.
///
/// Implementations can write to various destinations:
/// - Database (for queryable event store)
/// - Log file (for syslog/SIEM integration)
/// - Message queue (for real-time processing)
pub trait AdminEventLogger: Send + Sync {
    /// Logs an admin event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be logged.
    fn log(&self, event: Event) -> impl Future<Output = Result<(), EventLogError>> + Send;
}

/// Errors that can occur during event logging.
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// In-Memory Logger (for testing)
// ============================================================================

/// In-memory event logger for testing.
#[derive(Debug, Default)]
pub struct InMemoryEventLogger {
    events: RwLock<Vec<Event>>,
}

impl InMemoryEventLogger {
    /// Creates a new in-memory logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all logged events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Returns the types of all logged events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        self.events.read().iter().map(|e| e.event_type).collect()
    }

    /// Clears all logged events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl AdminEventLogger for InMemoryEventLogger {
    async fn log(&self, event: Event) -> Result<(), EventLogError> {
        self.events.write().push(event);
        Ok(())
    }
}

// ============================================================================
// Tracing Logger
// ============================================================================

/// Event logger that writes to the tracing framework.
///
/// Events are logged as structured fields at the INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventLogger;

impl TracingEventLogger {
    /// Creates a new tracing logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AdminEventLogger for TracingEventLogger {
    async fn log(&self, event: Event) -> Result<(), EventLogError> {
        let details = serde_json::to_string(&event.details)
            .map_err(|e| EventLogError::Serialization(e.to_string()))?;
        tracing::info!(
            event_id = %event.id,
            event_type = ?event.event_type,
            outcome = ?event.outcome,
            realm_id = ?event.realm_id,
            error = ?event.error,
            details = %details,
            "admin_event"
        );
        Ok(())
    }
}

// ============================================================================
// Admin Event Builder Helpers
// ============================================================================

/// Helper to build admin events with common context.
pub struct AdminEventBuilder {
    builder: EventBuilder,
}

impl AdminEventBuilder {
    /// Creates a new admin event builder.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            builder: Event::builder(event_type),
        }
    }

    /// Sets the realm context.
    #[must_use]
    pub fn realm(mut self, realm_id: Uuid) -> Self {
        self.builder = self.builder.realm(realm_id);
        self
    }

    /// Sets the target resource type.
    #[must_use]
    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.builder = self.builder.detail("resource_type", resource_type);
        self
    }

    /// Sets the target resource ID.
    #[must_use]
    pub fn resource_id(mut self, id: Uuid) -> Self {
        self.builder = self.builder.detail("resource_id", id.to_string());
        self
    }

    /// Sets the target resource name.
    #[must_use]
    pub fn resource_name(mut self, name: impl Into<String>) -> Self {
        self.builder = self.builder.detail("resource_name", name.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.detail(key, value);
        self
    }

    /// Marks the event as successful.
    #[must_use]
    pub fn success(mut self) -> Self {
        self.builder = self.builder.success();
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        self.builder.build()
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

/// Starts a flow event.
#[must_use]
pub fn flow_event(event_type: EventType, realm_id: Uuid, flow_id: Uuid, alias: &str) -> AdminEventBuilder {
    AdminEventBuilder::new(event_type)
        .realm(realm_id)
        .resource_type("authentication-flow")
        .resource_id(flow_id)
        .resource_name(alias)
}

/// Starts an execution event.
#[must_use]
pub fn execution_event(
    event_type: EventType,
    realm_id: Uuid,
    execution_id: Uuid,
    parent_flow: Uuid,
) -> AdminEventBuilder {
    AdminEventBuilder::new(event_type)
        .realm(realm_id)
        .resource_type("authentication-execution")
        .resource_id(execution_id)
        .detail("parent_flow", parent_flow.to_string())
}

/// Starts an authenticator config event.
#[must_use]
pub fn config_event(event_type: EventType, realm_id: Uuid, config_id: Uuid, alias: &str) -> AdminEventBuilder {
    AdminEventBuilder::new(event_type)
        .realm(realm_id)
        .resource_type("authenticator-config")
        .resource_id(config_id)
        .resource_name(alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_logger_stores_events() {
        let logger = InMemoryEventLogger::new();
        let event = Event::builder(EventType::FlowCreated).success().build();

        logger.log(event.clone()).await.unwrap();

        let events = logger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::FlowCreated);

        logger.clear();
        assert!(logger.event_types().is_empty());
    }

    #[tokio::test]
    async fn tracing_logger_accepts_events() {
        let event = config_event(EventType::AuthenticatorConfigDeleted, Uuid::now_v7(), Uuid::now_v7(), "foo")
            .success()
            .build();
        TracingEventLogger::new().log(event).await.unwrap();
    }

    #[test]
    fn resource_helpers_fill_details() {
        let flow_id = Uuid::now_v7();
        let event = flow_event(EventType::FlowCreated, Uuid::now_v7(), flow_id, "browser")
            .success()
            .build();

        assert_eq!(event.event_type, EventType::FlowCreated);
        assert_eq!(event.detail("resource_type"), Some("authentication-flow"));
        assert_eq!(event.detail("resource_id"), Some(flow_id.to_string().as_str()));
        assert_eq!(event.detail("resource_name"), Some("browser"));
    }
}
