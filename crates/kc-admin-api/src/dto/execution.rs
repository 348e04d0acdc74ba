//! Authentication execution DTOs for the Admin API.

use kc_model::{AuthenticationExecution, Requirement};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to add an authenticator execution to a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExecutionRequest {
    /// Authenticator provider ID.
    pub provider: String,
    /// Initial requirement; the configured default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
}

impl NewExecutionRequest {
    /// Creates a request with the default requirement.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            requirement: None,
        }
    }

    /// Sets the initial requirement.
    #[must_use]
    pub const fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = Some(requirement);
        self
    }
}

/// Request to add a new sub-flow to a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExecutionFlowRequest {
    /// Alias of the new sub-flow.
    pub alias: String,
    /// Sub-flow description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flow type; `basic-flow` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Initial requirement; the configured default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
}

/// Request to change an execution's requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExecutionRequest {
    /// New requirement.
    pub requirement: Requirement,
}

/// Raw execution representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExecutionRepresentation {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning flow.
    pub parent_flow: Uuid,
    /// Sibling order.
    pub priority: i32,
    /// Requirement.
    pub requirement: Requirement,
    /// Authenticator provider ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator: Option<String>,
    /// Whether this execution nests a flow.
    pub authenticator_flow: bool,
    /// Nested flow ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<Uuid>,
    /// Bound config ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_config: Option<Uuid>,
}

impl From<AuthenticationExecution> for AuthenticationExecutionRepresentation {
    fn from(execution: AuthenticationExecution) -> Self {
        Self {
            id: execution.id,
            parent_flow: execution.parent_flow,
            priority: execution.priority,
            requirement: execution.requirement,
            authenticator: execution.authenticator,
            authenticator_flow: execution.authenticator_flow,
            flow_id: execution.flow_id,
            authenticator_config: execution.authenticator_config,
        }
    }
}

/// Administrator view of one execution within a flow tree.
///
/// Sub-flow children follow their parent entry with `level` one higher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExecutionInfo {
    /// Execution ID.
    pub id: Uuid,
    /// Requirement.
    pub requirement: Requirement,
    /// Provider display name, or the sub-flow alias.
    pub display_name: String,
    /// Provider help text, or the sub-flow description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Alias of the bound config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Requirements the execution may be set to.
    pub requirement_choices: Vec<Requirement>,
    /// Whether a config may be bound.
    pub configurable: bool,
    /// Whether this execution nests a flow.
    pub authentication_flow: bool,
    /// Authenticator provider ID, or the sub-flow's flow type.
    pub provider_id: String,
    /// Bound config ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_config: Option<Uuid>,
    /// Nested flow ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<Uuid>,
    /// Nesting depth below the listed flow.
    pub level: usize,
    /// Position among its siblings.
    pub index: usize,
    /// Sibling order.
    pub priority: i32,
}
