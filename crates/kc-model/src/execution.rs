//! Authentication execution domain model.
//!
//! An execution is one node in a flow's child list: either a leaf
//! authenticator or a nested flow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-execution policy controlling how its outcome affects the parent flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Requirement {
    /// Must succeed for the flow to succeed.
    Required,
    /// Runs when possible; never fails the flow.
    Optional,
    /// One alternative in the group must succeed.
    Alternative,
    /// Not evaluated.
    #[default]
    Disabled,
}

impl Requirement {
    /// All requirement values, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Required,
        Self::Optional,
        Self::Alternative,
        Self::Disabled,
    ];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "REQUIRED",
            Self::Optional => "OPTIONAL",
            Self::Alternative => "ALTERNATIVE",
            Self::Disabled => "DISABLED",
        }
    }

    /// Checks for `REQUIRED`.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// Checks for `OPTIONAL`.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional)
    }

    /// Checks for `ALTERNATIVE`.
    #[must_use]
    pub const fn is_alternative(&self) -> bool {
        matches!(self, Self::Alternative)
    }

    /// Checks for `DISABLED`.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Anything but `DISABLED`.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.is_disabled()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown requirement string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequirementError(pub String);

impl fmt::Display for ParseRequirementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown requirement: {}", self.0)
    }
}

impl std::error::Error for ParseRequirementError {}

impl FromStr for Requirement {
    type Err = ParseRequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseRequirementError(s.to_string()))
    }
}

/// What an execution points at, resolved from its stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTarget<'a> {
    /// A leaf authenticator, by provider ID.
    Authenticator(&'a str),
    /// A nested flow, by flow ID.
    Flow(Uuid),
}

/// An authentication execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationExecution {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this execution belongs to.
    pub realm_id: Uuid,
    /// Owning flow.
    pub parent_flow: Uuid,
    /// Sibling order; lower runs first.
    pub priority: i32,
    /// Requirement policy.
    pub requirement: Requirement,
    /// Authenticator provider ID (ignored when `authenticator_flow` is set).
    pub authenticator: Option<String>,
    /// Whether this node is itself a nested flow.
    pub authenticator_flow: bool,
    /// Nested flow ID (meaningful only when `authenticator_flow` is set).
    pub flow_id: Option<Uuid>,
    /// Bound authenticator config ID.
    pub authenticator_config: Option<Uuid>,
}

impl AuthenticationExecution {
    /// Creates a leaf execution for an authenticator provider.
    #[must_use]
    pub fn new_authenticator(
        realm_id: Uuid,
        parent_flow: Uuid,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            parent_flow,
            priority: 0,
            requirement: Requirement::Disabled,
            authenticator: Some(provider_id.into()),
            authenticator_flow: false,
            flow_id: None,
            authenticator_config: None,
        }
    }

    /// Creates an execution that nests another flow.
    #[must_use]
    pub fn new_sub_flow(realm_id: Uuid, parent_flow: Uuid, flow_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            parent_flow,
            priority: 0,
            requirement: Requirement::Disabled,
            authenticator: None,
            authenticator_flow: true,
            flow_id: Some(flow_id),
            authenticator_config: None,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the requirement.
    #[must_use]
    pub const fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Binds an authenticator config.
    #[must_use]
    pub const fn with_config(mut self, config_id: Uuid) -> Self {
        self.authenticator_config = Some(config_id);
        self
    }

    /// Resolves what this execution points at.
    ///
    /// Returns `None` when the field selected by `authenticator_flow` is empty.
    #[must_use]
    pub fn target(&self) -> Option<ExecutionTarget<'_>> {
        if self.authenticator_flow {
            self.flow_id.map(ExecutionTarget::Flow)
        } else {
            self.authenticator
                .as_deref()
                .filter(|provider| !provider.is_empty())
                .map(ExecutionTarget::Authenticator)
        }
    }

    /// Checks if this execution nests `flow_id`.
    #[must_use]
    pub fn references_flow(&self, flow_id: Uuid) -> bool {
        self.authenticator_flow && self.flow_id == Some(flow_id)
    }

    /// Checks for `REQUIRED`.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.requirement.is_required()
    }

    /// Checks for `OPTIONAL`.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.requirement.is_optional()
    }

    /// Checks for `ALTERNATIVE`.
    #[must_use]
    pub const fn is_alternative(&self) -> bool {
        self.requirement.is_alternative()
    }

    /// Checks for `DISABLED`.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.requirement.is_disabled()
    }

    /// Anything but `DISABLED`.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.requirement.is_enabled()
    }
}

/// Orders sibling executions by ascending priority.
///
/// The sort is stable: executions with equal priority keep the order they
/// are given in, so callers pass them in creation order.
pub fn sort_by_priority(executions: &mut [AuthenticationExecution]) {
    executions.sort_by_key(|e| e.priority);
}

/// Priority for an execution appended after `siblings`.
#[must_use]
pub fn next_priority(siblings: &[AuthenticationExecution]) -> i32 {
    siblings
        .iter()
        .map(|e| e.priority)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}
