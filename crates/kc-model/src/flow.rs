//! Authentication flow domain model.
//!
//! A flow is a named policy tree. The flow itself holds no child list:
//! its executions point back at it through `parent_flow` and are looked
//! up by flow ID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known flow provider (flow type) identifiers.
pub mod flow_types {
    /// Generic flow of authenticators.
    pub const BASIC_FLOW: &str = "basic-flow";
    /// Flow rendered as a single form (registration and similar).
    pub const FORM_FLOW: &str = "form-flow";
    /// Flow for authenticating clients rather than users.
    pub const CLIENT_FLOW: &str = "client-flow";
}

/// An authentication flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationFlow {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this flow belongs to.
    pub realm_id: Uuid,
    /// Human label, unique within the realm.
    pub alias: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Flow type (see [`flow_types`]).
    pub provider_id: String,
    /// Whether the flow can be selected as an entry point.
    ///
    /// Non top-level flows are only reachable as sub-flows.
    pub top_level: bool,
    /// Whether the flow ships with the server and is not user-editable.
    pub built_in: bool,
}

impl AuthenticationFlow {
    /// Creates a new top-level, user-editable flow.
    #[must_use]
    pub fn new(realm_id: Uuid, alias: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            alias: alias.into(),
            description: None,
            provider_id: provider_id.into(),
            top_level: true,
            built_in: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the flow as reachable only as a sub-flow.
    #[must_use]
    pub const fn as_sub_flow(mut self) -> Self {
        self.top_level = false;
        self
    }

    /// Marks the flow as built-in.
    #[must_use]
    pub const fn as_built_in(mut self) -> Self {
        self.built_in = true;
        self
    }

    /// Checks if this is a form flow.
    #[must_use]
    pub fn is_form_flow(&self) -> bool {
        self.provider_id == flow_types::FORM_FLOW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_flow_is_top_level_and_editable() {
        let realm_id = Uuid::now_v7();
        let flow = AuthenticationFlow::new(realm_id, "browser", flow_types::BASIC_FLOW);

        assert_eq!(flow.alias, "browser");
        assert_eq!(flow.realm_id, realm_id);
        assert!(flow.top_level);
        assert!(!flow.built_in);
        assert!(!flow.is_form_flow());
    }

    #[test]
    fn builder_pattern_works() {
        let flow = AuthenticationFlow::new(Uuid::now_v7(), "registration form", flow_types::FORM_FLOW)
            .with_description("registration form")
            .as_sub_flow()
            .as_built_in();

        assert_eq!(flow.description.as_deref(), Some("registration form"));
        assert!(!flow.top_level);
        assert!(flow.built_in);
        assert!(flow.is_form_flow());
    }
}
