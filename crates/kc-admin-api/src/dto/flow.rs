//! Authentication flow DTOs for the Admin API.

use kc_model::{flow_types, AuthenticationFlow, FlowBinding};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_flow_provider() -> String {
    flow_types::BASIC_FLOW.to_string()
}

const fn default_top_level() -> bool {
    true
}

/// Request to create a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowRequest {
    /// Flow alias (required, unique within the realm).
    pub alias: String,
    /// Flow description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flow type.
    #[serde(default = "default_flow_provider")]
    pub provider_id: String,
    /// Whether the flow is selectable as an entry point.
    #[serde(default = "default_top_level")]
    pub top_level: bool,
}

impl CreateFlowRequest {
    /// Creates a top-level basic flow request.
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            description: None,
            provider_id: default_flow_provider(),
            top_level: true,
        }
    }

    /// Converts this request to a flow.
    #[must_use]
    pub fn into_flow(self, realm_id: Uuid) -> AuthenticationFlow {
        let mut flow = AuthenticationFlow::new(realm_id, self.alias.trim(), self.provider_id);
        flow.description = self.description;
        flow.top_level = self.top_level;
        flow
    }
}

/// Request to update a flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowRequest {
    /// New alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateFlowRequest {
    /// Applies this update to an existing flow.
    pub fn apply_to(&self, flow: &mut AuthenticationFlow) {
        if let Some(ref v) = self.alias {
            flow.alias = v.trim().to_string();
        }
        if let Some(ref v) = self.description {
            flow.description = Some(v.clone());
        }
    }
}

/// Request to copy a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFlowRequest {
    /// Alias of the copy.
    pub new_name: String,
}

/// Flow representation for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationFlowRepresentation {
    /// Unique identifier.
    pub id: Uuid,
    /// Flow alias.
    pub alias: String,
    /// Flow description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flow type.
    pub provider_id: String,
    /// Whether the flow is selectable as an entry point.
    pub top_level: bool,
    /// Whether the flow ships with the server.
    pub built_in: bool,
}

impl From<AuthenticationFlow> for AuthenticationFlowRepresentation {
    fn from(flow: AuthenticationFlow) -> Self {
        Self {
            id: flow.id,
            alias: flow.alias,
            description: flow.description,
            provider_id: flow.provider_id,
            top_level: flow.top_level,
            built_in: flow.built_in,
        }
    }
}

/// Request to bind (or unbind) a realm flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowBindingRequest {
    /// Purpose to bind.
    pub binding: FlowBinding,
    /// Flow to bind; `None` clears the binding.
    pub flow_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let request: CreateFlowRequest = serde_json::from_str(r#"{"alias":" my-browser "}"#).unwrap();
        assert_eq!(request.provider_id, flow_types::BASIC_FLOW);
        assert!(request.top_level);

        let flow = request.into_flow(Uuid::now_v7());
        assert_eq!(flow.alias, "my-browser");
        assert!(!flow.built_in);
    }

    #[test]
    fn update_applies_only_given_fields() {
        let mut flow = AuthenticationFlow::new(Uuid::now_v7(), "browser", flow_types::BASIC_FLOW)
            .with_description("old");
        UpdateFlowRequest {
            alias: None,
            description: Some("new".to_string()),
        }
        .apply_to(&mut flow);

        assert_eq!(flow.alias, "browser");
        assert_eq!(flow.description.as_deref(), Some("new"));
    }

    #[test]
    fn representation_is_camel_case() {
        let flow = AuthenticationFlow::new(Uuid::now_v7(), "browser", flow_types::BASIC_FLOW).as_built_in();
        let json = serde_json::to_value(AuthenticationFlowRepresentation::from(flow)).unwrap();
        assert_eq!(json["providerId"], "basic-flow");
        assert_eq!(json["builtIn"], true);
        assert_eq!(json["topLevel"], true);
    }

    #[test]
    fn binding_request_parses() {
        let request: FlowBindingRequest =
            serde_json::from_str(r#"{"binding":"browserFlow","flowId":null}"#).unwrap();
        assert_eq!(request.binding, FlowBinding::BrowserFlow);
        assert!(request.flow_id.is_none());
    }
}
