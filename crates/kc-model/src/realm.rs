//! Realm flow bindings.
//!
//! A realm designates one flow per well-known purpose (browser login,
//! registration, ...). Bound flows cannot be deleted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purposes a realm can bind a flow to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowBinding {
    /// Browser login.
    BrowserFlow,
    /// User self-registration.
    RegistrationFlow,
    /// Direct grant (resource owner password).
    DirectGrantFlow,
    /// Reset credentials.
    ResetCredentialsFlow,
    /// Client authentication.
    ClientAuthenticationFlow,
    /// Docker registry authentication.
    DockerAuthenticationFlow,
    /// First login through an identity broker.
    FirstBrokerLoginFlow,
}

impl FlowBinding {
    /// All bindings.
    pub const ALL: [Self; 7] = [
        Self::BrowserFlow,
        Self::RegistrationFlow,
        Self::DirectGrantFlow,
        Self::ResetCredentialsFlow,
        Self::ClientAuthenticationFlow,
        Self::DockerAuthenticationFlow,
        Self::FirstBrokerLoginFlow,
    ];

    /// Returns the realm attribute name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BrowserFlow => "browserFlow",
            Self::RegistrationFlow => "registrationFlow",
            Self::DirectGrantFlow => "directGrantFlow",
            Self::ResetCredentialsFlow => "resetCredentialsFlow",
            Self::ClientAuthenticationFlow => "clientAuthenticationFlow",
            Self::DockerAuthenticationFlow => "dockerAuthenticationFlow",
            Self::FirstBrokerLoginFlow => "firstBrokerLoginFlow",
        }
    }
}

impl fmt::Display for FlowBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The flows a realm has bound, by purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmFlowBindings {
    /// Browser login flow ID.
    pub browser_flow: Option<Uuid>,
    /// Registration flow ID.
    pub registration_flow: Option<Uuid>,
    /// Direct grant flow ID.
    pub direct_grant_flow: Option<Uuid>,
    /// Reset credentials flow ID.
    pub reset_credentials_flow: Option<Uuid>,
    /// Client authentication flow ID.
    pub client_authentication_flow: Option<Uuid>,
    /// Docker authentication flow ID.
    pub docker_authentication_flow: Option<Uuid>,
    /// First broker login flow ID.
    pub first_broker_login_flow: Option<Uuid>,
}

impl RealmFlowBindings {
    /// Gets the flow bound to `binding`.
    #[must_use]
    pub const fn get(&self, binding: FlowBinding) -> Option<Uuid> {
        match binding {
            FlowBinding::BrowserFlow => self.browser_flow,
            FlowBinding::RegistrationFlow => self.registration_flow,
            FlowBinding::DirectGrantFlow => self.direct_grant_flow,
            FlowBinding::ResetCredentialsFlow => self.reset_credentials_flow,
            FlowBinding::ClientAuthenticationFlow => self.client_authentication_flow,
            FlowBinding::DockerAuthenticationFlow => self.docker_authentication_flow,
            FlowBinding::FirstBrokerLoginFlow => self.first_broker_login_flow,
        }
    }

    /// Binds (or unbinds, with `None`) a flow.
    pub fn set(&mut self, binding: FlowBinding, flow_id: Option<Uuid>) {
        let slot = match binding {
            FlowBinding::BrowserFlow => &mut self.browser_flow,
            FlowBinding::RegistrationFlow => &mut self.registration_flow,
            FlowBinding::DirectGrantFlow => &mut self.direct_grant_flow,
            FlowBinding::ResetCredentialsFlow => &mut self.reset_credentials_flow,
            FlowBinding::ClientAuthenticationFlow => &mut self.client_authentication_flow,
            FlowBinding::DockerAuthenticationFlow => &mut self.docker_authentication_flow,
            FlowBinding::FirstBrokerLoginFlow => &mut self.first_broker_login_flow,
        };
        *slot = flow_id;
    }

    /// Returns the first purpose `flow_id` is bound to, if any.
    #[must_use]
    pub fn binding_of(&self, flow_id: Uuid) -> Option<FlowBinding> {
        FlowBinding::ALL
            .into_iter()
            .find(|binding| self.get(*binding) == Some(flow_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_start_empty() {
        let bindings = RealmFlowBindings::default();
        for binding in FlowBinding::ALL {
            assert_eq!(bindings.get(binding), None);
        }
    }

    #[test]
    fn binding_lookup_by_flow() {
        let browser = Uuid::now_v7();
        let mut bindings = RealmFlowBindings::default();
        bindings.set(FlowBinding::BrowserFlow, Some(browser));

        assert_eq!(bindings.binding_of(browser), Some(FlowBinding::BrowserFlow));
        assert_eq!(bindings.binding_of(Uuid::now_v7()), None);

        bindings.set(FlowBinding::BrowserFlow, None);
        assert_eq!(bindings.binding_of(browser), None);
    }
}
