//! Authenticator config DTOs for the Admin API.

use std::collections::HashMap;

use kc_model::AuthenticatorConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticator config, as created, updated and returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorConfigRepresentation {
    /// Unique identifier (ignored on input).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Config alias.
    pub alias: String,
    /// Settings.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl AuthenticatorConfigRepresentation {
    /// Creates an empty representation.
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            id: None,
            alias: alias.into(),
            config: HashMap::new(),
        }
    }

    /// Adds a setting.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Converts this representation to a new config.
    #[must_use]
    pub fn into_config(self, realm_id: Uuid) -> AuthenticatorConfig {
        let mut config = AuthenticatorConfig::new(realm_id, self.alias.trim());
        config.config = self.config;
        config
    }

    /// Replaces the alias and settings of an existing config.
    pub fn apply_to(self, config: &mut AuthenticatorConfig) {
        config.alias = self.alias.trim().to_string();
        config.config = self.config;
    }
}

impl From<AuthenticatorConfig> for AuthenticatorConfigRepresentation {
    fn from(config: AuthenticatorConfig) -> Self {
        Self {
            id: Some(config.id),
            alias: config.alias,
            config: config.config,
        }
    }
}
