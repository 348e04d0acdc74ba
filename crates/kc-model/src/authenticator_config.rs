//! Authenticator config domain model.
//!
//! Named key-value settings bound to executions. The config does not know
//! which executions reference it; the store tracks that link.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticator config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorConfig {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this config belongs to.
    pub realm_id: Uuid,
    /// Human label, unique within the realm.
    pub alias: String,
    /// Authenticator-specific settings.
    pub config: HashMap<String, String>,
}

impl AuthenticatorConfig {
    /// Creates an empty config.
    #[must_use]
    pub fn new(realm_id: Uuid, alias: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
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

    /// Gets a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Gets a boolean setting, falling back to `default` when absent or unparsable.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
