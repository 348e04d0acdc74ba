//! Authenticator registry keyed by provider ID.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use kc_model::Requirement;
use serde::Serialize;
use thiserror::Error;

use crate::authenticator::Authenticator;
use crate::builtin;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A provider with this ID is already registered.
    #[error("authenticator provider already registered: {0}")]
    Duplicate(String),
    /// Provider IDs must not be empty.
    #[error("authenticator provider id must not be empty")]
    EmptyId,
}

/// Administrator-facing description of a registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    /// Provider ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Help text.
    pub description: String,
    /// Whether this is a flow type.
    pub composite: bool,
    /// Whether executions may bind a config.
    pub configurable: bool,
    /// Allowed requirements.
    pub requirement_choices: Vec<Requirement>,
}

impl ProviderDescriptor {
    fn of(authenticator: &dyn Authenticator) -> Self {
        Self {
            id: authenticator.id().to_string(),
            display_name: authenticator.display_name().to_string(),
            description: authenticator.help_text().to_string(),
            composite: authenticator.is_composite(),
            configurable: authenticator.is_configurable(),
            requirement_choices: authenticator.requirement_choices().to_vec(),
        }
    }
}

/// Registry of authenticator capabilities.
///
/// Shared between the flow engine and the management API; lookups are
/// lock-free reads.
#[derive(Default)]
pub struct AuthenticatorRegistry {
    providers: DashMap<String, Arc<dyn Authenticator>>,
}

impl fmt::Debug for AuthenticatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        f.debug_struct("AuthenticatorRegistry")
            .field("providers", &ids)
            .finish()
    }
}

impl AuthenticatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in providers.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for provider in builtin::providers() {
            registry
                .providers
                .insert(provider.id().to_string(), provider);
        }
        registry
    }

    /// Registers a provider.
    ///
    /// ## Errors
    ///
    /// Returns `RegistryError::Duplicate` if the ID is taken, or
    /// `RegistryError::EmptyId` for an empty ID.
    pub fn register(&self, authenticator: Arc<dyn Authenticator>) -> Result<(), RegistryError> {
        let id = authenticator.id();
        if id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        match self.providers.entry(id.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::Duplicate(id.to_string())),
            Entry::Vacant(slot) => {
                tracing::debug!(provider_id = id, "registered authenticator provider");
                slot.insert(authenticator);
                Ok(())
            }
        }
    }

    /// Looks up a provider.
    #[must_use]
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn Authenticator>> {
        self.providers.get(provider_id).map(|e| Arc::clone(e.value()))
    }

    /// Checks if a provider is registered.
    #[must_use]
    pub fn contains(&self, provider_id: &str) -> bool {
        self.providers.contains_key(provider_id)
    }

    /// Describes every registered provider, sorted by ID.
    #[must_use]
    pub fn list(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors: Vec<ProviderDescriptor> = self
            .providers
            .iter()
            .map(|e| ProviderDescriptor::of(e.value().as_ref()))
            .collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    /// Returns the number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Checks if no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
