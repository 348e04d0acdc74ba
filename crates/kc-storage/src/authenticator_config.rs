//! Authenticator config storage provider trait.

use async_trait::async_trait;
use kc_model::AuthenticatorConfig;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for authenticator config storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait AuthenticatorConfigProvider: Send + Sync {
    /// Adds a config, optionally binding it to an execution in the same step.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the alias is taken, or
    /// `StorageError::NotFound` if `bind_to` names an unknown execution.
    /// Nothing is stored on error.
    async fn add_authenticator_config(
        &self,
        config: &AuthenticatorConfig,
        bind_to: Option<Uuid>,
    ) -> StorageResult<()>;

    /// Replaces a config's alias and settings.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the config doesn't exist, or
    /// `StorageError::Duplicate` if the new alias is taken.
    async fn update_authenticator_config(&self, config: &AuthenticatorConfig) -> StorageResult<()>;

    /// Removes a config and clears it from every execution bound to it.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the config doesn't exist.
    async fn remove_authenticator_config(&self, realm_id: Uuid, id: Uuid) -> StorageResult<()>;

    /// Gets a config by ID.
    async fn get_authenticator_config(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<AuthenticatorConfig>>;

    /// Gets a config by alias.
    async fn get_authenticator_config_by_alias(
        &self,
        realm_id: Uuid,
        alias: &str,
    ) -> StorageResult<Option<AuthenticatorConfig>>;

    /// Lists all configs in a realm.
    async fn list_authenticator_configs(
        &self,
        realm_id: Uuid,
    ) -> StorageResult<Vec<AuthenticatorConfig>>;
}
