//! Authentication flow storage provider trait.

use async_trait::async_trait;
use kc_model::{AuthenticationFlow, RealmFlowBindings};
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for authentication flow storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait AuthenticationFlowProvider: Send + Sync {
    /// Creates a new flow.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a flow with the same alias exists
    /// in the realm.
    async fn create_flow(&self, flow: &AuthenticationFlow) -> StorageResult<()>;

    /// Updates an existing flow.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the flow doesn't exist, or
    /// `StorageError::Duplicate` if the new alias is taken.
    async fn update_flow(&self, flow: &AuthenticationFlow) -> StorageResult<()>;

    /// Removes a flow together with its executions.
    ///
    /// Sub-flows nested through those executions are removed as well when
    /// they are not top-level and nothing else nests or binds them, and so
    /// are configs no remaining execution is bound to.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the flow doesn't exist, or
    /// `StorageError::InUse` if an execution nests it or the realm binds it.
    /// Nothing is removed on error.
    async fn remove_flow(&self, realm_id: Uuid, id: Uuid) -> StorageResult<()>;

    /// Gets a flow by ID.
    async fn get_flow(&self, realm_id: Uuid, id: Uuid)
        -> StorageResult<Option<AuthenticationFlow>>;

    /// Gets a flow by alias.
    async fn get_flow_by_alias(
        &self,
        realm_id: Uuid,
        alias: &str,
    ) -> StorageResult<Option<AuthenticationFlow>>;

    /// Lists all flows in a realm, in creation order.
    async fn list_flows(&self, realm_id: Uuid) -> StorageResult<Vec<AuthenticationFlow>>;

    /// Gets the realm's flow bindings.
    async fn get_flow_bindings(&self, realm_id: Uuid) -> StorageResult<RealmFlowBindings>;

    /// Replaces the realm's flow bindings.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if a bound flow doesn't exist.
    async fn set_flow_bindings(
        &self,
        realm_id: Uuid,
        bindings: &RealmFlowBindings,
    ) -> StorageResult<()>;

    /// Checks if a flow alias is taken.
    async fn flow_alias_exists(&self, realm_id: Uuid, alias: &str) -> StorageResult<bool> {
        Ok(self.get_flow_by_alias(realm_id, alias).await?.is_some())
    }
}
