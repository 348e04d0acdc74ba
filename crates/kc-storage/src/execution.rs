//! Authentication execution storage provider trait.

use async_trait::async_trait;
use kc_model::AuthenticationExecution;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for authentication execution storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait AuthenticationExecutionProvider: Send + Sync {
    /// Adds an execution to its parent flow.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the parent flow, the nested flow or
    /// the bound config doesn't exist.
    async fn add_execution(&self, execution: &AuthenticationExecution) -> StorageResult<()>;

    /// Updates an existing execution.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the execution or a newly bound
    /// config doesn't exist.
    async fn update_execution(&self, execution: &AuthenticationExecution) -> StorageResult<()>;

    /// Replaces several executions of one realm in a single step.
    ///
    /// Readers see either none or all of the changes; the priority moves of
    /// the management API rely on this.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if any execution or a newly bound
    /// config doesn't exist, and `StorageError::InvalidData` if an execution
    /// belongs to another realm. Nothing is written on error.
    async fn update_executions(
        &self,
        realm_id: Uuid,
        executions: &[AuthenticationExecution],
    ) -> StorageResult<()>;

    /// Removes an execution.
    ///
    /// A nested sub-flow that is not top-level and not referenced elsewhere
    /// is removed with it (recursively), as is a bound config no other
    /// execution uses.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the execution doesn't exist.
    async fn remove_execution(&self, realm_id: Uuid, id: Uuid) -> StorageResult<()>;

    /// Gets an execution by ID.
    async fn get_execution(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<AuthenticationExecution>>;

    /// Gets the executions of a flow, ordered by priority and then by
    /// creation order.
    async fn get_executions_for_flow(
        &self,
        realm_id: Uuid,
        flow_id: Uuid,
    ) -> StorageResult<Vec<AuthenticationExecution>>;
}
