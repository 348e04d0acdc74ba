//! Admin API state management.
//!
//! Defines the shared state structure for the Admin API endpoints.

use std::sync::Arc;

use kc_auth::AuthenticatorRegistry;
use kc_core::AdminConfig;
use kc_storage::AuthenticationStore;

use crate::events::AdminEventLogger;
use crate::management::AuthenticationManagement;

/// State for the authentication management endpoints.
///
/// Uses `Arc` for thread-safe shared ownership.
pub struct ManagementState<S, L>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    /// Management service.
    pub management: Arc<AuthenticationManagement<S, L>>,
}

// Manual Clone implementation that doesn't require T: Clone for Arc<T>
impl<S, L> Clone for ManagementState<S, L>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    fn clone(&self) -> Self {
        Self {
            management: Arc::clone(&self.management),
        }
    }
}

impl<S, L> ManagementState<S, L>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    /// Creates state around an existing service.
    #[must_use]
    pub const fn new(management: Arc<AuthenticationManagement<S, L>>) -> Self {
        Self { management }
    }

    /// Creates state from its parts.
    #[must_use]
    pub fn from_parts(
        store: Arc<S>,
        registry: Arc<AuthenticatorRegistry>,
        events: Arc<L>,
        config: AdminConfig,
    ) -> Self {
        Self::new(Arc::new(
            AuthenticationManagement::new(store, registry, events).with_config(config),
        ))
    }
}
