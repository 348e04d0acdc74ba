//! Common test utilities and fixtures.

use std::sync::Arc;

use axum::Router;
use kc_admin_api::dto::{CreateFlowRequest, NewExecutionFlowRequest, NewExecutionRequest};
use kc_admin_api::{
    authentication_router, AuthenticationManagement, InMemoryEventLogger, ManagementState,
};
use kc_auth::{AuthenticatorRegistry, FlowEngine};
use kc_core::Config;
use kc_model::Requirement;
use kc_storage_memory::InMemoryAuthenticationStore;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Management service over the in-memory store.
pub type Management = AuthenticationManagement<InMemoryAuthenticationStore, InMemoryEventLogger>;

/// Test environment sharing one store between the engine and the
/// management service.
pub struct TestEnv {
    /// Realm every fixture lives in.
    pub realm_id: Uuid,
    /// Flow definition store.
    pub store: Arc<InMemoryAuthenticationStore>,
    /// Recorded admin events.
    pub events: Arc<InMemoryEventLogger>,
    /// Management service.
    pub management: Arc<Management>,
    /// Flow engine.
    pub engine: FlowEngine<InMemoryAuthenticationStore>,
}

impl TestEnv {
    /// Creates a fresh environment with the built-in providers.
    pub fn new() -> Self {
        init_tracing();

        let config = Config::default();
        let store = Arc::new(InMemoryAuthenticationStore::new());
        let registry = Arc::new(AuthenticatorRegistry::with_builtins());
        let events = Arc::new(InMemoryEventLogger::new());
        let management = Arc::new(
            AuthenticationManagement::new(
                Arc::clone(&store),
                Arc::clone(&registry),
                Arc::clone(&events),
            )
            .with_config(config.admin),
        );
        let engine = FlowEngine::new(Arc::clone(&store), registry).with_config(config.engine);

        Self {
            realm_id: Uuid::now_v7(),
            store,
            events,
            management,
            engine,
        }
    }

    /// Returns the admin router bound to this environment.
    pub fn router(&self) -> Router {
        authentication_router().with_state(ManagementState::new(Arc::clone(&self.management)))
    }

    /// Returns the path prefix of the realm's authentication endpoints.
    pub fn base_path(&self) -> String {
        format!("/admin/realms/{}/authentication", self.realm_id)
    }

    /// Creates a top-level basic flow.
    pub async fn create_flow(&self, alias: &str) -> anyhow::Result<Uuid> {
        Ok(self
            .management
            .create_flow(self.realm_id, CreateFlowRequest::new(alias))
            .await?)
    }

    /// Appends an authenticator with the given requirement.
    pub async fn add_authenticator(
        &self,
        flow_id: Uuid,
        provider: &str,
        requirement: Requirement,
    ) -> anyhow::Result<Uuid> {
        Ok(self
            .management
            .add_execution(
                self.realm_id,
                flow_id,
                NewExecutionRequest::new(provider).with_requirement(requirement),
            )
            .await?)
    }

    /// Appends a basic sub-flow with the given requirement.
    pub async fn add_sub_flow(
        &self,
        flow_id: Uuid,
        alias: &str,
        requirement: Requirement,
    ) -> anyhow::Result<Uuid> {
        Ok(self
            .management
            .add_execution_flow(
                self.realm_id,
                flow_id,
                NewExecutionFlowRequest {
                    alias: alias.to_string(),
                    description: None,
                    provider: None,
                    requirement: Some(requirement),
                },
            )
            .await?)
    }
}

/// Initializes test logging once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
