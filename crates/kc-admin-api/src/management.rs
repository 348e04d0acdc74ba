//! Authentication flow management.
//!
//! [`AuthenticationManagement`] is the transport-free service behind the
//! admin endpoints. It validates requests against the registered providers,
//! delegates persistence to the store and records an admin event for every
//! successful mutation.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use kc_auth::{Authenticator, AuthenticatorRegistry, ProviderDescriptor};
use kc_core::event::EventType;
use kc_core::AdminConfig;
use kc_model::execution::next_priority;
use kc_model::{
    flow_types, AuthenticationExecution, AuthenticationFlow, AuthenticatorConfig, ExecutionTarget,
    ParseRequirementError, RealmFlowBindings, Requirement,
};
use kc_storage::{AuthenticationStore, StorageError};
use uuid::Uuid;

use crate::dto::{
    AuthenticationExecutionInfo, AuthenticationExecutionRepresentation,
    AuthenticationFlowRepresentation, AuthenticatorConfigRepresentation, CopyFlowRequest,
    CreateFlowRequest, FlowBindingRequest, NewExecutionFlowRequest, NewExecutionRequest,
    UpdateFlowRequest,
};
use crate::error::{AdminError, AdminResult};
use crate::events::{
    config_event, execution_event, flow_event, AdminEventBuilder, AdminEventLogger,
};

const FLOW: &str = "AuthenticationFlow";
const EXECUTION: &str = "AuthenticationExecution";
const CONFIG: &str = "AuthenticatorConfig";
const PROVIDER: &str = "AuthenticatorProvider";

#[derive(Debug, Clone, Copy)]
enum Shift {
    Up,
    Down,
}

/// Management service for flows, executions, configs and realm bindings.
pub struct AuthenticationManagement<S, L> {
    store: Arc<S>,
    registry: Arc<AuthenticatorRegistry>,
    events: Arc<L>,
    config: AdminConfig,
}

impl<S, L> AuthenticationManagement<S, L>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    /// Creates a management service with the default configuration.
    #[must_use]
    pub fn new(store: Arc<S>, registry: Arc<AuthenticatorRegistry>, events: Arc<L>) -> Self {
        Self {
            store,
            registry,
            events,
            config: AdminConfig::default(),
        }
    }

    /// Sets the management configuration.
    #[must_use]
    pub fn with_config(mut self, config: AdminConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the provider registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<AuthenticatorRegistry> {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Flows
    // ------------------------------------------------------------------------

    /// Creates a flow and returns its ID.
    ///
    /// ## Errors
    ///
    /// - `AdminError::Validation` for an empty alias or a provider that is not
    ///   a registered flow type
    /// - `AdminError::Conflict` if the alias is taken
    pub async fn create_flow(&self, realm_id: Uuid, request: CreateFlowRequest) -> AdminResult<Uuid> {
        require_alias(&request.alias)?;
        self.flow_type(&request.provider_id)?;

        let flow = request.into_flow(realm_id);
        if self.store.flow_alias_exists(realm_id, &flow.alias).await? {
            return Err(AdminError::conflict(FLOW, "alias", flow.alias));
        }
        self.store
            .create_flow(&flow)
            .await
            .map_err(|e| on_duplicate(e, FLOW, &flow.alias))?;

        tracing::info!(realm_id = %realm_id, flow_id = %flow.id, alias = %flow.alias, "authentication flow created");
        self.emit(flow_event(EventType::FlowCreated, realm_id, flow.id, &flow.alias))
            .await;
        Ok(flow.id)
    }

    /// Lists the realm's top-level flows.
    ///
    /// ## Errors
    ///
    /// Returns `AdminError::Storage` if the store fails.
    pub async fn get_flows(&self, realm_id: Uuid) -> AdminResult<Vec<AuthenticationFlowRepresentation>> {
        let flows = self.store.list_flows(realm_id).await?;
        Ok(flows
            .into_iter()
            .filter(|flow| flow.top_level)
            .map(AuthenticationFlowRepresentation::from)
            .collect())
    }

    /// Gets a flow by ID.
    ///
    /// ## Errors
    ///
    /// Returns `AdminError::NotFound` if the flow doesn't exist.
    pub async fn get_flow(&self, realm_id: Uuid, id: Uuid) -> AdminResult<AuthenticationFlowRepresentation> {
        Ok(self.load_flow(realm_id, id).await?.into())
    }

    /// Updates a flow's alias and description.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the flow doesn't exist
    /// - `AdminError::StateConflict` if the flow is built-in
    /// - `AdminError::Validation` for an empty alias
    /// - `AdminError::Conflict` if the new alias is taken
    pub async fn update_flow(&self, realm_id: Uuid, id: Uuid, request: UpdateFlowRequest) -> AdminResult<()> {
        let mut flow = self.load_editable_flow(realm_id, id).await?;
        let previous_alias = flow.alias.clone();
        request.apply_to(&mut flow);
        require_alias(&flow.alias)?;

        if flow.alias != previous_alias && self.store.flow_alias_exists(realm_id, &flow.alias).await? {
            return Err(AdminError::conflict(FLOW, "alias", flow.alias));
        }
        self.store
            .update_flow(&flow)
            .await
            .map_err(|e| on_duplicate(e, FLOW, &flow.alias))?;

        self.emit(flow_event(EventType::FlowUpdated, realm_id, flow.id, &flow.alias))
            .await;
        Ok(())
    }

    /// Deletes a flow.
    ///
    /// Its executions, the sub-flows only it nests and the configs left
    /// unbound go with it, in one store step.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the flow doesn't exist
    /// - `AdminError::StateConflict` if the flow is built-in
    /// - `AdminError::Storage` (409) if the flow is nested or realm-bound
    pub async fn delete_flow(&self, realm_id: Uuid, id: Uuid) -> AdminResult<()> {
        let flow = self.load_flow(realm_id, id).await?;
        if flow.built_in {
            return Err(AdminError::StateConflict(format!(
                "built-in flow '{}' cannot be deleted",
                flow.alias
            )));
        }
        self.store.remove_flow(realm_id, id).await?;

        tracing::info!(realm_id = %realm_id, flow_id = %id, alias = %flow.alias, "authentication flow deleted");
        self.emit(flow_event(EventType::FlowDeleted, realm_id, id, &flow.alias))
            .await;
        Ok(())
    }

    /// Copies a flow under a new alias and returns the copy's ID.
    ///
    /// Nested non-top-level sub-flows are copied recursively as
    /// `"<new name> <sub-flow alias>"`, bound configs as
    /// `"<new name> <config alias>"`. Top-level flows nested by reference
    /// stay shared. The copy is never built-in. It only becomes top-level,
    /// and so listable and bindable, once all of its children exist; a
    /// failed copy is rolled back.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the flow doesn't exist
    /// - `AdminError::Validation` for an empty name
    /// - `AdminError::Conflict` if a copied alias is taken
    pub async fn copy_flow(&self, realm_id: Uuid, id: Uuid, request: CopyFlowRequest) -> AdminResult<Uuid> {
        let source = self.load_flow(realm_id, id).await?;
        let new_name = require_alias(&request.new_name)?.to_string();
        if self.store.flow_alias_exists(realm_id, &new_name).await? {
            return Err(AdminError::conflict(FLOW, "alias", new_name));
        }

        let mut copied_configs = HashMap::new();
        let copy_id = self
            .copy_tree(realm_id, source, new_name.clone(), &new_name, &mut copied_configs)
            .await?;

        tracing::info!(realm_id = %realm_id, source_flow = %id, flow_id = %copy_id, "authentication flow copied");
        self.emit(
            flow_event(EventType::FlowCopied, realm_id, copy_id, &new_name)
                .detail("source_flow", id.to_string()),
        )
        .await;
        Ok(copy_id)
    }

    // ------------------------------------------------------------------------
    // Executions
    // ------------------------------------------------------------------------

    /// Appends an authenticator execution to a flow and returns its ID.
    ///
    /// The execution gets the next free priority and the configured default
    /// requirement unless one is given.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the flow or the provider doesn't exist
    /// - `AdminError::StateConflict` if the flow is built-in
    /// - `AdminError::Validation` if the provider is a flow type or the
    ///   requirement is not one of its choices
    pub async fn add_execution(
        &self,
        realm_id: Uuid,
        flow_id: Uuid,
        request: NewExecutionRequest,
    ) -> AdminResult<Uuid> {
        let flow = self.load_editable_flow(realm_id, flow_id).await?;
        let provider = self
            .registry
            .get(&request.provider)
            .ok_or_else(|| AdminError::not_found(PROVIDER, &request.provider))?;
        if provider.is_composite() {
            return Err(AdminError::Validation(format!(
                "'{}' is a flow type, not an authenticator",
                request.provider
            )));
        }
        let requirement = match request.requirement {
            Some(requirement) => {
                check_choice(requirement, provider.requirement_choices(), provider.id())?;
                requirement
            }
            None => self.default_requirement()?,
        };

        let siblings = self.store.get_executions_for_flow(realm_id, flow.id).await?;
        let execution = AuthenticationExecution::new_authenticator(realm_id, flow.id, request.provider)
            .with_priority(next_priority(&siblings))
            .with_requirement(requirement);
        self.store.add_execution(&execution).await?;

        tracing::info!(realm_id = %realm_id, flow_id = %flow.id, execution_id = %execution.id, provider = provider.id(), "execution added");
        self.emit(
            execution_event(EventType::ExecutionCreated, realm_id, execution.id, flow.id)
                .detail("provider", provider.id()),
        )
        .await;
        Ok(execution.id)
    }

    /// Creates a non-top-level sub-flow, appends it to a flow and returns the
    /// sub-flow's ID.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the parent flow doesn't exist
    /// - `AdminError::StateConflict` if the parent is built-in
    /// - `AdminError::Validation` for an empty alias, an unknown flow type or
    ///   a requirement the flow type doesn't allow
    /// - `AdminError::Conflict` if the alias is taken
    pub async fn add_execution_flow(
        &self,
        realm_id: Uuid,
        parent_id: Uuid,
        request: NewExecutionFlowRequest,
    ) -> AdminResult<Uuid> {
        let parent = self.load_editable_flow(realm_id, parent_id).await?;
        let alias = require_alias(&request.alias)?.to_string();
        let flow_type = request
            .provider
            .unwrap_or_else(|| flow_types::BASIC_FLOW.to_string());
        let provider = self.flow_type(&flow_type)?;
        let requirement = match request.requirement {
            Some(requirement) => {
                check_choice(requirement, provider.requirement_choices(), &flow_type)?;
                requirement
            }
            None => self.default_requirement()?,
        };
        if self.store.flow_alias_exists(realm_id, &alias).await? {
            return Err(AdminError::conflict(FLOW, "alias", alias));
        }

        let mut sub_flow = AuthenticationFlow::new(realm_id, alias, flow_type).as_sub_flow();
        sub_flow.description = request.description;
        let siblings = self.store.get_executions_for_flow(realm_id, parent.id).await?;
        self.store
            .create_flow(&sub_flow)
            .await
            .map_err(|e| on_duplicate(e, FLOW, &sub_flow.alias))?;

        let execution = AuthenticationExecution::new_sub_flow(realm_id, parent.id, sub_flow.id)
            .with_priority(next_priority(&siblings))
            .with_requirement(requirement);
        if let Err(err) = self.store.add_execution(&execution).await {
            if let Err(cleanup) = self.store.remove_flow(realm_id, sub_flow.id).await {
                tracing::warn!(flow_id = %sub_flow.id, error = %cleanup, "failed to roll back sub-flow");
            }
            return Err(err.into());
        }

        tracing::info!(realm_id = %realm_id, flow_id = %parent.id, sub_flow = %sub_flow.id, "sub-flow execution added");
        self.emit(flow_event(EventType::FlowCreated, realm_id, sub_flow.id, &sub_flow.alias))
            .await;
        self.emit(
            execution_event(EventType::ExecutionCreated, realm_id, execution.id, parent.id)
                .detail("sub_flow", sub_flow.id.to_string()),
        )
        .await;
        Ok(sub_flow.id)
    }

    /// Lists a flow's executions for administrators.
    ///
    /// Entries follow sibling order; a sub-flow's children come right after
    /// it with `level` one higher.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the flow doesn't exist
    /// - `AdminError::Configuration` if a sub-flow execution is dangling
    pub async fn get_executions(
        &self,
        realm_id: Uuid,
        flow_id: Uuid,
    ) -> AdminResult<Vec<AuthenticationExecutionInfo>> {
        self.load_flow(realm_id, flow_id).await?;
        let mut infos = Vec::new();
        self.collect_executions(realm_id, flow_id, 0, &mut infos).await?;
        Ok(infos)
    }

    /// Gets an execution by ID.
    ///
    /// ## Errors
    ///
    /// Returns `AdminError::NotFound` if the execution doesn't exist.
    pub async fn get_execution(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> AdminResult<AuthenticationExecutionRepresentation> {
        Ok(self.load_execution(realm_id, id).await?.into())
    }

    /// Changes an execution's requirement.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the execution doesn't exist
    /// - `AdminError::StateConflict` if its flow is built-in
    /// - `AdminError::Validation` if the requirement is not one of the
    ///   provider's choices
    /// - `AdminError::Configuration` if the provider or sub-flow is missing
    pub async fn update_execution_requirement(
        &self,
        realm_id: Uuid,
        id: Uuid,
        requirement: Requirement,
    ) -> AdminResult<()> {
        let mut execution = self.load_execution(realm_id, id).await?;
        self.load_editable_flow(realm_id, execution.parent_flow).await?;

        let choices = self.choices_for(realm_id, &execution).await?;
        check_choice(requirement, &choices, "this execution")?;
        if execution.requirement == requirement {
            return Ok(());
        }
        execution.requirement = requirement;
        self.store.update_execution(&execution).await?;

        self.emit(
            execution_event(EventType::ExecutionUpdated, realm_id, id, execution.parent_flow)
                .detail("requirement", requirement.as_str()),
        )
        .await;
        Ok(())
    }

    /// Moves an execution one place earlier among its siblings.
    ///
    /// The first execution stays where it is.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the execution doesn't exist
    /// - `AdminError::StateConflict` if its flow is built-in
    pub async fn raise_execution_priority(&self, realm_id: Uuid, id: Uuid) -> AdminResult<()> {
        self.shift_execution(realm_id, id, Shift::Up).await
    }

    /// Moves an execution one place later among its siblings.
    ///
    /// The last execution stays where it is.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the execution doesn't exist
    /// - `AdminError::StateConflict` if its flow is built-in
    pub async fn lower_execution_priority(&self, realm_id: Uuid, id: Uuid) -> AdminResult<()> {
        self.shift_execution(realm_id, id, Shift::Down).await
    }

    /// Removes an execution.
    ///
    /// A sub-flow only it nests is removed with it, as are configs left
    /// unbound.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the execution doesn't exist
    /// - `AdminError::StateConflict` if its flow is built-in
    pub async fn remove_execution(&self, realm_id: Uuid, id: Uuid) -> AdminResult<()> {
        let execution = self.load_execution(realm_id, id).await?;
        self.load_editable_flow(realm_id, execution.parent_flow).await?;
        self.store.remove_execution(realm_id, id).await?;

        tracing::info!(realm_id = %realm_id, execution_id = %id, "execution removed");
        self.emit(execution_event(
            EventType::ExecutionDeleted,
            realm_id,
            id,
            execution.parent_flow,
        ))
        .await;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Authenticator configs
    // ------------------------------------------------------------------------

    /// Creates a config, binds it to an execution and returns its ID.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the execution doesn't exist
    /// - `AdminError::Validation` for an empty alias, a sub-flow execution
    ///   or a provider that reads no config
    /// - `AdminError::Conflict` if the alias is taken
    pub async fn new_execution_config(
        &self,
        realm_id: Uuid,
        execution_id: Uuid,
        representation: AuthenticatorConfigRepresentation,
    ) -> AdminResult<Uuid> {
        let execution = self.load_execution(realm_id, execution_id).await?;
        match execution.target() {
            Some(ExecutionTarget::Authenticator(provider_id)) => {
                if let Some(provider) = self.registry.get(provider_id) {
                    if !provider.is_configurable() {
                        return Err(AdminError::Validation(format!(
                            "authenticator '{provider_id}' is not configurable"
                        )));
                    }
                }
            }
            _ => {
                return Err(AdminError::Validation(format!(
                    "execution {execution_id} does not run an authenticator"
                )))
            }
        }

        let alias = require_alias(&representation.alias)?.to_string();
        if self
            .store
            .get_authenticator_config_by_alias(realm_id, &alias)
            .await?
            .is_some()
        {
            return Err(AdminError::conflict(CONFIG, "alias", alias));
        }
        let config = representation.into_config(realm_id);
        self.store
            .add_authenticator_config(&config, Some(execution_id))
            .await
            .map_err(|e| on_duplicate(e, CONFIG, &config.alias))?;

        tracing::info!(realm_id = %realm_id, execution_id = %execution_id, config_id = %config.id, "authenticator config created");
        self.emit(
            config_event(EventType::AuthenticatorConfigCreated, realm_id, config.id, &config.alias)
                .detail("execution_id", execution_id.to_string()),
        )
        .await;
        Ok(config.id)
    }

    /// Gets a config by ID.
    ///
    /// ## Errors
    ///
    /// Returns `AdminError::NotFound` if the config doesn't exist.
    pub async fn get_authenticator_config(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> AdminResult<AuthenticatorConfigRepresentation> {
        Ok(self.load_config(realm_id, id).await?.into())
    }

    /// Replaces a config's alias and settings.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the config doesn't exist
    /// - `AdminError::Validation` for an empty alias
    /// - `AdminError::Conflict` if the new alias is taken
    pub async fn update_authenticator_config(
        &self,
        realm_id: Uuid,
        id: Uuid,
        representation: AuthenticatorConfigRepresentation,
    ) -> AdminResult<()> {
        let mut config = self.load_config(realm_id, id).await?;
        let alias = require_alias(&representation.alias)?;
        if alias != config.alias
            && self
                .store
                .get_authenticator_config_by_alias(realm_id, alias)
                .await?
                .is_some()
        {
            return Err(AdminError::conflict(CONFIG, "alias", alias));
        }
        representation.apply_to(&mut config);
        self.store
            .update_authenticator_config(&config)
            .await
            .map_err(|e| on_duplicate(e, CONFIG, &config.alias))?;

        self.emit(config_event(
            EventType::AuthenticatorConfigUpdated,
            realm_id,
            id,
            &config.alias,
        ))
        .await;
        Ok(())
    }

    /// Deletes a config and unbinds it from every execution.
    ///
    /// ## Errors
    ///
    /// Returns `AdminError::NotFound` if the config doesn't exist.
    pub async fn remove_authenticator_config(&self, realm_id: Uuid, id: Uuid) -> AdminResult<()> {
        let config = self.load_config(realm_id, id).await?;
        self.store.remove_authenticator_config(realm_id, id).await?;

        tracing::info!(realm_id = %realm_id, config_id = %id, "authenticator config removed");
        self.emit(config_event(
            EventType::AuthenticatorConfigDeleted,
            realm_id,
            id,
            &config.alias,
        ))
        .await;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Bindings and providers
    // ------------------------------------------------------------------------

    /// Gets the realm's flow bindings.
    ///
    /// ## Errors
    ///
    /// Returns `AdminError::Storage` if the store fails.
    pub async fn get_flow_bindings(&self, realm_id: Uuid) -> AdminResult<RealmFlowBindings> {
        Ok(self.store.get_flow_bindings(realm_id).await?)
    }

    /// Binds a top-level flow to a purpose, or clears the binding.
    ///
    /// ## Errors
    ///
    /// - `AdminError::NotFound` if the flow doesn't exist
    /// - `AdminError::Validation` if the flow is not top-level
    pub async fn bind_flow(&self, realm_id: Uuid, request: FlowBindingRequest) -> AdminResult<()> {
        if let Some(flow_id) = request.flow_id {
            let flow = self.load_flow(realm_id, flow_id).await?;
            if !flow.top_level {
                return Err(AdminError::Validation(format!(
                    "flow '{}' is not top-level and cannot be bound",
                    flow.alias
                )));
            }
        }
        let mut bindings = self.store.get_flow_bindings(realm_id).await?;
        bindings.set(request.binding, request.flow_id);
        self.store.set_flow_bindings(realm_id, &bindings).await?;

        let bound = request
            .flow_id
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        tracing::info!(realm_id = %realm_id, binding = %request.binding, flow_id = %bound, "flow binding changed");
        self.emit(
            AdminEventBuilder::new(EventType::FlowBound)
                .realm(realm_id)
                .resource_type("realm-flow-binding")
                .resource_name(request.binding.as_str())
                .detail("flow_id", bound),
        )
        .await;
        Ok(())
    }

    /// Describes the registered authenticators, excluding flow types.
    #[must_use]
    pub fn list_authenticator_providers(&self) -> Vec<ProviderDescriptor> {
        self.registry
            .list()
            .into_iter()
            .filter(|p| !p.composite)
            .collect()
    }

    /// Describes the registered flow types.
    #[must_use]
    pub fn list_flow_providers(&self) -> Vec<ProviderDescriptor> {
        self.registry
            .list()
            .into_iter()
            .filter(|p| p.composite)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn load_flow(&self, realm_id: Uuid, id: Uuid) -> AdminResult<AuthenticationFlow> {
        self.store
            .get_flow(realm_id, id)
            .await?
            .ok_or_else(|| AdminError::not_found_id(FLOW, id))
    }

    async fn load_editable_flow(&self, realm_id: Uuid, id: Uuid) -> AdminResult<AuthenticationFlow> {
        let flow = self.load_flow(realm_id, id).await?;
        if flow.built_in {
            return Err(AdminError::StateConflict(format!(
                "built-in flow '{}' cannot be modified",
                flow.alias
            )));
        }
        Ok(flow)
    }

    async fn load_execution(&self, realm_id: Uuid, id: Uuid) -> AdminResult<AuthenticationExecution> {
        self.store
            .get_execution(realm_id, id)
            .await?
            .ok_or_else(|| AdminError::not_found_id(EXECUTION, id))
    }

    async fn load_config(&self, realm_id: Uuid, id: Uuid) -> AdminResult<AuthenticatorConfig> {
        self.store
            .get_authenticator_config(realm_id, id)
            .await?
            .ok_or_else(|| AdminError::not_found_id(CONFIG, id))
    }

    fn flow_type(&self, provider_id: &str) -> AdminResult<Arc<dyn Authenticator>> {
        self.registry
            .get(provider_id)
            .filter(|provider| provider.is_composite())
            .ok_or_else(|| AdminError::Validation(format!("unknown flow type '{provider_id}'")))
    }

    fn flow_choices(&self, flow_type: &str) -> Vec<Requirement> {
        self.registry
            .get(flow_type)
            .map_or_else(|| Requirement::ALL.to_vec(), |p| p.requirement_choices().to_vec())
    }

    fn default_requirement(&self) -> AdminResult<Requirement> {
        self.config
            .default_execution_requirement
            .parse()
            .map_err(|err: ParseRequirementError| {
                AdminError::Configuration(format!("default execution requirement: {err}"))
            })
    }

    async fn choices_for(
        &self,
        realm_id: Uuid,
        execution: &AuthenticationExecution,
    ) -> AdminResult<Vec<Requirement>> {
        match execution.target() {
            Some(ExecutionTarget::Authenticator(provider_id)) => self
                .registry
                .get(provider_id)
                .map(|p| p.requirement_choices().to_vec())
                .ok_or_else(|| {
                    AdminError::Configuration(format!(
                        "authenticator provider '{provider_id}' is not registered"
                    ))
                }),
            Some(ExecutionTarget::Flow(flow_id)) => {
                let sub_flow = self.nested_flow(realm_id, execution.id, flow_id).await?;
                Ok(self.flow_choices(&sub_flow.provider_id))
            }
            None => Err(AdminError::Configuration(format!(
                "execution {} has no authenticator or flow",
                execution.id
            ))),
        }
    }

    async fn nested_flow(
        &self,
        realm_id: Uuid,
        execution_id: Uuid,
        flow_id: Uuid,
    ) -> AdminResult<AuthenticationFlow> {
        self.store.get_flow(realm_id, flow_id).await?.ok_or_else(|| {
            AdminError::Configuration(format!(
                "execution {execution_id} nests missing flow {flow_id}"
            ))
        })
    }

    async fn describe(
        &self,
        realm_id: Uuid,
        execution: &AuthenticationExecution,
        level: usize,
        index: usize,
    ) -> AdminResult<AuthenticationExecutionInfo> {
        let alias = match execution.authenticator_config {
            Some(config_id) => self
                .store
                .get_authenticator_config(realm_id, config_id)
                .await?
                .map(|config| config.alias),
            None => None,
        };
        let mut info = AuthenticationExecutionInfo {
            id: execution.id,
            requirement: execution.requirement,
            display_name: String::new(),
            description: None,
            alias,
            requirement_choices: Vec::new(),
            configurable: false,
            authentication_flow: execution.authenticator_flow,
            provider_id: String::new(),
            authentication_config: execution.authenticator_config,
            flow_id: execution.flow_id,
            level,
            index,
            priority: execution.priority,
        };

        match execution.target() {
            Some(ExecutionTarget::Flow(flow_id)) => {
                let sub_flow = self.nested_flow(realm_id, execution.id, flow_id).await?;
                info.requirement_choices = self.flow_choices(&sub_flow.provider_id);
                info.display_name = sub_flow.alias;
                info.description = sub_flow.description;
                info.provider_id = sub_flow.provider_id;
            }
            Some(ExecutionTarget::Authenticator(provider_id)) => {
                info.provider_id = provider_id.to_string();
                if let Some(provider) = self.registry.get(provider_id) {
                    info.display_name = provider.display_name().to_string();
                    info.description = Some(provider.help_text())
                        .filter(|text| !text.is_empty())
                        .map(str::to_string);
                    info.requirement_choices = provider.requirement_choices().to_vec();
                    info.configurable = provider.is_configurable();
                } else {
                    tracing::warn!(execution_id = %execution.id, provider_id, "execution references an unregistered provider");
                    info.display_name = provider_id.to_string();
                }
            }
            None => {
                return Err(AdminError::Configuration(format!(
                    "execution {} has no authenticator or flow",
                    execution.id
                )))
            }
        }
        Ok(info)
    }

    fn collect_executions<'a>(
        &'a self,
        realm_id: Uuid,
        flow_id: Uuid,
        level: usize,
        out: &'a mut Vec<AuthenticationExecutionInfo>,
    ) -> BoxFuture<'a, AdminResult<()>> {
        Box::pin(async move {
            let executions = self.store.get_executions_for_flow(realm_id, flow_id).await?;
            for (index, execution) in executions.iter().enumerate() {
                out.push(self.describe(realm_id, execution, level, index).await?);
                if let Some(ExecutionTarget::Flow(sub_flow)) = execution.target() {
                    self.collect_executions(realm_id, sub_flow, level + 1, &mut *out)
                        .await?;
                }
            }
            Ok(())
        })
    }

    async fn shift_execution(&self, realm_id: Uuid, id: Uuid, shift: Shift) -> AdminResult<()> {
        let execution = self.load_execution(realm_id, id).await?;
        self.load_editable_flow(realm_id, execution.parent_flow).await?;

        let mut siblings = self
            .store
            .get_executions_for_flow(realm_id, execution.parent_flow)
            .await?;
        let position = siblings
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AdminError::not_found_id(EXECUTION, id))?;
        let neighbour = match shift {
            Shift::Up => position.checked_sub(1),
            Shift::Down => Some(position + 1).filter(|&i| i < siblings.len()),
        };
        let Some(neighbour) = neighbour else {
            return Ok(());
        };

        let changed = if siblings[position].priority == siblings[neighbour].priority {
            // Equal priorities only order by creation; renumber the whole list.
            siblings.swap(position, neighbour);
            let mut changed = Vec::new();
            for (index, mut sibling) in siblings.into_iter().enumerate() {
                let priority = i32::try_from(index)
                    .map_err(|_| AdminError::Internal("too many executions in flow".to_string()))?;
                if sibling.priority != priority {
                    sibling.priority = priority;
                    changed.push(sibling);
                }
            }
            changed
        } else {
            let moved = siblings[position].priority;
            siblings[position].priority = siblings[neighbour].priority;
            siblings[neighbour].priority = moved;
            vec![siblings[position].clone(), siblings[neighbour].clone()]
        };
        self.store.update_executions(realm_id, &changed).await?;

        self.emit(
            execution_event(EventType::ExecutionUpdated, realm_id, id, execution.parent_flow)
                .detail("priority", format!("{shift:?}").to_lowercase()),
        )
        .await;
        Ok(())
    }

    fn copy_tree<'a>(
        &'a self,
        realm_id: Uuid,
        source: AuthenticationFlow,
        alias: String,
        prefix: &'a str,
        configs: &'a mut HashMap<Uuid, Uuid>,
    ) -> BoxFuture<'a, AdminResult<Uuid>> {
        Box::pin(async move {
            let source_id = source.id;
            let publish = source.top_level;
            // Kept out of listings and bindings until every child exists.
            let mut copy = AuthenticationFlow {
                id: Uuid::now_v7(),
                alias,
                built_in: false,
                top_level: false,
                ..source
            };
            self.store
                .create_flow(&copy)
                .await
                .map_err(|e| on_duplicate(e, FLOW, &copy.alias))?;

            let copied = async {
                for source_execution in self.store.get_executions_for_flow(realm_id, source_id).await? {
                    let source_config = source_execution.authenticator_config;
                    let mut execution = AuthenticationExecution {
                        id: Uuid::now_v7(),
                        parent_flow: copy.id,
                        authenticator_config: None,
                        ..source_execution
                    };

                    let nested_id = match execution.target() {
                        Some(ExecutionTarget::Flow(nested_id)) => Some(nested_id),
                        _ => None,
                    };
                    if let Some(nested_id) = nested_id {
                        let nested = self.nested_flow(realm_id, execution.id, nested_id).await?;
                        if !nested.top_level {
                            let nested_alias = format!("{prefix} {}", nested.alias);
                            let nested_copy = self
                                .copy_tree(realm_id, nested, nested_alias, prefix, &mut *configs)
                                .await?;
                            execution.flow_id = Some(nested_copy);
                        }
                    }

                    let fresh_config = match source_config {
                        Some(config_id) => match configs.get(&config_id) {
                            Some(copied_id) => {
                                execution.authenticator_config = Some(*copied_id);
                                None
                            }
                            None => self.store.get_authenticator_config(realm_id, config_id).await?,
                        },
                        None => None,
                    };
                    self.store.add_execution(&execution).await?;

                    if let Some(config) = fresh_config {
                        let source_config_id = config.id;
                        let config_copy = AuthenticatorConfig {
                            id: Uuid::now_v7(),
                            alias: format!("{prefix} {}", config.alias),
                            ..config
                        };
                        self.store
                            .add_authenticator_config(&config_copy, Some(execution.id))
                            .await
                            .map_err(|e| on_duplicate(e, CONFIG, &config_copy.alias))?;
                        configs.insert(source_config_id, config_copy.id);
                    }
                }
                if publish {
                    copy.top_level = true;
                    self.store.update_flow(&copy).await?;
                }
                Ok::<(), AdminError>(())
            }
            .await;

            if let Err(err) = copied {
                if let Err(cleanup) = self.store.remove_flow(realm_id, copy.id).await {
                    tracing::warn!(flow_id = %copy.id, error = %cleanup, "failed to roll back partial flow copy");
                }
                return Err(err);
            }
            Ok(copy.id)
        })
    }

    async fn emit(&self, event: AdminEventBuilder) {
        if !self.config.events_enabled {
            return;
        }
        if let Err(err) = self.events.log(event.success().build()).await {
            tracing::warn!(error = %err, "failed to record admin event");
        }
    }
}

fn require_alias(alias: &str) -> AdminResult<&str> {
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(AdminError::Validation("alias is required".to_string()));
    }
    Ok(alias)
}

fn check_choice(requirement: Requirement, choices: &[Requirement], subject: &str) -> AdminResult<()> {
    if choices.contains(&requirement) {
        Ok(())
    } else {
        Err(AdminError::Validation(format!(
            "requirement {requirement} is not allowed for {subject}"
        )))
    }
}

fn on_duplicate(err: StorageError, entity_type: &'static str, alias: &str) -> AdminError {
    if err.is_duplicate() {
        AdminError::conflict(entity_type, "alias", alias)
    } else {
        AdminError::from(err)
    }
}
