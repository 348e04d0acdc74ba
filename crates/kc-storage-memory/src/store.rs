//! In-memory flow definition store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use kc_model::execution::sort_by_priority;
use kc_model::{AuthenticationExecution, AuthenticationFlow, AuthenticatorConfig, RealmFlowBindings};
use kc_storage::{
    AuthenticationExecutionProvider, AuthenticationFlowProvider, AuthenticatorConfigProvider,
    StorageError, StorageResult,
};
use parking_lot::RwLock;
use uuid::Uuid;

/// Everything stored for one realm.
///
/// Vectors keep creation order, which is the tie-break for sibling
/// executions with equal priority.
#[derive(Debug, Default, Clone)]
struct RealmData {
    flows: Vec<AuthenticationFlow>,
    executions: Vec<AuthenticationExecution>,
    configs: Vec<AuthenticatorConfig>,
    bindings: RealmFlowBindings,
}

/// What a cascading removal dropped.
#[derive(Debug, Default)]
struct Removed {
    flows: usize,
    executions: usize,
    configs: usize,
}

impl RealmData {
    fn flow(&self, id: Uuid) -> Option<&AuthenticationFlow> {
        self.flows.iter().find(|f| f.id == id)
    }

    fn execution(&self, id: Uuid) -> Option<&AuthenticationExecution> {
        self.executions.iter().find(|e| e.id == id)
    }

    fn config(&self, id: Uuid) -> Option<&AuthenticatorConfig> {
        self.configs.iter().find(|c| c.id == id)
    }

    fn alias_taken(&self, alias: &str, except: Uuid) -> bool {
        self.flows.iter().any(|f| f.alias == alias && f.id != except)
    }

    fn config_alias_taken(&self, alias: &str, except: Uuid) -> bool {
        self.configs.iter().any(|c| c.alias == alias && c.id != except)
    }

    /// Whether `target` can be reached from `from` through nested sub-flows.
    fn reaches(&self, from: Uuid, target: Uuid) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(flow_id) = stack.pop() {
            if flow_id == target {
                return true;
            }
            if !seen.insert(flow_id) {
                continue;
            }
            stack.extend(
                self.executions
                    .iter()
                    .filter(|e| e.parent_flow == flow_id && e.authenticator_flow)
                    .filter_map(|e| e.flow_id),
            );
        }
        false
    }

    fn validate_execution_refs(&self, execution: &AuthenticationExecution) -> StorageResult<()> {
        if self.flow(execution.parent_flow).is_none() {
            return Err(StorageError::not_found(
                "AuthenticationFlow",
                execution.parent_flow,
            ));
        }
        if execution.authenticator_flow {
            if let Some(sub_flow) = execution.flow_id {
                if self.flow(sub_flow).is_none() {
                    return Err(StorageError::not_found("AuthenticationFlow", sub_flow));
                }
                if self.reaches(sub_flow, execution.parent_flow) {
                    return Err(StorageError::InvalidData(format!(
                        "nesting flow {sub_flow} in {} would create a cycle",
                        execution.parent_flow
                    )));
                }
            }
        }
        if let Some(config_id) = execution.authenticator_config {
            if self.config(config_id).is_none() {
                return Err(StorageError::not_found("AuthenticatorConfig", config_id));
            }
        }
        Ok(())
    }

    /// A sub-flow is owned by the doomed set when nothing outside it keeps it alive.
    fn is_owned(
        &self,
        flow_id: Uuid,
        doomed_flows: &HashSet<Uuid>,
        doomed_executions: &HashSet<Uuid>,
    ) -> bool {
        let Some(flow) = self.flow(flow_id) else {
            return false;
        };
        !flow.top_level
            && !doomed_flows.contains(&flow_id)
            && self.bindings.binding_of(flow_id).is_none()
            && self
                .executions
                .iter()
                .filter(|e| e.references_flow(flow_id))
                .all(|e| doomed_executions.contains(&e.id))
    }

    /// Removes the given flows and executions plus everything only they own.
    fn remove_cascading(&mut self, root_flows: &[Uuid], root_executions: &[Uuid]) -> Removed {
        let mut doomed_flows: HashSet<Uuid> = root_flows.iter().copied().collect();
        let mut doomed_executions: HashSet<Uuid> = root_executions.iter().copied().collect();
        let mut pending: Vec<Uuid> = root_flows.to_vec();
        let mut candidates: Vec<Uuid> = self
            .executions
            .iter()
            .filter(|e| doomed_executions.contains(&e.id) && e.authenticator_flow)
            .filter_map(|e| e.flow_id)
            .collect();

        loop {
            while let Some(flow_id) = pending.pop() {
                for execution in self.executions.iter().filter(|e| e.parent_flow == flow_id) {
                    doomed_executions.insert(execution.id);
                    if execution.authenticator_flow {
                        candidates.extend(execution.flow_id);
                    }
                }
            }

            let owned: Vec<Uuid> = candidates
                .drain(..)
                .filter(|c| self.is_owned(*c, &doomed_flows, &doomed_executions))
                .collect();
            if owned.is_empty() {
                break;
            }
            for flow_id in owned {
                if doomed_flows.insert(flow_id) {
                    pending.push(flow_id);
                }
            }
        }

        let released: HashSet<Uuid> = self
            .executions
            .iter()
            .filter(|e| doomed_executions.contains(&e.id))
            .filter_map(|e| e.authenticator_config)
            .collect();
        let still_bound: HashSet<Uuid> = self
            .executions
            .iter()
            .filter(|e| !doomed_executions.contains(&e.id))
            .filter_map(|e| e.authenticator_config)
            .collect();

        let before = (self.flows.len(), self.executions.len(), self.configs.len());
        self.flows.retain(|f| !doomed_flows.contains(&f.id));
        self.executions.retain(|e| !doomed_executions.contains(&e.id));
        self.configs
            .retain(|c| !released.contains(&c.id) || still_bound.contains(&c.id));

        Removed {
            flows: before.0 - self.flows.len(),
            executions: before.1 - self.executions.len(),
            configs: before.2 - self.configs.len(),
        }
    }
}

/// Flow definition store held in process memory.
///
/// A single lock guards all realms. Each mutator validates and applies its
/// whole change (cascades included) inside one write-lock critical section,
/// and readers clone out what they need, so no reader can observe a partial
/// mutation.
#[derive(Debug, Default)]
pub struct InMemoryAuthenticationStore {
    realms: RwLock<HashMap<Uuid, RealmData>>,
}

impl InMemoryAuthenticationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, realm_id: Uuid, f: impl FnOnce(&RealmData) -> T) -> T {
        let realms = self.realms.read();
        match realms.get(&realm_id) {
            Some(realm) => f(realm),
            None => f(&RealmData::default()),
        }
    }

    /// Mutates an existing realm.
    ///
    /// An unknown realm is handed over as an empty scratch copy that is
    /// dropped afterwards, so lookups inside `f` fail and nothing is kept.
    fn write<T>(&self, realm_id: Uuid, f: impl FnOnce(&mut RealmData) -> T) -> T {
        let mut realms = self.realms.write();
        match realms.get_mut(&realm_id) {
            Some(realm) => f(realm),
            None => f(&mut RealmData::default()),
        }
    }

    /// Mutates a realm, creating it first. Only for operations that create
    /// a root entity; the realm stays only if `f` succeeds.
    fn write_or_insert<T, E>(
        &self,
        realm_id: Uuid,
        f: impl FnOnce(&mut RealmData) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut realms = self.realms.write();
        if let Some(realm) = realms.get_mut(&realm_id) {
            return f(realm);
        }
        let mut realm = RealmData::default();
        let value = f(&mut realm)?;
        realms.insert(realm_id, realm);
        Ok(value)
    }

    #[cfg(test)]
    fn realm_count(&self) -> usize {
        self.realms.read().len()
    }
}

#[async_trait]
impl AuthenticationFlowProvider for InMemoryAuthenticationStore {
    async fn create_flow(&self, flow: &AuthenticationFlow) -> StorageResult<()> {
        self.write_or_insert(flow.realm_id, |realm| {
            if realm.alias_taken(&flow.alias, flow.id) {
                return Err(StorageError::duplicate(
                    "AuthenticationFlow",
                    "alias",
                    &flow.alias,
                ));
            }
            if realm.flow(flow.id).is_some() {
                return Err(StorageError::duplicate(
                    "AuthenticationFlow",
                    "id",
                    flow.id.to_string(),
                ));
            }
            realm.flows.push(flow.clone());
            Ok(())
        })
    }

    async fn update_flow(&self, flow: &AuthenticationFlow) -> StorageResult<()> {
        self.write(flow.realm_id, |realm| {
            if realm.alias_taken(&flow.alias, flow.id) {
                return Err(StorageError::duplicate(
                    "AuthenticationFlow",
                    "alias",
                    &flow.alias,
                ));
            }
            let existing = realm
                .flows
                .iter_mut()
                .find(|f| f.id == flow.id)
                .ok_or_else(|| StorageError::not_found("AuthenticationFlow", flow.id))?;
            *existing = flow.clone();
            Ok(())
        })
    }

    async fn remove_flow(&self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        let removed = self.write(realm_id, |realm| {
            if realm.flow(id).is_none() {
                return Err(StorageError::not_found("AuthenticationFlow", id));
            }
            if let Some(binding) = realm.bindings.binding_of(id) {
                return Err(StorageError::in_use(
                    "AuthenticationFlow",
                    id,
                    format!("bound as {binding}"),
                ));
            }
            if let Some(parent) = realm.executions.iter().find(|e| e.references_flow(id)) {
                return Err(StorageError::in_use(
                    "AuthenticationFlow",
                    id,
                    format!("nested in flow {}", parent.parent_flow),
                ));
            }
            Ok(realm.remove_cascading(&[id], &[]))
        })?;

        tracing::debug!(
            realm_id = %realm_id,
            flow_id = %id,
            flows = removed.flows,
            executions = removed.executions,
            configs = removed.configs,
            "flow removed"
        );
        Ok(())
    }

    async fn get_flow(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<AuthenticationFlow>> {
        Ok(self.read(realm_id, |realm| realm.flow(id).cloned()))
    }

    async fn get_flow_by_alias(
        &self,
        realm_id: Uuid,
        alias: &str,
    ) -> StorageResult<Option<AuthenticationFlow>> {
        Ok(self.read(realm_id, |realm| {
            realm.flows.iter().find(|f| f.alias == alias).cloned()
        }))
    }

    async fn list_flows(&self, realm_id: Uuid) -> StorageResult<Vec<AuthenticationFlow>> {
        Ok(self.read(realm_id, |realm| realm.flows.clone()))
    }

    async fn get_flow_bindings(&self, realm_id: Uuid) -> StorageResult<RealmFlowBindings> {
        Ok(self.read(realm_id, |realm| realm.bindings.clone()))
    }

    async fn set_flow_bindings(
        &self,
        realm_id: Uuid,
        bindings: &RealmFlowBindings,
    ) -> StorageResult<()> {
        self.write(realm_id, |realm| {
            for binding in kc_model::FlowBinding::ALL {
                if let Some(flow_id) = bindings.get(binding) {
                    if realm.flow(flow_id).is_none() {
                        return Err(StorageError::not_found("AuthenticationFlow", flow_id));
                    }
                }
            }
            realm.bindings = bindings.clone();
            Ok(())
        })
    }
}

#[async_trait]
impl AuthenticationExecutionProvider for InMemoryAuthenticationStore {
    async fn add_execution(&self, execution: &AuthenticationExecution) -> StorageResult<()> {
        self.write(execution.realm_id, |realm| {
            if realm.execution(execution.id).is_some() {
                return Err(StorageError::duplicate(
                    "AuthenticationExecution",
                    "id",
                    execution.id.to_string(),
                ));
            }
            realm.validate_execution_refs(execution)?;
            realm.executions.push(execution.clone());
            Ok(())
        })
    }

    async fn update_execution(&self, execution: &AuthenticationExecution) -> StorageResult<()> {
        self.write(execution.realm_id, |realm| {
            if realm.execution(execution.id).is_none() {
                return Err(StorageError::not_found(
                    "AuthenticationExecution",
                    execution.id,
                ));
            }
            realm.validate_execution_refs(execution)?;
            if let Some(existing) = realm.executions.iter_mut().find(|e| e.id == execution.id) {
                *existing = execution.clone();
            }
            Ok(())
        })
    }

    async fn update_executions(
        &self,
        realm_id: Uuid,
        executions: &[AuthenticationExecution],
    ) -> StorageResult<()> {
        self.write(realm_id, |realm| {
            for execution in executions {
                if execution.realm_id != realm_id {
                    return Err(StorageError::InvalidData(format!(
                        "execution {} belongs to realm {}",
                        execution.id, execution.realm_id
                    )));
                }
                if realm.execution(execution.id).is_none() {
                    return Err(StorageError::not_found(
                        "AuthenticationExecution",
                        execution.id,
                    ));
                }
                realm.validate_execution_refs(execution)?;
            }
            for execution in executions {
                if let Some(existing) = realm.executions.iter_mut().find(|e| e.id == execution.id) {
                    *existing = execution.clone();
                }
            }
            Ok(())
        })
    }

    async fn remove_execution(&self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        let removed = self.write(realm_id, |realm| {
            if realm.execution(id).is_none() {
                return Err(StorageError::not_found("AuthenticationExecution", id));
            }
            Ok(realm.remove_cascading(&[], &[id]))
        })?;

        tracing::debug!(
            realm_id = %realm_id,
            execution_id = %id,
            flows = removed.flows,
            configs = removed.configs,
            "execution removed"
        );
        Ok(())
    }

    async fn get_execution(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<AuthenticationExecution>> {
        Ok(self.read(realm_id, |realm| realm.execution(id).cloned()))
    }

    async fn get_executions_for_flow(
        &self,
        realm_id: Uuid,
        flow_id: Uuid,
    ) -> StorageResult<Vec<AuthenticationExecution>> {
        let mut executions: Vec<AuthenticationExecution> = self.read(realm_id, |realm| {
            realm
                .executions
                .iter()
                .filter(|e| e.parent_flow == flow_id)
                .cloned()
                .collect()
        });
        sort_by_priority(&mut executions);
        Ok(executions)
    }
}

#[async_trait]
impl AuthenticatorConfigProvider for InMemoryAuthenticationStore {
    async fn add_authenticator_config(
        &self,
        config: &AuthenticatorConfig,
        bind_to: Option<Uuid>,
    ) -> StorageResult<()> {
        self.write_or_insert(config.realm_id, |realm| {
            if realm.config_alias_taken(&config.alias, config.id) {
                return Err(StorageError::duplicate(
                    "AuthenticatorConfig",
                    "alias",
                    &config.alias,
                ));
            }
            if realm.config(config.id).is_some() {
                return Err(StorageError::duplicate(
                    "AuthenticatorConfig",
                    "id",
                    config.id.to_string(),
                ));
            }
            if let Some(execution_id) = bind_to {
                let execution = realm
                    .executions
                    .iter_mut()
                    .find(|e| e.id == execution_id)
                    .ok_or_else(|| {
                        StorageError::not_found("AuthenticationExecution", execution_id)
                    })?;
                execution.authenticator_config = Some(config.id);
            }
            realm.configs.push(config.clone());
            Ok(())
        })
    }

    async fn update_authenticator_config(&self, config: &AuthenticatorConfig) -> StorageResult<()> {
        self.write(config.realm_id, |realm| {
            if realm.config(config.id).is_none() {
                return Err(StorageError::not_found("AuthenticatorConfig", config.id));
            }
            if realm.config_alias_taken(&config.alias, config.id) {
                return Err(StorageError::duplicate(
                    "AuthenticatorConfig",
                    "alias",
                    &config.alias,
                ));
            }
            if let Some(existing) = realm.configs.iter_mut().find(|c| c.id == config.id) {
                *existing = config.clone();
            }
            Ok(())
        })
    }

    async fn remove_authenticator_config(&self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        let unbound = self.write(realm_id, |realm| {
            if realm.config(id).is_none() {
                return Err(StorageError::not_found("AuthenticatorConfig", id));
            }
            let mut unbound = 0usize;
            for execution in &mut realm.executions {
                if execution.authenticator_config == Some(id) {
                    execution.authenticator_config = None;
                    unbound += 1;
                }
            }
            realm.configs.retain(|c| c.id != id);
            Ok(unbound)
        })?;

        tracing::debug!(
            realm_id = %realm_id,
            config_id = %id,
            unbound_executions = unbound,
            "authenticator config removed"
        );
        Ok(())
    }

    async fn get_authenticator_config(
        &self,
        realm_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<AuthenticatorConfig>> {
        Ok(self.read(realm_id, |realm| realm.config(id).cloned()))
    }

    async fn get_authenticator_config_by_alias(
        &self,
        realm_id: Uuid,
        alias: &str,
    ) -> StorageResult<Option<AuthenticatorConfig>> {
        Ok(self.read(realm_id, |realm| {
            realm.configs.iter().find(|c| c.alias == alias).cloned()
        }))
    }

    async fn list_authenticator_configs(
        &self,
        realm_id: Uuid,
    ) -> StorageResult<Vec<AuthenticatorConfig>> {
        Ok(self.read(realm_id, |realm| realm.configs.clone()))
    }
}
