//! Flow execution engine.
//!
//! Evaluates a flow tree against an authentication attempt. Each flow
//! partitions its enabled executions into REQUIRED, ALTERNATIVE and
//! OPTIONAL groups (keeping sibling order) and resolves them in that
//! order:
//!
//! - every REQUIRED execution must succeed; ATTEMPTED counts as FAILURE and
//!   the first FAILURE ends the flow without invoking the rest
//! - if there are ALTERNATIVE executions, the first SUCCESS decides the flow
//!   and the flow fails when none succeeds
//! - OPTIONAL executions run only when there is no ALTERNATIVE group and
//!   never fail the flow
//!
//! A flow with nothing enabled succeeds. Sub-flows are evaluated the same
//! way and fold into their parent like a single execution. A CHALLENGE
//! anywhere suspends the attempt; the returned [`ResumeCursor`] records
//! every decision made so far so that [`FlowEngine::resume`] never invokes
//! a decided execution twice.
//!
//! The engine reads the store on every evaluation and caches nothing.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use kc_core::event::{Event, EventType};
use kc_core::EngineConfig;
use kc_model::{AuthenticationExecution, AuthenticationFlow, AuthenticatorConfig, ExecutionTarget};
use kc_storage::AuthenticationStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authenticator::{AuthContext, Authenticator, Challenge, Outcome};
use crate::cursor::{ExecutionStatus, FlowFrame, ResumeCursor};
use crate::error::{AuthError, AuthResult};
use crate::registry::AuthenticatorRegistry;

/// Overall result of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// The principal is authenticated.
    Success,
    /// The principal was rejected.
    Failure,
    /// The attempt waits for a challenge response.
    Challenge,
}

/// What the engine hands back to the caller.
#[derive(Debug, Clone)]
pub struct EngineResult {
    /// Verdict.
    pub verdict: Verdict,
    /// Challenge to present, when suspended.
    pub pending_challenge: Option<Challenge>,
    /// Cursor to resume with, when suspended.
    pub resume_cursor: Option<ResumeCursor>,
    /// User identified by the flow so far.
    pub user_id: Option<Uuid>,
}

impl EngineResult {
    /// Checks for a success verdict.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.verdict, Verdict::Success)
    }

    /// Checks for a failure verdict.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.verdict, Verdict::Failure)
    }

    /// Checks for a pending challenge.
    #[must_use]
    pub const fn is_challenge(&self) -> bool {
        matches!(self.verdict, Verdict::Challenge)
    }
}

/// Result of evaluating one execution or flow.
enum Step {
    Decided(ExecutionStatus),
    Suspended(Suspension),
}

/// A challenge on its way up, collecting one frame per flow (innermost first).
struct Suspension {
    challenge: Challenge,
    frames: Vec<FlowFrame>,
}

/// Resolves flows against the store and the authenticator registry.
pub struct FlowEngine<S> {
    store: Arc<S>,
    registry: Arc<AuthenticatorRegistry>,
    config: EngineConfig,
}

impl<S> std::fmt::Debug for FlowEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: AuthenticationStore + 'static> FlowEngine<S> {
    /// Creates an engine with default settings.
    #[must_use]
    pub fn new(store: Arc<S>, registry: Arc<AuthenticatorRegistry>) -> Self {
        Self {
            store,
            registry,
            config: EngineConfig::default(),
        }
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the authenticator registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<AuthenticatorRegistry> {
        &self.registry
    }

    /// Evaluates a flow from the start.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Configuration` when the flow tree cannot be
    /// evaluated as stored, and `AuthError::Storage` when the store fails.
    /// A rejected principal is a [`Verdict::Failure`], not an error.
    pub async fn evaluate_flow(
        &self,
        realm_id: Uuid,
        flow_id: Uuid,
        context: &mut AuthContext,
    ) -> AuthResult<EngineResult> {
        context.realm_id = realm_id;
        tracing::debug!(
            realm_id = %realm_id,
            flow_id = %flow_id,
            attempt_id = %context.attempt_id,
            "evaluating flow"
        );
        let step = self.evaluate(context, flow_id, 0, &[]).await;
        self.finish(context, flow_id, step)
    }

    /// Continues a suspended attempt with the principal's response.
    ///
    /// The response becomes the attempt's form data. Executions decided
    /// before the suspension are not invoked again; the challenged
    /// authenticator receives the response through
    /// [`Authenticator::action`].
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::InvalidCursor` for a cursor that does not
    /// describe its flow, and `AuthError::Configuration` when the suspended
    /// execution or its bound config has since been removed.
    pub async fn resume(
        &self,
        cursor: &ResumeCursor,
        response: HashMap<String, String>,
    ) -> AuthResult<EngineResult> {
        match cursor.frames.first() {
            None => return Err(AuthError::InvalidCursor("cursor has no frames".to_string())),
            Some(root) if root.flow_id != cursor.flow_id => {
                return Err(AuthError::InvalidCursor(format!(
                    "root frame is for flow {}, cursor is for flow {}",
                    root.flow_id, cursor.flow_id
                )));
            }
            Some(_) => {}
        }

        let mut context = AuthContext {
            realm_id: cursor.realm_id,
            attempt_id: cursor.attempt_id,
            execution_id: None,
            config: None,
            user_id: cursor.user_id,
            form_data: response,
            notes: cursor.notes.clone(),
        };
        tracing::debug!(
            realm_id = %cursor.realm_id,
            flow_id = %cursor.flow_id,
            attempt_id = %cursor.attempt_id,
            depth = cursor.frames.len(),
            "resuming flow"
        );
        let step = self
            .evaluate(&mut context, cursor.flow_id, 0, &cursor.frames)
            .await;
        self.finish(&context, cursor.flow_id, step)
    }

    fn finish(
        &self,
        context: &AuthContext,
        flow_id: Uuid,
        step: AuthResult<Step>,
    ) -> AuthResult<EngineResult> {
        let event = |event_type: EventType| {
            let builder = Event::builder(event_type)
                .realm(context.realm_id)
                .attempt(context.attempt_id)
                .detail("flow_id", flow_id.to_string());
            match context.user_id {
                Some(user_id) => builder.user(user_id),
                None => builder,
            }
        };

        let step = match step {
            Ok(step) => step,
            Err(err) => {
                tracing::error!(
                    flow_id = %flow_id,
                    attempt_id = %context.attempt_id,
                    error = %err,
                    "flow could not be evaluated"
                );
                record(&event(EventType::LoginError).failure(err.to_string()).build());
                return Err(err);
            }
        };

        let result = match step {
            Step::Decided(ExecutionStatus::Success) => {
                record(&event(EventType::Login).success().build());
                EngineResult {
                    verdict: Verdict::Success,
                    pending_challenge: None,
                    resume_cursor: None,
                    user_id: context.user_id,
                }
            }
            Step::Decided(_) => {
                record(
                    &event(EventType::LoginError)
                        .failure("authentication failed")
                        .build(),
                );
                EngineResult {
                    verdict: Verdict::Failure,
                    pending_challenge: None,
                    resume_cursor: None,
                    user_id: context.user_id,
                }
            }
            Step::Suspended(Suspension { challenge, mut frames }) => {
                frames.reverse();
                record(
                    &event(EventType::LoginChallenge)
                        .detail("challenge", challenge.challenge_type.clone())
                        .build(),
                );
                EngineResult {
                    verdict: Verdict::Challenge,
                    pending_challenge: Some(challenge),
                    resume_cursor: Some(ResumeCursor {
                        attempt_id: context.attempt_id,
                        realm_id: context.realm_id,
                        flow_id,
                        frames,
                        user_id: context.user_id,
                        notes: context.notes.clone(),
                    }),
                    user_id: context.user_id,
                }
            }
        };
        Ok(result)
    }

    /// Evaluates one flow. `replay` starts with this flow's frame when resuming.
    fn evaluate<'a>(
        &'a self,
        context: &'a mut AuthContext,
        flow_id: Uuid,
        depth: usize,
        replay: &'a [FlowFrame],
    ) -> BoxFuture<'a, AuthResult<Step>> {
        Box::pin(async move {
            let realm_id = context.realm_id;
            let flow = self
                .store
                .get_flow(realm_id, flow_id)
                .await?
                .ok_or_else(|| AuthError::configuration(format!("flow {flow_id} does not exist")))?;
            self.check_flow_type(&flow)?;
            let executions = self.store.get_executions_for_flow(realm_id, flow_id).await?;

            if let Some(frame) = replay.first() {
                if frame.flow_id != flow_id {
                    return Err(AuthError::InvalidCursor(format!(
                        "expected a frame for flow {flow_id}, found {}",
                        frame.flow_id
                    )));
                }
                self.check_suspension(realm_id, frame, &executions).await?;
            }

            let required = group(&executions, AuthenticationExecution::is_required);
            let alternative = group(&executions, AuthenticationExecution::is_alternative);
            let optional = group(&executions, AuthenticationExecution::is_optional);

            let mut decided: Vec<(Uuid, ExecutionStatus)> = Vec::new();

            for (index, execution) in required {
                match self.step(context, execution, depth, replay).await? {
                    Step::Suspended(s) => return Ok(suspend(s, flow_id, decided, execution, index)),
                    Step::Decided(status) => {
                        decided.push((execution.id, status));
                        if status != ExecutionStatus::Success {
                            tracing::debug!(
                                flow = %flow.alias,
                                execution_id = %execution.id,
                                status = ?status,
                                "required execution did not succeed"
                            );
                            return Ok(Step::Decided(ExecutionStatus::Failure));
                        }
                    }
                }
            }

            if !alternative.is_empty() {
                for (index, execution) in alternative {
                    match self.step(context, execution, depth, replay).await? {
                        Step::Suspended(s) => {
                            return Ok(suspend(s, flow_id, decided, execution, index))
                        }
                        Step::Decided(status) => {
                            decided.push((execution.id, status));
                            if status == ExecutionStatus::Success {
                                return Ok(Step::Decided(ExecutionStatus::Success));
                            }
                        }
                    }
                }
                tracing::debug!(flow = %flow.alias, "no alternative succeeded");
                return Ok(Step::Decided(ExecutionStatus::Failure));
            }

            for (index, execution) in optional {
                match self.step(context, execution, depth, replay).await? {
                    Step::Suspended(s) => return Ok(suspend(s, flow_id, decided, execution, index)),
                    Step::Decided(status) => decided.push((execution.id, status)),
                }
            }

            Ok(Step::Decided(ExecutionStatus::Success))
        })
    }

    /// Replays, resumes or invokes one execution.
    async fn step(
        &self,
        context: &mut AuthContext,
        execution: &AuthenticationExecution,
        depth: usize,
        replay: &[FlowFrame],
    ) -> AuthResult<Step> {
        if let Some(frame) = replay.first() {
            if let Some(status) = frame.status_of(execution.id) {
                return Ok(Step::Decided(status));
            }
            if frame.suspended_execution == execution.id {
                return self.resume_execution(context, execution, depth, replay).await;
            }
        }
        self.invoke(context, execution, depth).await
    }

    async fn invoke(
        &self,
        context: &mut AuthContext,
        execution: &AuthenticationExecution,
        depth: usize,
    ) -> AuthResult<Step> {
        match execution.target() {
            None => Err(missing_target(execution)),
            Some(ExecutionTarget::Flow(sub_flow)) => {
                self.check_depth(depth + 1)?;
                self.evaluate(context, sub_flow, depth + 1, &[]).await
            }
            Some(ExecutionTarget::Authenticator(provider_id)) => {
                let authenticator = self.resolve_leaf(execution, provider_id)?;
                let config = self.bound_config(context.realm_id, execution).await?;
                if authenticator.requires_user() && context.user_id.is_none() {
                    tracing::debug!(
                        execution_id = %execution.id,
                        provider_id,
                        "no user identified, skipping authenticator"
                    );
                    return Ok(Step::Decided(ExecutionStatus::Attempted));
                }

                context.execution_id = Some(execution.id);
                context.config = config;
                let outcome = authenticator.authenticate(context).await;
                context.config = None;
                Ok(fold(execution, provider_id, outcome?))
            }
        }
    }

    async fn resume_execution(
        &self,
        context: &mut AuthContext,
        execution: &AuthenticationExecution,
        depth: usize,
        replay: &[FlowFrame],
    ) -> AuthResult<Step> {
        let nested = replay.get(1..).unwrap_or(&[]);
        match execution.target() {
            None => Err(missing_target(execution)),
            Some(ExecutionTarget::Flow(sub_flow)) => {
                if nested.is_empty() {
                    return Err(AuthError::InvalidCursor(format!(
                        "no frame for sub-flow {sub_flow} of execution {}",
                        execution.id
                    )));
                }
                self.check_depth(depth + 1)?;
                self.evaluate(context, sub_flow, depth + 1, nested).await
            }
            Some(ExecutionTarget::Authenticator(provider_id)) => {
                if !nested.is_empty() {
                    return Err(AuthError::InvalidCursor(format!(
                        "execution {} is not a sub-flow",
                        execution.id
                    )));
                }
                let authenticator = self.resolve_leaf(execution, provider_id)?;
                let config = self.bound_config(context.realm_id, execution).await?;

                context.execution_id = Some(execution.id);
                context.config = config;
                let outcome = authenticator.action(context).await;
                context.config = None;
                Ok(fold(execution, provider_id, outcome?))
            }
        }
    }

    /// Verifies that the frame's suspension point still exists as recorded.
    async fn check_suspension(
        &self,
        realm_id: Uuid,
        frame: &FlowFrame,
        executions: &[AuthenticationExecution],
    ) -> AuthResult<()> {
        let Some(suspended) = executions
            .iter()
            .find(|e| e.id == frame.suspended_execution)
        else {
            return Err(AuthError::configuration(format!(
                "suspended execution {} no longer exists in flow {}",
                frame.suspended_execution, frame.flow_id
            )));
        };

        if let Some(config_id) = frame.config_id {
            let still_bound = suspended.authenticator_config == Some(config_id)
                && self
                    .store
                    .get_authenticator_config(realm_id, config_id)
                    .await?
                    .is_some();
            if !still_bound {
                return Err(AuthError::configuration(format!(
                    "config {config_id} of suspended execution {} was removed",
                    suspended.id
                )));
            }
        }
        Ok(())
    }

    fn check_flow_type(&self, flow: &AuthenticationFlow) -> AuthResult<()> {
        match self.registry.get(&flow.provider_id) {
            Some(provider) if provider.is_composite() => Ok(()),
            Some(_) => Err(AuthError::configuration(format!(
                "flow '{}' uses authenticator '{}' as its flow type",
                flow.alias, flow.provider_id
            ))),
            None => Err(AuthError::configuration(format!(
                "flow '{}' has unknown flow type '{}'",
                flow.alias, flow.provider_id
            ))),
        }
    }

    fn check_depth(&self, depth: usize) -> AuthResult<()> {
        if depth > self.config.max_flow_depth {
            return Err(AuthError::configuration(format!(
                "flows nested deeper than {}",
                self.config.max_flow_depth
            )));
        }
        Ok(())
    }

    fn resolve_leaf(
        &self,
        execution: &AuthenticationExecution,
        provider_id: &str,
    ) -> AuthResult<Arc<dyn Authenticator>> {
        match self.registry.get(provider_id) {
            Some(provider) if provider.is_composite() => Err(AuthError::configuration(format!(
                "execution {} uses flow type '{provider_id}' as an authenticator",
                execution.id
            ))),
            Some(provider) => Ok(provider),
            None => Err(AuthError::configuration(format!(
                "execution {} references unknown authenticator '{provider_id}'",
                execution.id
            ))),
        }
    }

    async fn bound_config(
        &self,
        realm_id: Uuid,
        execution: &AuthenticationExecution,
    ) -> AuthResult<Option<AuthenticatorConfig>> {
        let Some(config_id) = execution.authenticator_config else {
            return Ok(None);
        };
        self.store
            .get_authenticator_config(realm_id, config_id)
            .await?
            .map(Some)
            .ok_or_else(|| {
                AuthError::configuration(format!(
                    "execution {} is bound to missing config {config_id}",
                    execution.id
                ))
            })
    }
}

/// Executions matching `pred`, with their position among all siblings.
fn group(
    executions: &[AuthenticationExecution],
    pred: fn(&AuthenticationExecution) -> bool,
) -> Vec<(usize, &AuthenticationExecution)> {
    executions
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e))
        .collect()
}

fn missing_target(execution: &AuthenticationExecution) -> AuthError {
    AuthError::configuration(format!(
        "execution {} has neither an authenticator nor a flow",
        execution.id
    ))
}

fn fold(execution: &AuthenticationExecution, provider_id: &str, outcome: Outcome) -> Step {
    match outcome {
        Outcome::Success => Step::Decided(ExecutionStatus::Success),
        Outcome::Failure { message } => {
            tracing::debug!(
                execution_id = %execution.id,
                provider_id,
                message = %message,
                "authenticator rejected attempt"
            );
            Step::Decided(ExecutionStatus::Failure)
        }
        Outcome::Attempted => Step::Decided(ExecutionStatus::Attempted),
        Outcome::Challenge(challenge) => Step::Suspended(Suspension {
            challenge,
            frames: Vec::new(),
        }),
    }
}

fn suspend(
    mut suspension: Suspension,
    flow_id: Uuid,
    decided: Vec<(Uuid, ExecutionStatus)>,
    execution: &AuthenticationExecution,
    index: usize,
) -> Step {
    suspension.frames.push(FlowFrame {
        flow_id,
        decided,
        suspended_execution: execution.id,
        index,
        config_id: execution.authenticator_config,
    });
    Step::Suspended(suspension)
}

fn record(event: &Event) {
    tracing::info!(
        event_id = %event.id,
        event_type = ?event.event_type,
        outcome = ?event.outcome,
        realm_id = ?event.realm_id,
        user_id = ?event.user_id,
        attempt_id = ?event.attempt_id,
        error = ?event.error,
        "authentication event"
    );
}
