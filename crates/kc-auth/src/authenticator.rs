//! Authenticator trait and outcomes.
//!
//! Authenticators are pluggable checks that the flow engine invokes for
//! leaf executions. Flow types (basic, form, client) implement the same
//! trait as composites; the engine never invokes them directly.

use std::collections::HashMap;

use async_trait::async_trait;
use kc_model::{AuthenticatorConfig, Requirement};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthResult;

/// A request for more input from the principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// What is being asked for (e.g. "login-username").
    pub challenge_type: String,
    /// Data needed to render the challenge.
    pub data: Option<serde_json::Value>,
}

/// Result of one authenticator invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The check passed.
    Success,
    /// The check rejected the principal.
    Failure {
        /// Why.
        message: String,
    },
    /// The check did not apply to this attempt.
    Attempted,
    /// The check needs a response before it can decide.
    Challenge(Challenge),
}

impl Outcome {
    /// Creates a success outcome.
    #[must_use]
    pub const fn success() -> Self {
        Self::Success
    }

    /// Creates a failure outcome.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Creates an attempted outcome.
    #[must_use]
    pub const fn attempted() -> Self {
        Self::Attempted
    }

    /// Creates a challenge outcome.
    #[must_use]
    pub fn challenge(challenge_type: impl Into<String>) -> Self {
        Self::Challenge(Challenge {
            challenge_type: challenge_type.into(),
            data: None,
        })
    }

    /// Creates a challenge outcome with data.
    #[must_use]
    pub fn challenge_with_data(challenge_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Challenge(Challenge {
            challenge_type: challenge_type.into(),
            data: Some(data),
        })
    }

    /// Checks if this is a success outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Checks if this is a failure outcome.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Checks if this is a challenge outcome.
    #[must_use]
    pub const fn is_challenge(&self) -> bool {
        matches!(self, Self::Challenge(_))
    }
}

/// Per-attempt state handed to authenticators.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Realm ID.
    pub realm_id: Uuid,
    /// Authentication attempt ID.
    pub attempt_id: Uuid,
    /// Execution currently being evaluated.
    pub execution_id: Option<Uuid>,
    /// Config bound to the current execution.
    pub config: Option<AuthenticatorConfig>,
    /// Identified user, if any.
    pub user_id: Option<Uuid>,
    /// Form data from the request.
    pub form_data: HashMap<String, String>,
    /// Attempt notes, carried across challenges.
    pub notes: HashMap<String, String>,
}

impl AuthContext {
    /// Creates a context for a new attempt.
    #[must_use]
    pub fn new(realm_id: Uuid) -> Self {
        Self {
            realm_id,
            attempt_id: Uuid::now_v7(),
            execution_id: None,
            config: None,
            user_id: None,
            form_data: HashMap::new(),
            notes: HashMap::new(),
        }
    }

    /// Sets the user ID.
    #[must_use]
    pub const fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Adds a form value.
    #[must_use]
    pub fn with_form_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    /// Adds a note.
    #[must_use]
    pub fn with_note(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }

    /// Gets a form value.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form_data.get(key).map(String::as_str)
    }

    /// Gets a note value.
    #[must_use]
    pub fn note(&self, key: &str) -> Option<&str> {
        self.notes.get(key).map(String::as_str)
    }

    /// Sets a note value.
    pub fn set_note(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.notes.insert(key.into(), value.into());
    }

    /// Gets a setting from the bound config.
    #[must_use]
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.get(key))
    }
}

/// Authenticator capability contract.
///
/// Registered by provider ID in the [`AuthenticatorRegistry`](crate::AuthenticatorRegistry).
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &'static str;

    /// Returns the display name.
    fn display_name(&self) -> &'static str;

    /// Returns a short description for administrators.
    fn help_text(&self) -> &'static str {
        ""
    }

    /// Checks if this provider is a flow type rather than a leaf check.
    fn is_composite(&self) -> bool {
        false
    }

    /// Checks if this authenticator needs an identified user.
    ///
    /// When it does and the attempt has none, the engine skips it with
    /// [`Outcome::Attempted`].
    fn requires_user(&self) -> bool {
        true
    }

    /// Checks if this authenticator reads a bound config.
    fn is_configurable(&self) -> bool {
        false
    }

    /// Requirements an execution of this provider may be set to.
    fn requirement_choices(&self) -> &'static [Requirement] {
        &Requirement::ALL
    }

    /// Evaluates the check.
    ///
    /// Called when the execution is first reached.
    async fn authenticate(&self, context: &mut AuthContext) -> AuthResult<Outcome>;

    /// Handles a challenge response.
    ///
    /// Called when an attempt suspended on this authenticator is resumed.
    async fn action(&self, context: &mut AuthContext) -> AuthResult<Outcome> {
        self.authenticate(context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_predicates() {
        assert!(Outcome::success().is_success());
        assert!(Outcome::failure("bad password").is_failure());
        assert!(!Outcome::attempted().is_failure());
        assert!(Outcome::challenge("otp").is_challenge());
    }

    #[test]
    fn challenge_serializes_camel_case() {
        let Outcome::Challenge(challenge) =
            Outcome::challenge_with_data("login-username", serde_json::json!({"attempts": 1}))
        else {
            panic!("expected challenge");
        };

        let json = serde_json::to_value(&challenge).unwrap();
        assert_eq!(json["challengeType"], "login-username");
        assert_eq!(json["data"]["attempts"], 1);
    }

    #[test]
    fn auth_context_notes_and_config() {
        let realm_id = Uuid::now_v7();
        let mut context = AuthContext::new(realm_id).with_form_value("username", "alice");

        context.set_note("key", "value");
        assert_eq!(context.note("key"), Some("value"));
        assert_eq!(context.note("missing"), None);
        assert_eq!(context.form_value("username"), Some("alice"));

        assert_eq!(context.config_value("k"), None);
        context.config = Some(AuthenticatorConfig::new(realm_id, "cfg").with_entry("k", "v"));
        assert_eq!(context.config_value("k"), Some("v"));
    }
}
