//! Built-in authenticator providers.
//!
//! User lookup and credential checks live outside this crate, so the leaf
//! authenticators here work purely from the attempt's form data and notes.

use std::sync::Arc;

use async_trait::async_trait;
use kc_model::{flow_types, Requirement};
use uuid::Uuid;

use crate::authenticator::{AuthContext, Authenticator, Outcome};
use crate::error::{AuthError, AuthResult};

/// Note holding the user ID of an existing SSO session.
pub const SSO_USER_NOTE: &str = "sso.user";

/// Note set by a broker login with the federated username.
pub const BROKERED_USERNAME_NOTE: &str = "brokered.username";

/// Note set when a local user already matches the brokered identity.
pub const EXISTING_USER_NOTE: &str = "existing.user";

/// Note set once a user was created during the attempt.
pub const REGISTERED_USER_NOTE: &str = "registered.new.user";

/// Note listing the required action queued for the user.
pub const REQUIRED_ACTION_NOTE: &str = "required.action";

/// Note holding the username entered on the login form.
pub const ATTEMPTED_USERNAME_NOTE: &str = "attempted.username";

/// Config key forcing a password update after broker registration.
pub const REQUIRE_PASSWORD_UPDATE: &str = "require.password.update.after.registration";

const REQUIRED_ALTERNATIVE_DISABLED: &[Requirement] = &[
    Requirement::Required,
    Requirement::Alternative,
    Requirement::Disabled,
];

const ALTERNATIVE_DISABLED: &[Requirement] = &[Requirement::Alternative, Requirement::Disabled];

const REQUIRED_ONLY: &[Requirement] = &[Requirement::Required];

/// A flow type provider.
///
/// Composite: it names the kind of a flow and is never invoked as a check.
#[derive(Debug, Clone, Copy)]
pub struct FlowType {
    id: &'static str,
    display_name: &'static str,
    help_text: &'static str,
}

impl FlowType {
    /// Generic flow of authenticators and sub-flows.
    pub const BASIC: Self = Self {
        id: flow_types::BASIC_FLOW,
        display_name: "Generic",
        help_text: "Generic flow of authenticators and sub-flows",
    };

    /// Flow whose executions render a single form.
    pub const FORM: Self = Self {
        id: flow_types::FORM_FLOW,
        display_name: "Form",
        help_text: "Flow whose executions contribute to one form",
    };

    /// Client authentication flow.
    pub const CLIENT: Self = Self {
        id: flow_types::CLIENT_FLOW,
        display_name: "Client",
        help_text: "Flow authenticating a client rather than a user",
    };
}

#[async_trait]
impl Authenticator for FlowType {
    fn id(&self) -> &'static str {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn help_text(&self) -> &'static str {
        self.help_text
    }

    fn is_composite(&self) -> bool {
        true
    }

    fn requires_user(&self) -> bool {
        false
    }

    async fn authenticate(&self, _context: &mut AuthContext) -> AuthResult<Outcome> {
        Err(AuthError::configuration(format!(
            "flow type '{}' cannot be evaluated as an authenticator",
            self.id
        )))
    }
}

/// Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAccess;

impl AllowAccess {
    /// Provider ID.
    pub const ID: &'static str = "allow-access-authenticator";
}

#[async_trait]
impl Authenticator for AllowAccess {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "Allow access"
    }

    fn help_text(&self) -> &'static str {
        "Grants access when reached"
    }

    fn requires_user(&self) -> bool {
        false
    }

    fn requirement_choices(&self) -> &'static [Requirement] {
        REQUIRED_ALTERNATIVE_DISABLED
    }

    async fn authenticate(&self, _context: &mut AuthContext) -> AuthResult<Outcome> {
        Ok(Outcome::success())
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAccess;

impl DenyAccess {
    /// Provider ID.
    pub const ID: &'static str = "deny-access-authenticator";
}

#[async_trait]
impl Authenticator for DenyAccess {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "Deny access"
    }

    fn help_text(&self) -> &'static str {
        "Denies access when reached"
    }

    fn requires_user(&self) -> bool {
        false
    }

    fn requirement_choices(&self) -> &'static [Requirement] {
        REQUIRED_ALTERNATIVE_DISABLED
    }

    async fn authenticate(&self, _context: &mut AuthContext) -> AuthResult<Outcome> {
        Ok(Outcome::failure("access denied"))
    }
}

/// Reuses an existing SSO session.
///
/// Succeeds and identifies the user when the attempt carries an
/// [`SSO_USER_NOTE`]; otherwise it does not apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieAuthenticator;

impl CookieAuthenticator {
    /// Provider ID.
    pub const ID: &'static str = "auth-cookie";
}

#[async_trait]
impl Authenticator for CookieAuthenticator {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "Cookie"
    }

    fn help_text(&self) -> &'static str {
        "Validates the SSO cookie set by the auth server"
    }

    fn requires_user(&self) -> bool {
        false
    }

    fn requirement_choices(&self) -> &'static [Requirement] {
        ALTERNATIVE_DISABLED
    }

    async fn authenticate(&self, context: &mut AuthContext) -> AuthResult<Outcome> {
        match context.note(SSO_USER_NOTE).map(Uuid::parse_str) {
            Some(Ok(user_id)) => {
                context.user_id = Some(user_id);
                Ok(Outcome::success())
            }
            Some(Err(_)) => Ok(Outcome::failure("invalid SSO session")),
            None => Ok(Outcome::attempted()),
        }
    }
}

/// Asks for a username and identifies the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameForm;

impl UsernameForm {
    /// Provider ID.
    pub const ID: &'static str = "auth-username-form";

    /// Challenge type presented to the principal.
    pub const CHALLENGE: &'static str = "login-username";

    fn identify(context: &mut AuthContext, username: String) -> Outcome {
        context.set_note(ATTEMPTED_USERNAME_NOTE, username);
        if context.user_id.is_none() {
            context.user_id = Some(Uuid::now_v7());
        }
        Outcome::success()
    }
}

#[async_trait]
impl Authenticator for UsernameForm {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "Username Form"
    }

    fn help_text(&self) -> &'static str {
        "Selects a user from their username"
    }

    fn requires_user(&self) -> bool {
        false
    }

    fn requirement_choices(&self) -> &'static [Requirement] {
        REQUIRED_ONLY
    }

    async fn authenticate(&self, context: &mut AuthContext) -> AuthResult<Outcome> {
        match context.form_value("username").filter(|u| !u.is_empty()) {
            Some(username) => {
                let username = username.to_string();
                Ok(Self::identify(context, username))
            }
            None => Ok(Outcome::challenge(Self::CHALLENGE)),
        }
    }

    async fn action(&self, context: &mut AuthContext) -> AuthResult<Outcome> {
        match context.form_value("username").map(str::trim) {
            Some(username) if !username.is_empty() => {
                let username = username.to_string();
                Ok(Self::identify(context, username))
            }
            _ => Ok(Outcome::challenge_with_data(
                Self::CHALLENGE,
                serde_json::json!({ "error": "missingUsernameMessage" }),
            )),
        }
    }
}

/// Creates a local user for a brokered identity when no user matches it.
///
/// Does not apply (`ATTEMPTED`) when a matching user already exists, which
/// lets a following alternative link the accounts instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateUserIfUnique;

impl CreateUserIfUnique {
    /// Provider ID.
    pub const ID: &'static str = "idp-create-user-if-unique";
}

#[async_trait]
impl Authenticator for CreateUserIfUnique {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "Create User If Unique"
    }

    fn help_text(&self) -> &'static str {
        "Detect if there is existing user with same email or username. If no, create new user."
    }

    fn requires_user(&self) -> bool {
        false
    }

    fn is_configurable(&self) -> bool {
        true
    }

    fn requirement_choices(&self) -> &'static [Requirement] {
        REQUIRED_ALTERNATIVE_DISABLED
    }

    async fn authenticate(&self, context: &mut AuthContext) -> AuthResult<Outcome> {
        let Some(username) = context.note(BROKERED_USERNAME_NOTE).map(str::to_string) else {
            return Ok(Outcome::failure("no brokered identity in attempt"));
        };
        if context.note(EXISTING_USER_NOTE).is_some() {
            tracing::debug!(username = %username, "brokered user is not unique");
            return Ok(Outcome::attempted());
        }

        let user_id = Uuid::now_v7();
        context.user_id = Some(user_id);
        context.set_note(REGISTERED_USER_NOTE, "true");
        if context
            .config
            .as_ref()
            .is_some_and(|c| c.get_bool(REQUIRE_PASSWORD_UPDATE, false))
        {
            context.set_note(REQUIRED_ACTION_NOTE, "UPDATE_PASSWORD");
        }
        tracing::info!(username = %username, user_id = %user_id, "created user for brokered identity");
        Ok(Outcome::success())
    }
}

/// All built-in providers.
#[must_use]
pub fn providers() -> Vec<Arc<dyn Authenticator>> {
    vec![
        Arc::new(FlowType::BASIC),
        Arc::new(FlowType::FORM),
        Arc::new(FlowType::CLIENT),
        Arc::new(AllowAccess),
        Arc::new(DenyAccess),
        Arc::new(CookieAuthenticator),
        Arc::new(UsernameForm),
        Arc::new(CreateUserIfUnique),
    ]
}
