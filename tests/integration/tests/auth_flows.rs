//! Authentication flow integration tests.
//!
//! Flows are built through the management service and evaluated by the
//! engine over the same store.

use std::collections::HashMap;

use kc_admin_api::dto::{AuthenticatorConfigRepresentation, CopyFlowRequest};
use kc_auth::builtin::{
    AllowAccess, CookieAuthenticator, DenyAccess, UsernameForm, ATTEMPTED_USERNAME_NOTE,
    SSO_USER_NOTE,
};
use kc_auth::{AuthContext, ResumeCursor, Verdict};
use kc_model::{AuthenticatorConfig, Requirement};
use kc_storage::AuthenticatorConfigProvider;
use uuid::Uuid;

use crate::common::TestEnv;

/// Builds the usual browser flow: cookie, or a forms sub-flow asking for a
/// username.
async fn browser_flow(env: &TestEnv) -> anyhow::Result<(Uuid, Uuid)> {
    let flow_id = env.create_flow("browser").await?;
    env.add_authenticator(flow_id, CookieAuthenticator::ID, Requirement::Alternative)
        .await?;
    let forms = env
        .add_sub_flow(flow_id, "browser forms", Requirement::Alternative)
        .await?;
    let username = env
        .add_authenticator(forms, UsernameForm::ID, Requirement::Required)
        .await?;
    Ok((flow_id, username))
}

fn username_response(username: &str) -> HashMap<String, String> {
    HashMap::from([("username".to_string(), username.to_string())])
}

/// Tests that an SSO session short-circuits the login forms.
#[tokio::test]
async fn test_sso_session_skips_forms() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (flow_id, _) = browser_flow(&env).await?;
    let user_id = Uuid::now_v7();

    let mut context = AuthContext::new(env.realm_id).with_note(SSO_USER_NOTE, user_id.to_string());
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;

    assert!(result.is_success());
    assert_eq!(result.user_id, Some(user_id));
    assert!(result.pending_challenge.is_none());
    assert!(context.note(ATTEMPTED_USERNAME_NOTE).is_none());
    Ok(())
}

/// Tests a challenge suspended in a sub-flow and resumed from a serialized cursor.
#[tokio::test]
async fn test_challenge_and_resume() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (flow_id, username_execution) = browser_flow(&env).await?;

    let mut context = AuthContext::new(env.realm_id);
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;

    assert_eq!(result.verdict, Verdict::Challenge);
    let challenge = result.pending_challenge.expect("challenge");
    assert_eq!(challenge.challenge_type, UsernameForm::CHALLENGE);
    let cursor = result.resume_cursor.expect("cursor");
    assert_eq!(cursor.challenged_execution(), Some(username_execution));

    // The cursor survives a trip through another process.
    let cursor: ResumeCursor = serde_json::from_str(&serde_json::to_string(&cursor)?)?;

    // An empty answer re-challenges.
    let result = env.engine.resume(&cursor, username_response("")).await?;
    assert!(result.is_challenge());
    let cursor = result.resume_cursor.expect("cursor");

    let result = env.engine.resume(&cursor, username_response("alice")).await?;
    assert!(result.is_success());
    assert!(result.user_id.is_some());
    Ok(())
}

/// Tests that a required failure fails the flow without raising an error.
#[tokio::test]
async fn test_required_failure_is_a_verdict() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let flow_id = env.create_flow("locked").await?;
    env.add_authenticator(flow_id, AllowAccess::ID, Requirement::Required)
        .await?;
    env.add_authenticator(flow_id, DenyAccess::ID, Requirement::Required)
        .await?;

    let mut context = AuthContext::new(env.realm_id);
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;

    assert!(result.is_failure());
    assert!(result.resume_cursor.is_none());
    Ok(())
}

/// Tests that disabling an execution through the management API takes
/// effect on the next evaluation.
#[tokio::test]
async fn test_requirement_change_applies_to_next_attempt() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let flow_id = env.create_flow("gate").await?;
    env.add_authenticator(flow_id, AllowAccess::ID, Requirement::Required)
        .await?;
    let deny = env
        .add_authenticator(flow_id, DenyAccess::ID, Requirement::Required)
        .await?;

    let mut context = AuthContext::new(env.realm_id);
    assert!(env
        .engine
        .evaluate_flow(env.realm_id, flow_id, &mut context)
        .await?
        .is_failure());

    env.management
        .update_execution_requirement(env.realm_id, deny, Requirement::Disabled)
        .await?;

    let mut context = AuthContext::new(env.realm_id);
    assert!(env
        .engine
        .evaluate_flow(env.realm_id, flow_id, &mut context)
        .await?
        .is_success());
    Ok(())
}

/// Tests that removing the challenged execution breaks the suspended attempt.
#[tokio::test]
async fn test_resume_after_execution_removed() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (flow_id, username_execution) = browser_flow(&env).await?;

    let mut context = AuthContext::new(env.realm_id);
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;
    let cursor = result.resume_cursor.expect("cursor");

    env.management
        .remove_execution(env.realm_id, username_execution)
        .await?;

    let err = env
        .engine
        .resume(&cursor, username_response("alice"))
        .await
        .unwrap_err();
    assert!(err.is_configuration_error());
    Ok(())
}

/// Tests that removing the challenged execution's config breaks the
/// suspended attempt.
#[tokio::test]
async fn test_resume_after_config_removed() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (flow_id, username_execution) = browser_flow(&env).await?;
    // The username form reads no config, so bind one through the store.
    let config = AuthenticatorConfig::new(env.realm_id, "username hints");
    env.store
        .add_authenticator_config(&config, Some(username_execution))
        .await?;

    let mut context = AuthContext::new(env.realm_id);
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;
    let cursor = result.resume_cursor.expect("cursor");

    env.management
        .remove_authenticator_config(env.realm_id, config.id)
        .await?;

    let err = env
        .engine
        .resume(&cursor, username_response("alice"))
        .await
        .unwrap_err();
    assert!(err.is_configuration_error());
    Ok(())
}

/// Tests that the management API refuses to configure the username form.
#[tokio::test]
async fn test_unconfigurable_authenticator() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (_, username_execution) = browser_flow(&env).await?;

    let result = env
        .management
        .new_execution_config(
            env.realm_id,
            username_execution,
            AuthenticatorConfigRepresentation::new("hints"),
        )
        .await;
    assert!(result.is_err());
    Ok(())
}

/// Tests that a copied flow evaluates like its source.
#[tokio::test]
async fn test_copied_flow_evaluates_like_source() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (flow_id, _) = browser_flow(&env).await?;
    let copy_id = env
        .management
        .copy_flow(
            env.realm_id,
            flow_id,
            CopyFlowRequest {
                new_name: "browser copy".to_string(),
            },
        )
        .await?;

    let mut context = AuthContext::new(env.realm_id);
    let result = env.engine.evaluate_flow(env.realm_id, copy_id, &mut context).await?;
    assert!(result.is_challenge());

    let cursor = result.resume_cursor.expect("cursor");
    assert_eq!(cursor.flow_id, copy_id);
    let result = env.engine.resume(&cursor, username_response("bob")).await?;
    assert!(result.is_success());
    Ok(())
}
