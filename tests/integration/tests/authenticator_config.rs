//! Authenticator config integration tests.
//!
//! Exercises config management around an `idp-create-user-if-unique`
//! execution in a first broker login flow.

use kc_admin_api::dto::{AuthenticatorConfigRepresentation, CreateFlowRequest, NewExecutionRequest};
use kc_admin_api::AdminError;
use kc_auth::builtin::{
    CreateUserIfUnique, BROKERED_USERNAME_NOTE, REGISTERED_USER_NOTE, REQUIRED_ACTION_NOTE,
    REQUIRE_PASSWORD_UPDATE,
};
use kc_auth::AuthContext;
use kc_core::event::EventType;
use kc_model::{flow_types, Requirement};
use uuid::Uuid;

use crate::common::TestEnv;

/// A non-top-level first broker login flow with one create-user execution.
async fn first_broker_login(env: &TestEnv) -> anyhow::Result<(Uuid, Uuid)> {
    let flow_id = env
        .management
        .create_flow(
            env.realm_id,
            CreateFlowRequest {
                alias: "firstBrokerLogin2".to_string(),
                description: None,
                provider_id: flow_types::BASIC_FLOW.to_string(),
                top_level: false,
            },
        )
        .await?;
    let execution_id = env
        .management
        .add_execution(
            env.realm_id,
            flow_id,
            NewExecutionRequest::new(CreateUserIfUnique::ID),
        )
        .await?;
    Ok((flow_id, execution_id))
}

fn foo_config() -> AuthenticatorConfigRepresentation {
    AuthenticatorConfigRepresentation::new("foo").with_entry(REQUIRE_PASSWORD_UPDATE, "true")
}

/// Tests creating a config for an execution.
#[tokio::test]
async fn test_create_config() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (flow_id, execution_id) = first_broker_login(&env).await?;

    let execution = env.management.get_execution(env.realm_id, execution_id).await?;
    assert_eq!(execution.parent_flow, flow_id);
    assert_eq!(execution.priority, 0);

    let err = env
        .management
        .new_execution_config(env.realm_id, Uuid::now_v7(), foo_config())
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::NotFound { .. }));

    let config_id = env
        .management
        .new_execution_config(env.realm_id, execution_id, foo_config())
        .await?;

    let fetched = env
        .management
        .get_authenticator_config(env.realm_id, config_id)
        .await?;
    assert_eq!(fetched.id, Some(config_id));
    assert_eq!(fetched.alias, "foo");
    assert_eq!(fetched.config, foo_config().config);

    let execution = env.management.get_execution(env.realm_id, execution_id).await?;
    assert_eq!(execution.authenticator_config, Some(config_id));
    Ok(())
}

/// Tests updating a config, including an unknown ID.
#[tokio::test]
async fn test_update_config() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (_, execution_id) = first_broker_login(&env).await?;
    let config_id = env
        .management
        .new_execution_config(env.realm_id, execution_id, foo_config())
        .await?;

    let err = env
        .management
        .update_authenticator_config(env.realm_id, Uuid::now_v7(), foo_config())
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::NotFound { .. }));
    let unchanged = env
        .management
        .get_authenticator_config(env.realm_id, config_id)
        .await?;
    assert_eq!(unchanged.alias, "foo");
    assert_eq!(unchanged.config, foo_config().config);

    let mut update = unchanged;
    update.alias = "foo2".to_string();
    update
        .config
        .insert("configKey2".to_string(), "configValue2".to_string());
    env.management
        .update_authenticator_config(env.realm_id, config_id, update.clone())
        .await?;

    let updated = env
        .management
        .get_authenticator_config(env.realm_id, config_id)
        .await?;
    assert_eq!(updated, update);
    assert_eq!(
        updated.config.get(REQUIRE_PASSWORD_UPDATE).map(String::as_str),
        Some("true")
    );
    assert_eq!(
        updated.config.get("configKey2").map(String::as_str),
        Some("configValue2")
    );
    Ok(())
}

/// Tests removing a config, including an unknown ID.
#[tokio::test]
async fn test_remove_config() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let (_, execution_id) = first_broker_login(&env).await?;
    let config_id = env
        .management
        .new_execution_config(env.realm_id, execution_id, foo_config())
        .await?;

    let err = env
        .management
        .remove_authenticator_config(env.realm_id, Uuid::now_v7())
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::NotFound { .. }));

    env.management
        .remove_authenticator_config(env.realm_id, config_id)
        .await?;

    let execution = env.management.get_execution(env.realm_id, execution_id).await?;
    assert_eq!(execution.authenticator_config, None);
    let err = env
        .management
        .get_authenticator_config(env.realm_id, config_id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);

    assert_eq!(
        env.events.event_types(),
        [
            EventType::FlowCreated,
            EventType::ExecutionCreated,
            EventType::AuthenticatorConfigCreated,
            EventType::AuthenticatorConfigDeleted,
        ]
    );
    Ok(())
}

/// Tests that the engine reads the bound config on the next attempt.
#[tokio::test]
async fn test_config_drives_authenticator() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let flow_id = env.create_flow("broker login").await?;
    let execution_id = env
        .add_authenticator(flow_id, CreateUserIfUnique::ID, Requirement::Required)
        .await?;
    let config_id = env
        .management
        .new_execution_config(env.realm_id, execution_id, foo_config())
        .await?;

    let mut context = AuthContext::new(env.realm_id).with_note(BROKERED_USERNAME_NOTE, "alice");
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;
    assert!(result.is_success());
    assert!(result.user_id.is_some());
    assert_eq!(context.note(REGISTERED_USER_NOTE), Some("true"));
    assert_eq!(context.note(REQUIRED_ACTION_NOTE), Some("UPDATE_PASSWORD"));

    env.management
        .remove_authenticator_config(env.realm_id, config_id)
        .await?;

    let mut context = AuthContext::new(env.realm_id).with_note(BROKERED_USERNAME_NOTE, "bob");
    let result = env.engine.evaluate_flow(env.realm_id, flow_id, &mut context).await?;
    assert!(result.is_success());
    assert_eq!(context.note(REQUIRED_ACTION_NOTE), None);
    Ok(())
}
