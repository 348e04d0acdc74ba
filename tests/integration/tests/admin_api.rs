//! Admin API integration tests.
//!
//! Drives the authentication router in-process with `tower::ServiceExt`.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use kc_auth::builtin::{CookieAuthenticator, CreateUserIfUnique, UsernameForm};
use kc_auth::AuthContext;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::TestEnv;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> anyhow::Result<Response<Body>> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |v| Body::from(v.to_string())))?;
    Ok(app.clone().oneshot(request).await?)
}

async fn json_body(response: Response<Body>) -> anyhow::Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

fn location(response: &Response<Body>) -> anyhow::Result<String> {
    let header = response
        .headers()
        .get("Location")
        .ok_or_else(|| anyhow::anyhow!("missing Location header"))?;
    Ok(header.to_str()?.to_string())
}

fn id_of(location: &str) -> anyhow::Result<Uuid> {
    let id = location
        .rsplit('/')
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty location"))?;
    Ok(id.parse()?)
}

/// Tests the config lifecycle over HTTP.
#[tokio::test]
async fn test_config_lifecycle_over_http() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router();
    let base = env.base_path();

    let response = send(
        &app,
        "POST",
        &format!("{base}/flows"),
        Some(json!({"alias": "firstBrokerLogin2", "topLevel": false})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let flow = location(&response)?;

    let response = send(
        &app,
        "POST",
        &format!("{flow}/executions/execution"),
        Some(json!({"provider": CreateUserIfUnique::ID})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let execution = location(&response)?;

    let config_body = json!({
        "alias": "foo",
        "config": {"require.password.update.after.registration": "true"}
    });
    let response = send(
        &app,
        "POST",
        &format!("{base}/executions/{}/config", Uuid::now_v7()),
        Some(config_body.clone()),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "POST", &format!("{execution}/config"), Some(config_body)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let config = location(&response)?;

    let response = send(
        &app,
        "PUT",
        &config,
        Some(json!({
            "alias": "foo2",
            "config": {
                "require.password.update.after.registration": "true",
                "configKey2": "configValue2"
            }
        })),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(send(&app, "GET", &config, None).await?).await?;
    assert_eq!(body["alias"], "foo2");
    assert_eq!(body["config"]["configKey2"], "configValue2");
    assert_eq!(body["config"]["require.password.update.after.registration"], "true");

    let response = send(&app, "DELETE", &config, None).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(send(&app, "GET", &execution, None).await?).await?;
    assert!(body.get("authenticatorConfig").is_none());
    let response = send(&app, "GET", &config, None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

/// Tests building a flow over HTTP and running it.
#[tokio::test]
async fn test_flow_built_over_http_runs() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router();
    let base = env.base_path();

    let flow = location(
        &send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "my browser"}))).await?,
    )?;
    send(
        &app,
        "POST",
        &format!("{flow}/executions/execution"),
        Some(json!({"provider": CookieAuthenticator::ID, "requirement": "ALTERNATIVE"})),
    )
    .await?;
    let forms = location(
        &send(
            &app,
            "POST",
            &format!("{flow}/executions/flow"),
            Some(json!({"alias": "my browser forms", "requirement": "ALTERNATIVE"})),
        )
        .await?,
    )?;
    let response = send(
        &app,
        "POST",
        &format!("{forms}/executions/execution"),
        Some(json!({"provider": UsernameForm::ID, "requirement": "REQUIRED"})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "PUT",
        &format!("{base}/bindings"),
        Some(json!({"binding": "browserFlow", "flowId": id_of(&flow)?})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(send(&app, "GET", &format!("{flow}/executions"), None).await?).await?;
    let levels: Vec<u64> = body
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("expected an array"))?
        .iter()
        .filter_map(|info| info["level"].as_u64())
        .collect();
    assert_eq!(levels, [0, 0, 1]);

    let bindings = env.management.get_flow_bindings(env.realm_id).await?;
    let browser = bindings
        .browser_flow
        .ok_or_else(|| anyhow::anyhow!("browser flow not bound"))?;
    let mut context = AuthContext::new(env.realm_id);
    let result = env.engine.evaluate_flow(env.realm_id, browser, &mut context).await?;
    assert!(result.is_challenge());

    // A bound flow can't be deleted.
    let response = send(&app, "DELETE", &flow, None).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    Ok(())
}

/// Tests copying a flow over HTTP.
#[tokio::test]
async fn test_copy_flow_over_http() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router();
    let base = env.base_path();

    let flow = location(
        &send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "browser"}))).await?,
    )?;
    send(
        &app,
        "POST",
        &format!("{flow}/executions/execution"),
        Some(json!({"provider": CookieAuthenticator::ID})),
    )
    .await?;

    let response = send(&app, "POST", &format!("{flow}/copy"), Some(json!({"newName": "browser 2"}))).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let copy = location(&response)?;
    assert_ne!(copy, flow);

    let response = send(&app, "POST", &format!("{flow}/copy"), Some(json!({"newName": "browser 2"}))).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = json_body(send(&app, "GET", &format!("{copy}/executions"), None).await?).await?;
    assert_eq!(body[0]["providerId"], CookieAuthenticator::ID);

    let body = json_body(send(&app, "GET", &format!("{base}/flows"), None).await?).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    Ok(())
}

/// Tests that malformed requests are rejected before reaching the service.
#[tokio::test]
async fn test_rejects_unknown_requirement() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router();
    let base = env.base_path();

    let flow = location(
        &send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "f"}))).await?,
    )?;
    let response = send(
        &app,
        "POST",
        &format!("{flow}/executions/execution"),
        Some(json!({"provider": CookieAuthenticator::ID, "requirement": "CONDITIONAL"})),
    )
    .await?;
    assert!(response.status().is_client_error());

    let body = json_body(send(&app, "GET", &format!("{flow}/executions"), None).await?).await?;
    assert_eq!(body, json!([]));
    Ok(())
}
