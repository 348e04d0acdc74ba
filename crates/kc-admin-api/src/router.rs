//! Admin API router configuration.
//!
//! Maps [`AuthenticationManagement`](crate::AuthenticationManagement)
//! operations onto Axum routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use kc_auth::ProviderDescriptor;
use kc_model::RealmFlowBindings;
use kc_storage::AuthenticationStore;
use uuid::Uuid;

use crate::dto::{
    AuthenticationExecutionInfo, AuthenticationExecutionRepresentation,
    AuthenticationFlowRepresentation, AuthenticatorConfigRepresentation, CopyFlowRequest,
    CreateFlowRequest, FlowBindingRequest, NewExecutionFlowRequest, NewExecutionRequest,
    UpdateExecutionRequest, UpdateFlowRequest,
};
use crate::error::AdminResult;
use crate::events::AdminEventLogger;
use crate::state::ManagementState;

fn location(realm_id: Uuid, resource: &str, id: Uuid) -> [(&'static str, String); 1] {
    [(
        "Location",
        format!("/admin/realms/{realm_id}/authentication/{resource}/{id}"),
    )]
}

// ============================================================================
// Flow Handlers
// ============================================================================

/// GET /flows - List top-level flows
async fn list_flows<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path(realm_id): Path<Uuid>,
) -> AdminResult<Json<Vec<AuthenticationFlowRepresentation>>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Ok(Json(state.management.get_flows(realm_id).await?))
}

/// POST /flows - Create a flow
async fn create_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path(realm_id): Path<Uuid>,
    Json(request): Json<CreateFlowRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    let id = state.management.create_flow(realm_id, request).await?;
    Ok((StatusCode::CREATED, location(realm_id, "flows", id)))
}

/// GET /flows/{id} - Get flow by ID
async fn get_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<Json<AuthenticationFlowRepresentation>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Ok(Json(state.management.get_flow(realm_id, id).await?))
}

/// PUT /flows/{id} - Update a flow
async fn update_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateFlowRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state.management.update_flow(realm_id, id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /flows/{id} - Delete a flow
async fn delete_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state.management.delete_flow(realm_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /flows/{id}/copy - Copy a flow
async fn copy_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CopyFlowRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    let copy_id = state.management.copy_flow(realm_id, id, request).await?;
    Ok((StatusCode::CREATED, location(realm_id, "flows", copy_id)))
}

/// GET /flows/{id}/executions - List a flow's executions
async fn get_executions<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<Json<Vec<AuthenticationExecutionInfo>>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Ok(Json(state.management.get_executions(realm_id, id).await?))
}

/// POST /flows/{id}/executions/execution - Add an authenticator execution
async fn add_execution<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<NewExecutionRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    let execution_id = state.management.add_execution(realm_id, id, request).await?;
    Ok((
        StatusCode::CREATED,
        location(realm_id, "executions", execution_id),
    ))
}

/// POST /flows/{id}/executions/flow - Add a sub-flow
async fn add_execution_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<NewExecutionFlowRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    let flow_id = state
        .management
        .add_execution_flow(realm_id, id, request)
        .await?;
    Ok((StatusCode::CREATED, location(realm_id, "flows", flow_id)))
}

// ============================================================================
// Execution Handlers
// ============================================================================

/// GET /executions/{id} - Get execution by ID
async fn get_execution<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<Json<AuthenticationExecutionRepresentation>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Ok(Json(state.management.get_execution(realm_id, id).await?))
}

/// PUT /executions/{id} - Change an execution's requirement
async fn update_execution<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateExecutionRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state
        .management
        .update_execution_requirement(realm_id, id, request.requirement)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /executions/{id} - Remove an execution
async fn remove_execution<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state.management.remove_execution(realm_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /executions/{id}/raise-priority - Move an execution earlier
async fn raise_priority<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state
        .management
        .raise_execution_priority(realm_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /executions/{id}/lower-priority - Move an execution later
async fn lower_priority<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state
        .management
        .lower_execution_priority(realm_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /executions/{id}/config - Create and bind a config
async fn new_execution_config<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(representation): Json<AuthenticatorConfigRepresentation>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    let config_id = state
        .management
        .new_execution_config(realm_id, id, representation)
        .await?;
    Ok((StatusCode::CREATED, location(realm_id, "config", config_id)))
}

// ============================================================================
// Config Handlers
// ============================================================================

/// GET /config/{id} - Get config by ID
async fn get_config<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<Json<AuthenticatorConfigRepresentation>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Ok(Json(
        state
            .management
            .get_authenticator_config(realm_id, id)
            .await?,
    ))
}

/// PUT /config/{id} - Replace a config's alias and settings
async fn update_config<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
    Json(representation): Json<AuthenticatorConfigRepresentation>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state
        .management
        .update_authenticator_config(realm_id, id, representation)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /config/{id} - Delete a config
async fn remove_config<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path((realm_id, id)): Path<(Uuid, Uuid)>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state
        .management
        .remove_authenticator_config(realm_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Provider and Binding Handlers
// ============================================================================

/// GET /authenticator-providers - List authenticators
async fn authenticator_providers<S, L>(
    State(state): State<ManagementState<S, L>>,
) -> Json<Vec<ProviderDescriptor>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Json(state.management.list_authenticator_providers())
}

/// GET /flow-providers - List flow types
async fn flow_providers<S, L>(
    State(state): State<ManagementState<S, L>>,
) -> Json<Vec<ProviderDescriptor>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Json(state.management.list_flow_providers())
}

/// GET /bindings - Get realm flow bindings
async fn get_bindings<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path(realm_id): Path<Uuid>,
) -> AdminResult<Json<RealmFlowBindings>>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    Ok(Json(state.management.get_flow_bindings(realm_id).await?))
}

/// PUT /bindings - Bind or unbind a flow
async fn bind_flow<S, L>(
    State(state): State<ManagementState<S, L>>,
    Path(realm_id): Path<Uuid>,
    Json(request): Json<FlowBindingRequest>,
) -> AdminResult<impl IntoResponse>
where
    S: AuthenticationStore,
    L: AdminEventLogger,
{
    state.management.bind_flow(realm_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router Construction
// ============================================================================

/// Creates the authentication management router.
///
/// Every route lives under `/admin/realms/{realm_id}/authentication`.
///
/// # Routes
///
/// ## Flows
/// - `GET|POST /flows` - List or create flows
/// - `GET|PUT|DELETE /flows/{id}` - Read, update or delete a flow
/// - `POST /flows/{id}/copy` - Copy a flow
/// - `GET /flows/{id}/executions` - List a flow's executions
/// - `POST /flows/{id}/executions/execution` - Add an authenticator
/// - `POST /flows/{id}/executions/flow` - Add a sub-flow
///
/// ## Executions
/// - `GET|PUT|DELETE /executions/{id}` - Read, re-require or remove
/// - `POST /executions/{id}/raise-priority` - Move earlier
/// - `POST /executions/{id}/lower-priority` - Move later
/// - `POST /executions/{id}/config` - Create and bind a config
///
/// ## Configs, providers and bindings
/// - `GET|PUT|DELETE /config/{id}` - Read, replace or delete a config
/// - `GET /authenticator-providers` - List authenticators
/// - `GET /flow-providers` - List flow types
/// - `GET|PUT /bindings` - Read or change realm flow bindings
///
/// # Example
///
/// ```ignore
/// use kc_admin_api::{authentication_router, ManagementState};
///
/// let state = ManagementState::new(management);
/// let app = authentication_router().with_state(state);
/// ```
pub fn authentication_router<S, L>() -> Router<ManagementState<S, L>>
where
    S: AuthenticationStore + 'static,
    L: AdminEventLogger + 'static,
{
    const BASE: &str = "/admin/realms/{realm_id}/authentication";

    Router::new()
        // Flow endpoints
        .route(
            &format!("{BASE}/flows"),
            get(list_flows::<S, L>).post(create_flow::<S, L>),
        )
        .route(
            &format!("{BASE}/flows/{{id}}"),
            get(get_flow::<S, L>)
                .put(update_flow::<S, L>)
                .delete(delete_flow::<S, L>),
        )
        .route(&format!("{BASE}/flows/{{id}}/copy"), post(copy_flow::<S, L>))
        .route(
            &format!("{BASE}/flows/{{id}}/executions"),
            get(get_executions::<S, L>),
        )
        .route(
            &format!("{BASE}/flows/{{id}}/executions/execution"),
            post(add_execution::<S, L>),
        )
        .route(
            &format!("{BASE}/flows/{{id}}/executions/flow"),
            post(add_execution_flow::<S, L>),
        )
        // Execution endpoints
        .route(
            &format!("{BASE}/executions/{{id}}"),
            get(get_execution::<S, L>)
                .put(update_execution::<S, L>)
                .delete(remove_execution::<S, L>),
        )
        .route(
            &format!("{BASE}/executions/{{id}}/raise-priority"),
            post(raise_priority::<S, L>),
        )
        .route(
            &format!("{BASE}/executions/{{id}}/lower-priority"),
            post(lower_priority::<S, L>),
        )
        .route(
            &format!("{BASE}/executions/{{id}}/config"),
            post(new_execution_config::<S, L>),
        )
        // Config endpoints
        .route(
            &format!("{BASE}/config/{{id}}"),
            get(get_config::<S, L>)
                .put(update_config::<S, L>)
                .delete(remove_config::<S, L>),
        )
        // Provider and binding endpoints
        .route(
            &format!("{BASE}/authenticator-providers"),
            get(authenticator_providers::<S, L>),
        )
        .route(
            &format!("{BASE}/flow-providers"),
            get(flow_providers::<S, L>),
        )
        .route(
            &format!("{BASE}/bindings"),
            get(get_bindings::<S, L>).put(bind_flow::<S, L>),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use http_body_util::BodyExt;
    use kc_auth::builtin::{CookieAuthenticator, CreateUserIfUnique};
    use kc_auth::AuthenticatorRegistry;
    use kc_core::AdminConfig;
    use kc_storage_memory::InMemoryAuthenticationStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::events::InMemoryEventLogger;

    fn app() -> Router {
        let state = ManagementState::from_parts(
            Arc::new(InMemoryAuthenticationStore::new()),
            Arc::new(AuthenticatorRegistry::with_builtins()),
            Arc::new(InMemoryEventLogger::new()),
            AdminConfig::default(),
        );
        authentication_router().with_state(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |v| Body::from(v.to_string())))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location_of(response: &Response<Body>) -> String {
        response.headers()["Location"].to_str().unwrap().to_string()
    }

    fn id_of(location: &str) -> String {
        location.rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn flow_crud() {
        let app = app();
        let base = format!("/admin/realms/{}/authentication", Uuid::now_v7());

        let response = send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "my-browser"}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let flow = location_of(&response);
        assert!(flow.starts_with(&format!("{base}/flows/")));

        let response = send(&app, "GET", &flow, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["alias"], "my-browser");
        assert_eq!(body["providerId"], "basic-flow");

        let response = send(&app, "PUT", &flow, Some(json!({"description": "mine"}))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &format!("{base}/flows"), None).await;
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["description"], "mine");

        let response = send(&app, "DELETE", &flow, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &flow, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn flow_errors_map_to_status_codes() {
        let app = app();
        let base = format!("/admin/realms/{}/authentication", Uuid::now_v7());

        let response = send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": ""}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "a"}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "a"}))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "conflict");
    }

    #[tokio::test]
    async fn execution_and_config_endpoints() {
        let app = app();
        let base = format!("/admin/realms/{}/authentication", Uuid::now_v7());

        let response = send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "login"}))).await;
        let flow = location_of(&response);

        let response = send(
            &app,
            "POST",
            &format!("{flow}/executions/execution"),
            Some(json!({"provider": CreateUserIfUnique::ID})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let execution = location_of(&response);
        assert!(execution.starts_with(&format!("{base}/executions/")));

        let response = send(
            &app,
            "POST",
            &format!("{execution}/config"),
            Some(json!({"alias": "foo", "config": {"configKey1": "configValue1"}})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let config = location_of(&response);

        let response = send(&app, "GET", &format!("{flow}/executions"), None).await;
        let body = json_body(response).await;
        assert_eq!(body[0]["alias"], "foo");
        assert_eq!(body[0]["configurable"], true);
        assert_eq!(body[0]["authenticationConfig"], id_of(&config));

        let response = send(&app, "PUT", &execution, Some(json!({"requirement": "REQUIRED"}))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = json_body(send(&app, "GET", &execution, None).await).await;
        assert_eq!(body["requirement"], "REQUIRED");

        let response = send(&app, "DELETE", &config, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, "GET", &config, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            "POST",
            &format!("{base}/executions/{}/config", Uuid::now_v7()),
            Some(json!({"alias": "bar"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sub_flows_and_priorities() {
        let app = app();
        let base = format!("/admin/realms/{}/authentication", Uuid::now_v7());

        let flow = location_of(&send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "login"}))).await);
        let cookie = location_of(
            &send(
                &app,
                "POST",
                &format!("{flow}/executions/execution"),
                Some(json!({"provider": CookieAuthenticator::ID, "requirement": "ALTERNATIVE"})),
            )
            .await,
        );
        let response = send(
            &app,
            "POST",
            &format!("{flow}/executions/flow"),
            Some(json!({"alias": "forms", "requirement": "ALTERNATIVE"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let forms = location_of(&response);

        let response = send(&app, "POST", &format!("{cookie}/lower-priority"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let body = json_body(send(&app, "GET", &format!("{flow}/executions"), None).await).await;
        assert_eq!(body[0]["displayName"], "forms");
        assert_eq!(body[0]["flowId"], id_of(&forms));
        assert_eq!(body[1]["id"], id_of(&cookie));

        // Nested flows can't be deleted directly.
        let response = send(&app, "DELETE", &forms, None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bindings_and_providers() {
        let app = app();
        let base = format!("/admin/realms/{}/authentication", Uuid::now_v7());

        let flow = location_of(&send(&app, "POST", &format!("{base}/flows"), Some(json!({"alias": "browser"}))).await);
        let response = send(
            &app,
            "PUT",
            &format!("{base}/bindings"),
            Some(json!({"binding": "browserFlow", "flowId": id_of(&flow)})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let body = json_body(send(&app, "GET", &format!("{base}/bindings"), None).await).await;
        assert_eq!(body["browserFlow"], id_of(&flow));

        let body = json_body(send(&app, "GET", &format!("{base}/flow-providers"), None).await).await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let body = json_body(send(&app, "GET", &format!("{base}/authenticator-providers"), None).await).await;
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["id"] == CookieAuthenticator::ID));
    }
}
