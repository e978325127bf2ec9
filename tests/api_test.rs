// tests/api_test.rs — HTTP surface scenarios

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use toolgate::api::{build_router, ApiState};
use toolgate::infra::config::OrgToken;
use toolgate::integrations::adapters::builtin_registry;
use toolgate::integrations::dispatch::Dispatcher;
use toolgate::integrations::oauth::TokenRefresher;
use toolgate::store::crypto::CredentialCipher;
use toolgate::store::{InstanceStore, IntegrationInstance, MemoryInstanceStore};

const TOKEN: &str = "wf-secret-token";

struct TestApp {
    state: ApiState,
    org: Uuid,
}

fn app() -> TestApp {
    let registry = Arc::new(builtin_registry());
    let store: Arc<dyn InstanceStore> = Arc::new(MemoryInstanceStore::new());
    let cipher = Arc::new(CredentialCipher::new(&[7u8; 32]));
    let refresher = TokenRefresher::new(Duration::from_secs(2)).unwrap();
    let dispatcher = Arc::new(Dispatcher::new(
        registry.clone(),
        store.clone(),
        cipher.clone(),
        refresher,
    ));

    let org = Uuid::new_v4();
    let state = ApiState {
        registry,
        dispatcher,
        store,
        cipher,
        org_tokens: Arc::new(vec![OrgToken {
            token: TOKEN.into(),
            organisation_id: org,
        }]),
    };
    TestApp { state, org }
}

fn authed_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(state: &ApiState, req: Request<Body>) -> (StatusCode, Value) {
    let resp = build_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

#[tokio::test]
async fn test_execute_platform_tool() {
    let app = app();
    let instance = IntegrationInstance::new(app.org, "system.clock");
    app.state.store.upsert(&instance).await.unwrap();

    let req = authed_json(
        "POST",
        "/api/v1/execute",
        &json!({
            "instance_id": instance.id,
            "tool_name": "current_time",
            "parameters": { "format": "%Y" },
        }),
    );
    let (status, body) = send(&app.state, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["time"].as_str().unwrap().starts_with("20"));
}

#[tokio::test]
async fn test_execute_rejects_bad_token() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/execute")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"instance_id": Uuid::new_v4(), "tool_name": "x"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app.state, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_execute_cross_tenant_is_not_found() {
    let app = app();
    // Instance owned by a different organisation
    let instance = IntegrationInstance::new(Uuid::new_v4(), "system.clock");
    app.state.store.upsert(&instance).await.unwrap();

    let req = authed_json(
        "POST",
        "/api/v1/execute",
        &json!({ "instance_id": instance.id, "tool_name": "current_time" }),
    );
    let (status, body) = send(&app.state, req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_execute_disabled_tool() {
    let app = app();
    let mut instance = IntegrationInstance::new(app.org, "system.clock");
    instance.disabled_tools.insert("current_time".into());
    app.state.store.upsert(&instance).await.unwrap();

    let req = authed_json(
        "POST",
        "/api/v1/execute",
        &json!({ "instance_id": instance.id, "tool_name": "current_time" }),
    );
    let (status, body) = send(&app.state, req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "tool_disabled");
}

#[tokio::test]
async fn test_execute_missing_credentials_conflict() {
    let app = app();
    let instance = IntegrationInstance::new(app.org, "jira");
    app.state.store.upsert(&instance).await.unwrap();

    let req = authed_json(
        "POST",
        "/api/v1/execute",
        &json!({ "instance_id": instance.id, "tool_name": "get_issue",
                 "parameters": {"issue_key": "OPS-1"} }),
    );
    let (status, body) = send(&app.state, req).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "credentials_missing");
}

#[tokio::test]
async fn test_put_credentials_validates_then_stores() {
    let app = app();
    let instance = IntegrationInstance::new(app.org, "jira");
    app.state.store.upsert(&instance).await.unwrap();
    let uri = format!("/api/v1/instances/{}/credentials", instance.id);

    // Structural validation failure: missing api_token
    let req = authed_json(
        "PUT",
        &uri,
        &json!({ "credentials": {
            "base_url": "https://acme.atlassian.net",
            "email": "bot@acme.com",
        }}),
    );
    let (status, body) = send(&app.state, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_failed");
    assert!(!app
        .state
        .store
        .get(instance.id)
        .await
        .unwrap()
        .unwrap()
        .has_credentials());

    // Valid credentials are encrypted and stored
    let req = authed_json(
        "PUT",
        &uri,
        &json!({ "credentials": {
            "base_url": "https://acme.atlassian.net",
            "email": "bot@acme.com",
            "api_token": "tok-1",
        }}),
    );
    let (status, body) = send(&app.state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let stored = app.state.store.get(instance.id).await.unwrap().unwrap();
    let ciphertext = stored.encrypted_credentials.unwrap();
    assert!(!ciphertext.contains("tok-1"), "ciphertext must not leak the token");
    let plaintext = app.state.cipher.decrypt(&ciphertext).unwrap();
    assert!(plaintext.contains("tok-1"));
}

#[tokio::test]
async fn test_prompt_endpoint_with_override() {
    let app = app();

    let mut instance = IntegrationInstance::new(app.org, "jira");
    app.state.store.upsert(&instance).await.unwrap();

    let uri = format!("/api/v1/instances/{}/prompt", instance.id);
    let (status, body) = send(&app.state, authed_get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prompt"].as_str().unwrap().contains("Jira"));

    // Per-instance override wins
    instance.system_prompt_override = Some("Only read, never write.".into());
    app.state.store.upsert(&instance).await.unwrap();
    let (_, body) = send(&app.state, authed_get(&uri)).await;
    assert_eq!(body["prompt"], "Only read, never write.");
}

#[tokio::test]
async fn test_instance_listing_hides_ciphertext() {
    let app = app();
    let mut instance = IntegrationInstance::new(app.org, "websearch");
    instance.encrypted_credentials = Some("opaque-ciphertext-blob".into());
    instance.disabled_tools.insert("web_search".into());
    app.state.store.upsert(&instance).await.unwrap();

    let (status, body) = send(&app.state, authed_get("/api/v1/instances")).await;
    assert_eq!(status, StatusCode::OK);

    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["type"], "websearch");
    assert_eq!(list[0]["has_credentials"], true);
    assert_eq!(list[0]["disabled_tools"][0], "web_search");
    assert!(!body.to_string().contains("opaque-ciphertext-blob"));
}

#[tokio::test]
async fn test_catalog_formats() {
    let app = app();

    // XML (default) with the right content type
    let resp = build_router(app.state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/v1/catalog")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let xml = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(xml.starts_with("<integrations>"));

    // JSON rendering
    let (status, body) = send(
        &app.state,
        Request::builder()
            .uri("/api/v1/catalog?format=json&scope=user")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let integrations = body["integrations"].as_array().unwrap();
    assert!(integrations.iter().all(|i| i["category"] == "user"));

    // Unknown format rejected
    let (status, _) = send(
        &app.state,
        Request::builder()
            .uri("/api/v1/catalog?format=yaml")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_integrations_listing_exposes_credential_schema() {
    let app = app();
    let (status, body) = send(
        &app.state,
        Request::builder()
            .uri("/api/v1/integrations")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let list = body.as_array().unwrap();
    let jira = list.iter().find(|i| i["type"] == "jira").unwrap();
    assert_eq!(jira["category"], "user");
    assert_eq!(jira["requires_credentials"], true);
    let fields = jira["credential_fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["name"] == "api_token"));

    let clock = list.iter().find(|i| i["type"] == "system.clock").unwrap();
    assert_eq!(clock["category"], "system");
    assert_eq!(clock["requires_credentials"], false);
    assert!(clock["credential_fields"].as_array().unwrap().is_empty());
}
