use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use prometheus::Registry;
use serde_json::{json, Value};
use service::document::{DocumentService, DocumentStore, NewDocument};
use service::metering::{Operation, PrometheusMeter};
use service::storage::file_store::JsonFileDocumentStore;
use tower::Service;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes;
use server::state::{AppState, ResourceSpec};

const BASE_URI: &str = "https://localhost:18443";
const CONFIG_ID: &str = "https://localhost:18443/service-objects/z1";
const CONTEXTS: &str = "/service-objects/z1/contexts";
const REGISTRY: &str = "/service-objects/z1/cborld-registry-entries";

struct TestApp {
    router: Router,
    meter: PrometheusMeter,
    store: Arc<JsonFileDocumentStore>,
}

async fn build_app() -> anyhow::Result<TestApp> {
    let path = std::env::temp_dir().join(format!("ctx_server_{}.json", Uuid::new_v4()));
    let store = JsonFileDocumentStore::open(&path).await?;
    let registry = Registry::new();
    let meter = PrometheusMeter::new(&registry)?;

    let mut cfg = AppConfig::default();
    cfg.server.base_uri = BASE_URI.into();
    let state = AppState::new(DocumentService::new(store.clone()), Arc::new(meter.clone()), registry, &cfg);
    let router = routes::build_router(state, ResourceSpec::from_config(&cfg.routes), CorsLayer::very_permissive());
    Ok(TestApp { router, meter, store })
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder.header("content-type", "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => builder.body(Body::empty())?,
    };
    let resp = app.router.clone().call(req).await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, headers, value))
}

fn item(collection: &str, id: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(id))
}

fn context(term: &str) -> Value {
    json!({"@context": {"term": format!("https://test.example#{term}")}})
}

#[tokio::test]
async fn creates_and_gets_a_context() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";

    let (status, headers, body) = send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": id, "context": context("a"), "sequence": 0}));
    let location = headers.get("location").and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert_eq!(location, format!("{CONFIG_ID}/contexts/https%3A%2F%2Ftest.example%2Fv1"));

    let (status, _, body) = send(&app, "GET", &item(CONTEXTS, id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "context": context("a"), "sequence": 0}));
    Ok(())
}

#[tokio::test]
async fn updates_a_context() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;

    let update = json!({"id": id, "context": context("b"), "sequence": 1});
    let (status, _, body) = send(&app, "POST", &item(CONTEXTS, id), Some(update.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, update);

    let (_, _, body) = send(&app, "GET", &item(CONTEXTS, id), None).await?;
    assert_eq!(body["sequence"], 1);
    assert_eq!(body["context"], context("b"));
    Ok(())
}

#[tokio::test]
async fn rejects_update_with_wrong_sequence() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;

    let (status, _, body) =
        send(&app, "POST", &item(CONTEXTS, id), Some(json!({"id": id, "context": context("b"), "sequence": 10}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["type"], "InvalidStateError");
    assert_eq!(body["details"]["expected"], 9);
    assert_eq!(body["details"]["actual"], 0);

    // stored document untouched
    let (_, _, body) = send(&app, "GET", &item(CONTEXTS, id), None).await?;
    assert_eq!(body["sequence"], 0);
    assert_eq!(body["context"], context("a"));
    Ok(())
}

#[tokio::test]
async fn rejects_duplicate_create() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;

    let (status, _, body) = send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("other")}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["type"], "DuplicateError");
    assert_eq!(body["message"], "Duplicate context.");
    Ok(())
}

#[tokio::test]
async fn document_with_foreign_type_is_not_found() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;

    app.store
        .put_unchecked(CONFIG_ID, NewDocument::with_type(id, json!({"id": id, "context": context("a")}), "different"))
        .await?;

    let (status, _, body) = send(&app, "GET", &item(CONTEXTS, id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "NotFoundError");

    // updating it is refused rather than reported missing
    let (status, _, body) =
        send(&app, "POST", &item(CONTEXTS, id), Some(json!({"id": id, "context": context("b"), "sequence": 2}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], "NotAllowedError");
    Ok(())
}

#[tokio::test]
async fn kinds_share_one_id_space() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "urn:cborld:registry-entry:1";
    let entry = json!({"id": id, "registryEntry": {"context": {"https://www.w3.org/ns/credentials/v2": 1}}});
    let (status, _, _) = send(&app, "POST", REGISTRY, Some(entry)).await?;
    assert_eq!(status, StatusCode::CREATED);

    // a context at the same id is a duplicate
    let (status, _, _) = send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // and the registry entry is invisible through the contexts collection
    let (status, _, _) = send(&app, "GET", &item(CONTEXTS, id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, body) = send(&app, "GET", &item(REGISTRY, id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registryEntry"]["context"]["https://www.w3.org/ns/credentials/v2"], 1);
    Ok(())
}

#[tokio::test]
async fn registry_entry_lifecycle() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "urn:cborld:registry-entry:100";
    let entry = json!([{"type": "context", "table": {"https://www.w3.org/ns/credentials/v2": 1}}]);

    let (status, headers, body) = send(&app, "POST", REGISTRY, Some(json!({"id": id, "registryEntry": entry}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sequence"], 0);
    assert!(headers.contains_key("location"));

    let next = json!({"url": {"https://foo.example": 2}});
    let (status, _, body) =
        send(&app, "POST", &item(REGISTRY, id), Some(json!({"id": id, "registryEntry": next, "sequence": 1}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registryEntry"], next);
    Ok(())
}

#[tokio::test]
async fn validation_errors_are_reported() -> anyhow::Result<()> {
    let app = build_app().await?;

    let bad_id = json!({"id": "urn:other:1", "registryEntry": {}});
    let (status, _, body) = send(&app, "POST", REGISTRY, Some(bad_id)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "ValidationError");
    assert_eq!(body["message"], "A validation error occured in the 'createCborLdRegistryEntryBody' validator.");

    let (status, _, body) = send(&app, "POST", CONTEXTS, Some(json!({"id": "x", "context": {"@context": 5}}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["validator"], "createContextBody");

    // update body id must match the URL
    let (status, _, body) = send(
        &app,
        "POST",
        &item(CONTEXTS, "https://test.example/v1"),
        Some(json!({"id": "https://test.example/v2", "context": context("a"), "sequence": 1})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["validator"], "updateContextBody");
    Ok(())
}

#[tokio::test]
async fn non_json_body_is_a_validation_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = Request::builder()
        .method("POST")
        .uri(CONTEXTS)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let resp = app.router.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_of_missing_document_is_not_found() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/missing";
    let (status, _, _) =
        send(&app, "POST", &item(CONTEXTS, id), Some(json!({"id": id, "context": context("a"), "sequence": 1}))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn scopes_are_isolated_per_config() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;
    let (status, _, _) = send(&app, "GET", &item("/service-objects/z2/contexts", id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn meters_each_successful_request_once() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = "https://test.example/v1";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?; // duplicate
    send(&app, "POST", &item(CONTEXTS, id), Some(json!({"id": id, "context": context("b"), "sequence": 1}))).await?;
    send(&app, "GET", &item(CONTEXTS, id), None).await?;
    send(&app, "GET", &item(CONTEXTS, "https://test.example/none"), None).await?;

    assert_eq!(app.meter.count(Operation::Create), 1);
    assert_eq!(app.meter.count(Operation::Update), 1);
    assert_eq!(app.meter.count(Operation::Read), 1);

    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let resp = app.router.clone().call(req).await?;
    let text = String::from_utf8(axum::body::to_bytes(resp.into_body(), usize::MAX).await?.to_vec())?;
    assert!(text.contains("context_store_operations_total{operation=\"create\"} 1"));
    Ok(())
}

#[tokio::test]
async fn options_and_health_are_open() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, _, _) = send(&app, "OPTIONS", CONTEXTS, None).await?;
    assert!(status.is_success());
    let (status, _, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn concurrent_updates_only_one_wins() -> anyhow::Result<()> {
    let app = Arc::new(build_app().await?);
    let id = "https://test.example/race";
    send(&app, "POST", CONTEXTS, Some(json!({"id": id, "context": context("a")}))).await?;

    let mut handles = Vec::new();
    for i in 0..2 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let body = json!({"id": id, "context": context(&i.to_string()), "sequence": 1});
            send(&app, "POST", &item(CONTEXTS, id), Some(body)).await
        }));
    }
    let mut statuses = Vec::new();
    for h in handles {
        statuses.push(h.await??.0);
    }
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let (_, _, body) = send(&app, "GET", &item(CONTEXTS, id), None).await?;
    assert_eq!(body["sequence"], 1);
    Ok(())
}
