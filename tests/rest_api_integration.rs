//! Integration tests for the REST API
//!
//! Router tests drive the full axum stack in-process with `tower::ServiceExt`.
//! The lifecycle tests bind a real port and are opt-in.
//!
//! ## Environment Variables
//!
//! - `SENSORFLOW_REST_API_TEST_ENABLED=true` - Required for the lifecycle tests
//!
//! ## Running Tests
//!
//! ```bash
//! SENSORFLOW_REST_API_TEST_ENABLED=true cargo test --test rest_api_integration -- --test-threads=1
//! ```
//!
//! ## Notes
//!
//! - Lifecycle tests use high port numbers (17100+), one per test

use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use sensorflow::config::Config;
use sensorflow::rest::{build_router, ApiState, RestApiServer, RestApiStatus};
use sensorflow::store::seed::DEMO_PASSWORD;
use sensorflow::store::{MockBackend, MockData};

// ─── Configuration ────────────────────────────────────────────────────────────

fn rest_api_tests_enabled() -> bool {
    env::var("SENSORFLOW_REST_API_TEST_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

macro_rules! skip_if_not_configured {
    () => {
        if !rest_api_tests_enabled() {
            eprintln!("Skipping test: SENSORFLOW_REST_API_TEST_ENABLED not set to true");
            return;
        }
    };
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn test_config() -> Config {
    let mut config = Config::default();
    config.backend.latency_ms = 0;
    config
}

fn seeded() -> (Arc<MockBackend>, Router) {
    let backend = Arc::new(MockBackend::seeded());
    let router = build_router(ApiState::new(test_config(), backend.clone()));
    (backend, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

// ─── Router Tests ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_and_status_counts() {
    let (_, router) = seeded();

    let (status, health) = get(&router, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert!(!health["version"].as_str().unwrap().is_empty());

    let (status, body) = get(&router, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceCount"], 18);
    assert_eq!(body["planCount"], 4);
    assert_eq!(body["userCount"], 8);
}

#[tokio::test]
async fn test_device_status_filter_returns_exact_subset() {
    let (_, router) = seeded();

    let (_, all) = get(&router, "/api/v1/devices").await;
    let all = all.as_array().unwrap().clone();
    assert_eq!(all.len(), 18);

    for key in ["online", "offline", "maintenance", "error"] {
        let (status, body) = get(&router, &format!("/api/v1/devices?status={}", key)).await;
        assert_eq!(status, StatusCode::OK);
        let expected = all.iter().filter(|d| d["status"] == key).count();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), expected, "status {}", key);
        assert!(rows.iter().all(|d| d["status"] == key));
    }

    let (_, body) = get(&router, "/api/v1/devices?status=all").await;
    assert_eq!(body.as_array().unwrap().len(), 18);
}

#[tokio::test]
async fn test_device_sort_orders_are_reversed() {
    let (_, router) = seeded();

    for key in ["name", "battery", "last_seen"] {
        let (_, asc) = get(&router, &format!("/api/v1/devices?sort={}&order=asc", key)).await;
        let (_, desc) = get(&router, &format!("/api/v1/devices?sort={}&order=desc", key)).await;
        let mut reversed = ids(&desc);
        reversed.reverse();
        assert_eq!(ids(&asc), reversed, "sort {}", key);
    }
}

#[tokio::test]
async fn test_device_query_and_bad_params() {
    let (_, router) = seeded();

    let (status, body) = get(&router, "/api/v1/devices?q=freezer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = get(&router, "/api/v1/devices?status=sleeping").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = get(&router, "/api/v1/devices?sort=colour").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_device_is_404() {
    let (_, router) = seeded();

    let (status, body) = get(&router, "/api/v1/devices/dev-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Freezer A1");

    let (status, body) = get(&router, "/api/v1/devices/dev-999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_create_organization_validates_every_step() {
    let (_, router) = seeded();

    let (status, body) = post(
        &router,
        "/api/v1/organizations",
        json!({
            "name": "", "industry": "logistics", "size": "11-50",
            "email": "not-an-email", "phone": "+1 555 010 3000",
            "street": "1 Pier Rd", "city": "Portland", "region": "OR",
            "postalCode": "97201", "country": "US", "planId": "plan-starter"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let fields = body["fields"].as_object().unwrap();
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("name"));
    assert!(!fields.contains_key("city"));
}

#[tokio::test]
async fn test_create_organization_then_list() {
    let (_, router) = seeded();

    let (status, created) = post(
        &router,
        "/api/v1/organizations",
        json!({
            "name": "Harbor Labs", "industry": "logistics", "size": "11-50",
            "email": "ops@harbor.example", "phone": "+1 555 010 3000",
            "website": "https://harbor.example",
            "street": "1 Pier Rd", "city": "Portland", "region": "OR",
            "postalCode": "97201", "country": "US", "planId": "plan-starter"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Harbor Labs");

    let (_, organizations) = get(&router, "/api/v1/organizations").await;
    assert_eq!(organizations.as_array().unwrap().len(), 4);
    assert!(ids(&organizations).contains(&created["id"].as_str().unwrap().to_string()));
}

#[tokio::test]
async fn test_password_reset_round_trip_over_http() {
    let (backend, router) = seeded();

    let (status, body) = post(
        &router,
        "/api/v1/auth/password-reset",
        json!({ "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_object().unwrap().len(), 1);

    let (status, _) = post(
        &router,
        "/api/v1/auth/password-reset",
        json!({ "email": "user@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = backend.last_reset_code("user@example.com").await.unwrap();

    let (status, body) = post(
        &router,
        "/api/v1/auth/password-reset/verify",
        json!({ "email": "user@example.com", "code": "000000" }),
    )
    .await;
    if code != "000000" {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_code");
    }

    let (status, _) = post(
        &router,
        "/api/v1/auth/password-reset/complete",
        json!({ "email": "user@example.com", "code": code, "password": "N3w#Password" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &router,
        "/api/v1/auth/sign-in",
        json!({ "email": "user@example.com", "password": DEMO_PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, user) = post(
        &router,
        "/api/v1/auth/sign-in",
        json!({ "email": "user@example.com", "password": "N3w#Password" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "user@example.com");
}

#[tokio::test]
async fn test_locked_account_cannot_sign_in() {
    let (_, router) = seeded();

    let (status, body) = post(
        &router,
        "/api/v1/auth/sign-in",
        json!({ "email": "anouk@greenleaf.example", "password": DEMO_PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_locked");
}

#[tokio::test]
async fn test_router_serves_fixture_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixtures.json");

    let mut data = MockData::seeded();
    data.devices.truncate(2);
    fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

    let mut config = test_config();
    config.paths.fixtures = Some(path.to_string_lossy().to_string());
    let router = build_router(ApiState::from_config(config).unwrap());

    let (status, body) = get(&router, "/api/v1/devices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["dev-001", "dev-002"]);
}

// ─── Lifecycle Tests ──────────────────────────────────────────────────────────

async fn wait_for_running(server: &RestApiServer) -> bool {
    for _ in 0..50 {
        if server.is_running() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_api_server_starts_and_stops() {
    skip_if_not_configured!();

    let port = 17101;
    let server = RestApiServer::new(ApiState::new(test_config(), Arc::new(MockBackend::seeded())), port);

    server.start().expect("Server should start");
    assert!(wait_for_running(&server).await, "Server should report as running");
    assert_eq!(server.status(), RestApiStatus::Running { port });

    let stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await;
    assert!(stream.is_ok(), "Port should accept connections");

    server.stop();
    assert_eq!(server.status(), RestApiStatus::Stopped);
}

#[tokio::test]
async fn test_api_port_in_use_reports_error() {
    skip_if_not_configured!();

    let port = 17102;
    let _listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Should bind the test port");

    let server = RestApiServer::new(ApiState::new(test_config(), Arc::new(MockBackend::seeded())), port);
    server.start().expect("Start only spawns the listener task");

    let mut reported = false;
    for _ in 0..50 {
        if matches!(server.status(), RestApiStatus::Error(_)) {
            reported = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(reported, "Bind failure should surface in the status");
}
