//! HTTP surface tests, driving the router directly without a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sqlgate::config::GatewayConfig;
use sqlgate::db::{MockConnector, MockFailure, Row};
use sqlgate::server::{build_router, AppState, API_KEY_HEADER, CORRELATION_HEADER};

const KEY: &str = "test-key";

fn users() -> Vec<Row> {
    vec![
        Row::new().with("id", 1).with("name", "Alice"),
        Row::new().with("id", 2).with("name", "Bob"),
    ]
}

fn router(connector: MockConnector) -> Router {
    let mut config = GatewayConfig::default();
    config.api_key = KEY.to_string();
    let state = AppState::from_config(&config, Arc::new(connector)).unwrap();
    build_router(state)
}

fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(body: Value, key: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/query")
        .header(API_KEY_HEADER, key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let correlation = response
        .headers()
        .get(CORRELATION_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, correlation, body)
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let connector = MockConnector::new().with_table("users", users());
    let (status, _, body) = send(
        router(connector.clone()),
        get("/query?sql=SELECT%201", None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": "error", "message": "Invalid API key"}));
    assert_eq!(connector.stats().opened, 0);
}

#[tokio::test]
async fn test_wrong_api_key_is_unauthorized() {
    let (status, _, _) = send(
        router(MockConnector::new()),
        get("/query?sql=SELECT%201", Some("nope")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_query_returns_rows() {
    let (status, correlation, body) = send(
        router(MockConnector::new().with_table("users", users())),
        get("/query?sql=SELECT%20*%20FROM%20users", Some(KEY)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["data"],
        json!([{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}])
    );
    assert_eq!(body["metadata"]["row_count"], 2);
    assert_eq!(body["metadata"]["truncated"], false);

    let correlation = correlation.expect("correlation header");
    assert_eq!(correlation.len(), 8);
    assert_eq!(body["metadata"]["correlation_id"], correlation.as_str());
}

#[tokio::test]
async fn test_post_query_returns_rows() {
    let (status, _, body) = send(
        router(MockConnector::new().with_table("users", users())),
        post(json!({"sql": "SELECT name FROM users LIMIT 1"}), KEY),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["row_count"], 1);
}

#[tokio::test]
async fn test_missing_sql_is_bad_request() {
    let (status, correlation, body) =
        send(router(MockConnector::new()), get("/query", Some(KEY))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "SQL query is required");
    assert!(correlation.is_some());

    let (status, _, body) = send(
        router(MockConnector::new()),
        post(json!({"sql": "   "}), KEY),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "SQL query is required");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header(API_KEY_HEADER, KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = send(router(MockConnector::new()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_forbidden_keyword_is_rejected_with_reason() {
    let connector = MockConnector::new().with_table("users", users());
    let (status, correlation, body) = send(
        router(connector.clone()),
        post(json!({"sql": "SELECT * FROM users WHERE 1=1 OR DROP"}), KEY),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Forbidden keyword: DROP");
    assert_eq!(body["details"], "FORBIDDEN_KEYWORD");
    assert_eq!(body["metadata"]["keyword"], "DROP");
    assert_eq!(
        body["metadata"]["correlation_id"],
        correlation.unwrap().as_str()
    );
    assert_eq!(connector.stats().opened, 0);
}

#[tokio::test]
async fn test_database_error_is_server_error() {
    let (status, _, body) = send(
        router(MockConnector::new()),
        post(json!({"sql": "SELECT * FROM nowhere"}), KEY),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Table 'mock.nowhere' doesn't exist");
    assert_eq!(body["metadata"]["kind"], "DATABASE_ERROR");
    assert_eq!(body["metadata"]["code"], 1146);
}

#[tokio::test]
async fn test_panicking_session_yields_unexpected_error() {
    let connector = MockConnector::new().failing_with(MockFailure::Panic);
    let (status, correlation, body) = send(
        router(connector.clone()),
        post(json!({"sql": "SELECT 1"}), KEY),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An unexpected error occurred");
    assert_eq!(body["metadata"]["kind"], "UNEXPECTED");
    assert_eq!(
        body["metadata"]["correlation_id"],
        correlation.unwrap().as_str()
    );

    // Unwinding drops the session.
    let stats = connector.stats();
    assert_eq!(stats.opened, 1);
    assert_eq!(stats.closed, 1);
}

#[tokio::test]
async fn test_health_ok() {
    let (status, _, body) = send(router(MockConnector::new()), get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "connected"}));
}

#[tokio::test]
async fn test_health_degraded_when_database_unreachable() {
    let (status, _, body) = send(
        router(MockConnector::new().failing_with(MockFailure::Unreachable)),
        get("/health", None),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unreachable");
    assert!(body["message"].as_str().unwrap().contains("Can't connect"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = router(MockConnector::new())
        .oneshot(get("/nope", Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
