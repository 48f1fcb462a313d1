//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use transient_store::{
    api::create_router, clock::ManualClock, options::MemoryOptions, AppState, Transients,
};

const T0: i64 = 1_700_000_000;

// == Helper Functions ==

fn create_test_app() -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let transients = Transients::builder(Arc::new(MemoryOptions::new()))
        .clock(clock.clone())
        .build();
    (create_router(AppState::new(transients)), clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// == SET / GET Endpoint Tests ==

#[tokio::test]
async fn test_set_then_get() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        "PUT",
        "/transients/feed",
        Some(json!({"value": {"items": [1, 2]}, "expiration": 60})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("feed"));

    let (status, json) = send(&app, "GET", "/transients/feed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], json!({"items": [1, 2]}));
    assert_eq!(json["scope"], "local");
}

#[tokio::test]
async fn test_get_missing_returns_404() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/transients/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_expired_entry_returns_404() {
    let (app, clock) = create_test_app();

    send(
        &app,
        "PUT",
        "/transients/short",
        Some(json!({"value": "x", "expiration": 10})),
    )
    .await;

    clock.advance(9);
    let (status, _) = send(&app, "GET", "/transients/short", None).await;
    assert_eq!(status, StatusCode::OK);

    clock.advance(1);
    let (status, _) = send(&app, "GET", "/transients/short", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_identical_set_returns_409() {
    let (app, _) = create_test_app();
    let body = json!({"value": "same"});

    let (status, _) = send(&app, "PUT", "/transients/k", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "PUT", "/transients/k", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_key_too_long_returns_400() {
    let (app, _) = create_test_app();
    let uri = format!("/transients/{}", "k".repeat(173));

    let (status, _) = send(&app, "PUT", &uri, Some(json!({"value": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_value_field_returns_400() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "PUT", "/transients/k", Some(json!({"expiration": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("value"));

    let (status, json) = send(&app, "PATCH", "/transients/k", Some(json!({"expiration": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_malformed_body_returns_400() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("PUT")
        .uri("/transients/k")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request"));

    let request = Request::builder()
        .method("PUT")
        .uri("/transients/k")
        .body(Body::from(r#"{"value": 1}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/transients/k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == UPDATE Endpoint Tests ==

#[tokio::test]
async fn test_update_keeps_timeout() {
    let (app, clock) = create_test_app();

    send(
        &app,
        "PUT",
        "/transients/k",
        Some(json!({"value": "a", "expiration": 30})),
    )
    .await;
    clock.advance(20);

    let (status, _) = send(
        &app,
        "PATCH",
        "/transients/k",
        Some(json!({"value": "b", "expiration": 3600})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", "/transients", None).await;
    let row = &json["transients"][0];
    assert_eq!(row["value"], "b");
    assert_eq!(row["timeout"], T0 + 30);
    assert_eq!(row["expires_in"], 10);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let (app, _) = create_test_app();
    send(&app, "PUT", "/transients/k", Some(json!({"value": 1}))).await;

    let (status, json) = send(&app, "DELETE", "/transients/k", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("deleted"));

    let (status, _) = send(&app, "DELETE", "/transients/k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_and_delete_all() {
    let (app, _) = create_test_app();
    for key in ["a", "b", "c"] {
        send(
            &app,
            "PUT",
            &format!("/transients/{key}"),
            Some(json!({"value": key})),
        )
        .await;
    }

    let (status, json) = send(&app, "GET", "/transients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transients"].as_array().unwrap().len(), 3);
    assert!(json["transients"][0]["timeout"].is_null());

    let (_, json) = send(&app, "DELETE", "/transients", None).await;
    assert_eq!(json["deleted"], 3);

    let (_, json) = send(&app, "GET", "/transients", None).await;
    assert!(json["transients"].as_array().unwrap().is_empty());
}

// == Scope Tests ==

#[tokio::test]
async fn test_network_scope_is_separate() {
    let (app, _) = create_test_app();

    send(
        &app,
        "PUT",
        "/transients/shared?network=true",
        Some(json!({"value": "network"})),
    )
    .await;

    let (status, _) = send(&app, "GET", "/transients/shared", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, "GET", "/transients/shared?network=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scope"], "global");
    assert_eq!(json["value"], "network");
}

#[tokio::test]
async fn test_network_key_limit_is_shorter() {
    let (app, _) = create_test_app();
    let uri = format!("/transients/{}?network=true", "k".repeat(168));

    let (status, _) = send(&app, "PUT", &uri, Some(json!({"value": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Sweep Endpoint Tests ==

#[tokio::test]
async fn test_sweep_endpoint() {
    let (app, clock) = create_test_app();
    send(
        &app,
        "PUT",
        "/transients/old",
        Some(json!({"value": 1, "expiration": 5})),
    )
    .await;
    send(
        &app,
        "PUT",
        "/transients/old?network=true",
        Some(json!({"value": 1, "expiration": 5})),
    )
    .await;
    send(&app, "PUT", "/transients/keep", Some(json!({"value": 1}))).await;

    clock.advance(30);
    let (_, json) = send(&app, "POST", "/sweep", None).await;
    assert_eq!(json["ran"], true);
    assert_eq!(json["report"]["local"]["reclaimed"], 0);

    clock.advance(60);
    let (status, json) = send(&app, "POST", "/sweep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["local"]["reclaimed"], 1);
    assert_eq!(json["report"]["network"]["reclaimed"], 1);

    let (_, json) = send(&app, "GET", "/transients", None).await;
    assert_eq!(json["transients"].as_array().unwrap().len(), 1);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
