//! Integration tests for idrec-svc API endpoints
//!
//! Tests cover:
//! - POST /identify success, validation and lenient body parsing
//! - GET / banner
//! - GET /health with and without a database
//! - GET /buildinfo

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use idrec_common::db::init::init_memory_database;
use idrec_common::{ContactStore, MemoryContactStore, SqliteContactStore};
use serde_json::{json, Value};
use idrec_svc::{build_router, AppState};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: app over an in-memory SQLite database
async fn setup_app() -> axum::Router {
    let pool = init_memory_database()
        .await
        .expect("Should create in-memory database");
    let store: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(pool.clone()));
    build_router(AppState::new(store, Some(pool)))
}

/// Test helper: JSON POST request
fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Identify Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_identify_creates_primary() {
    let app = setup_app().await;

    let response = app
        .oneshot(post_json("/identify", json!({"email": "a@x.com"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body,
        json!({
            "contact": {
                "primaryContactId": 1,
                "emails": ["a@x.com"],
                "phoneNumbers": [],
                "secondaryContactIds": []
            }
        })
    );
}

#[tokio::test]
async fn test_identify_consolidates_across_requests() {
    let app = setup_app().await;

    let requests = [
        json!({"email": "lorraine@hillvalley.edu", "phoneNumber": "123456"}),
        json!({"email": "mcfly@hillvalley.edu", "phoneNumber": "123456"}),
    ];
    for body in requests {
        let response = app.clone().oneshot(post_json("/identify", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(post_json("/identify", json!({"phoneNumber": "123456"})))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["contact"]["primaryContactId"], 1);
    assert_eq!(
        body["contact"]["emails"],
        json!(["lorraine@hillvalley.edu", "mcfly@hillvalley.edu"])
    );
    assert_eq!(body["contact"]["phoneNumbers"], json!(["123456"]));
    assert_eq!(body["contact"]["secondaryContactIds"], json!([2]));
}

#[tokio::test]
async fn test_identify_merges_two_primaries() {
    let app = setup_app().await;

    for body in [
        json!({"email": "george@hillvalley.edu", "phoneNumber": "919191"}),
        json!({"email": "biffsucks@hillvalley.edu", "phoneNumber": "717171"}),
    ] {
        app.clone().oneshot(post_json("/identify", body)).await.unwrap();
    }

    let response = app
        .oneshot(post_json(
            "/identify",
            json!({"email": "george@hillvalley.edu", "phoneNumber": "717171"}),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(
        body["contact"],
        json!({
            "primaryContactId": 1,
            "emails": ["george@hillvalley.edu", "biffsucks@hillvalley.edu"],
            "phoneNumbers": ["919191", "717171"],
            "secondaryContactIds": [2]
        })
    );
}

#[tokio::test]
async fn test_identify_accepts_numeric_phone_number() {
    let app = setup_app().await;

    let response = app
        .oneshot(post_json("/identify", json!({"email": null, "phoneNumber": 5551234})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["contact"]["phoneNumbers"], json!(["5551234"]));
}

#[tokio::test]
async fn test_identify_without_identifiers_is_bad_request() {
    let app = setup_app().await;

    let response = app
        .oneshot(post_json("/identify", json!({"email": "", "phoneNumber": null})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("At least one of email or phoneNumber"));
}

#[tokio::test]
async fn test_identify_rejects_malformed_body() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/identify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

// =============================================================================
// Banner and Health Tests
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let app = setup_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Identity Reconciliation API is running");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "idrec-svc");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let app = setup_app().await;

    let response = app.oneshot(get("/buildinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_health_reports_degraded_when_database_closed() {
    let pool = init_memory_database().await.unwrap();
    let store: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(pool.clone()));
    let app = build_router(AppState::new(store, Some(pool.clone())));
    pool.close().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_store_failure_is_generic_server_error() {
    let pool = init_memory_database().await.unwrap();
    let store: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(pool.clone()));
    let app = build_router(AppState::new(store, None));
    pool.close().await;

    let response = app
        .oneshot(post_json("/identify", json!({"email": "a@x.com"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_in_memory_store_serves_identify() {
    let store: Arc<dyn ContactStore> = Arc::new(MemoryContactStore::new());
    let app = build_router(AppState::new(store, None));

    let response = app
        .oneshot(post_json("/identify", json!({"phoneNumber": "555"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["contact"]["phoneNumbers"], json!(["555"]));
}
