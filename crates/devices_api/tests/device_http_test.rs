use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use common::memory::InMemoryDeviceRepository;
use devices_api::{build_devices_api_routes, DeviceService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let repository = Arc::new(InMemoryDeviceRepository::new());
    build_devices_api_routes(Arc::new(DeviceService::new(repository)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, name: &str, brand: &str, state: &str) -> Value {
    let (status, device) = send(
        app,
        Method::POST,
        "/api/v1/devices",
        Some(json!({ "name": name, "brand": brand, "state": state })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    device
}

fn device_uri(device: &Value) -> String {
    format!("/api/v1/devices/{}", device["id"].as_str().unwrap())
}

#[tokio::test]
async fn test_create_returns_generated_id_and_creation_time() {
    let app = app();
    let before = Utc::now() - chrono::Duration::seconds(1);

    let device = create(&app, "D1", "B1", "AVAILABLE").await;

    assert!(!device["id"].as_str().unwrap().is_empty());
    assert_eq!(device["name"], "D1");
    assert_eq!(device["brand"], "B1");
    assert_eq!(device["state"], "AVAILABLE");

    let created = device["creationTime"]
        .as_str()
        .unwrap()
        .parse::<DateTime<Utc>>()
        .unwrap();
    assert!(created >= before && created <= Utc::now());
}

#[tokio::test]
async fn test_create_ignores_client_supplied_id() {
    let app = app();
    let (status, device) = send(
        &app,
        Method::POST,
        "/api/v1/devices",
        Some(json!({ "id": "mine", "name": "D1", "brand": "B1", "state": "INACTIVE" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(device["id"], "mine");
}

#[tokio::test]
async fn test_create_missing_fields_rejected() {
    let app = app();
    let bodies = [
        json!({ "brand": "B1", "state": "AVAILABLE" }),
        json!({ "name": "D1", "state": "AVAILABLE" }),
        json!({ "name": "D1", "brand": "B1" }),
        json!({ "name": "", "brand": "B1", "state": "AVAILABLE" }),
    ];

    for body in bodies {
        let (status, error) = send(&app, Method::POST, "/api/v1/devices", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["kind"], "missing_fields");
        assert_eq!(error["code"], 400);
    }

    let (_, devices) = send(&app, Method::GET, "/api/v1/devices", None).await;
    assert_eq!(devices.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_invalid_state_rejected() {
    let app = app();
    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/devices",
        Some(json!({ "name": "D1", "brand": "B1", "state": "BROKEN" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "immutable_field");
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("Invalid device state: BROKEN"));
}

#[tokio::test]
async fn test_reads_return_identical_id_and_creation_time() {
    let app = app();
    let device = create(&app, "D1", "B1", "AVAILABLE").await;
    let uri = device_uri(&device);

    let (_, first) = send(&app, Method::GET, &uri, None).await;
    let (_, second) = send(&app, Method::GET, &uri, None).await;

    assert_eq!(first, device);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["creationTime"], second["creationTime"]);
}

#[tokio::test]
async fn test_partial_update_changes_only_supplied_fields() {
    let app = app();
    let device = create(&app, "D1", "B1", "AVAILABLE").await;

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &device_uri(&device),
        Some(json!({ "brand": "B2" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "D1");
    assert_eq!(updated["brand"], "B2");
    assert_eq!(updated["state"], "AVAILABLE");
    assert_eq!(updated["creationTime"], device["creationTime"]);
}

#[tokio::test]
async fn test_full_update_requires_all_fields() {
    let app = app();
    let device = create(&app, "D1", "B1", "AVAILABLE").await;
    let uri = device_uri(&device);

    let (status, error) = send(&app, Method::PUT, &uri, Some(json!({ "name": "D2" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "missing_fields");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "name": "D2", "brand": "B2", "state": "INACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "D2");
    assert_eq!(updated["brand"], "B2");
    assert_eq!(updated["state"], "INACTIVE");
}

#[tokio::test]
async fn test_in_use_device_cannot_be_renamed() {
    let app = app();
    let device = create(&app, "D1", "B1", "IN_USE").await;
    let uri = device_uri(&device);

    let (status, error) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "D2" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "device_in_use");

    // leaving IN_USE in the same request does not lift the guard
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "brand": "B2", "state": "AVAILABLE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "name": "D1", "brand": "B1", "state": "INACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["state"], "INACTIVE");

    let (status, renamed) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "D2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "D2");
}

#[tokio::test]
async fn test_creation_time_is_immutable() {
    let app = app();
    let device = create(&app, "D1", "B1", "AVAILABLE").await;
    let uri = device_uri(&device);

    let (status, error) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "creationTime": "2001-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "immutable_field");

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "creationTime": device["creationTime"], "name": "D9" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "D9");
    assert_eq!(updated["creationTime"], device["creationTime"]);
}

#[tokio::test]
async fn test_delete_guards_in_use_devices() {
    let app = app();
    let in_use = create(&app, "D1", "B1", "IN_USE").await;
    let inactive = create(&app, "D2", "B1", "INACTIVE").await;

    let (status, error) = send(&app, Method::DELETE, &device_uri(&in_use), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "device_in_use");

    let (status, body) = send(&app, Method::DELETE, &device_uri(&inactive), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, error) = send(&app, Method::GET, &device_uri(&inactive), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["kind"], "device_not_found");
}

#[tokio::test]
async fn test_search_dispatches_on_criteria() {
    let app = app();
    create(&app, "D1", "B1", "AVAILABLE").await;
    create(&app, "D2", "B2", "IN_USE").await;
    create(&app, "D3", "B1", "INACTIVE").await;

    let cases = [
        ("/api/v1/devices/search?brand=B1", 2),
        ("/api/v1/devices/search?state=AVAILABLE", 1),
        ("/api/v1/devices/search?brand=B1&state=INACTIVE", 1),
        ("/api/v1/devices/search?brand=B2&state=AVAILABLE", 0),
        ("/api/v1/devices/search", 3),
        ("/api/v1/devices/search?brand=&state=", 3),
        ("/api/v1/devices", 3),
    ];

    for (uri, expected) in cases {
        let (status, devices) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(devices.as_array().unwrap().len(), expected, "{uri}");
    }

    let (status, _) = send(&app, Method::GET, "/api/v1/devices/search?state=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_device_is_not_found() {
    let app = app();
    let uri = "/api/v1/devices/does-not-exist";

    let (status, error) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        error["error"],
        "Device not found for this id :: does-not-exist"
    );
    assert_eq!(error["code"], 404);

    let (status, _) = send(&app, Method::PATCH, uri, Some(json!({ "name": "D1" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        uri,
        Some(json!({ "name": "D1", "brand": "B1", "state": "AVAILABLE" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_route() {
    let (status, _) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_on_missing_device_is_not_found_before_field_checks() {
    let app = app();
    let uri = "/api/v1/devices/nope";

    let requests = [
        (Method::PUT, json!({ "name": "D1", "brand": "B1" })),
        (Method::PATCH, json!({ "name": "" })),
        (Method::PATCH, json!({ "state": "BROKEN" })),
        (Method::PUT, json!({ "name": "D1", "brand": "B1", "state": "BROKEN" })),
    ];

    for (method, body) in requests {
        let (status, error) = send(&app, method.clone(), uri, Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {error}");
        assert_eq!(error["kind"], "device_not_found");
    }
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_malformed_bodies_use_error_shape() {
    let app = app();
    let device = create(&app, "D1", "B1", "AVAILABLE").await;

    let cases = [
        (Method::POST, "/api/v1/devices".to_string(), r#"{"name": 5}"#),
        (Method::POST, "/api/v1/devices".to_string(), r#"{"name": "D1""#),
        (
            Method::PATCH,
            device_uri(&device),
            r#"{"creationTime": "yesterday"}"#,
        ),
    ];

    for (method, uri, body) in cases {
        let (status, error) = send_raw(&app, method, &uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error["kind"], "invalid_body");
        assert_eq!(error["code"], 400);
        assert!(!error["error"].as_str().unwrap().is_empty());
    }
}
