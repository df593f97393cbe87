//! Requests the router answers without reaching the database.

mod common;

use axum::http::StatusCode;
use common::{offline_app, send, send_json};
use serde_json::json;

#[tokio::test]
async fn greeting_and_probes() {
    let app = offline_app();
    let (status, body) = send(&app, "GET", "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Food delivery API");

    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send_json(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "food-api");
}

#[tokio::test]
async fn non_numeric_id_is_invalid() {
    let app = offline_app();
    for (method, body) in [("GET", None), ("PUT", Some(r#"{"name":"x"}"#)), ("DELETE", None)] {
        let (status, text) = send(&app, method, "/api/users/abc", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", method);
        assert_eq!(text, "Invalid ID");
    }
    let (status, text) = send(&app, "GET", "/api/users/12.5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Invalid ID");
}

#[tokio::test]
async fn id_is_checked_before_body() {
    let app = offline_app();
    let (status, text) = send(&app, "PUT", "/api/users/abc", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Invalid ID");
}

#[tokio::test]
async fn unknown_resource_is_not_found() {
    let app = offline_app();
    let (status, text) = send(&app, "GET", "/api/orders", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(text, "Resource not found");
}

#[tokio::test]
async fn read_only_entities_reject_writes() {
    let app = offline_app();
    let (status, body) = send_json(&app, "POST", "/api/cities", Some(json!({"name": "Lyon"}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "create not allowed"}));

    let (status, _) = send(&app, "DELETE", "/api/state/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = offline_app();
    let (status, body) = send_json(&app, "POST", "/api/users", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "POST", "/api/users", Some("{\"name\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"));
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let app = offline_app();
    let (status, body) = send_json(&app, "POST", "/api/users", Some(json!({"name": "Ada"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));

    let (status, _) = send_json(&app, "POST", "/api/users", Some(json!(["Ada"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_include_is_rejected() {
    let app = offline_app();
    let (status, body) = send_json(&app, "GET", "/api/users?include=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("bogus"));

    let (status, _) = send(&app, "GET", "/api/users/1?include=addresses,bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
