use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, MockState, SharedState};
use serde_json::{json, Value};
use tower::ServiceExt;

// "daemon:secret"
const BASIC: &str = "Basic ZGFlbW9uOnNlY3JldA==";

fn state() -> SharedState {
    Arc::new(MockState::new("daemon", "secret"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn token_request(authorization: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/token")
        .header(http::header::AUTHORIZATION, authorization)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(String::new())
        .unwrap()
}

fn bearer_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn obtain_token(app: &Router) -> String {
    let resp = app.clone().oneshot(token_request(BASIC)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

// --- token ---

#[tokio::test]
async fn token_is_issued_for_valid_credentials() {
    let state = state();
    let app = app(state.clone());
    let resp = app.oneshot(token_request(BASIC)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["expires"]["date"], mock_server::DEFAULT_EXPIRES_DATE);
    assert_eq!(state.token_requests(), 1);
}

#[tokio::test]
async fn token_rejects_wrong_password() {
    let app = app(state());
    // "daemon:wrong"
    let resp = app
        .oneshot(token_request("Basic ZGFlbW9uOndyb25n"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_rejects_missing_credentials() {
    let app = app(state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_response_can_omit_expiry() {
    let app = app(Arc::new(
        MockState::new("daemon", "secret").with_expires_date(None),
    ));
    let resp = app.oneshot(token_request(BASIC)).await.unwrap();
    let body = body_json(resp).await;
    assert!(body.get("token").is_some());
    assert!(body.get("expires").is_none());
}

// --- bearer guard ---

#[tokio::test]
async fn resources_require_known_token() {
    let state = state();
    let app = app(state.clone());
    let resp = app
        .oneshot(bearer_request("GET", "/v1/ping", "forged", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.resource_requests(), 1);
}

#[tokio::test]
async fn ping_returns_envelope() {
    let app = app(state());
    let token = obtain_token(&app).await;
    let resp = app
        .oneshot(bearer_request("GET", "/v1/ping", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "statusCode": 200, "data": { "pong": true } })
    );
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_query_and_body() {
    let app = app(state());
    let token = obtain_token(&app).await;
    let resp = app
        .oneshot(bearer_request(
            "PUT",
            "/v1/echo?status[0]=a&status[1]=b",
            &token,
            r#"{"name":"ddc"}"#,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["method"], "PUT");
    assert_eq!(body["data"]["query"], "status[0]=a&status[1]=b");
    assert_eq!(body["data"]["body"], json!({ "name": "ddc" }));
    assert_eq!(body["data"]["content_type"], "application/json");
}

#[tokio::test]
async fn echo_rejects_non_json_body() {
    let app = app(state());
    let token = obtain_token(&app).await;
    let resp = app
        .oneshot(bearer_request("POST", "/v1/echo", &token, "plain"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- bus_config ---

#[tokio::test]
async fn bus_config_crud() {
    let app = app(state());
    let token = obtain_token(&app).await;

    let resp = app
        .clone()
        .oneshot(bearer_request(
            "POST",
            "/v1/bus_config",
            &token,
            r#"{"project_id":"p","bus_type":"MODBUS","hostname":"192.168.1.2","port":502,"name":"ddc"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["statusCode"], 201);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(bearer_request(
            "PUT",
            &format!("/v1/bus_config/{id}"),
            &token,
            r#"{"port":503}"#,
        ))
        .await
        .unwrap();
    let updated = body_json(resp).await;
    assert_eq!(updated["data"]["port"], 503);
    assert_eq!(updated["data"]["hostname"], "192.168.1.2");

    let resp = app
        .clone()
        .oneshot(bearer_request("GET", "/v1/bus_config", &token, ""))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 1);

    let resp = app
        .clone()
        .oneshot(bearer_request("DELETE", &format!("/v1/bus_config/{id}"), &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(bearer_request("GET", &format!("/v1/bus_config/{id}"), &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["description"], "bus config not found");
}

#[tokio::test]
async fn bus_config_invalid_id_returns_400() {
    let app = app(state());
    let token = obtain_token(&app).await;
    let resp = app
        .oneshot(bearer_request("GET", "/v1/bus_config/not-a-uuid", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- faults ---

#[tokio::test]
async fn faults_return_malformed_responses() {
    let app = app(state());
    let token = obtain_token(&app).await;

    let resp = app
        .clone()
        .oneshot(bearer_request("GET", "/v1/faults/no-data", &token, ""))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, json!({ "statusCode": 200 }));

    let resp = app
        .clone()
        .oneshot(bearer_request("GET", "/v1/faults/not-json", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"<html>maintenance</html>");

    let resp = app
        .oneshot(bearer_request("GET", "/v1/faults/server-error", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn binary_fault_is_not_utf8() {
    let app = app(state());
    let token = obtain_token(&app).await;

    let resp = app
        .oneshot(bearer_request("GET", "/v1/faults/binary", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = body_bytes(resp).await;
    assert!(std::str::from_utf8(&bytes).is_err());
    assert!(bytes.ends_with(b" bad bytes"));
}
