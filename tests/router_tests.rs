/// Router tests driven through tower's `oneshot`
/// The dispatcher clock is pinned so admin tokens are deterministic
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Local, TimeZone};
use rust_scoring_api::auth::AuthConfig;
use rust_scoring_api::dispatcher::Dispatcher;
use rust_scoring_api::handlers::{self, router, AppState, REQUEST_ID_HEADER};
use rust_scoring_api::store::MemoryStore;
use serde_json::{json, Value};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn pinned_now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 2, 10, 17, 45, 0).unwrap()
}

fn state() -> Arc<AppState> {
    let auth = AuthConfig {
        salt: "Otus".to_string(),
        admin_login: "admin".to_string(),
        admin_salt: "42".to_string(),
    };
    let dispatcher = Dispatcher::new(auth, Arc::new(MemoryStore::default()), Duration::from_secs(60))
        .with_clock(Arc::new(pinned_now));
    Arc::new(AppState { dispatcher })
}

fn app() -> Router {
    router(state())
}

fn admin_token() -> String {
    let input = format!("{}42", pinned_now().format("%Y%m%d%H"));
    hex::encode(Sha512::digest(input.as_bytes()))
}

fn method_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/method")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_admin_gets_fixed_score() {
    let request = json!({
        "login": "admin",
        "method": "online_score",
        "token": admin_token(),
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"}
    });

    let response = app().oneshot(method_request(&request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["response"]["score"].as_f64(), Some(42.0));
}

#[tokio::test]
async fn test_admin_token_from_other_hour_is_rejected() {
    let stale = hex::encode(Sha512::digest(b"202502101642"));
    let request = json!({
        "login": "admin",
        "method": "online_score",
        "token": stale,
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"}
    });

    let response = app().oneshot(method_request(&request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/method")
        .header(REQUEST_ID_HEADER, "req-123")
        .body(Body::from("not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    assert_eq!(
        read_json(response).await,
        json!({"error": "Bad Request", "code": 400})
    );
}

#[tokio::test]
async fn test_request_id_is_generated_when_missing() {
    let response = app()
        .oneshot(method_request(&json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_path() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/nope")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await,
        json!({"error": "Not Found", "code": 404})
    );
}

#[tokio::test]
async fn test_oversized_body_gets_envelope() {
    let request = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "method": "online_score",
        "token": "x".repeat(128),
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"}
    });
    let request = Request::builder()
        .method(Method::POST)
        .uri("/method")
        .header(REQUEST_ID_HEADER, "big-1")
        .body(Body::from(request.to_string()))
        .unwrap();

    let response = handlers::app(state(), 64).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "big-1");
    assert_eq!(
        read_json(response).await,
        json!({"error": "Payload Too Large", "code": 413})
    );
}

#[tokio::test]
async fn test_body_within_limit_reaches_dispatcher() {
    let response = handlers::app(state(), 1024)
        .oneshot(method_request(&json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_wrong_http_method_gets_envelope() {
    for (method, uri) in [(Method::GET, "/method"), (Method::DELETE, "/health")] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Method Not Allowed", "code": 405})
        );
    }
}
