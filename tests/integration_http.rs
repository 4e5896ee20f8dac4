/// End-to-end tests over a real TCP listener
/// Mirrors how clients call the service: JSON fixtures POSTed to /method
use rust_scoring_api::auth::AuthConfig;
use rust_scoring_api::dispatcher::Dispatcher;
use rust_scoring_api::handlers::{router, AppState};
use rust_scoring_api::store::MemoryStore;
use serde_json::{json, Value};
use sha2::{Digest, Sha512};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SALT: &str = "Otus";
const ADMIN_SALT: &str = "42";

fn test_auth() -> AuthConfig {
    AuthConfig {
        salt: SALT.to_string(),
        admin_login: "admin".to_string(),
        admin_salt: ADMIN_SALT.to_string(),
    }
}

/// Starts the service on an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    let store = MemoryStore::default();
    store.insert("i:1", json!(["books", "music"]).to_string()).await;
    store.insert("i:2", json!(["travel", "sports"]).to_string()).await;
    store.insert("i:3", json!(["movies", "tech"]).to_string()).await;

    let dispatcher = Dispatcher::new(test_auth(), Arc::new(store), Duration::from_secs(60));
    let app = router(Arc::new(AppState { dispatcher }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn load_fixture(kind: &str, name: &str) -> Value {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", kind, name]
        .iter()
        .collect();
    let raw = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

/// Signs a regular (non-admin) request the way a client would.
fn set_valid_auth(request: &mut Value) {
    let account = request["account"].as_str().unwrap_or_default();
    let login = request["login"].as_str().unwrap_or_default();
    let digest = Sha512::digest(format!("{}{}{}", account, login, SALT).as_bytes());
    request["token"] = json!(hex::encode(digest));
}

async fn post_raw(base: &str, body: String) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/method", base))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap();
    (status, body)
}

async fn post(base: &str, request: &Value) -> (u16, Value) {
    post_raw(base, request.to_string()).await
}

#[tokio::test]
async fn test_valid_online_score() {
    let base = spawn_server().await;
    let mut request = load_fixture("requests", "valid_online_score_request.json");
    let expected = load_fixture("responses", "expected_online_score_response.json");
    set_valid_auth(&mut request);

    let (status, body) = post(&base, &request).await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], expected["code"]);
    let score = body["response"]["score"].as_f64().unwrap();
    assert!(score >= 0.0);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_invalid_online_score() {
    let base = spawn_server().await;
    let mut request = load_fixture("requests", "invalid_online_score_request.json");
    set_valid_auth(&mut request);

    let (status, body) = post(&base, &request).await;

    assert_eq!(status, 422);
    assert_eq!(body["code"], 422);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("phone"), "error: {}", error);
    assert!(error.contains("email"), "error: {}", error);
}

#[tokio::test]
async fn test_valid_clients_interests() {
    let base = spawn_server().await;
    let mut request = load_fixture("requests", "valid_clients_interests_request.json");
    let expected = load_fixture("responses", "expected_clients_interests_response.json");
    set_valid_auth(&mut request);

    let (status, body) = post(&base, &request).await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], expected["code"]);
    let interests = body["response"].as_object().unwrap();
    assert_eq!(interests.len(), 3);
    for (cid, list) in interests {
        assert_eq!(list, &expected["response"][cid]);
    }
}

#[tokio::test]
async fn test_invalid_clients_interests() {
    let base = spawn_server().await;
    let mut request = load_fixture("requests", "invalid_clients_interests_request.json");
    set_valid_auth(&mut request);

    let (status, body) = post(&base, &request).await;

    assert_eq!(status, 422);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("client_ids"), "error: {}", error);
    assert!(error.contains("date"), "error: {}", error);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let base = spawn_server().await;
    let (status, body) = post_raw(&base, "{\"login\": ".to_string()).await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Bad Request", "code": 400}));
}

#[tokio::test]
async fn test_missing_token_is_invalid_request() {
    let base = spawn_server().await;
    let request = load_fixture("requests", "valid_online_score_request.json");

    let (status, body) = post(&base, &request).await;

    assert_eq!(status, 422);
    assert!(body["error"].as_str().unwrap().contains("token"));
}

#[tokio::test]
async fn test_wrong_token_is_forbidden() {
    let base = spawn_server().await;
    let mut request = load_fixture("requests", "valid_online_score_request.json");
    request["token"] = json!("not-a-valid-token");

    let (status, body) = post(&base, &request).await;

    assert_eq!(status, 403);
    assert_eq!(body, json!({"error": "Forbidden", "code": 403}));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{}/other", base))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Not Found", "code": 404}));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let base = spawn_server().await;
    let mut request = load_fixture("requests", "valid_clients_interests_request.json");
    set_valid_auth(&mut request);

    let mut handles = vec![];
    for _ in 0..10 {
        let base = base.clone();
        let request = request.clone();
        handles.push(tokio::spawn(async move { post(&base, &request).await }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["response"].as_object().unwrap().len(), 3);
    }
}
