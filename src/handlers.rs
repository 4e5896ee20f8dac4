use crate::dispatcher::{Context, Dispatcher};
use crate::errors::AppError;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Header carrying the caller-supplied (or generated) request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validation and dispatch core.
    pub dispatcher: Dispatcher,
}

/// Builds the service routes.
///
/// Middleware (tracing, body limits) is layered on by the caller so tests can
/// exercise the bare router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/method", post(method_endpoint).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(state)
}

/// Router plus the middleware stack `main` serves.
///
/// Bodies over `max_body_bytes` are rejected inside `method_endpoint`, so the
/// 413 still goes out as a JSON envelope.
pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(max_body_bytes)),
    )
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-scoring-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /method
///
/// Single RPC endpoint. The raw body goes to the dispatcher untouched so that
/// malformed JSON is reported in the same envelope as every other failure.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `headers` - Request headers; `X-Request-ID` is reused when present.
/// * `body` - Raw request body, or the rejection when it could not be buffered.
///
/// # Returns
///
/// * `Response` - JSON envelope whose `code` equals the HTTP status.
pub async fn method_endpoint(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = match body {
        Ok(body) => {
            tracing::debug!("POST /method - request_id: {}, {} bytes", request_id, body.len());

            let mut ctx = Context::new(request_id.clone());
            let (status, payload) = state.dispatcher.handle(&body, &mut ctx).await;
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                payload,
            )
                .into_response()
        }
        Err(rejection) => {
            tracing::debug!("POST /method - request_id: {}, body rejected: {}", request_id, rejection);
            body_rejection(rejection).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn body_rejection(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::MalformedRequest(rejection.body_text())
    }
}

/// Fallback for unknown paths, rendered in the same envelope as `/method`.
pub async fn not_found() -> Response {
    AppError::NotFound.into_response()
}

/// Fallback for unsupported HTTP methods on known paths.
pub async fn method_not_allowed() -> Response {
    AppError::MethodNotAllowed.into_response()
}
