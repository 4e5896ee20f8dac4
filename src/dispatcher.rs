//! Request dispatch: envelope validation, authentication, method routing.
//!
//! [`Dispatcher::handle`] is the single entry point the transport calls per
//! request. It never returns an error: every outcome is rendered into a
//! `{"response": ..., "code": ...}` or `{"error": ..., "code": ...}` envelope.
use crate::auth::{AuthConfig, Principal};
use crate::errors::{AppError, ResultExt};
use crate::models::{ClientsInterestsResponse, MethodResponse, OnlineScoreResponse};
use crate::requests::{
    ClientsInterestsArguments, MethodRequest, OnlineScoreArguments, METHOD_CLIENTS_INTERESTS,
    METHOD_ONLINE_SCORE,
};
use crate::scoring;
use crate::store::Store;
use axum::http::StatusCode;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Score returned to the admin principal regardless of the arguments.
pub const ADMIN_SCORE: f64 = 42.0;

/// Source of "now" for token windows and birthday ages.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Per-request values that live outside the validated schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub request_id: String,
    pub login: String,
    pub is_admin: bool,
    /// Non-empty online_score fields.
    pub has: Vec<String>,
    /// Number of client ids requested by clients_interests.
    pub nclients: usize,
}

impl Context {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }
}

/// Methods reachable through the envelope's `method` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    OnlineScore,
    ClientsInterests,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            METHOD_ONLINE_SCORE => Some(Method::OnlineScore),
            METHOD_CLIENTS_INTERESTS => Some(Method::ClientsInterests),
            _ => None,
        }
    }
}

/// Validates, authenticates and executes method calls.
#[derive(Clone)]
pub struct Dispatcher {
    auth: AuthConfig,
    store: Arc<dyn Store>,
    score_cache_ttl: Duration,
    clock: Clock,
}

impl Dispatcher {
    pub fn new(auth: AuthConfig, store: Arc<dyn Store>, score_cache_ttl: Duration) -> Self {
        Self {
            auth,
            store,
            score_cache_ttl,
            clock: Arc::new(Local::now),
        }
    }

    /// Replaces the wall clock, e.g. to pin the admin token hour in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs one call end to end and returns the status plus serialized envelope.
    pub async fn handle(&self, raw_body: &[u8], ctx: &mut Context) -> (StatusCode, Vec<u8>) {
        let (status, envelope) = self.respond(raw_body, ctx).await;
        (status, envelope.to_bytes())
    }

    /// Like [`Dispatcher::handle`] but returns the envelope unserialized.
    pub async fn respond(&self, raw_body: &[u8], ctx: &mut Context) -> (StatusCode, MethodResponse) {
        let outcome = self.dispatch(raw_body, ctx).await;
        let (status, envelope) = match outcome {
            Ok(response) => (StatusCode::OK, MethodResponse::success(response)),
            Err(err) => err.to_envelope(),
        };

        tracing::info!(
            request_id = %ctx.request_id,
            login = %ctx.login,
            has = ?ctx.has,
            nclients = ctx.nclients,
            code = status.as_u16(),
            "Request processed"
        );
        (status, envelope)
    }

    async fn dispatch(&self, raw_body: &[u8], ctx: &mut Context) -> Result<Value, AppError> {
        let now = (self.clock)();
        let today = now.date_naive();

        let body: Value = serde_json::from_slice(raw_body)
            .map_err(|e| AppError::MalformedRequest(e.to_string()))?;
        let Value::Object(raw) = body else {
            return Err(AppError::MalformedRequest(
                "request body must be a JSON object".to_string(),
            ));
        };

        let request = MethodRequest::parse(&raw, today)?;
        ctx.login = request.login.clone();

        let principal = self
            .auth
            .authenticate(&request, now)
            .ok_or(AppError::Forbidden)?;
        ctx.is_admin = principal == Principal::Admin;

        let method = Method::from_name(&request.method)
            .ok_or_else(|| AppError::MethodNotFound(request.method.clone()))?;
        tracing::debug!(request_id = %ctx.request_id, method = ?method, "Dispatching");

        match method {
            Method::OnlineScore => {
                let args = OnlineScoreArguments::parse(&request.arguments, today)?;
                self.online_score(&args, ctx).await
            }
            Method::ClientsInterests => {
                let args = ClientsInterestsArguments::parse(&request.arguments, today)?;
                self.clients_interests(&args, ctx).await
            }
        }
    }

    async fn online_score(
        &self,
        args: &OnlineScoreArguments,
        ctx: &mut Context,
    ) -> Result<Value, AppError> {
        ctx.has = args.filled.iter().map(|name| name.to_string()).collect();

        let score = if ctx.is_admin {
            ADMIN_SCORE
        } else {
            scoring::get_score(self.store.as_ref(), &ctx.login, args, self.score_cache_ttl).await
        };

        serde_json::to_value(OnlineScoreResponse { score })
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn clients_interests(
        &self,
        args: &ClientsInterestsArguments,
        ctx: &mut Context,
    ) -> Result<Value, AppError> {
        ctx.nclients = args.client_ids.len();

        let mut interests = ClientsInterestsResponse::new();
        for &client_id in &args.client_ids {
            let list = scoring::get_interests(self.store.as_ref(), client_id)
                .await
                .with_context(|| format!("interests lookup for client {}", client_id))?;
            interests.insert(client_id.to_string(), list);
        }

        serde_json::to_value(interests).map_err(|e| AppError::Internal(e.to_string()))
    }
}
