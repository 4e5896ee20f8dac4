use crate::models::MethodResponse;
use crate::schema::ValidationError;
use crate::store::StoreError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Body is not valid JSON or not a JSON object.
    MalformedRequest(String),
    /// Envelope or arguments violate their schema.
    Validation(ValidationError),
    /// Token mismatch.
    Forbidden,
    /// `method` names no known handler.
    MethodNotFound(String),
    /// Unknown path.
    NotFound,
    /// Known path, unsupported HTTP method.
    MethodNotAllowed,
    /// Body exceeds the configured size limit.
    PayloadTooLarge,
    /// Key-value store failure.
    Store(StoreError),
    /// Internal server error.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            AppError::Validation(err) => write!(f, "Validation error: {}", err),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::MethodNotFound(name) => write!(f, "Method not found: {}", name),
            AppError::NotFound => write!(f, "Not found"),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::PayloadTooLarge => write!(f, "Payload too large"),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Status code reported both as HTTP status and envelope `code`.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) | AppError::MethodNotFound(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::WithContext { source, .. } => source.status(),
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Only validation failures echo details; everything else uses a fixed text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::MalformedRequest(_) => "Bad Request".to_string(),
            AppError::Validation(err) => err.to_string(),
            AppError::Forbidden => "Forbidden".to_string(),
            AppError::MethodNotFound(name) => format!("Method not found: {}", name),
            AppError::NotFound => "Not Found".to_string(),
            AppError::MethodNotAllowed => "Method Not Allowed".to_string(),
            AppError::PayloadTooLarge => "Payload Too Large".to_string(),
            AppError::Store(_) | AppError::Internal(_) => "Internal Server Error".to_string(),
            AppError::WithContext { source, .. } => source.public_message(),
        }
    }

    /// Logs the error at a level matching its severity and builds the envelope.
    pub fn to_envelope(&self) -> (StatusCode, MethodResponse) {
        let status = self.status();
        match self {
            AppError::Store(_) | AppError::Internal(_) | AppError::WithContext { .. }
                if status.is_server_error() =>
            {
                tracing::error!("Request failed: {}", self);
            }
            AppError::Forbidden => tracing::warn!("Authentication failed"),
            AppError::MalformedRequest(detail) => {
                tracing::info!("Malformed request body: {}", detail)
            }
            _ => tracing::info!("Request rejected: {}", self),
        }
        (status, MethodResponse::failure(self.public_message(), status.as_u16()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_envelope();
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_bytes(),
        )
            .into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

/// Extension trait for adding context to store errors.
/// Similar to `anyhow::Context` but yields our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

/// Extension for StoreError to add context
impl<T> ResultExt<T> for Result<T, StoreError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Store(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Store(e)),
            context: f(),
        })
    }
}
