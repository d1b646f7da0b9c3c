//! Application error taxonomy and its HTTP representation.
//!
//! Every failure that can leave a component is one of the [`AppError`]
//! variants. Each variant carries a human-readable message, a JSON `details`
//! payload and maps to a stable numeric [`AppError::error_code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::infrastructure::cache::CacheError;
use crate::infrastructure::queue::QueueError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub error_code: u16,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    #[error("{message}")]
    Forbidden { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    DuplicateCode { message: String, details: Value },
    #[error("{message}")]
    RateLimited { message: String, details: Value },
    /// Cache, store or queue unavailable. Safe to retry.
    #[error("{message}")]
    TransientIo { message: String, details: Value },
    /// Invariant violation or programmer error.
    #[error("{message}")]
    Fatal { message: String, details: Value },
}

impl AppError {
    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn duplicate_code(message: impl Into<String>, details: Value) -> Self {
        Self::DuplicateCode {
            message: message.into(),
            details,
        }
    }
    pub fn rate_limited(message: impl Into<String>, details: Value) -> Self {
        Self::RateLimited {
            message: message.into(),
            details,
        }
    }
    pub fn transient(message: impl Into<String>, details: Value) -> Self {
        Self::TransientIo {
            message: message.into(),
            details,
        }
    }
    pub fn fatal(message: impl Into<String>, details: Value) -> Self {
        Self::Fatal {
            message: message.into(),
            details,
        }
    }

    /// Stable numeric code, part of the public error contract.
    pub fn error_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 1000,
            Self::Unauthorized { .. } => 1001,
            Self::Forbidden { .. } => 1002,
            Self::NotFound { .. } => 1003,
            Self::DuplicateCode { .. } => 1004,
            Self::RateLimited { .. } => 1005,
            Self::TransientIo { .. } => 1006,
            Self::Fatal { .. } => 1007,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateCode { .. } => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::TransientIo { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Fatal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::DuplicateCode { .. } => "duplicate_code",
            Self::RateLimited { .. } => "too_many_requests",
            Self::TransientIo { .. } => "service_unavailable",
            Self::Fatal { .. } => "internal_error",
        }
    }

    /// True for failures a caller may retry unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo { .. })
    }

    pub fn into_info(self) -> ErrorInfo {
        let code = self.slug();
        let error_code = self.error_code();
        let (message, details) = match self {
            Self::Validation { message, details }
            | Self::Unauthorized { message, details }
            | Self::Forbidden { message, details }
            | Self::NotFound { message, details }
            | Self::DuplicateCode { message, details }
            | Self::RateLimited { message, details }
            | Self::TransientIo { message, details }
            | Self::Fatal { message, details } => (message, details),
        };

        ErrorInfo {
            code,
            error_code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), "{}", self);
        }

        let body = ErrorBody {
            error: self.into_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

/// Classifies a database error. Unique violations become
/// [`AppError::DuplicateCode`]; connectivity problems and serialization
/// conflicts are transient; everything else is fatal.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::duplicate_code(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
        // serialization_failure, deadlock_detected
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return AppError::transient("Store conflict, retry", json!({}));
        }
        return AppError::fatal("Database error", json!({ "reason": db.message() }));
    }

    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            AppError::transient("Store unavailable", json!({ "reason": e.to_string() }))
        }
        other => AppError::fatal("Database error", json!({ "reason": other.to_string() })),
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::transient("Cache unavailable", json!({ "reason": e.to_string() }))
    }
}

impl From<QueueError> for AppError {
    fn from(e: QueueError) -> Self {
        AppError::transient("Queue unavailable", json!({ "reason": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Map::new();
        for (field, errs) in errors.field_errors() {
            let messages: Vec<Value> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| Value::String(m.to_string()))
                        .unwrap_or_else(|| Value::String(e.code.to_string()))
                })
                .collect();
            fields.insert(field.to_string(), Value::Array(messages));
        }

        AppError::validation("Validation failed", json!({ "fields": fields }))
    }
}
