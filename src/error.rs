//! Application error type and HTTP mapping.
//!
//! Every fallible operation in the service returns [`AppError`]. The variants
//! mirror the conditions the core distinguishes between: recoverable
//! not-found and duplicate-key signals, terminal code-space exhaustion, and
//! opaque store failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Serializable error payload returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Typed application error.
///
/// - [`AppError::NotFound`] is an expected, recoverable condition: the
///   allocator reads it as "candidate code is free", the lookup path maps it
///   to a 404.
/// - [`AppError::Conflict`] is the duplicate-key signal raised by the store's
///   unique constraint. The link-creation flow treats it as a collision and
///   retries the whole allocate-and-insert cycle within its budget.
/// - [`AppError::CodeSpaceExhausted`] is terminal for a single creation call:
///   the retry budget ran out without finding a free code.
/// - [`AppError::Internal`] wraps any other store fault and is never retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("failed to allocate a unique short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
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

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Converts the error into its client-facing payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, details) = match self {
            AppError::Validation { details, .. } => ("validation_error", details.clone()),
            AppError::NotFound { details, .. } => ("not_found", details.clone()),
            AppError::Conflict { details, .. } => ("conflict", details.clone()),
            AppError::CodeSpaceExhausted { attempts } => (
                "code_space_exhausted",
                json!({ "attempts": attempts }),
            ),
            AppError::Internal { details, .. } => ("internal_error", details.clone()),
        };

        ErrorInfo {
            code,
            message: self.to_string(),
            details,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::CodeSpaceExhausted { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => {
                AppError::not_found("Record not found", json!({}))
            }
            _ => {
                if let Some(db) = e.as_database_error()
                    && db.is_unique_violation()
                {
                    return AppError::conflict(
                        "Unique constraint violation",
                        json!({ "constraint": db.constraint() }),
                    );
                }

                tracing::error!(error = %e, "database error");
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request(
            "Request validation failed",
            serde_json::to_value(&e).unwrap_or_else(|_| json!({})),
        )
    }
}
