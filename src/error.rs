//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::clients::TransportError;
use crate::domain::{DestinationKey, TenantId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "destination not found: -100123",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation / Auth | 400 Bad Request / 401          |
/// | 2000–2999 | State/Not Found   | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server / Upstream | 500 Internal / 502 Bad Gateway |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed before any storage access.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong credential.
    #[error("unauthorized")]
    Unauthorized,

    /// No destination exists for the given chat id.
    #[error("destination not found: {0}")]
    DestinationNotFound(DestinationKey),

    /// No tenant exists with the given id.
    #[error("tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Explicit creation of a destination that already exists.
    #[error("destination already exists: {0}")]
    DestinationExists(DestinationKey),

    /// The chat platform refused or never answered the approval call.
    #[error("join approval failed: {0}")]
    ApprovalFailed(#[source] TransportError),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized => 1101,
            Self::DestinationNotFound(_) => 2001,
            Self::TenantNotFound(_) => 2002,
            Self::DestinationExists(_) => 2101,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::ApprovalFailed(_) => 3101,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::DestinationNotFound(_) | Self::TenantNotFound(_) => StatusCode::NOT_FOUND,
            Self::DestinationExists(_) => StatusCode::CONFLICT,
            Self::ApprovalFailed(_) => StatusCode::BAD_GATEWAY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
