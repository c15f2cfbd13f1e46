//! Credential checks for the administrative and webhook surfaces.
//!
//! Admin routes require `Authorization: Bearer <ADMIN_API_KEY>`. When no key
//! is configured every admin request is rejected (fail-closed).

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// Header carrying the secret registered with `setWebhook`.
pub const WEBHOOK_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Middleware that validates the admin bearer token.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when no key is configured or the
/// header is missing or wrong.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(expected) = state.admin_api_key.as_deref() else {
        tracing::error!("admin request rejected: no admin key configured");
        return Err(GatewayError::Unauthorized);
    };

    let presented = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            tracing::debug!(path = %request.uri().path(), "admin request rejected");
            Err(GatewayError::Unauthorized)
        }
    }
}

/// Checks the webhook secret header. Passes when no secret is configured.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] on a missing or wrong header.
pub fn check_webhook_secret(
    expected: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), GatewayError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented == Some(expected) {
        Ok(())
    } else {
        tracing::warn!("webhook rejected: secret token mismatch");
        Err(GatewayError::Unauthorized)
    }
}
