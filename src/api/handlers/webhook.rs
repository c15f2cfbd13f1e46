//! Chat platform webhook: join requests enter the pipeline here.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::api::auth::check_webhook_secret;
use crate::api::dto::TelegramUpdate;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /telegram-webhook` — Receive a platform update.
///
/// # Errors
///
/// - [`GatewayError::Unauthorized`] on a secret token mismatch.
/// - [`GatewayError::ApprovalFailed`] if the join could not be approved.
/// - [`GatewayError::PersistenceError`] on storage failure.
#[utoipa::path(
    post,
    path = "/telegram-webhook",
    tag = "Webhook",
    summary = "Receive a Telegram update",
    description = "Approves `chat_join_request` updates, attributes them to a recent landing-page click, and reports a Lead conversion. Other update types are acknowledged and ignored. A failed conversion dispatch still answers 200.",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Update processed or ignored", body = serde_json::Value),
        (status = 401, description = "Secret token mismatch", body = ErrorResponse),
        (status = 502, description = "Join approval failed", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> Result<impl IntoResponse, GatewayError> {
    check_webhook_secret(state.webhook_secret.as_deref(), &headers)?;

    let update_id = update.update_id;
    let Some(event) = update.into_join_event() else {
        tracing::debug!(?update_id, "non-join update ignored");
        return Ok(Json(json!({ "ok": true, "outcome": "ignored" })));
    };

    tracing::info!(
        ?update_id,
        chat_id = %event.chat_id,
        user_id = %event.user_id,
        "join request received"
    );
    let outcome = state.pipeline.process(event).await?;
    Ok(Json(json!({ "ok": true, "result": outcome })))
}

/// Webhook route mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/telegram-webhook", post(telegram_webhook))
}
