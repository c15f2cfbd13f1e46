//! Landing-page click notifications.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{PreLeadRequest, PreLeadResponse};
use crate::app_state::AppState;
use crate::domain::DestinationKey;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /pre-leads` — Record a landing-page click.
///
/// # Errors
///
/// - [`GatewayError::InvalidRequest`] if `destination_key` is missing or
///   blank.
/// - [`GatewayError::PersistenceError`] on storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/pre-leads",
    tag = "Pre-leads",
    summary = "Record a landing-page click",
    description = "Stores a click for later attribution. `channel_id` is accepted as an alias of `destination_key` and `token` as an alias of `fbc`; a blank `fbc` is stored as absent.",
    request_body = PreLeadRequest,
    responses(
        (status = 201, description = "Click recorded", body = PreLeadResponse),
        (status = 400, description = "Missing destination key", body = ErrorResponse),
    )
)]
pub async fn create_pre_lead(
    State(state): State<AppState>,
    Json(req): Json<PreLeadRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let key = req
        .destination_key
        .map(DestinationKey::from)
        .unwrap_or_else(|| DestinationKey::new(""));

    let pre_lead = state.pre_leads.record(&key, req.fbc).await?;

    let response = PreLeadResponse {
        id: pre_lead.id,
        destination_key: pre_lead.destination_key,
        has_token: pre_lead.token.is_some(),
        created_at: pre_lead.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Pre-lead routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/pre-leads", post(create_pre_lead))
}
