//! Destination administration: create, list, get, reconfigure.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::CreateDestinationRequest;
use crate::app_state::AppState;
use crate::domain::{Destination, DestinationKey, DestinationUpdate};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /admin/destinations` — Create a destination explicitly.
///
/// # Errors
///
/// - [`GatewayError::InvalidRequest`] on a blank key or field.
/// - [`GatewayError::TenantNotFound`] for an unknown tenant.
/// - [`GatewayError::DestinationExists`] if the chat is already tracked.
#[utoipa::path(
    post,
    path = "/api/v1/admin/destinations",
    tag = "Admin",
    summary = "Create a destination",
    description = "Registers a channel ahead of its first join. Omitted pixel and landing URL take the system defaults.",
    request_body = CreateDestinationRequest,
    responses(
        (status = 201, description = "Destination created", body = Destination),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or wrong admin key", body = ErrorResponse),
        (status = 404, description = "Tenant not found", body = ErrorResponse),
        (status = 409, description = "Destination already exists", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_destination(
    State(state): State<AppState>,
    Json(req): Json<CreateDestinationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let (chat_id, draft) = req.into_parts();
    let key = DestinationKey::from(chat_id);
    let destination = state.registry.create(&key, draft).await?;
    Ok((StatusCode::CREATED, Json(destination)))
}

/// `GET /admin/destinations` — List destinations.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/admin/destinations",
    tag = "Admin",
    summary = "List destinations",
    responses(
        (status = 200, description = "All destinations", body = Vec<Destination>),
        (status = 401, description = "Missing or wrong admin key", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_destinations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.registry.list().await?))
}

/// `GET /admin/destinations/{chat_id}` — Get one destination.
///
/// # Errors
///
/// Returns [`GatewayError::DestinationNotFound`] if the chat is unknown.
#[utoipa::path(
    get,
    path = "/api/v1/admin/destinations/{chat_id}",
    tag = "Admin",
    summary = "Get a destination",
    params(
        ("chat_id" = String, Path, description = "External chat id"),
    ),
    responses(
        (status = 200, description = "Destination", body = Destination),
        (status = 401, description = "Missing or wrong admin key", body = ErrorResponse),
        (status = 404, description = "Destination not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_destination(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let key = DestinationKey::new(chat_id);
    Ok(Json(state.registry.get(&key).await?))
}

/// `PATCH /admin/destinations/{chat_id}` — Reconfigure a destination.
///
/// # Errors
///
/// - [`GatewayError::InvalidRequest`] if no field is set or a field is
///   blank.
/// - [`GatewayError::TenantNotFound`] for an unknown tenant.
/// - [`GatewayError::DestinationNotFound`] if the chat is unknown.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/destinations/{chat_id}",
    tag = "Admin",
    summary = "Update destination config",
    description = "Partially updates pixel, landing URL, tenant, or deep link. Fields left out keep their value; repeating an update is a no-op.",
    params(
        ("chat_id" = String, Path, description = "External chat id"),
    ),
    request_body = DestinationUpdate,
    responses(
        (status = 200, description = "Updated destination", body = Destination),
        (status = 400, description = "Empty or invalid update", body = ErrorResponse),
        (status = 401, description = "Missing or wrong admin key", body = ErrorResponse),
        (status = 404, description = "Destination or tenant not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_destination(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(update): Json<DestinationUpdate>,
) -> Result<impl IntoResponse, GatewayError> {
    let key = DestinationKey::new(chat_id);
    let destination = state.registry.apply_config(&key, &update).await?;
    Ok(Json(destination))
}

/// Destination admin routes. The caller applies the admin auth layer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/destinations",
            get(list_destinations).post(create_destination),
        )
        .route(
            "/destinations/{chat_id}",
            get(get_destination).patch(update_destination),
        )
}
