//! Join reporting: recent joins and aggregate counts.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::TimeDelta;

use crate::api::dto::{LimitParams, StatsResponse};
use crate::app_state::AppState;
use crate::domain::JoinRecord;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /admin/joins` — Most recent joins, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/admin/joins",
    tag = "Reports",
    summary = "Recent joins",
    description = "Returns the newest join records. `limit` defaults to 20 and is clamped to 1–200.",
    params(LimitParams),
    responses(
        (status = 200, description = "Recent joins", body = Vec<JoinRecord>),
        (status = 401, description = "Missing or wrong admin key", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn recent_joins(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.ledger.query_recent(params.limit).await?))
}

/// `GET /admin/stats` — Join counts.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Reports",
    summary = "Join statistics",
    description = "Joins recorded in the last 24 hours and all-time totals per destination.",
    responses(
        (status = 200, description = "Join statistics", body = StatsResponse),
        (status = 401, description = "Missing or wrong admin key", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let now = state.clock.now();
    let since = now
        .checked_sub_signed(TimeDelta::hours(24))
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);

    let joins_last_24h = state.ledger.count_since(since).await?;
    let by_destination = state.ledger.count_by_destination().await?;

    Ok(Json(StatsResponse {
        joins_last_24h,
        by_destination,
        generated_at: now,
    }))
}

/// Reporting routes. The caller applies the admin auth layer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/joins", get(recent_joins))
        .route("/stats", get(stats))
}
