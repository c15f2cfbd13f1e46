//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod pre_leads;
pub mod reports;
pub mod system;
pub mod webhook;

use axum::Router;

use crate::app_state::AppState;

/// Public resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().merge(pre_leads::routes())
}

/// Admin resource routes under `/api/v1/admin`, before the auth layer.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .merge(admin::routes())
        .merge(reports::routes())
}
