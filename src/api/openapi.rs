//! OpenAPI document for the HTTP surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    ChatIdInput, CreateDestinationRequest, PreLeadRequest, PreLeadResponse, StatsResponse,
};
use super::handlers::{admin, pre_leads, reports, system, webhook};
use crate::domain::{
    Destination, DestinationJoinCount, DestinationKey, DestinationUpdate, JoinRecord, TenantId,
};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated API description.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "funnel-gateway",
        description = "Telegram join-request approval and ad conversion attribution"
    ),
    paths(
        webhook::telegram_webhook,
        pre_leads::create_pre_lead,
        admin::create_destination,
        admin::list_destinations,
        admin::get_destination,
        admin::update_destination,
        reports::recent_joins,
        reports::stats,
        system::health_handler,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        Destination,
        DestinationUpdate,
        DestinationKey,
        TenantId,
        JoinRecord,
        DestinationJoinCount,
        ChatIdInput,
        PreLeadRequest,
        PreLeadResponse,
        CreateDestinationRequest,
        StatsResponse,
        system::HealthResponse,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by admin paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
