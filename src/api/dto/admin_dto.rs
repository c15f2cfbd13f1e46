//! Administrative DTOs for destinations and reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::ChatIdInput;
use crate::domain::{DestinationJoinCount, TenantId};
use crate::service::DestinationDraft;

/// Request body for `POST /api/v1/admin/destinations`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDestinationRequest {
    /// External chat identifier.
    pub chat_id: ChatIdInput,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Attribution pixel id; the system default when omitted.
    #[serde(default)]
    pub pixel_id: Option<String>,
    /// Landing page URL; the system default when omitted.
    #[serde(default)]
    pub lp_url: Option<String>,
    /// Owning tenant; the default tenant when omitted.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Deep link.
    #[serde(default)]
    pub deep_link: Option<String>,
}

impl CreateDestinationRequest {
    /// Splits the request into key and draft.
    #[must_use]
    pub fn into_parts(self) -> (ChatIdInput, DestinationDraft) {
        (
            self.chat_id,
            DestinationDraft {
                title: self.title,
                pixel_id: self.pixel_id,
                lp_url: self.lp_url,
                tenant_id: self.tenant_id,
                deep_link: self.deep_link,
            },
        )
    }
}

/// Response body for `GET /api/v1/admin/stats`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Joins recorded in the last 24 hours.
    pub joins_last_24h: i64,
    /// All-time joins per destination, largest first.
    pub by_destination: Vec<DestinationJoinCount>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}
