//! Landing-page click notification DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::ChatIdInput;
use crate::domain::DestinationKey;

/// Request body for `POST /api/v1/pre-leads`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PreLeadRequest {
    /// Destination the landing page promotes.
    #[serde(default, alias = "channel_id")]
    pub destination_key: Option<ChatIdInput>,
    /// Click-attribution cookie value, if the browser had one.
    #[serde(default, alias = "token")]
    pub fbc: Option<String>,
}

/// Response body for `POST /api/v1/pre-leads` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct PreLeadResponse {
    /// Stored click id.
    pub id: i64,
    /// Destination the click was recorded for.
    pub destination_key: DestinationKey,
    /// Whether a click token was stored.
    pub has_token: bool,
    /// Server timestamp of the click.
    pub created_at: DateTime<Utc>,
}
