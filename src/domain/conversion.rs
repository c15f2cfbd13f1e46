//! Conversion events reported to the ads-analytics endpoint.
//!
//! A [`ConversionEvent`] serializes to the event object expected by the
//! Meta Conversions API. The joining user is identified only by a SHA-256
//! digest of their platform id; the raw id never leaves the process.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Event name reported for every approved join.
pub const LEAD_EVENT_NAME: &str = "Lead";

/// Action source reported for server-side generated events.
pub const ACTION_SOURCE: &str = "system_generated";

/// Returns the lowercase hex SHA-256 digest of an external user id.
#[must_use]
pub fn hash_external_id(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}

/// User matching data attached to a conversion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    /// SHA-256 hex digest of the external user id.
    pub external_id: String,
    /// Click-attribution token recovered from a matched pre-lead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,
}

/// One conversion event addressed to an attribution pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionEvent {
    /// Pixel the event is attributed to. Part of the request URL, not the body.
    #[serde(skip)]
    pub pixel_id: String,
    /// Event name, always [`LEAD_EVENT_NAME`].
    pub event_name: &'static str,
    /// Event time in unix seconds.
    pub event_time: i64,
    /// Deduplication id for the analytics endpoint.
    pub event_id: Uuid,
    /// Landing page the conversion is attributed to.
    pub event_source_url: String,
    /// Always [`ACTION_SOURCE`].
    pub action_source: &'static str,
    /// Hashed user matching data.
    pub user_data: UserData,
}

impl ConversionEvent {
    /// Builds a `Lead` event for `user_id` joining at `event_time`.
    #[must_use]
    pub fn lead(
        pixel_id: &str,
        lp_url: &str,
        user_id: &str,
        event_time: DateTime<Utc>,
        fbc: Option<String>,
    ) -> Self {
        Self {
            pixel_id: pixel_id.to_string(),
            event_name: LEAD_EVENT_NAME,
            event_time: event_time.timestamp(),
            event_id: Uuid::new_v4(),
            event_source_url: lp_url.to_string(),
            action_source: ACTION_SOURCE,
            user_data: UserData {
                external_id: hash_external_id(user_id),
                fbc,
            },
        }
    }
}

/// Outcome of a best-effort conversion dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The analytics endpoint acknowledged the event.
    Dispatched,
    /// The dispatch failed; the join is still recorded.
    Failed(String),
}

impl DispatchOutcome {
    /// Returns `true` if the event was acknowledged.
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched)
    }
}
