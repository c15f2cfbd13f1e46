//! Landing-page clicks awaiting correlation with a later join.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::DestinationKey;

/// A recorded landing-page click.
///
/// Once `consumed` is set the row is never matched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreLead {
    /// Storage row id.
    pub id: i64,
    /// Destination the click pointed at.
    pub destination_key: DestinationKey,
    /// Opaque click-attribution token (the `fbc` cookie), if captured.
    pub token: Option<String>,
    /// When the click was recorded.
    pub created_at: DateTime<Utc>,
    /// Whether a join has already claimed this click.
    pub consumed: bool,
}

/// Result of a successful consume-and-mark lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreLeadMatch {
    /// Row id of the claimed click.
    pub id: i64,
    /// Click-attribution token carried by the claimed click.
    pub token: Option<String>,
    /// When the claimed click was recorded.
    pub created_at: DateTime<Utc>,
}

/// Normalizes a raw click token: blank tokens are treated as absent.
#[must_use]
pub fn normalize_token(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
