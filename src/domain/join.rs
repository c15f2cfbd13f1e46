//! Inbound join events and the ledger records they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DestinationKey;

/// A join request that arrived from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEvent {
    /// Platform update id, used to drop redelivered webhooks.
    pub update_id: Option<i64>,
    /// External user identifier.
    pub user_id: String,
    /// Optional username of the joining user.
    pub username: Option<String>,
    /// Channel the user asked to join.
    pub chat_id: DestinationKey,
    /// Channel title as carried by the event.
    pub chat_title: Option<String>,
}

/// Values for a ledger row about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJoinRecord {
    /// Platform update id of the originating webhook.
    pub update_id: Option<i64>,
    /// External user identifier.
    pub user_id: String,
    /// Optional username.
    pub username: Option<String>,
    /// Destination joined.
    pub destination_key: DestinationKey,
    /// Destination title at the time of the join.
    pub destination_title: Option<String>,
    /// Join timestamp, identical to the conversion event time.
    pub joined_at: DateTime<Utc>,
    /// Conversion event id sent to the analytics endpoint.
    pub event_id: Option<Uuid>,
    /// Whether a pre-lead click was matched.
    pub click_matched: bool,
    /// Whether the conversion dispatch succeeded.
    pub dispatched: bool,
}

/// An appended join, as read back from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JoinRecord {
    /// Storage row id.
    pub id: i64,
    /// Platform update id of the originating webhook.
    pub update_id: Option<i64>,
    /// External user identifier.
    pub user_id: String,
    /// Optional username.
    pub username: Option<String>,
    /// Destination joined.
    pub destination_key: DestinationKey,
    /// Destination title at the time of the join.
    pub destination_title: Option<String>,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
    /// Conversion event id sent to the analytics endpoint.
    pub event_id: Option<Uuid>,
    /// Whether a pre-lead click was matched.
    pub click_matched: bool,
    /// Whether the conversion dispatch succeeded.
    pub dispatched: bool,
}

impl NewJoinRecord {
    /// Builds the stored form of this record with the assigned row id.
    #[must_use]
    pub fn with_id(self, id: i64) -> JoinRecord {
        JoinRecord {
            id,
            update_id: self.update_id,
            user_id: self.user_id,
            username: self.username,
            destination_key: self.destination_key,
            destination_title: self.destination_title,
            joined_at: self.joined_at,
            event_id: self.event_id,
            click_matched: self.click_matched,
            dispatched: self.dispatched,
        }
    }
}

/// Number of joins recorded for one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DestinationJoinCount {
    /// Destination key.
    pub destination_key: DestinationKey,
    /// Total joins recorded.
    pub joins: i64,
}
