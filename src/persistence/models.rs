//! Database row models and their conversion into domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Destination, DestinationJoinCount, DestinationKey, JoinRecord, PreLead, PreLeadMatch, TenantId,
};

/// A row from the `destinations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DestinationRow {
    /// External chat identifier (primary key).
    pub chat_id: String,
    /// Owning tenant id.
    pub tenant_id: i64,
    /// Display title.
    pub title: Option<String>,
    /// Optional deep link.
    pub deep_link: Option<String>,
    /// Attribution pixel id.
    pub pixel_id: String,
    /// Landing page URL.
    pub lp_url: String,
    /// Active flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<DestinationRow> for Destination {
    fn from(row: DestinationRow) -> Self {
        Self {
            key: DestinationKey::from(row.chat_id),
            tenant_id: TenantId::new(row.tenant_id),
            title: row.title,
            deep_link: row.deep_link,
            pixel_id: row.pixel_id,
            lp_url: row.lp_url,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// A row from the `pre_leads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PreLeadRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Destination key the click belongs to.
    pub destination_key: String,
    /// Click-attribution token.
    pub token: Option<String>,
    /// Click timestamp.
    pub created_at: DateTime<Utc>,
    /// Consumed flag.
    pub consumed: bool,
}

impl From<PreLeadRow> for PreLead {
    fn from(row: PreLeadRow) -> Self {
        Self {
            id: row.id,
            destination_key: DestinationKey::from(row.destination_key),
            token: row.token,
            created_at: row.created_at,
            consumed: row.consumed,
        }
    }
}

/// Columns returned by the consume-and-mark update.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConsumedPreLeadRow {
    /// Claimed row id.
    pub id: i64,
    /// Click-attribution token.
    pub token: Option<String>,
    /// Click timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ConsumedPreLeadRow> for PreLeadMatch {
    fn from(row: ConsumedPreLeadRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            created_at: row.created_at,
        }
    }
}

/// A row from the `join_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JoinRecordRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Platform update id.
    pub update_id: Option<i64>,
    /// External user id.
    pub user_id: String,
    /// Optional username.
    pub username: Option<String>,
    /// Destination key.
    pub destination_key: String,
    /// Destination title snapshot.
    pub destination_title: Option<String>,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
    /// Conversion event id.
    pub event_id: Option<Uuid>,
    /// Whether a click was matched.
    pub click_matched: bool,
    /// Whether dispatch succeeded.
    pub dispatched: bool,
}

impl From<JoinRecordRow> for JoinRecord {
    fn from(row: JoinRecordRow) -> Self {
        Self {
            id: row.id,
            update_id: row.update_id,
            user_id: row.user_id,
            username: row.username,
            destination_key: DestinationKey::from(row.destination_key),
            destination_title: row.destination_title,
            joined_at: row.joined_at,
            event_id: row.event_id,
            click_matched: row.click_matched,
            dispatched: row.dispatched,
        }
    }
}

/// Aggregated join count per destination.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JoinCountRow {
    /// Destination key.
    pub destination_key: String,
    /// Number of joins.
    pub joins: i64,
}

impl From<JoinCountRow> for DestinationJoinCount {
    fn from(row: JoinCountRow) -> Self {
        Self {
            destination_key: DestinationKey::from(row.destination_key),
            joins: row.joins,
        }
    }
}
