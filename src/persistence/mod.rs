//! Persistence layer: destinations, pre-lead clicks, and the join ledger.
//!
//! Provides the [`AttributionStore`] trait for durable storage. The
//! concrete implementations are [`PostgresStore`] (`sqlx::PgPool`) and
//! [`MemoryStore`], used when persistence is disabled and in tests.
//!
//! Every operation is a single atomic step at the storage level: the
//! services above never hold authoritative copies across calls.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Destination, DestinationJoinCount, DestinationKey, DestinationUpdate, JoinRecord,
    NewDestination, NewJoinRecord, PreLead, PreLeadMatch, TenantId,
};
use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage collaborator for the attribution pipeline.
///
/// All methods return [`GatewayError::PersistenceError`] on storage
/// failure; "absent" outcomes are expressed as `Option`/`bool`, never as
/// errors.
#[async_trait]
pub trait AttributionStore: Send + Sync + Debug {
    /// Inserts the tenant if no tenant with that id exists.
    async fn ensure_tenant(
        &self,
        tenant_id: TenantId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    /// Returns `true` if a tenant with that id exists.
    async fn tenant_exists(&self, tenant_id: TenantId) -> Result<bool, GatewayError>;

    /// Atomically returns the destination for `new.key`, inserting `new`
    /// if none exists. The flag is `true` when this call created the row.
    async fn get_or_insert_destination(
        &self,
        new: NewDestination,
    ) -> Result<(Destination, bool), GatewayError>;

    /// Inserts `new` only if no destination with that key exists.
    /// Returns `None` when the key is already taken.
    async fn insert_destination(
        &self,
        new: NewDestination,
    ) -> Result<Option<Destination>, GatewayError>;

    /// Looks up a destination by key.
    async fn find_destination(
        &self,
        key: &DestinationKey,
    ) -> Result<Option<Destination>, GatewayError>;

    /// Lists all destinations ordered by creation time.
    async fn list_destinations(&self) -> Result<Vec<Destination>, GatewayError>;

    /// Overwrites the stored title if it differs from `title`.
    /// Returns `true` if a row changed.
    async fn update_destination_title(
        &self,
        key: &DestinationKey,
        title: &str,
    ) -> Result<bool, GatewayError>;

    /// Applies the supplied fields of `update`. Returns `None`, with no
    /// write, if the destination does not exist.
    async fn update_destination_config(
        &self,
        key: &DestinationKey,
        update: &DestinationUpdate,
    ) -> Result<Option<Destination>, GatewayError>;

    /// Records a new unconsumed click.
    async fn insert_pre_lead(
        &self,
        key: &DestinationKey,
        token: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<PreLead, GatewayError>;

    /// Claims the newest unconsumed click for `key` created at or after
    /// `window_start`, marking it consumed in the same atomic step.
    async fn consume_recent_pre_lead(
        &self,
        key: &DestinationKey,
        window_start: DateTime<Utc>,
    ) -> Result<Option<PreLeadMatch>, GatewayError>;

    /// Appends a join. Returns `None` if a record with the same platform
    /// update id already exists.
    async fn append_join(&self, record: NewJoinRecord)
    -> Result<Option<JoinRecord>, GatewayError>;

    /// Atomically marks a platform update id as taken. Returns `false` if
    /// another delivery already claimed it.
    async fn claim_update(
        &self,
        update_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, GatewayError>;

    /// Drops a claim so a later redelivery can retry the update.
    async fn release_update(&self, update_id: i64) -> Result<(), GatewayError>;

    /// Returns up to `limit` joins, newest first.
    async fn recent_joins(&self, limit: u32) -> Result<Vec<JoinRecord>, GatewayError>;

    /// Counts joins with `joined_at >= since`.
    async fn count_joins_since(&self, since: DateTime<Utc>) -> Result<i64, GatewayError>;

    /// Counts joins per destination, largest first.
    async fn count_joins_by_destination(&self)
    -> Result<Vec<DestinationJoinCount>, GatewayError>;
}
