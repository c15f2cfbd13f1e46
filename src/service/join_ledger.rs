//! Append-only ledger of attributed joins.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{DestinationJoinCount, JoinRecord, NewJoinRecord};
use crate::error::GatewayError;
use crate::persistence::AttributionStore;

/// Largest page [`JoinLedger::query_recent`] will return.
pub const MAX_RECENT_LIMIT: u32 = 200;

/// Read/write access to the join ledger.
#[derive(Debug)]
pub struct JoinLedger {
    store: Arc<dyn AttributionStore>,
}

impl JoinLedger {
    /// Creates a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn AttributionStore>) -> Self {
        Self { store }
    }

    /// Appends a record. Returns `None` if the platform update id was
    /// already recorded.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn append(&self, record: NewJoinRecord) -> Result<Option<JoinRecord>, GatewayError> {
        self.store.append_join(record).await
    }

    /// Claims `update_id` for processing. Returns `false` if another
    /// delivery of the same update holds or finished the claim.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn claim_update(
        &self,
        update_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        self.store.claim_update(update_id, claimed_at).await
    }

    /// Releases a claim taken by [`JoinLedger::claim_update`].
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn release_update(&self, update_id: i64) -> Result<(), GatewayError> {
        self.store.release_update(update_id).await
    }

    /// Returns up to `limit` joins, newest first. `limit` is clamped to
    /// `1..=MAX_RECENT_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn query_recent(&self, limit: u32) -> Result<Vec<JoinRecord>, GatewayError> {
        self.store
            .recent_joins(limit.clamp(1, MAX_RECENT_LIMIT))
            .await
    }

    /// Counts joins at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, GatewayError> {
        self.store.count_joins_since(since).await
    }

    /// Counts joins per destination.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn count_by_destination(&self) -> Result<Vec<DestinationJoinCount>, GatewayError> {
        self.store.count_joins_by_destination().await
    }
}
