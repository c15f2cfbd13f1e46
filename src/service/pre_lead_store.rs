//! Pre-lead store: landing-page clicks and their one-shot consumption.
//!
//! Correlation is a time-proximity heuristic. There is no shared session
//! between the anonymous click and the named join, so the destination key
//! plus a bounded window is the only link available. A join claims the
//! newest unclaimed click for its destination; nothing guarantees that it
//! is the same person.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::pre_lead::normalize_token;
use crate::domain::{Clock, DestinationKey, PreLead, PreLeadMatch};
use crate::error::GatewayError;
use crate::persistence::AttributionStore;

/// Records clicks and hands each one to at most one join.
#[derive(Debug)]
pub struct PreLeadStore {
    store: Arc<dyn AttributionStore>,
    clock: Arc<dyn Clock>,
    window: TimeDelta,
}

impl PreLeadStore {
    /// Creates a store with the given correlation `window`.
    #[must_use]
    pub fn new(store: Arc<dyn AttributionStore>, clock: Arc<dyn Clock>, window: TimeDelta) -> Self {
        Self {
            store,
            clock,
            window,
        }
    }

    /// Returns the earliest click time a join at `now` may still claim.
    #[must_use]
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Records a click on the landing page of `destination_key`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the key is empty; nothing is
    ///   written.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn record(
        &self,
        destination_key: &DestinationKey,
        token: Option<String>,
    ) -> Result<PreLead, GatewayError> {
        if destination_key.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "destination_key is required".to_string(),
            ));
        }
        let token = normalize_token(token);
        let pre_lead = self
            .store
            .insert_pre_lead(destination_key, token.as_deref(), self.clock.now())
            .await?;

        tracing::info!(
            %destination_key,
            pre_lead_id = pre_lead.id,
            has_token = pre_lead.token.is_some(),
            "pre-lead recorded"
        );
        Ok(pre_lead)
    }

    /// Claims the newest unconsumed click for `destination_key` created at
    /// or after `window_start`.
    ///
    /// Returns `None` when nothing matches; that is not an error. A claimed
    /// click is never returned again.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn consume_recent_match(
        &self,
        destination_key: &DestinationKey,
        window_start: DateTime<Utc>,
    ) -> Result<Option<PreLeadMatch>, GatewayError> {
        let matched = self
            .store
            .consume_recent_pre_lead(destination_key, window_start)
            .await?;
        match &matched {
            Some(m) => tracing::debug!(%destination_key, pre_lead_id = m.id, "pre-lead consumed"),
            None => tracing::debug!(%destination_key, %window_start, "no pre-lead in window"),
        }
        Ok(matched)
    }
}
