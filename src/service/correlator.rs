//! Attribution correlator: turns an approved join into one conversion
//! event and one ledger entry.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{DestinationRegistry, JoinLedger, PreLeadStore};
use crate::clients::ConversionSink;
use crate::domain::{
    Clock, ConversionEvent, DestinationKey, DispatchOutcome, JoinEvent, NewJoinRecord,
};
use crate::error::GatewayError;

/// What happened to one attributed join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionResult {
    /// Destination the join was attributed to.
    pub destination_key: DestinationKey,
    /// Pixel the conversion was addressed to.
    pub pixel_id: String,
    /// Whether a pre-lead click was claimed.
    pub click_matched: bool,
    /// Outcome of the conversion dispatch.
    pub dispatch: DispatchOutcome,
    /// Conversion event id.
    pub event_id: Uuid,
    /// Ledger row id, or `None` if the platform update was already recorded.
    pub join_id: Option<i64>,
}

/// Correlates approved joins with pre-lead clicks and reports conversions.
#[derive(Debug)]
pub struct AttributionCorrelator {
    registry: Arc<DestinationRegistry>,
    pre_leads: Arc<PreLeadStore>,
    ledger: Arc<JoinLedger>,
    sink: Arc<dyn ConversionSink>,
    clock: Arc<dyn Clock>,
}

impl AttributionCorrelator {
    /// Creates a correlator over its collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<DestinationRegistry>,
        pre_leads: Arc<PreLeadStore>,
        ledger: Arc<JoinLedger>,
        sink: Arc<dyn ConversionSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            pre_leads,
            ledger,
            sink,
            clock,
        }
    }

    /// Attributes one approved join.
    ///
    /// Resolves (or creates) the destination, claims a recent click if one
    /// exists, dispatches a hashed `Lead` event, and appends the join to the
    /// ledger. A failed dispatch is logged and reported in the result; it
    /// does not prevent the ledger append.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn attribute(&self, event: &JoinEvent) -> Result<AttributionResult, GatewayError> {
        let destination = self
            .registry
            .resolve(&event.chat_id, event.chat_title.as_deref())
            .await?;

        let now = self.clock.now();
        let window_start = self.pre_leads.window_start(now);
        let matched = self
            .pre_leads
            .consume_recent_match(&destination.key, window_start)
            .await?;
        let click_matched = matched.is_some();
        let fbc = matched.and_then(|m| m.token);

        let conversion = ConversionEvent::lead(
            &destination.pixel_id,
            &destination.lp_url,
            &event.user_id,
            now,
            fbc,
        );
        let dispatch = self.dispatch(&conversion).await;

        let appended = self
            .ledger
            .append(NewJoinRecord {
                update_id: event.update_id,
                user_id: event.user_id.clone(),
                username: event.username.clone(),
                destination_key: destination.key.clone(),
                destination_title: destination.title.clone(),
                joined_at: now,
                event_id: Some(conversion.event_id),
                click_matched,
                dispatched: dispatch.is_dispatched(),
            })
            .await?;
        if appended.is_none() {
            tracing::warn!(update_id = ?event.update_id, "join already recorded for this update");
        }

        tracing::info!(
            chat_id = %destination.key,
            user_id = %event.user_id,
            click_matched,
            dispatched = dispatch.is_dispatched(),
            event_id = %conversion.event_id,
            "join attributed"
        );

        Ok(AttributionResult {
            destination_key: destination.key,
            pixel_id: destination.pixel_id,
            click_matched,
            dispatch,
            event_id: conversion.event_id,
            join_id: appended.map(|j| j.id),
        })
    }

    async fn dispatch(&self, conversion: &ConversionEvent) -> DispatchOutcome {
        match self.sink.send(conversion).await {
            Ok(()) => DispatchOutcome::Dispatched,
            Err(e) => {
                tracing::warn!(
                    pixel_id = %conversion.pixel_id,
                    event_id = %conversion.event_id,
                    error = %e,
                    "conversion dispatch failed"
                );
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
