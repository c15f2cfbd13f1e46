//! Join pipeline: approval, then attribution.

use std::sync::Arc;

use serde::Serialize;

use super::{ApprovalGateway, AttributionCorrelator, AttributionResult, JoinLedger};
use crate::domain::{Clock, JoinEvent};
use crate::error::GatewayError;

/// Result of processing one inbound join event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinOutcome {
    /// The join was approved and attributed.
    Attributed(AttributionResult),
    /// The platform redelivered an update that was already processed.
    Duplicate,
}

/// Runs the full approve → attribute sequence for a join event.
#[derive(Debug)]
pub struct JoinPipeline {
    approval: ApprovalGateway,
    correlator: AttributionCorrelator,
    ledger: Arc<JoinLedger>,
    clock: Arc<dyn Clock>,
}

impl JoinPipeline {
    /// Creates a pipeline from its stages.
    #[must_use]
    pub fn new(
        approval: ApprovalGateway,
        correlator: AttributionCorrelator,
        ledger: Arc<JoinLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            approval,
            correlator,
            ledger,
            clock,
        }
    }

    /// Processes one join event.
    ///
    /// The platform update id is claimed before anything else, so a
    /// redelivery (including one overlapping the first delivery) is skipped
    /// without calling the platform. The join is then approved; if approval
    /// fails the claim is released and nothing is dispatched or recorded.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ApprovalFailed`] if the platform call fails.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn process(&self, event: JoinEvent) -> Result<JoinOutcome, GatewayError> {
        if let Some(update_id) = event.update_id
            && !self.ledger.claim_update(update_id, self.clock.now()).await?
        {
            tracing::info!(update_id, chat_id = %event.chat_id, "duplicate join update skipped");
            return Ok(JoinOutcome::Duplicate);
        }

        if let Err(e) = self.approval.approve(&event.chat_id, &event.user_id).await {
            if let Some(update_id) = event.update_id
                && let Err(release) = self.ledger.release_update(update_id).await
            {
                tracing::warn!(update_id, error = %release, "update claim not released");
            }
            return Err(e);
        }
        let result = self.correlator.attribute(&event).await?;
        Ok(JoinOutcome::Attributed(result))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::domain::{DestinationKey, DestinationUpdate, DispatchOutcome, hash_external_id};
    use crate::testing::{FakeApprover, Harness, harness, harness_with};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn join(chat: &str, user: &str) -> JoinEvent {
        JoinEvent {
            update_id: None,
            user_id: user.to_string(),
            username: Some("alice".to_string()),
            chat_id: DestinationKey::new(chat),
            chat_title: Some("Signals".to_string()),
        }
    }

    async fn attributed(h: &Harness, event: JoinEvent) -> AttributionResult {
        let outcome = h.state.pipeline.process(event).await;
        let Ok(JoinOutcome::Attributed(result)) = outcome else {
            panic!("expected attribution, got {outcome:?}");
        };
        result
    }

    #[tokio::test]
    async fn scenario_a_click_inside_window_is_attributed() {
        let h = harness().await;
        let chat = DestinationKey::new("-100123");

        h.clock.set(1000);
        let _ = h
            .state
            .pre_leads
            .record(&chat, Some("fb.1.999".to_string()))
            .await;

        h.clock.set(1200);
        let result = attributed(&h, join("-100123", "55")).await;
        assert!(result.click_matched);
        assert_eq!(result.dispatch, DispatchOutcome::Dispatched);

        let events = h.sink.events.lock().await;
        let Some(sent) = events.first() else {
            panic!("nothing dispatched");
        };
        assert_eq!(sent.user_data.fbc.as_deref(), Some("fb.1.999"));
        assert_eq!(sent.user_data.external_id, hash_external_id("55"));
        assert_eq!(sent.event_time, 1200);
        assert_eq!(sent.event_name, "Lead");

        let pre_leads = h.store.pre_leads().await;
        assert!(pre_leads.iter().all(|p| p.consumed));

        let Ok(joins) = h.state.ledger.query_recent(10).await else {
            panic!("ledger query failed");
        };
        let Some(record) = joins.first() else {
            panic!("no join recorded");
        };
        assert_eq!(record.joined_at.timestamp(), 1200);
        assert_eq!(record.user_id, "55");
        assert_eq!(record.destination_title.as_deref(), Some("Signals"));
        assert_eq!(record.event_id, Some(sent.event_id));
    }

    #[tokio::test]
    async fn scenario_b_click_outside_window_is_not_attributed() {
        let h = harness().await;
        let chat = DestinationKey::new("-100123");

        h.clock.set(1000);
        let _ = h
            .state
            .pre_leads
            .record(&chat, Some("fb.1.999".to_string()))
            .await;

        h.clock.set(3500);
        let result = attributed(&h, join("-100123", "55")).await;
        assert!(!result.click_matched);

        let events = h.sink.events.lock().await;
        let Some(sent) = events.first() else {
            panic!("nothing dispatched");
        };
        assert_eq!(sent.user_data.fbc, None);
        let Ok(json) = serde_json::to_value(sent) else {
            panic!("serialization failed");
        };
        assert!(json["user_data"].get("fbc").is_none());
        assert!(h.store.pre_leads().await.iter().all(|p| !p.consumed));
    }

    #[tokio::test]
    async fn scenario_c_concurrent_first_joins_share_one_destination() {
        let h = harness().await;
        h.clock.set(5000);

        let (a, b) = tokio::join!(
            h.state.pipeline.process(join("-200456", "1")),
            h.state.pipeline.process(join("-200456", "2"))
        );
        let (Ok(JoinOutcome::Attributed(a)), Ok(JoinOutcome::Attributed(b))) = (a, b) else {
            panic!("both joins should be attributed");
        };
        assert_eq!(h.store.destination_count().await, 1);
        assert_eq!(a.pixel_id, b.pixel_id);
        assert_eq!(a.destination_key, b.destination_key);

        let Ok(joins) = h.state.ledger.query_recent(10).await else {
            panic!("ledger query failed");
        };
        assert_eq!(joins.len(), 2);
    }

    #[tokio::test]
    async fn scenario_d_failed_approval_records_nothing() {
        let h = harness_with(GatewayConfig::for_tests(), FakeApprover::failing()).await;
        let _ = h
            .state
            .pre_leads
            .record(&DestinationKey::new("-100123"), Some("fb.1.999".to_string()))
            .await;

        let outcome = h.state.pipeline.process(join("-100123", "55")).await;
        assert!(matches!(outcome, Err(GatewayError::ApprovalFailed(_))));
        assert!(h.sink.events.lock().await.is_empty());

        let Ok(joins) = h.state.ledger.query_recent(10).await else {
            panic!("ledger query failed");
        };
        assert!(joins.is_empty());
        assert!(h.store.pre_leads().await.iter().all(|p| !p.consumed));
    }

    #[tokio::test]
    async fn failed_dispatch_still_records_join() {
        let h = harness().await;
        h.sink.fail.store(true, Ordering::SeqCst);

        let result = attributed(&h, join("-100123", "55")).await;
        assert!(matches!(result.dispatch, DispatchOutcome::Failed(_)));
        assert!(result.join_id.is_some());

        let Ok(joins) = h.state.ledger.query_recent(10).await else {
            panic!("ledger query failed");
        };
        let Some(record) = joins.first() else {
            panic!("no join recorded");
        };
        assert!(!record.dispatched);
    }

    #[tokio::test]
    async fn configured_pixel_replaces_default() {
        let h = harness().await;
        let chat = DestinationKey::new("-100123");
        let _ = attributed(&h, join("-100123", "1")).await;

        let update = DestinationUpdate {
            pixel_id: Some("px-custom".to_string()),
            lp_url: Some("https://custom.example/".to_string()),
            ..DestinationUpdate::default()
        };
        let Ok(_) = h.state.registry.apply_config(&chat, &update).await else {
            panic!("config update failed");
        };

        let result = attributed(&h, join("-100123", "2")).await;
        assert_eq!(result.pixel_id, "px-custom");

        let events = h.sink.events.lock().await;
        let Some(last) = events.last() else {
            panic!("nothing dispatched");
        };
        assert_eq!(last.pixel_id, "px-custom");
        assert_eq!(last.event_source_url, "https://custom.example/");
        assert_eq!(events.first().map(|e| e.pixel_id.as_str()), Some("default-pixel"));
    }

    #[tokio::test]
    async fn redelivered_update_is_skipped() {
        let h = harness().await;
        let mut event = join("-100123", "55");
        event.update_id = Some(42);

        let _ = attributed(&h, event.clone()).await;
        let again = h.state.pipeline.process(event).await;
        assert!(matches!(again, Ok(JoinOutcome::Duplicate)));
        assert_eq!(h.approver.calls.lock().await.len(), 1);
        assert_eq!(h.sink.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn overlapping_redeliveries_act_once() {
        let approver = FakeApprover::slow(Duration::from_millis(50));
        let h = harness_with(GatewayConfig::for_tests(), approver).await;
        let chat = DestinationKey::new("-100123");
        h.clock.set(1000);
        for token in ["fb.1.first", "fb.1.second"] {
            let _ = h.state.pre_leads.record(&chat, Some(token.to_string())).await;
        }

        h.clock.set(1100);
        let mut event = join("-100123", "55");
        event.update_id = Some(42);
        let (a, b) = tokio::join!(
            h.state.pipeline.process(event.clone()),
            h.state.pipeline.process(event)
        );
        let outcomes = [a, b];
        let attributed = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(JoinOutcome::Attributed(_))))
            .count();
        let duplicates = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(JoinOutcome::Duplicate)))
            .count();
        assert_eq!((attributed, duplicates), (1, 1));

        assert_eq!(h.approver.calls.lock().await.len(), 1);
        assert_eq!(h.sink.events.lock().await.len(), 1);
        let consumed = h.store.pre_leads().await.iter().filter(|p| p.consumed).count();
        assert_eq!(consumed, 1);
        let Ok(joins) = h.state.ledger.query_recent(10).await else {
            panic!("ledger query failed");
        };
        assert_eq!(joins.len(), 1);
    }

    #[tokio::test]
    async fn failed_approval_lets_redelivery_retry() {
        let h = harness_with(GatewayConfig::for_tests(), FakeApprover::failing()).await;
        let mut event = join("-100123", "55");
        event.update_id = Some(43);

        let first = h.state.pipeline.process(event.clone()).await;
        assert!(matches!(first, Err(GatewayError::ApprovalFailed(_))));

        h.approver.fail.store(false, Ordering::SeqCst);
        let retry = h.state.pipeline.process(event).await;
        assert!(matches!(retry, Ok(JoinOutcome::Attributed(_))));
        assert_eq!(h.approver.calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn click_for_other_destination_is_not_claimed() {
        let h = harness().await;
        h.clock.set(1000);
        let _ = h
            .state
            .pre_leads
            .record(&DestinationKey::new("-999"), Some("fb.1.other".to_string()))
            .await;

        h.clock.set(1100);
        let result = attributed(&h, join("-100123", "55")).await;
        assert!(!result.click_matched);
    }
}
