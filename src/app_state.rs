//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::clients::{ConversionSink, JoinApprover};
use crate::config::GatewayConfig;
use crate::domain::Clock;
use crate::error::GatewayError;
use crate::persistence::AttributionStore;
use crate::service::{
    ApprovalGateway, AttributionCorrelator, DestinationRegistry, JoinLedger, JoinPipeline,
    PreLeadStore,
};

/// Name given to the default tenant row when it is seeded.
const DEFAULT_TENANT_NAME: &str = "Default Tenant";

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Approve-then-attribute pipeline for join requests.
    pub pipeline: Arc<JoinPipeline>,
    /// Destination lookup and administration.
    pub registry: Arc<DestinationRegistry>,
    /// Landing-page click recording.
    pub pre_leads: Arc<PreLeadStore>,
    /// Join reporting.
    pub ledger: Arc<JoinLedger>,
    /// Clock used for reporting windows.
    pub clock: Arc<dyn Clock>,
    /// Expected webhook secret header value.
    pub webhook_secret: Option<Arc<str>>,
    /// Admin credential.
    pub admin_api_key: Option<Arc<str>>,
}

impl AppState {
    /// Wires every service over the given collaborators and seeds the
    /// default tenant.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the default tenant
    /// cannot be written.
    pub async fn build(
        config: &GatewayConfig,
        store: Arc<dyn AttributionStore>,
        approver: Arc<dyn JoinApprover>,
        sink: Arc<dyn ConversionSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        store
            .ensure_tenant(config.default_tenant(), DEFAULT_TENANT_NAME, clock.now())
            .await?;

        let registry = Arc::new(DestinationRegistry::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.destination_defaults(),
        ));
        let pre_leads = Arc::new(PreLeadStore::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.correlation_window(),
        ));
        let ledger = Arc::new(JoinLedger::new(Arc::clone(&store)));
        let correlator = AttributionCorrelator::new(
            Arc::clone(&registry),
            Arc::clone(&pre_leads),
            Arc::clone(&ledger),
            sink,
            Arc::clone(&clock),
        );
        let pipeline = Arc::new(JoinPipeline::new(
            ApprovalGateway::new(approver),
            correlator,
            Arc::clone(&ledger),
            Arc::clone(&clock),
        ));

        Ok(Self {
            pipeline,
            registry,
            pre_leads,
            ledger,
            clock,
            webhook_secret: config.telegram_webhook_secret.as_deref().map(Arc::from),
            admin_api_key: config.admin_api_key.as_deref().map(Arc::from),
        })
    }
}
