//! Service layer: the attribution pipeline and its components.
//!
//! [`JoinPipeline`] approves a join through the [`ApprovalGateway`] and
//! hands it to the [`AttributionCorrelator`], which uses the
//! [`DestinationRegistry`], [`PreLeadStore`], and [`JoinLedger`] over the
//! storage collaborator.

pub mod approval;
pub mod correlator;
pub mod destination_registry;
pub mod join_ledger;
pub mod pipeline;
pub mod pre_lead_store;

pub use approval::ApprovalGateway;
pub use correlator::{AttributionCorrelator, AttributionResult};
pub use destination_registry::{DestinationDraft, DestinationRegistry};
pub use join_ledger::JoinLedger;
pub use pipeline::{JoinOutcome, JoinPipeline};
pub use pre_lead_store::PreLeadStore;
