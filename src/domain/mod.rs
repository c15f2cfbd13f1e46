//! Domain layer: destinations, pre-lead clicks, joins, and conversions.
//!
//! Plain data types shared by the storage, service, and API layers. No
//! type in this module performs I/O.

pub mod clock;
pub mod conversion;
pub mod destination;
pub mod ids;
pub mod join;
pub mod pre_lead;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conversion::{ConversionEvent, DispatchOutcome, hash_external_id};
pub use destination::{Destination, DestinationDefaults, DestinationUpdate, NewDestination};
pub use ids::{DestinationKey, TenantId};
pub use join::{DestinationJoinCount, JoinEvent, JoinRecord, NewJoinRecord};
pub use pre_lead::{PreLead, PreLeadMatch};
