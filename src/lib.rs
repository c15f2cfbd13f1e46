//! # funnel-gateway
//!
//! Join-request approval and ad conversion attribution for Telegram
//! channels.
//!
//! A landing page reports each ad click (`POST /api/v1/pre-leads`). When
//! the visitor later asks to join the channel, the Telegram webhook
//! approves the request, claims the most recent unconsumed click for that
//! channel inside the correlation window, sends one `Lead` event to the
//! Meta Conversions API, and appends the join to a ledger.
//!
//! ## Architecture
//!
//! ```text
//! Telegram webhook        Landing page        Admin
//!     │                        │                 │
//!     ├── REST Handlers (api/) ┴─────────────────┘
//!     │
//!     ├── JoinPipeline (service/)
//!     │     ├── ApprovalGateway ── TelegramClient (clients/)
//!     │     └── AttributionCorrelator
//!     │           ├── DestinationRegistry
//!     │           ├── PreLeadStore
//!     │           ├── MetaConversionsClient (clients/)
//!     │           └── JoinLedger
//!     │
//!     └── AttributionStore (persistence/)
//!           ├── PostgreSQL
//!           └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;

#[cfg(test)]
mod testing;
