//! Data Transfer Objects for REST request/response serialization.
//!
//! Chat identifiers are serialized as JSON strings to prevent precision
//! loss on 64-bit channel ids.

pub mod admin_dto;
pub mod common_dto;
pub mod pre_lead_dto;
pub mod webhook_dto;

pub use admin_dto::*;
pub use common_dto::*;
pub use pre_lead_dto::*;
pub use webhook_dto::*;
