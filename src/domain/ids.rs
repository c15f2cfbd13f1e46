//! Type-safe identifiers for destinations and tenants.
//!
//! [`DestinationKey`] wraps the chat platform's chat identifier as a string
//! so that 64-bit channel ids (e.g. `-1001234567890`) never pass through a
//! floating-point JSON number. [`TenantId`] wraps the numeric tenant key.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// External chat identifier of a tracked channel.
///
/// Used as the unique key of a destination and as the correlation key of
/// pre-lead clicks. Surrounding whitespace is stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct DestinationKey(String);

impl DestinationKey {
    /// Creates a key from any string-like value, trimming whitespace.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// Creates a key from a numeric chat id as delivered by the Bot API.
    #[must_use]
    pub fn from_chat_id(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DestinationKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for DestinationKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Identifier of the tenant (agency or customer) owning a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    /// The implicit tenant every deployment starts with.
    pub const DEFAULT: Self = Self(1);

    /// Wraps a raw tenant id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw tenant id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
