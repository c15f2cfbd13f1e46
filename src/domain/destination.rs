//! Tracked channel and its attribution configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DestinationKey, TenantId};

/// A chat-platform channel with its own attribution configuration.
///
/// Exactly one `Destination` exists per [`DestinationKey`]. Rows are created
/// lazily on the first join for a channel or explicitly by an administrator,
/// and are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Destination {
    /// External chat identifier (unique).
    pub key: DestinationKey,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display title as last reported by the platform.
    pub title: Option<String>,
    /// Optional invite/deep link for the channel.
    pub deep_link: Option<String>,
    /// Attribution pixel conversion events are sent to.
    pub pixel_id: String,
    /// Landing page reported as the event source URL.
    pub lp_url: String,
    /// Whether the destination is active.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Values for a destination row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDestination {
    /// External chat identifier.
    pub key: DestinationKey,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display title.
    pub title: Option<String>,
    /// Optional deep link.
    pub deep_link: Option<String>,
    /// Attribution pixel id.
    pub pixel_id: String,
    /// Landing page URL.
    pub lp_url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewDestination {
    /// Materializes the row that the store will hold after insertion.
    #[must_use]
    pub fn into_destination(self) -> Destination {
        Destination {
            key: self.key,
            tenant_id: self.tenant_id,
            title: self.title,
            deep_link: self.deep_link,
            pixel_id: self.pixel_id,
            lp_url: self.lp_url,
            is_active: true,
            created_at: self.created_at,
        }
    }
}

/// System-wide defaults applied to auto-created destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDefaults {
    /// Tenant that owns auto-created destinations.
    pub tenant_id: TenantId,
    /// Fallback attribution pixel id.
    pub pixel_id: String,
    /// Fallback landing page URL.
    pub lp_url: String,
}

/// Partial administrative update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DestinationUpdate {
    /// New attribution pixel id.
    #[serde(default)]
    pub pixel_id: Option<String>,
    /// New landing page URL.
    #[serde(default)]
    pub lp_url: Option<String>,
    /// New owning tenant.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// New deep link.
    #[serde(default)]
    pub deep_link: Option<String>,
}

impl DestinationUpdate {
    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixel_id.is_none()
            && self.lp_url.is_none()
            && self.tenant_id.is_none()
            && self.deep_link.is_none()
    }

    /// Applies the supplied fields to `destination` in place.
    pub fn apply_to(&self, destination: &mut Destination) {
        if let Some(pixel_id) = &self.pixel_id {
            destination.pixel_id.clone_from(pixel_id);
        }
        if let Some(lp_url) = &self.lp_url {
            destination.lp_url.clone_from(lp_url);
        }
        if let Some(tenant_id) = self.tenant_id {
            destination.tenant_id = tenant_id;
        }
        if let Some(deep_link) = &self.deep_link {
            destination.deep_link = Some(deep_link.clone());
        }
    }
}
