//! Destination registry: resolves, auto-creates, and reconfigures
//! tracked channels.

use std::sync::Arc;

use crate::domain::{
    Clock, Destination, DestinationDefaults, DestinationKey, DestinationUpdate, NewDestination,
    TenantId,
};
use crate::error::GatewayError;
use crate::persistence::AttributionStore;

/// Fields for an explicit administrative creation. Unset fields take the
/// system defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationDraft {
    /// Display title.
    pub title: Option<String>,
    /// Attribution pixel id.
    pub pixel_id: Option<String>,
    /// Landing page URL.
    pub lp_url: Option<String>,
    /// Owning tenant.
    pub tenant_id: Option<TenantId>,
    /// Deep link.
    pub deep_link: Option<String>,
}

/// Resolves per-channel attribution configuration.
///
/// Unknown channels are created on first sight with the configured
/// [`DestinationDefaults`]. Creation goes through the store's atomic
/// get-or-insert, so concurrent first joins share a single row.
#[derive(Debug)]
pub struct DestinationRegistry {
    store: Arc<dyn AttributionStore>,
    clock: Arc<dyn Clock>,
    defaults: DestinationDefaults,
}

impl DestinationRegistry {
    /// Creates a registry over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn AttributionStore>,
        clock: Arc<dyn Clock>,
        defaults: DestinationDefaults,
    ) -> Self {
        Self {
            store,
            clock,
            defaults,
        }
    }

    /// Returns the destination for `chat_id`, creating it with the system
    /// defaults if it does not exist yet.
    ///
    /// A non-empty `title` that differs from the stored one replaces it.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn resolve(
        &self,
        chat_id: &DestinationKey,
        title: Option<&str>,
    ) -> Result<Destination, GatewayError> {
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let new = NewDestination {
            key: chat_id.clone(),
            tenant_id: self.defaults.tenant_id,
            title: title.map(str::to_string),
            deep_link: None,
            pixel_id: self.defaults.pixel_id.clone(),
            lp_url: self.defaults.lp_url.clone(),
            created_at: self.clock.now(),
        };

        let (mut destination, created) = self.store.get_or_insert_destination(new).await?;
        if created {
            tracing::info!(%chat_id, tenant_id = %destination.tenant_id, "destination auto-created");
            return Ok(destination);
        }

        if let Some(title) = title
            && destination.title.as_deref() != Some(title)
        {
            self.store.update_destination_title(chat_id, title).await?;
            tracing::debug!(%chat_id, title, "destination title refreshed");
            destination.title = Some(title.to_string());
        }
        Ok(destination)
    }

    /// Applies an administrative partial update to an existing destination.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if no field is supplied or a
    ///   supplied field is blank.
    /// - [`GatewayError::DestinationNotFound`] if the destination does not
    ///   exist; nothing is written. Checked before the tenant.
    /// - [`GatewayError::TenantNotFound`] if the tenant does not exist.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn apply_config(
        &self,
        chat_id: &DestinationKey,
        update: &DestinationUpdate,
    ) -> Result<Destination, GatewayError> {
        validate_key(chat_id)?;
        if update.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "update must set at least one of pixel_id, lp_url, tenant_id, deep_link"
                    .to_string(),
            ));
        }
        validate_not_blank("pixel_id", update.pixel_id.as_deref())?;
        validate_not_blank("lp_url", update.lp_url.as_deref())?;
        if self.store.find_destination(chat_id).await?.is_none() {
            return Err(GatewayError::DestinationNotFound(chat_id.clone()));
        }
        if let Some(tenant_id) = update.tenant_id {
            self.ensure_tenant(tenant_id).await?;
        }

        let destination = self
            .store
            .update_destination_config(chat_id, update)
            .await?
            .ok_or_else(|| GatewayError::DestinationNotFound(chat_id.clone()))?;

        tracing::info!(
            %chat_id,
            pixel_id = %destination.pixel_id,
            tenant_id = %destination.tenant_id,
            "destination config updated"
        );
        Ok(destination)
    }

    /// Creates a destination explicitly.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the key or a supplied field is
    ///   blank.
    /// - [`GatewayError::TenantNotFound`] if the tenant does not exist.
    /// - [`GatewayError::DestinationExists`] if the key is already taken.
    /// - [`GatewayError::PersistenceError`] on storage failure.
    pub async fn create(
        &self,
        chat_id: &DestinationKey,
        draft: DestinationDraft,
    ) -> Result<Destination, GatewayError> {
        validate_key(chat_id)?;
        validate_not_blank("pixel_id", draft.pixel_id.as_deref())?;
        validate_not_blank("lp_url", draft.lp_url.as_deref())?;
        let tenant_id = draft.tenant_id.unwrap_or(self.defaults.tenant_id);
        self.ensure_tenant(tenant_id).await?;

        let new = NewDestination {
            key: chat_id.clone(),
            tenant_id,
            title: draft.title.filter(|t| !t.trim().is_empty()),
            deep_link: draft.deep_link,
            pixel_id: draft
                .pixel_id
                .unwrap_or_else(|| self.defaults.pixel_id.clone()),
            lp_url: draft.lp_url.unwrap_or_else(|| self.defaults.lp_url.clone()),
            created_at: self.clock.now(),
        };
        let destination = self
            .store
            .insert_destination(new)
            .await?
            .ok_or_else(|| GatewayError::DestinationExists(chat_id.clone()))?;

        tracing::info!(%chat_id, %tenant_id, "destination created");
        Ok(destination)
    }

    /// Looks up one destination.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DestinationNotFound`] if it does not exist,
    /// or a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn get(&self, chat_id: &DestinationKey) -> Result<Destination, GatewayError> {
        self.store
            .find_destination(chat_id)
            .await?
            .ok_or_else(|| GatewayError::DestinationNotFound(chat_id.clone()))
    }

    /// Lists every destination.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn list(&self) -> Result<Vec<Destination>, GatewayError> {
        self.store.list_destinations().await
    }

    async fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), GatewayError> {
        if self.store.tenant_exists(tenant_id).await? {
            Ok(())
        } else {
            Err(GatewayError::TenantNotFound(tenant_id))
        }
    }
}

fn validate_key(chat_id: &DestinationKey) -> Result<(), GatewayError> {
    if chat_id.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "destination key must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_not_blank(field: &str, value: Option<&str>) -> Result<(), GatewayError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(GatewayError::InvalidRequest(format!(
            "{field} must not be blank"
        ))),
        _ => Ok(()),
    }
}
