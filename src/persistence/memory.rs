//! In-process store for single-node deployments without a database.
//!
//! All tables live behind one [`tokio::sync::Mutex`], which makes every
//! trait method atomic with respect to every other. Data is lost on
//! restart.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::AttributionStore;
use crate::domain::{
    Destination, DestinationJoinCount, DestinationKey, DestinationUpdate, JoinRecord,
    NewDestination, NewJoinRecord, PreLead, PreLeadMatch, TenantId,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Tables {
    tenants: HashMap<TenantId, String>,
    destinations: BTreeMap<DestinationKey, Destination>,
    pre_leads: Vec<PreLead>,
    joins: Vec<JoinRecord>,
    seen_updates: HashSet<i64>,
    claimed_updates: HashSet<i64>,
    next_pre_lead_id: i64,
    next_join_id: i64,
}

/// Mutex-guarded in-memory [`AttributionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded click, consumed or not, oldest first.
    pub async fn pre_leads(&self) -> Vec<PreLead> {
        self.tables.lock().await.pre_leads.clone()
    }

    /// Returns the number of stored destinations.
    pub async fn destination_count(&self) -> usize {
        self.tables.lock().await.destinations.len()
    }
}

#[async_trait]
impl AttributionStore for MemoryStore {
    async fn ensure_tenant(
        &self,
        tenant_id: TenantId,
        name: &str,
        _now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut tables = self.tables.lock().await;
        tables
            .tenants
            .entry(tenant_id)
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    async fn tenant_exists(&self, tenant_id: TenantId) -> Result<bool, GatewayError> {
        Ok(self.tables.lock().await.tenants.contains_key(&tenant_id))
    }

    async fn get_or_insert_destination(
        &self,
        new: NewDestination,
    ) -> Result<(Destination, bool), GatewayError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.destinations.get(&new.key) {
            return Ok((existing.clone(), false));
        }
        let destination = new.into_destination();
        tables
            .destinations
            .insert(destination.key.clone(), destination.clone());
        Ok((destination, true))
    }

    async fn insert_destination(
        &self,
        new: NewDestination,
    ) -> Result<Option<Destination>, GatewayError> {
        let mut tables = self.tables.lock().await;
        if tables.destinations.contains_key(&new.key) {
            return Ok(None);
        }
        let destination = new.into_destination();
        tables
            .destinations
            .insert(destination.key.clone(), destination.clone());
        Ok(Some(destination))
    }

    async fn find_destination(
        &self,
        key: &DestinationKey,
    ) -> Result<Option<Destination>, GatewayError> {
        Ok(self.tables.lock().await.destinations.get(key).cloned())
    }

    async fn list_destinations(&self) -> Result<Vec<Destination>, GatewayError> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Destination> = tables.destinations.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)));
        Ok(list)
    }

    async fn update_destination_title(
        &self,
        key: &DestinationKey,
        title: &str,
    ) -> Result<bool, GatewayError> {
        let mut tables = self.tables.lock().await;
        match tables.destinations.get_mut(key) {
            Some(dest) if dest.title.as_deref() != Some(title) => {
                dest.title = Some(title.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_destination_config(
        &self,
        key: &DestinationKey,
        update: &DestinationUpdate,
    ) -> Result<Option<Destination>, GatewayError> {
        let mut tables = self.tables.lock().await;
        let Some(dest) = tables.destinations.get_mut(key) else {
            return Ok(None);
        };
        update.apply_to(dest);
        Ok(Some(dest.clone()))
    }

    async fn insert_pre_lead(
        &self,
        key: &DestinationKey,
        token: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<PreLead, GatewayError> {
        let mut tables = self.tables.lock().await;
        tables.next_pre_lead_id = tables.next_pre_lead_id.saturating_add(1);
        let pre_lead = PreLead {
            id: tables.next_pre_lead_id,
            destination_key: key.clone(),
            token: token.map(str::to_string),
            created_at,
            consumed: false,
        };
        tables.pre_leads.push(pre_lead.clone());
        Ok(pre_lead)
    }

    async fn consume_recent_pre_lead(
        &self,
        key: &DestinationKey,
        window_start: DateTime<Utc>,
    ) -> Result<Option<PreLeadMatch>, GatewayError> {
        let mut tables = self.tables.lock().await;
        let candidate = tables
            .pre_leads
            .iter_mut()
            .filter(|p| !p.consumed && p.destination_key == *key && p.created_at >= window_start)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(candidate.map(|p| {
            p.consumed = true;
            PreLeadMatch {
                id: p.id,
                token: p.token.clone(),
                created_at: p.created_at,
            }
        }))
    }

    async fn append_join(
        &self,
        record: NewJoinRecord,
    ) -> Result<Option<JoinRecord>, GatewayError> {
        let mut tables = self.tables.lock().await;
        if let Some(update_id) = record.update_id
            && !tables.seen_updates.insert(update_id)
        {
            return Ok(None);
        }
        tables.next_join_id = tables.next_join_id.saturating_add(1);
        let stored = record.with_id(tables.next_join_id);
        tables.joins.push(stored.clone());
        Ok(Some(stored))
    }

    async fn claim_update(
        &self,
        update_id: i64,
        _claimed_at: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        Ok(self.tables.lock().await.claimed_updates.insert(update_id))
    }

    async fn release_update(&self, update_id: i64) -> Result<(), GatewayError> {
        self.tables.lock().await.claimed_updates.remove(&update_id);
        Ok(())
    }

    async fn recent_joins(&self, limit: u32) -> Result<Vec<JoinRecord>, GatewayError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .joins
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_joins_since(&self, since: DateTime<Utc>) -> Result<i64, GatewayError> {
        let tables = self.tables.lock().await;
        let count = tables.joins.iter().filter(|j| j.joined_at >= since).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn count_joins_by_destination(
        &self,
    ) -> Result<Vec<DestinationJoinCount>, GatewayError> {
        let tables = self.tables.lock().await;
        let mut counts: BTreeMap<&DestinationKey, i64> = BTreeMap::new();
        for join in &tables.joins {
            *counts.entry(&join.destination_key).or_default() += 1;
        }
        let mut list: Vec<DestinationJoinCount> = counts
            .into_iter()
            .map(|(key, joins)| DestinationJoinCount {
                destination_key: key.clone(),
                joins,
            })
            .collect();
        list.sort_by(|a, b| {
            b.joins
                .cmp(&a.joins)
                .then_with(|| a.destination_key.cmp(&b.destination_key))
        });
        Ok(list)
    }
}
