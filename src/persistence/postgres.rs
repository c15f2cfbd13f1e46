//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::AttributionStore;
use super::models::{ConsumedPreLeadRow, DestinationRow, JoinCountRow, JoinRecordRow, PreLeadRow};
use crate::config::GatewayConfig;
use crate::domain::{
    Destination, DestinationJoinCount, DestinationKey, DestinationUpdate, JoinRecord,
    NewDestination, NewJoinRecord, PreLead, PreLeadMatch, TenantId,
};
use crate::error::GatewayError;

const DESTINATION_COLUMNS: &str =
    "chat_id, tenant_id, title, deep_link, pixel_id, lp_url, is_active, created_at";

const JOIN_COLUMNS: &str = "id, update_id, user_id, username, destination_key, destination_title, \
     joined_at, event_id, click_matched, dispatched";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config` and applies pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }

    async fn select_destination(
        &self,
        key: &DestinationKey,
    ) -> Result<Option<Destination>, GatewayError> {
        let row = sqlx::query_as::<_, DestinationRow>(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations WHERE chat_id = $1"
        ))
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Destination::from))
    }
}

#[async_trait]
impl AttributionStore for PostgresStore {
    async fn ensure_tenant(
        &self,
        tenant_id: TenantId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO tenants (id, name, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(tenant_id.get())
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn tenant_exists(&self, tenant_id: TenantId) -> Result<bool, GatewayError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM tenants WHERE id = $1)",
        )
        .bind(tenant_id.get())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_or_insert_destination(
        &self,
        new: NewDestination,
    ) -> Result<(Destination, bool), GatewayError> {
        let key = new.key.clone();
        if let Some(created) = self.insert_destination(new).await? {
            return Ok((created, true));
        }
        // Lost the insert race or the row already existed.
        let existing = self.select_destination(&key).await?.ok_or_else(|| {
            GatewayError::PersistenceError(format!("destination {key} vanished after conflict"))
        })?;
        Ok((existing, false))
    }

    async fn insert_destination(
        &self,
        new: NewDestination,
    ) -> Result<Option<Destination>, GatewayError> {
        let row = sqlx::query_as::<_, DestinationRow>(&format!(
            "INSERT INTO destinations ({DESTINATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7) \
             ON CONFLICT (chat_id) DO NOTHING \
             RETURNING {DESTINATION_COLUMNS}"
        ))
        .bind(new.key.as_str())
        .bind(new.tenant_id.get())
        .bind(&new.title)
        .bind(&new.deep_link)
        .bind(&new.pixel_id)
        .bind(&new.lp_url)
        .bind(new.created_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Destination::from))
    }

    async fn find_destination(
        &self,
        key: &DestinationKey,
    ) -> Result<Option<Destination>, GatewayError> {
        self.select_destination(key).await
    }

    async fn list_destinations(&self) -> Result<Vec<Destination>, GatewayError> {
        let rows = sqlx::query_as::<_, DestinationRow>(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations ORDER BY created_at ASC, chat_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Destination::from).collect())
    }

    async fn update_destination_title(
        &self,
        key: &DestinationKey,
        title: &str,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "UPDATE destinations SET title = $2 \
             WHERE chat_id = $1 AND title IS DISTINCT FROM $2",
        )
        .bind(key.as_str())
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_destination_config(
        &self,
        key: &DestinationKey,
        update: &DestinationUpdate,
    ) -> Result<Option<Destination>, GatewayError> {
        let row = sqlx::query_as::<_, DestinationRow>(&format!(
            "UPDATE destinations SET \
                 pixel_id = COALESCE($2, pixel_id), \
                 lp_url = COALESCE($3, lp_url), \
                 tenant_id = COALESCE($4, tenant_id), \
                 deep_link = COALESCE($5, deep_link) \
             WHERE chat_id = $1 \
             RETURNING {DESTINATION_COLUMNS}"
        ))
        .bind(key.as_str())
        .bind(&update.pixel_id)
        .bind(&update.lp_url)
        .bind(update.tenant_id.map(TenantId::get))
        .bind(&update.deep_link)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Destination::from))
    }

    async fn insert_pre_lead(
        &self,
        key: &DestinationKey,
        token: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<PreLead, GatewayError> {
        let row = sqlx::query_as::<_, PreLeadRow>(
            "INSERT INTO pre_leads (destination_key, token, created_at, consumed) \
             VALUES ($1, $2, $3, FALSE) \
             RETURNING id, destination_key, token, created_at, consumed",
        )
        .bind(key.as_str())
        .bind(token)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn consume_recent_pre_lead(
        &self,
        key: &DestinationKey,
        window_start: DateTime<Utc>,
    ) -> Result<Option<PreLeadMatch>, GatewayError> {
        // The row lock taken by FOR UPDATE serializes concurrent claimers;
        // a waiter re-checks `NOT consumed` and comes back empty.
        let row = sqlx::query_as::<_, ConsumedPreLeadRow>(
            "UPDATE pre_leads SET consumed = TRUE \
             WHERE id = ( \
                 SELECT id FROM pre_leads \
                 WHERE destination_key = $1 AND NOT consumed AND created_at >= $2 \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT 1 \
                 FOR UPDATE \
             ) AND NOT consumed \
             RETURNING id, token, created_at",
        )
        .bind(key.as_str())
        .bind(window_start)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PreLeadMatch::from))
    }

    async fn append_join(
        &self,
        record: NewJoinRecord,
    ) -> Result<Option<JoinRecord>, GatewayError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO join_records \
                 (update_id, user_id, username, destination_key, destination_title, \
                  joined_at, event_id, click_matched, dispatched) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (update_id) WHERE update_id IS NOT NULL DO NOTHING \
             RETURNING id",
        )
        .bind(record.update_id)
        .bind(&record.user_id)
        .bind(&record.username)
        .bind(record.destination_key.as_str())
        .bind(&record.destination_title)
        .bind(record.joined_at)
        .bind(record.event_id)
        .bind(record.click_matched)
        .bind(record.dispatched)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(|id| record.with_id(id)))
    }

    async fn claim_update(
        &self,
        update_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "INSERT INTO processed_updates (update_id, claimed_at) VALUES ($1, $2) \
             ON CONFLICT (update_id) DO NOTHING",
        )
        .bind(update_id)
        .bind(claimed_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_update(&self, update_id: i64) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM processed_updates WHERE update_id = $1")
            .bind(update_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn recent_joins(&self, limit: u32) -> Result<Vec<JoinRecord>, GatewayError> {
        let rows = sqlx::query_as::<_, JoinRecordRow>(&format!(
            "SELECT {JOIN_COLUMNS} FROM join_records ORDER BY id DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(JoinRecord::from).collect())
    }

    async fn count_joins_since(&self, since: DateTime<Utc>) -> Result<i64, GatewayError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM join_records WHERE joined_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_joins_by_destination(
        &self,
    ) -> Result<Vec<DestinationJoinCount>, GatewayError> {
        let rows = sqlx::query_as::<_, JoinCountRow>(
            "SELECT destination_key, COUNT(*) AS joins FROM join_records \
             GROUP BY destination_key ORDER BY joins DESC, destination_key ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DestinationJoinCount::from).collect())
    }
}
