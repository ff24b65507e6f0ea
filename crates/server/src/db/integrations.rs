//! Integration settings repository.
//!
//! Configs are stored as tagged JSON; the table's `CHECK` keeps the tag and
//! the `kind` column in agreement.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use simpler_proofs_core::{IntegrationId, StoreId};

use super::{RepositoryError, corrupt};
use crate::models::{Integration, IntegrationConfig, IntegrationKind};

#[derive(Debug, sqlx::FromRow)]
struct IntegrationRow {
    id: IntegrationId,
    store_id: StoreId,
    kind: String,
    enabled: bool,
    config: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IntegrationRow> for Integration {
    type Error = RepositoryError;

    fn try_from(row: IntegrationRow) -> Result<Self, Self::Error> {
        let config: IntegrationConfig =
            serde_json::from_value(row.config).map_err(|e| corrupt("integration config", e))?;
        if config.kind().as_str() != row.kind {
            return Err(corrupt(
                "integration kind",
                format!("{} stored with {} config", row.kind, config.kind()),
            ));
        }
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            enabled: row.enabled,
            config,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const INTEGRATION_COLUMNS: &str = "id, store_id, kind, enabled, config, created_at, updated_at";

/// Insert or replace the store's integration of `config`'s kind.
pub(crate) async fn upsert_integration<'e>(
    executor: impl PgExecutor<'e>,
    store_id: StoreId,
    enabled: bool,
    config: &IntegrationConfig,
) -> Result<Integration, RepositoryError> {
    let row = sqlx::query_as::<_, IntegrationRow>(&format!(
        r"
        INSERT INTO integrations (id, store_id, kind, enabled, config)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (store_id, kind) DO UPDATE SET
            enabled = EXCLUDED.enabled,
            config = EXCLUDED.config,
            updated_at = NOW()
        RETURNING {INTEGRATION_COLUMNS}
        "
    ))
    .bind(IntegrationId::generate())
    .bind(store_id)
    .bind(config.kind().as_str())
    .bind(enabled)
    .bind(Json(config))
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Repository for integration settings.
pub struct IntegrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IntegrationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored config no longer
    /// parses.
    pub async fn list(&self, store_id: StoreId) -> Result<Vec<Integration>, RepositoryError> {
        let rows = sqlx::query_as::<_, IntegrationRow>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE store_id = $1 ORDER BY kind"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Save a validated config.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn save(
        &self,
        store_id: StoreId,
        enabled: bool,
        config: &IntegrationConfig,
    ) -> Result<Integration, RepositoryError> {
        let integration = upsert_integration(self.pool, store_id, enabled, config).await?;
        tracing::info!(store_id = %store_id, kind = %config.kind(), enabled, "Integration saved");
        Ok(integration)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store has no such integration.
    pub async fn delete(&self, store_id: StoreId, kind: IntegrationKind) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM integrations WHERE store_id = $1 AND kind = $2")
            .bind(store_id)
            .bind(kind.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
