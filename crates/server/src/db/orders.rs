//! Order repository.
//!
//! Every query is scoped by `store_id`; an order id from another store reads
//! as not found.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use simpler_proofs_core::{ArtistId, Email, OrderId, OrderStatus, StoreId};

use super::{RepositoryError, corrupt, not_found_on_foreign_key};
use crate::models::{Order, OrderCounts, ValidNewOrder, order::display_number};
use crate::services::run_sheet::RunSheetRow;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: OrderId,
    store_id: StoreId,
    external_id: Option<String>,
    customer_name: String,
    customer_email: String,
    status: OrderStatus,
    artist_id: Option<ArtistId>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            external_id: row.external_id,
            customer_name: row.customer_name,
            customer_email: Email::parse(&row.customer_email).map_err(|e| corrupt("email", e))?,
            status: row.status,
            artist_id: row.artist_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) const ORDER_COLUMNS: &str = "id, store_id, external_id, customer_name, customer_email, status, artist_id, notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct RunSheetDbRow {
    id: OrderId,
    external_id: Option<String>,
    customer_name: String,
    notes: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    file_url: String,
}

impl From<RunSheetDbRow> for RunSheetRow {
    fn from(row: RunSheetDbRow) -> Self {
        Self {
            order_number: display_number(row.external_id.as_deref(), row.id),
            customer_name: row.customer_name,
            approved_at: row.approved_at,
            notes: row.notes,
            proof_url: row.file_url,
        }
    }
}

/// Orders joined to their current proof, which must be approved.
const RUN_SHEET_QUERY: &str = r"
    SELECT o.id, o.external_id, o.customer_name, o.notes, p.approved_at, p.file_url
    FROM orders o
    JOIN LATERAL (
        SELECT approved_at, file_url, status
        FROM proofs
        WHERE order_id = o.id
        ORDER BY created_at DESC, id DESC
        LIMIT 1
    ) p ON p.status = 'approved'
    WHERE o.store_id = $1
      AND o.status IN ('approved', 'completed')
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        store_id: StoreId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE store_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(store_id)
        .bind(status.map(OrderStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Order totals per status for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_counts(&self, store_id: StoreId) -> Result<OrderCounts, RepositoryError> {
        let groups = sqlx::query_as::<_, (OrderStatus, i64)>(
            r"
            SELECT status, COUNT(*)
            FROM orders
            WHERE store_id = $1
            GROUP BY status
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(OrderCounts::from_groups(groups))
    }

    /// Get one of a store's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND store_id = $2"
        ))
        .bind(id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create an order in `awaiting_proof`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artist is not one of the
    /// store's artists.
    pub async fn create(
        &self,
        store_id: StoreId,
        order: &ValidNewOrder,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (id, store_id, external_id, customer_name, customer_email, artist_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(OrderId::generate())
        .bind(store_id)
        .bind(order.external_id.as_deref())
        .bind(&order.customer_name)
        .bind(order.customer_email.as_str())
        .bind(order.artist_id)
        .bind(order.notes.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(not_found_on_foreign_key)?;

        let order: Order = row.try_into()?;
        tracing::info!(order_id = %order.id, store_id = %store_id, "Order created");
        Ok(order)
    }

    /// Replace an order's notes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is not in the store.
    pub async fn update_notes(
        &self,
        store_id: StoreId,
        id: OrderId,
        notes: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders SET notes = $3, updated_at = NOW()
            WHERE id = $1 AND store_id = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(store_id)
        .bind(notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Assign (or with `None`, unassign) an artist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is not in the store or
    /// the artist belongs to a different store.
    pub async fn assign_artist(
        &self,
        store_id: StoreId,
        id: OrderId,
        artist_id: Option<ArtistId>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders SET artist_id = $3, updated_at = NOW()
            WHERE id = $1 AND store_id = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(store_id)
        .bind(artist_id)
        .fetch_optional(self.pool)
        .await
        .map_err(not_found_on_foreign_key)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Every approved or completed order whose current proof is approved,
    /// most recently approved first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn run_sheet_all(&self, store_id: StoreId) -> Result<Vec<RunSheetRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, RunSheetDbRow>(&format!(
            "{RUN_SHEET_QUERY} ORDER BY p.approved_at DESC, o.id"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Like [`Self::run_sheet_all`] restricted to `ids`, in the order given.
    /// Ids that are not exportable are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn run_sheet_for(
        &self,
        store_id: StoreId,
        ids: &[OrderId],
    ) -> Result<Vec<RunSheetRow>, RepositoryError> {
        let uuids: Vec<uuid::Uuid> = ids.iter().map(OrderId::as_uuid).collect();
        let mut rows = sqlx::query_as::<_, RunSheetDbRow>(&format!(
            "{RUN_SHEET_QUERY} AND o.id = ANY($2)"
        ))
        .bind(store_id)
        .bind(&uuids)
        .fetch_all(self.pool)
        .await?;

        rows.sort_by_key(|r| ids.iter().position(|id| *id == r.id));
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
