//! Postgres implementation of the status engine's [`WorkflowStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use simpler_proofs_core::{OrderId, ProofId, UserId};

use super::proofs::current_proof;
use super::{OrderRepository, ProofRepository, RepositoryError, SettingsRepository, StoreRepository};
use crate::models::{Comment, CommentBody, Store, StoreSettings};
use crate::services::workflow::{
    ApprovalStamp, OrderScope, OrderSnapshot, StatusChange, WorkflowStore,
};

/// [`WorkflowStore`] over the connection pool.
#[derive(Debug, Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
}

impl PgWorkflowStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn snapshot(
        &self,
        scope: &OrderScope,
        order_id: OrderId,
    ) -> Result<Option<OrderSnapshot>, RepositoryError> {
        let stores = StoreRepository::new(&self.pool);
        let store = match scope {
            OrderScope::Store(id) => stores.get_by_id(*id).await?,
            OrderScope::Public(slug) => stores.get_by_slug(slug).await?,
        };
        let Some(store) = store else {
            return Ok(None);
        };

        let Some(order) = OrderRepository::new(&self.pool).get(store.id, order_id).await? else {
            return Ok(None);
        };
        let current_proof = current_proof(&self.pool, order_id).await?;
        let proof_status = current_proof.as_ref().map(|p| p.status);
        if !order.status.is_consistent_with(proof_status) {
            tracing::warn!(
                order_id = %order_id,
                order_status = %order.status,
                proof_status = ?proof_status,
                "Order and current proof statuses disagree"
            );
        }

        Ok(Some(OrderSnapshot {
            store,
            order,
            current_proof,
        }))
    }

    async fn settings(&self, store: &Store) -> Result<StoreSettings, RepositoryError> {
        SettingsRepository::new(&self.pool).effective(store).await
    }

    async fn apply(&self, change: &StatusChange) -> Result<bool, RepositoryError> {
        let t = change.transition;
        let (stamp_approval, approved_at) = match change.approval {
            ApprovalStamp::Keep => (false, None),
            ApprovalStamp::Set(at) => (true, Some(at)),
            ApprovalStamp::Clear => (true, None),
        };

        let mut tx = self.pool.begin().await?;

        let order_rows = sqlx::query(
            r"
            UPDATE orders SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            ",
        )
        .bind(change.order_id)
        .bind(t.order_to)
        .bind(t.order_from)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if order_rows == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let proof_rows = sqlx::query(
            r"
            UPDATE proofs SET
                status = $2,
                approved_at = CASE WHEN $4 THEN $5 ELSE approved_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $3
              AND id = (
                  SELECT id FROM proofs
                  WHERE order_id = $6
                  ORDER BY created_at DESC, id DESC
                  LIMIT 1
              )
            ",
        )
        .bind(change.proof_id)
        .bind(t.proof_to)
        .bind(t.proof_from)
        .bind(stamp_approval)
        .bind(approved_at)
        .bind(change.order_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if proof_rows == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn comments(&self, proof_id: ProofId) -> Result<Vec<Comment>, RepositoryError> {
        ProofRepository::new(&self.pool).comments(proof_id).await
    }

    async fn add_comment(
        &self,
        proof_id: ProofId,
        author: Option<UserId>,
        body: &CommentBody,
    ) -> Result<Comment, RepositoryError> {
        ProofRepository::new(&self.pool)
            .add_comment(proof_id, author, body)
            .await
    }
}
