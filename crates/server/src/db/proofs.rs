//! Proof and comment repository.
//!
//! `created_at` on both tables comes from `clock_timestamp()` so revisions
//! and comments inserted in one transaction still order correctly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use simpler_proofs_core::{
    CommentId, Email, OrderId, OrderStatus, ProofId, ProofStatus, StoreId, UserId, accepts_revision,
};

use super::{RepositoryError, corrupt};
use crate::models::order::display_number;
use crate::models::{Comment, CommentBody, Proof, ProofOrder, ProofWithComments, StoreProof};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProofRow {
    id: ProofId,
    order_id: OrderId,
    file_url: String,
    status: ProofStatus,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProofRow> for Proof {
    fn from(row: ProofRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            file_url: row.file_url,
            status: row.status,
            approved_at: row.approved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    proof_id: ProofId,
    user_id: Option<UserId>,
    is_customer: bool,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            proof_id: row.proof_id,
            is_customer: row.is_customer,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreProofRow {
    #[sqlx(flatten)]
    proof: ProofRow,
    external_id: Option<String>,
    customer_name: String,
    customer_email: String,
    order_status: OrderStatus,
}

impl StoreProofRow {
    fn into_entry(self, comments: Vec<Comment>) -> Result<StoreProof, RepositoryError> {
        let proof: Proof = self.proof.into();
        let order = ProofOrder {
            id: proof.order_id,
            order_number: display_number(self.external_id.as_deref(), proof.order_id),
            customer_name: self.customer_name,
            customer_email: Email::parse(&self.customer_email)
                .map_err(|e| corrupt("email", e))?,
            status: self.order_status,
        };
        Ok(StoreProof {
            proof,
            order,
            comments,
        })
    }
}

fn group_by_proof(rows: Vec<CommentRow>) -> HashMap<ProofId, Vec<Comment>> {
    let mut by_proof: HashMap<ProofId, Vec<Comment>> = HashMap::new();
    for row in rows {
        by_proof.entry(row.proof_id).or_default().push(row.into());
    }
    by_proof
}

const PROOF_COLUMNS: &str = "id, order_id, file_url, status, approved_at, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, proof_id, user_id, is_customer, content, created_at";

/// The newest proof for an order (ties broken by id).
pub(crate) async fn current_proof<'e>(
    executor: impl PgExecutor<'e>,
    order_id: OrderId,
) -> Result<Option<Proof>, RepositoryError> {
    let row = sqlx::query_as::<_, ProofRow>(&format!(
        r"
        SELECT {PROOF_COLUMNS}
        FROM proofs
        WHERE order_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "
    ))
    .bind(order_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Order statuses that accept a new revision, as stored.
fn revision_statuses() -> Vec<&'static str> {
    OrderStatus::ALL
        .iter()
        .filter(|s| accepts_revision(**s))
        .map(|s| s.as_str())
        .collect()
}

/// Repository for proof and comment database operations.
pub struct ProofRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProofRepository<'a> {
    /// Create a new proof repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a `pending` revision, but only while the order accepts one (see
    /// [`accepts_revision`]). The check and the insert are one statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is in any other
    /// status, `RepositoryError::NotFound` if it is not in the store.
    pub async fn create_revision(
        &self,
        store_id: StoreId,
        order_id: OrderId,
        file_url: &str,
    ) -> Result<Proof, RepositoryError> {
        let row = sqlx::query_as::<_, ProofRow>(&format!(
            r"
            INSERT INTO proofs (id, order_id, file_url)
            SELECT $1, o.id, $3
            FROM orders o
            WHERE o.id = $2 AND o.store_id = $4
              AND o.status = ANY($5)
            RETURNING {PROOF_COLUMNS}
            "
        ))
        .bind(ProofId::generate())
        .bind(order_id)
        .bind(file_url)
        .bind(store_id)
        .bind(revision_statuses())
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = row {
            let proof: Proof = row.into();
            tracing::info!(order_id = %order_id, proof_id = %proof.id, "Proof revision uploaded");
            return Ok(proof);
        }

        let exists: Option<(OrderId,)> =
            sqlx::query_as("SELECT id FROM orders WHERE id = $1 AND store_id = $2")
                .bind(order_id)
                .bind(store_id)
                .fetch_optional(self.pool)
                .await?;
        Err(match exists {
            Some(_) => RepositoryError::Conflict(
                "a new proof can only be uploaded before sending or after changes are requested"
                    .to_owned(),
            ),
            None => RepositoryError::NotFound,
        })
    }

    /// Every revision of an order, newest first, each with its comments
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, order_id: OrderId) -> Result<Vec<ProofWithComments>, RepositoryError> {
        let proofs = sqlx::query_as::<_, ProofRow>(&format!(
            r"
            SELECT {PROOF_COLUMNS}
            FROM proofs
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        let comments = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT c.id, c.proof_id, c.user_id, c.is_customer, c.content, c.created_at
            FROM comments c
            JOIN proofs p ON p.id = c.proof_id
            WHERE p.order_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        let mut by_proof = group_by_proof(comments);

        Ok(proofs
            .into_iter()
            .map(|row| {
                let proof: Proof = row.into();
                let comments = by_proof.remove(&proof.id).unwrap_or_default();
                ProofWithComments { proof, comments }
            })
            .collect())
    }

    /// Every proof in the store, newest first, joined to its order. Comments
    /// are oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn store_history(
        &self,
        store_id: StoreId,
        status: Option<ProofStatus>,
    ) -> Result<Vec<StoreProof>, RepositoryError> {
        let proofs = sqlx::query_as::<_, StoreProofRow>(
            r"
            SELECT p.id, p.order_id, p.file_url, p.status, p.approved_at, p.created_at, p.updated_at,
                   o.external_id, o.customer_name, o.customer_email, o.status AS order_status
            FROM proofs p
            JOIN orders o ON o.id = p.order_id
            WHERE o.store_id = $1 AND ($2::TEXT IS NULL OR p.status = $2)
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .bind(store_id)
        .bind(status.map(ProofStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        let comments = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT c.id, c.proof_id, c.user_id, c.is_customer, c.content, c.created_at
            FROM comments c
            JOIN proofs p ON p.id = c.proof_id
            JOIN orders o ON o.id = p.order_id
            WHERE o.store_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        let mut by_proof = group_by_proof(comments);
        proofs
            .into_iter()
            .map(|row| {
                let comments = by_proof.remove(&row.proof.id).unwrap_or_default();
                row.into_entry(comments)
            })
            .collect()
    }

    /// Comments on one proof, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn comments(&self, proof_id: ProofId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE proof_id = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(proof_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Append a comment. `author` is `None` for customer comments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_comment(
        &self,
        proof_id: ProofId,
        author: Option<UserId>,
        body: &CommentBody,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r"
            INSERT INTO comments (id, proof_id, user_id, is_customer, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(CommentId::generate())
        .bind(proof_id)
        .bind(author)
        .bind(author.is_none())
        .bind(body.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_statuses_follow_core_rule() {
        assert_eq!(
            revision_statuses(),
            ["awaiting_proof", "changes_requested"]
        );
    }
}
