//! Canned reply repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use simpler_proofs_core::{CannedReplyId, StoreId};

use super::RepositoryError;
use crate::models::{CannedReply, NewCannedReply};

#[derive(Debug, sqlx::FromRow)]
struct CannedReplyRow {
    id: CannedReplyId,
    store_id: StoreId,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CannedReplyRow> for CannedReply {
    fn from(row: CannedReplyRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Repository for canned replies.
pub struct CannedReplyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CannedReplyRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, store_id: StoreId) -> Result<Vec<CannedReply>, RepositoryError> {
        let rows = sqlx::query_as::<_, CannedReplyRow>(
            r"
            SELECT id, store_id, title, content, created_at
            FROM canned_replies
            WHERE store_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        reply: &NewCannedReply,
    ) -> Result<CannedReply, RepositoryError> {
        let row = sqlx::query_as::<_, CannedReplyRow>(
            r"
            INSERT INTO canned_replies (id, store_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, store_id, title, content, created_at
            ",
        )
        .bind(CannedReplyId::generate())
        .bind(store_id)
        .bind(&reply.title)
        .bind(&reply.content)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the reply is not in the store.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: CannedReplyId,
        reply: &NewCannedReply,
    ) -> Result<CannedReply, RepositoryError> {
        let row = sqlx::query_as::<_, CannedReplyRow>(
            r"
            UPDATE canned_replies SET title = $3, content = $4
            WHERE id = $1 AND store_id = $2
            RETURNING id, store_id, title, content, created_at
            ",
        )
        .bind(id)
        .bind(store_id)
        .bind(&reply.title)
        .bind(&reply.content)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the reply is not in the store.
    pub async fn delete(&self, store_id: StoreId, id: CannedReplyId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM canned_replies WHERE id = $1 AND store_id = $2")
            .bind(id)
            .bind(store_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
