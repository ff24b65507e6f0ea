//! Artist repository.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use simpler_proofs_core::{ArtistId, Email, StoreId};

use super::{RepositoryError, corrupt};
use crate::models::Artist;

#[derive(Debug, sqlx::FromRow)]
struct ArtistRow {
    id: ArtistId,
    store_id: StoreId,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ArtistRow> for Artist {
    type Error = RepositoryError;

    fn try_from(row: ArtistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            email: Email::parse(&row.email).map_err(|e| corrupt("email", e))?,
            created_at: row.created_at,
        })
    }
}

pub(crate) async fn insert_artist<'e>(
    executor: impl PgExecutor<'e>,
    store_id: StoreId,
    name: &str,
    email: &Email,
) -> Result<Artist, RepositoryError> {
    let row = sqlx::query_as::<_, ArtistRow>(
        r"
        INSERT INTO artists (id, store_id, name, email)
        VALUES ($1, $2, $3, $4)
        RETURNING id, store_id, name, email, created_at
        ",
    )
    .bind(ArtistId::generate())
    .bind(store_id)
    .bind(name)
    .bind(email.as_str())
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Repository for artists.
pub struct ArtistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArtistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, store_id: StoreId) -> Result<Vec<Artist>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtistRow>(
            r"
            SELECT id, store_id, name, email, created_at
            FROM artists
            WHERE store_id = $1
            ORDER BY name, id
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        name: &str,
        email: &Email,
    ) -> Result<Artist, RepositoryError> {
        insert_artist(self.pool, store_id, name, email).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artist is not in the store.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ArtistId,
        name: &str,
        email: &Email,
    ) -> Result<Artist, RepositoryError> {
        let row = sqlx::query_as::<_, ArtistRow>(
            r"
            UPDATE artists SET name = $3, email = $4
            WHERE id = $1 AND store_id = $2
            RETURNING id, store_id, name, email, created_at
            ",
        )
        .bind(id)
        .bind(store_id)
        .bind(name)
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete an artist. Orders assigned to them become unassigned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artist is not in the store.
    pub async fn delete(&self, store_id: StoreId, id: ArtistId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM artists WHERE id = $1 AND store_id = $2")
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
