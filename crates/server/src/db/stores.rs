//! Store repository.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use simpler_proofs_core::{Slug, StoreId, UserId};

use super::{RepositoryError, conflict_on_unique, corrupt};
use crate::models::{Store, ValidStoreUpdate};

pub(crate) const SLUG_TAKEN: &str = "that URL is already taken";
const STORE_EXISTS: &str = "a store already exists for this account";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StoreRow {
    id: StoreId,
    user_id: UserId,
    name: String,
    slug: String,
    logo_url: Option<String>,
    accent_color: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            slug: Slug::parse(&row.slug).map_err(|e| corrupt("slug", e))?,
            logo_url: row.logo_url,
            accent_color: row.accent_color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const STORE_COLUMNS: &str =
    "id, user_id, name, slug, logo_url, accent_color, created_at, updated_at";

/// Insert a store row. Shared with onboarding, which runs it in a transaction.
pub(crate) async fn insert_store<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
    name: &str,
    slug: &Slug,
    logo_url: Option<&str>,
    accent_color: Option<&str>,
) -> Result<Store, RepositoryError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        r"
        INSERT INTO stores (id, user_id, name, slug, logo_url, accent_color)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {STORE_COLUMNS}
        "
    ))
    .bind(StoreId::generate())
    .bind(user_id)
    .bind(name)
    .bind(slug.as_str())
    .bind(logo_url)
    .bind(accent_color)
    .fetch_one(executor)
    .await
    .map_err(|e| conflict_on_unique(e, SLUG_TAKEN))?;

    row.try_into()
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get the store owned by an identity-provider user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a store by its public slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1"
        ))
        .bind(slug.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a store with no settings row (defaults apply).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the user
    /// already has a store.
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        slug: &Slug,
    ) -> Result<Store, RepositoryError> {
        if self.get_by_user(user_id).await?.is_some() {
            return Err(RepositoryError::Conflict(STORE_EXISTS.to_owned()));
        }
        insert_store(self.pool, user_id, name, slug, None, None).await
    }

    /// Apply a validated partial update.
    ///
    /// A slug change is re-checked against the unique index at write time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new slug is taken,
    /// `RepositoryError::NotFound` if the store does not exist.
    pub async fn update(
        &self,
        id: StoreId,
        update: &ValidStoreUpdate,
    ) -> Result<Store, RepositoryError> {
        let (set_logo, logo_url) = split_clearable(update.logo_url.as_ref());
        let (set_accent, accent_color) = split_clearable(update.accent_color.as_ref());

        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE stores SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                logo_url = CASE WHEN $4 THEN $5 ELSE logo_url END,
                accent_color = CASE WHEN $6 THEN $7 ELSE accent_color END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.slug.as_ref().map(Slug::as_str))
        .bind(set_logo)
        .bind(logo_url)
        .bind(set_accent)
        .bind(accent_color)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, SLUG_TAKEN))?
        .ok_or(RepositoryError::NotFound)?;

        let store: Store = row.try_into()?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "Store updated");
        Ok(store)
    }
}

/// `Some(v)` means "set to v" (where v may be `None` to clear).
fn split_clearable(value: Option<&Option<String>>) -> (bool, Option<&str>) {
    match value {
        Some(v) => (true, v.as_deref()),
        None => (false, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_clearable() {
        assert_eq!(split_clearable(None), (false, None));
        assert_eq!(split_clearable(Some(&None)), (true, None));
        let logo = Some("https://files.test/logo.png".to_owned());
        assert_eq!(
            split_clearable(Some(&logo)),
            (true, Some("https://files.test/logo.png"))
        );
    }
}
