//! Store provisioning.
//!
//! Creates a bare store (no settings row, so every setting takes its
//! default) for a user that should skip the onboarding flow.

use sqlx::PgPool;
use thiserror::Error;

use simpler_proofs_core::{Slug, SlugError, UserId};
use simpler_proofs_server::db::{RepositoryError, StoreRepository};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Invalid slug: {0}")]
    InvalidSlug(#[from] SlugError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Create a store owned by `user_id`.
///
/// # Errors
///
/// Returns an error for a malformed user id or slug, a user that already has
/// a store, or a slug that is taken.
pub async fn create(user_id: &str, name: &str, slug: Option<&str>) -> Result<(), StoreError> {
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| StoreError::InvalidUserId(user_id.to_owned()))?;
    let slug = match slug {
        Some(s) => Slug::parse(s)?,
        None => Slug::from_name(name)?,
    };

    let database_url =
        super::database_url().ok_or(StoreError::MissingEnvVar("DATABASE_URL"))?;
    let pool = PgPool::connect(&database_url).await?;

    let store = StoreRepository::new(&pool)
        .create(user_id, name.trim(), &slug)
        .await?;

    tracing::info!(
        "Store created! ID: {}, Name: {}, Slug: {}",
        store.id,
        store.name,
        store.slug
    );
    Ok(())
}
