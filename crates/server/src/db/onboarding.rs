//! Onboarding: everything a new store starts with, in one transaction.

use sqlx::PgPool;

use simpler_proofs_core::UserId;

use super::artists::insert_artist;
use super::integrations::upsert_integration;
use super::settings::insert_settings;
use super::stores::insert_store;
use super::{RepositoryError, StoreRepository};
use crate::models::{Store, ValidOnboarding};

pub struct OnboardingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OnboardingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the store, its settings row, team and integrations. Nothing is
    /// written unless everything is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a store or
    /// the slug is taken.
    pub async fn complete(
        &self,
        user_id: UserId,
        onboarding: &ValidOnboarding,
    ) -> Result<Store, RepositoryError> {
        if StoreRepository::new(self.pool)
            .get_by_user(user_id)
            .await?
            .is_some()
        {
            return Err(RepositoryError::Conflict(
                "onboarding is already complete".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let store = insert_store(
            &mut *tx,
            user_id,
            &onboarding.name,
            &onboarding.slug,
            onboarding.logo_url.as_deref(),
            onboarding.accent_color.as_deref(),
        )
        .await?;

        insert_settings(&mut *tx, store.id, &onboarding.settings).await?;

        for (name, email) in &onboarding.artists {
            insert_artist(&mut *tx, store.id, name, email).await?;
        }

        for (enabled, config) in &onboarding.integrations {
            upsert_integration(&mut *tx, store.id, *enabled, config).await?;
        }

        tx.commit().await?;

        tracing::info!(
            store_id = %store.id,
            slug = %store.slug,
            artists = onboarding.artists.len(),
            integrations = onboarding.integrations.len(),
            "Onboarding completed"
        );
        Ok(store)
    }
}
