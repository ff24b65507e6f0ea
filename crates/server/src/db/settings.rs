//! Store settings database operations.
//!
//! One optional row per store. Each settings page writes only its own
//! columns; the other group keeps whatever it had (or stays `NULL`).

use sqlx::{PgExecutor, PgPool};

use simpler_proofs_core::StoreId;

use super::RepositoryError;
use crate::models::{EmailSettingsUpdate, ProofPageSettingsUpdate, Store, StoreSettings, StoredSettings};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    email_template: Option<String>,
    email_subject: Option<String>,
    email_sender_name: Option<String>,
    email_banner_url: Option<String>,
    proof_page_instructions: Option<String>,
    thanks_message: Option<String>,
    revision_message: Option<String>,
    show_timer: Option<bool>,
    timer_duration: Option<i32>,
    show_logo: Option<bool>,
    enable_undo_approval: Option<bool>,
    undo_approval_time: Option<i32>,
}

impl From<SettingsRow> for StoredSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            email_template: row.email_template,
            email_subject: row.email_subject,
            email_sender_name: row.email_sender_name,
            email_banner_url: row.email_banner_url,
            proof_page_instructions: row.proof_page_instructions,
            thanks_message: row.thanks_message,
            revision_message: row.revision_message,
            show_timer: row.show_timer,
            timer_duration: row.timer_duration,
            show_logo: row.show_logo,
            enable_undo_approval: row.enable_undo_approval,
            undo_approval_time: row.undo_approval_time,
        }
    }
}

/// Write a full settings row. Used by onboarding.
pub(crate) async fn insert_settings<'e>(
    executor: impl PgExecutor<'e>,
    store_id: StoreId,
    s: &StoredSettings,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO store_settings (
            store_id, email_template, email_subject, email_sender_name, email_banner_url,
            proof_page_instructions, thanks_message, revision_message,
            show_timer, timer_duration, show_logo, enable_undo_approval, undo_approval_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ",
    )
    .bind(store_id)
    .bind(s.email_template.as_deref())
    .bind(s.email_subject.as_deref())
    .bind(s.email_sender_name.as_deref())
    .bind(s.email_banner_url.as_deref())
    .bind(s.proof_page_instructions.as_deref())
    .bind(s.thanks_message.as_deref())
    .bind(s.revision_message.as_deref())
    .bind(s.show_timer)
    .bind(s.timer_duration)
    .bind(s.show_logo)
    .bind(s.enable_undo_approval)
    .bind(s.undo_approval_time)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for store settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The raw row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_stored(&self, store_id: StoreId) -> Result<Option<StoredSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            SELECT email_template, email_subject, email_sender_name, email_banner_url,
                   proof_page_instructions, thanks_message, revision_message,
                   show_timer, timer_duration, show_logo, enable_undo_approval, undo_approval_time
            FROM store_settings
            WHERE store_id = $1
            ",
        )
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Effective settings with defaults applied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn effective(&self, store: &Store) -> Result<StoreSettings, RepositoryError> {
        let stored = self.get_stored(store.id).await?;
        Ok(StoreSettings::resolve(stored, &store.name))
    }

    /// Save the proof page group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn save_proof_page(
        &self,
        store_id: StoreId,
        update: &ProofPageSettingsUpdate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store_settings (
                store_id, proof_page_instructions, thanks_message, revision_message,
                show_timer, timer_duration, show_logo, enable_undo_approval, undo_approval_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (store_id) DO UPDATE SET
                proof_page_instructions = EXCLUDED.proof_page_instructions,
                thanks_message = EXCLUDED.thanks_message,
                revision_message = EXCLUDED.revision_message,
                show_timer = EXCLUDED.show_timer,
                timer_duration = EXCLUDED.timer_duration,
                show_logo = EXCLUDED.show_logo,
                enable_undo_approval = EXCLUDED.enable_undo_approval,
                undo_approval_time = EXCLUDED.undo_approval_time,
                updated_at = NOW()
            ",
        )
        .bind(store_id)
        .bind(&update.proof_page_instructions)
        .bind(&update.thanks_message)
        .bind(&update.revision_message)
        .bind(update.show_timer)
        .bind(update.timer_duration)
        .bind(update.show_logo)
        .bind(update.enable_undo_approval)
        .bind(update.undo_approval_time)
        .execute(self.pool)
        .await?;

        tracing::info!(store_id = %store_id, "Proof page settings saved");
        Ok(())
    }

    /// Save the email group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn save_email(
        &self,
        store_id: StoreId,
        update: &EmailSettingsUpdate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store_settings (
                store_id, email_sender_name, email_subject, email_template, email_banner_url
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (store_id) DO UPDATE SET
                email_sender_name = EXCLUDED.email_sender_name,
                email_subject = EXCLUDED.email_subject,
                email_template = EXCLUDED.email_template,
                email_banner_url = EXCLUDED.email_banner_url,
                updated_at = NOW()
            ",
        )
        .bind(store_id)
        .bind(&update.email_sender_name)
        .bind(&update.email_subject)
        .bind(&update.email_template)
        .bind(update.email_banner_url.as_deref())
        .execute(self.pool)
        .await?;

        tracing::info!(store_id = %store_id, "Email settings saved");
        Ok(())
    }
}
