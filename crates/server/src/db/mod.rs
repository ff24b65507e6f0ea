//! Database operations for the proof service `PostgreSQL`.
//!
//! ## Tables
//!
//! - `stores` - Tenants, one per seller
//! - `orders` - Customer orders with a projected status
//! - `proofs` - Proof revisions; the newest row is the current proof
//! - `comments` - Comments on proofs (customer or seller)
//! - `store_settings` - Optional per-store settings row
//! - `artists`, `canned_replies`, `integrations` - Store-level CRUD
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p simpler-proofs-cli -- migrate
//! ```

pub mod artists;
pub mod canned_replies;
pub mod integrations;
pub mod onboarding;
pub mod orders;
pub mod proofs;
pub mod settings;
pub mod stores;
pub mod workflow;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use artists::ArtistRepository;
pub use canned_replies::CannedReplyRepository;
pub use integrations::IntegrationRepository;
pub use onboarding::OnboardingRepository;
pub use orders::OrderRepository;
pub use proofs::ProofRepository;
pub use settings::SettingsRepository;
pub use stores::StoreRepository;
pub use workflow::PgWorkflowStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., slug already taken).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `Conflict(message)`, anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a foreign key violation to `NotFound` (e.g. an artist from another store).
pub(crate) fn not_found_on_foreign_key(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

pub(crate) fn corrupt(what: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {what} in database: {err}"))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
