//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::PgWorkflowStore;
use crate::services::{MailError, Mailer, ProofWorkflow};

/// The status engine as wired in production.
pub type Workflow = ProofWorkflow<PgWorkflowStore, Mailer>;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    workflow: Workflow,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the email provider cannot be set up from `config`.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, MailError> {
        let mailer = Mailer::from_config(&config.email)?;
        let workflow = ProofWorkflow::new(
            PgWorkflowStore::new(pool.clone()),
            mailer,
            config.base_url.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                workflow,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The order/proof status engine.
    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.inner.workflow
    }
}
