//! Integration tests for Simpler Proofs.
//!
//! # Running Tests
//!
//! ```bash
//! # Workflow and proof page tests run against in-memory fakes
//! cargo test -p simpler-proofs-integration-tests
//!
//! # HTTP tests need a running server and database; Postgres tests need DATABASE_URL
//! SERVER_BASE_URL=http://localhost:3000 DATABASE_URL=postgres://localhost/simpler_proofs \
//!     cargo test -p simpler-proofs-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `workflow` - Status engine behaviour across whole order lifecycles
//! - `proof_page` - Rendered customer pages
//! - `http_api` - Seller API and public pages over HTTP
//! - `postgres_workflow` - Status writes against the real schema

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use simpler_proofs_core::{Actor, OrderId, Slug};
use simpler_proofs_server::db::RepositoryError;
use simpler_proofs_server::models::{Order, Proof, Store, StoredSettings};
use simpler_proofs_server::services::memory::{MemoryWorkflowStore, RecordingNotifier};
use simpler_proofs_server::services::{OrderScope, ProofEmailOverrides, ProofWorkflow};

pub const BASE_URL: &str = "https://app.test";

pub type TestWorkflow = ProofWorkflow<MemoryWorkflowStore, RecordingNotifier>;

/// One store with one order, wired to in-memory fakes.
pub struct Fixture {
    pub workflow: TestWorkflow,
    pub store: Store,
    pub order: Order,
}

impl Fixture {
    /// "Sunny Prints" (`sunny-prints`) with an `awaiting_proof` order for Jane.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(StoredSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: StoredSettings) -> Self {
        let memory = MemoryWorkflowStore::new();
        let store = memory.add_store("Sunny Prints", "sunny-prints");
        memory.set_settings(store.id, settings);
        let order = memory.add_order(store.id, "Jane Doe", "jane@shop.test");
        Self {
            workflow: ProofWorkflow::new(memory, RecordingNotifier::new(), BASE_URL),
            store,
            order,
        }
    }

    /// Undo enabled with the given window.
    #[must_use]
    pub fn with_undo(minutes: i32) -> Self {
        Self::with_settings(StoredSettings {
            enable_undo_approval: Some(true),
            undo_approval_time: Some(minutes),
            ..StoredSettings::default()
        })
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryWorkflowStore {
        self.workflow.store()
    }

    #[must_use]
    pub fn notifier(&self) -> &RecordingNotifier {
        self.workflow.notifier()
    }

    #[must_use]
    pub const fn seller(&self) -> Actor {
        Actor::Seller(self.store.user_id)
    }

    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    /// Scope the customer reaches the order through.
    #[must_use]
    pub fn public(&self) -> OrderScope {
        OrderScope::Public(self.store.slug.clone())
    }

    #[must_use]
    pub fn slug(&self) -> &Slug {
        &self.store.slug
    }

    /// Upload a revision for the order.
    ///
    /// # Panics
    ///
    /// Panics if the order does not accept a revision.
    pub fn upload(&self, file_url: &str) -> Proof {
        self.try_upload(file_url).expect("order should accept a revision")
    }

    /// Upload a revision, reporting a rejection.
    ///
    /// # Errors
    ///
    /// Returns the store's rejection.
    pub fn try_upload(&self, file_url: &str) -> Result<Proof, RepositoryError> {
        self.memory().add_proof(self.order.id, file_url)
    }

    /// Upload a proof and send it with default overrides.
    pub async fn send_new_proof(&self, file_url: &str) -> Proof {
        let proof = self.upload(file_url);
        self.workflow
            .send_proof(
                &self.seller(),
                self.store.id,
                self.order.id,
                &ProofEmailOverrides::default(),
                None,
            )
            .await
            .expect("send should succeed");
        proof
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed instant to measure undo windows from.
#[must_use]
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap()
}

#[must_use]
pub fn after(start: DateTime<Utc>, minutes: i64, seconds: i64) -> DateTime<Utc> {
    start + Duration::minutes(minutes) + Duration::seconds(seconds)
}
