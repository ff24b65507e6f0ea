//! In-memory workflow store and a recording notifier.
//!
//! Used by unit and integration tests to drive [`ProofWorkflow`] without a
//! database or an email provider. Behaves like the Postgres store: proofs get
//! strictly increasing `created_at` values, and [`WorkflowStore::apply`]
//! re-checks the expected statuses and that the proof is still current.
//!
//! [`ProofWorkflow`]: super::workflow::ProofWorkflow

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use simpler_proofs_core::{
    CommentId, Email, OrderId, OrderStatus, ProofId, ProofStatus, Slug, StoreId, UserId,
    accepts_revision,
};

use crate::db::RepositoryError;
use crate::models::{Comment, CommentBody, Order, Proof, Store, StoreSettings, StoredSettings};
use crate::services::mailer::{Delivery, MailError, OutboundEmail, ProofNotifier};
use crate::services::workflow::{
    ApprovalStamp, OrderScope, OrderSnapshot, StatusChange, WorkflowStore,
};

#[derive(Debug, Default)]
struct MemoryState {
    stores: Vec<Store>,
    orders: Vec<Order>,
    proofs: Vec<Proof>,
    comments: Vec<Comment>,
    settings: HashMap<StoreId, StoredSettings>,
    ticks: i64,
    fail_writes: bool,
    race_next_apply: bool,
}

impl MemoryState {
    /// Monotonic stand-in for the database clock.
    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.timestamp_opt(1_767_225_600, 0)
            .single()
            .unwrap_or_default()
            + Duration::milliseconds(self.ticks)
    }

    fn current_proof(&self, order_id: OrderId) -> Option<&Proof> {
        self.proofs
            .iter()
            .filter(|p| p.order_id == order_id)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
    }

    fn apply(&mut self, change: &StatusChange) -> bool {
        let t = change.transition;
        let is_current = self
            .current_proof(change.order_id)
            .is_some_and(|p| p.id == change.proof_id && p.status == t.proof_from);
        let order_matches = self
            .orders
            .iter()
            .any(|o| o.id == change.order_id && o.status == t.order_from);
        if !(is_current && order_matches) {
            return false;
        }

        let now = self.tick();
        if let Some(order) = self.orders.iter_mut().find(|o| o.id == change.order_id) {
            order.status = t.order_to;
            order.updated_at = now;
        }
        if let Some(proof) = self.proofs.iter_mut().find(|p| p.id == change.proof_id) {
            proof.status = t.proof_to;
            proof.updated_at = now;
            match change.approval {
                ApprovalStamp::Keep => {}
                ApprovalStamp::Set(at) => proof.approved_at = Some(at),
                ApprovalStamp::Clear => proof.approved_at = None,
            }
        }
        true
    }
}

/// A [`WorkflowStore`] backed by vectors behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryWorkflowStore {
    state: Mutex<MemoryState>,
}

impl MemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a store named `name` with the given slug.
    ///
    /// # Panics
    ///
    /// Panics if `slug` is not a valid slug.
    #[must_use]
    pub fn add_store(&self, name: &str, slug: &str) -> Store {
        let mut state = self.lock();
        let now = state.tick();
        #[allow(clippy::expect_used)]
        let slug = Slug::parse(slug).expect("test slug must be valid");
        let store = Store {
            id: StoreId::generate(),
            user_id: UserId::generate(),
            name: name.to_owned(),
            slug,
            logo_url: None,
            accent_color: None,
            created_at: now,
            updated_at: now,
        };
        state.stores.push(store.clone());
        store
    }

    /// Add an `awaiting_proof` order.
    ///
    /// # Panics
    ///
    /// Panics if `customer_email` is not a valid address.
    #[must_use]
    pub fn add_order(&self, store_id: StoreId, customer_name: &str, customer_email: &str) -> Order {
        let mut state = self.lock();
        let now = state.tick();
        #[allow(clippy::expect_used)]
        let customer_email = Email::parse(customer_email).expect("test email must be valid");
        let order = Order {
            id: OrderId::generate(),
            store_id,
            external_id: None,
            customer_name: customer_name.to_owned(),
            customer_email,
            status: OrderStatus::AwaitingProof,
            artist_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(order.clone());
        order
    }

    /// Upload a `pending` proof revision, subject to the same status rule as
    /// the Postgres repository.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown order, `Conflict` when the order does not
    /// accept a revision.
    pub fn add_proof(&self, order_id: OrderId, file_url: &str) -> Result<Proof, RepositoryError> {
        let mut state = self.lock();
        let order_status = state
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.status)
            .ok_or(RepositoryError::NotFound)?;
        if !accepts_revision(order_status) {
            return Err(RepositoryError::Conflict(format!(
                "order is {order_status}; no new proof accepted"
            )));
        }

        let now = state.tick();
        let proof = Proof {
            id: ProofId::generate(),
            order_id,
            file_url: file_url.to_owned(),
            status: ProofStatus::Pending,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        state.proofs.push(proof.clone());
        Ok(proof)
    }

    pub fn set_settings(&self, store_id: StoreId, settings: StoredSettings) {
        self.lock().settings.insert(store_id, settings);
    }

    /// Make every following write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// The next `apply` sees the same change land first from another request.
    pub fn race_next_apply(&self) {
        self.lock().race_next_apply = true;
    }

    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.lock().orders.iter().find(|o| o.id == order_id).cloned()
    }

    #[must_use]
    pub fn current_proof(&self, order_id: OrderId) -> Option<Proof> {
        self.lock().current_proof(order_id).cloned()
    }

    #[must_use]
    pub fn proof(&self, proof_id: ProofId) -> Option<Proof> {
        self.lock().proofs.iter().find(|p| p.id == proof_id).cloned()
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn snapshot(
        &self,
        scope: &OrderScope,
        order_id: OrderId,
    ) -> Result<Option<OrderSnapshot>, RepositoryError> {
        let state = self.lock();
        let Some(order) = state.orders.iter().find(|o| o.id == order_id) else {
            return Ok(None);
        };
        let store = state.stores.iter().find(|s| match scope {
            OrderScope::Store(id) => s.id == *id,
            OrderScope::Public(slug) => s.slug == *slug,
        });
        let Some(store) = store.filter(|s| s.id == order.store_id) else {
            return Ok(None);
        };

        Ok(Some(OrderSnapshot {
            store: store.clone(),
            order: order.clone(),
            current_proof: state.current_proof(order_id).cloned(),
        }))
    }

    async fn settings(&self, store: &Store) -> Result<StoreSettings, RepositoryError> {
        let stored = self.lock().settings.get(&store.id).cloned();
        Ok(StoreSettings::resolve(stored, &store.name))
    }

    async fn apply(&self, change: &StatusChange) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        if std::mem::take(&mut state.race_next_apply) {
            state.apply(change);
        }
        Ok(state.apply(change))
    }

    async fn comments(&self, proof_id: ProofId) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self
            .lock()
            .comments
            .iter()
            .filter(|c| c.proof_id == proof_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn add_comment(
        &self,
        proof_id: ProofId,
        author: Option<UserId>,
        body: &CommentBody,
    ) -> Result<Comment, RepositoryError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        let created_at = state.tick();
        let comment = Comment {
            id: CommentId::generate(),
            proof_id,
            is_customer: author.is_none(),
            user_id: author,
            content: body.as_str().to_owned(),
            created_at,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}

/// A [`ProofNotifier`] that records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutboundEmail>>,
    failure: Mutex<Option<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every delivery with this provider message until cleared.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = message.map(str::to_owned);
    }

    /// Emails accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ProofNotifier for RecordingNotifier {
    async fn deliver(&self, email: &OutboundEmail) -> Result<Delivery, MailError> {
        if let Some(message) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(MailError::Provider {
                status: 422,
                message,
            });
        }
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(email.clone());
        Ok(Delivery {
            message_id: Some(format!("msg-{}", sent.len())),
        })
    }
}
