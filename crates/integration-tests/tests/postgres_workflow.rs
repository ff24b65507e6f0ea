//! Workflow status writes against `PostgreSQL`.
//!
//! These tests require `DATABASE_URL` pointing at a database with migrations
//! applied (`sp-cli migrate`).
//!
//! Run with: `cargo test -p simpler-proofs-integration-tests --test postgres_workflow -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use sqlx::PgPool;

use simpler_proofs_core::{
    Action, Actor, OrderStatus, ProofStatus, Slug, Transition, TransitionError, UserId,
};
use simpler_proofs_integration_tests::BASE_URL;
use simpler_proofs_server::db::{
    OrderRepository, PgWorkflowStore, ProofRepository, RepositoryError, StoreRepository,
};
use simpler_proofs_server::models::{NewOrder, Order, Proof, Store};
use simpler_proofs_server::services::memory::RecordingNotifier;
use simpler_proofs_server::services::workflow::{ApprovalStamp, StatusChange};
use simpler_proofs_server::services::{
    OrderScope, ProofEmailOverrides, ProofWorkflow, WorkflowError, WorkflowStore,
};

type PgWorkflow = ProofWorkflow<PgWorkflowStore, RecordingNotifier>;

struct Seeded {
    pool: PgPool,
    workflow: PgWorkflow,
    store: Store,
    order: Order,
}

impl Seeded {
    /// A fresh store and order in the database behind `DATABASE_URL`.
    async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.expect("Failed to connect");

        let user = UserId::generate();
        let slug = Slug::parse(&format!("pg-shop-{}", &user.to_string()[..8])).unwrap();
        let store = StoreRepository::new(&pool)
            .create(user, "Pg Shop", &slug)
            .await
            .expect("Failed to create store");

        let order = NewOrder {
            customer_name: "Jane Doe".into(),
            customer_email: "jane@shop.test".into(),
            external_id: Some("1042".into()),
            notes: None,
            artist_id: None,
        }
        .validate()
        .unwrap();
        let order = OrderRepository::new(&pool)
            .create(store.id, &order)
            .await
            .expect("Failed to create order");

        let workflow = ProofWorkflow::new(
            PgWorkflowStore::new(pool.clone()),
            RecordingNotifier::new(),
            BASE_URL,
        );
        Self {
            pool,
            workflow,
            store,
            order,
        }
    }

    fn public(&self) -> OrderScope {
        OrderScope::Public(self.store.slug.clone())
    }

    async fn upload(&self, file_url: &str) -> Proof {
        ProofRepository::new(&self.pool)
            .create_revision(self.store.id, self.order.id, file_url)
            .await
            .expect("Failed to upload revision")
    }

    async fn send(&self) {
        self.workflow
            .send_proof(
                &Actor::Seller(self.store.user_id),
                self.store.id,
                self.order.id,
                &ProofEmailOverrides::default(),
                None,
            )
            .await
            .expect("send should succeed");
    }

    /// Order status and the newest proof's status, as stored.
    async fn statuses(&self) -> (OrderStatus, ProofStatus) {
        let order = OrderRepository::new(&self.pool)
            .get(self.store.id, self.order.id)
            .await
            .unwrap()
            .expect("order should exist");
        let history = ProofRepository::new(&self.pool)
            .history(self.order.id)
            .await
            .unwrap();
        let current = history.first().expect("order should have a proof");
        (order.status, current.proof.status)
    }

    async fn assert_statuses(&self, order: OrderStatus, proof: ProofStatus) {
        let (stored_order, stored_proof) = self.statuses().await;
        assert_eq!(stored_order, order);
        assert_eq!(stored_proof, proof);
        assert!(stored_order.is_consistent_with(Some(stored_proof)));
    }
}

fn is_rejected_repeat(err: &WorkflowError) -> bool {
    matches!(
        err,
        WorkflowError::Conflict | WorkflowError::Transition(TransitionError::AlreadyDecided(_))
    )
}

// ============================================================================
// Approval
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_second_approval_is_rejected() {
    let db = Seeded::new().await;
    db.upload("https://files.test/proofs/1.png").await;
    db.send().await;

    db.workflow
        .approve(&Actor::Customer, &db.public(), db.order.id, Utc::now())
        .await
        .expect("first approval should succeed");
    let err = db
        .workflow
        .approve(&Actor::Customer, &db.public(), db.order.id, Utc::now())
        .await
        .unwrap_err();

    assert!(is_rejected_repeat(&err), "unexpected error: {err:?}");
    db.assert_statuses(OrderStatus::Approved, ProofStatus::Approved)
        .await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_concurrent_approvals_commit_once() {
    let db = Seeded::new().await;
    db.upload("https://files.test/proofs/1.png").await;
    db.send().await;

    let scope = db.public();
    let (first, second) = tokio::join!(
        db.workflow
            .approve(&Actor::Customer, &scope, db.order.id, Utc::now()),
        db.workflow
            .approve(&Actor::Customer, &scope, db.order.id, Utc::now()),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    for err in outcomes.iter().filter_map(|r| r.as_ref().err()) {
        assert!(is_rejected_repeat(err), "unexpected error: {err:?}");
    }
    db.assert_statuses(OrderStatus::Approved, ProofStatus::Approved)
        .await;
}

// ============================================================================
// Revisions
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_change_for_superseded_proof_is_not_applied() {
    let db = Seeded::new().await;
    let old = db.upload("https://files.test/proofs/1.png").await;
    db.send().await;
    db.workflow
        .request_changes(&Actor::Customer, &db.public(), db.order.id)
        .await
        .unwrap();
    db.upload("https://files.test/proofs/2.png").await;

    let stale = StatusChange {
        order_id: db.order.id,
        proof_id: old.id,
        transition: Transition {
            action: Action::SendProof,
            order_from: OrderStatus::ChangesRequested,
            order_to: OrderStatus::ProofSent,
            proof_from: ProofStatus::ChangesRequested,
            proof_to: ProofStatus::ProofSent,
        },
        approval: ApprovalStamp::Keep,
    };
    let applied = db.workflow.store().apply(&stale).await.unwrap();

    assert!(!applied);
    db.assert_statuses(OrderStatus::ChangesRequested, ProofStatus::Pending)
        .await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_revision_rejected_while_out_for_review() {
    let db = Seeded::new().await;
    db.upload("https://files.test/proofs/1.png").await;
    db.send().await;

    let result = ProofRepository::new(&db.pool)
        .create_revision(db.store.id, db.order.id, "https://files.test/proofs/2.png")
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    db.assert_statuses(OrderStatus::ProofSent, ProofStatus::ProofSent)
        .await;
}
