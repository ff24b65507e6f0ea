//! Order/proof status engine.
//!
//! [`ProofWorkflow`] loads an order with its current proof, asks
//! [`plan_transition`] whether the requested action is legal, performs the
//! side effects (the proof-ready email for sends) and then writes the new
//! order/proof status pair through [`WorkflowStore::apply`], which re-checks
//! the expected previous statuses at write time.
//!
//! Identity is always passed in as an [`Actor`]; nothing here reads request
//! or session state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use simpler_proofs_core::{
    Action, Actor, Email, OrderId, OrderStatus, ProofId, ProofPageView, ProofStatus, Slug,
    StoreId, Transition, TransitionError, UserId, plan_transition,
};

use crate::db::RepositoryError;
use crate::models::{Comment, CommentBody, Order, Proof, Store, StoreSettings, optional_text};
use crate::services::mailer::{Delivery, MailError, OutboundEmail, ProofNotifier};
use crate::services::proof_email::{ProofEmailContent, compose_html};

/// Recipient name used by test sends.
pub const TEST_RECIPIENT_NAME: &str = "Test User";
/// Order number used by test sends.
pub const TEST_ORDER_NUMBER: &str = "test-order-id";

// =============================================================================
// Persistence seam
// =============================================================================

/// How an order is being addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Seller API: the order must belong to this store.
    Store(StoreId),
    /// Public link: the order must belong to the store with this slug.
    Public(Slug),
}

/// An order as read for one request.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub store: Store,
    pub order: Order,
    /// Most recently created proof, if any.
    pub current_proof: Option<Proof>,
}

impl OrderSnapshot {
    fn plan(&self, action: Action, actor: &Actor) -> Result<(Transition, &Proof), WorkflowError> {
        let transition = plan_transition(
            action,
            actor,
            self.order.status,
            self.current_proof.as_ref().map(|p| p.status),
        )?;
        let proof = self
            .current_proof
            .as_ref()
            .ok_or(TransitionError::NoProof)?;
        Ok((transition, proof))
    }
}

/// What happens to `proofs.approved_at` alongside a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStamp {
    Keep,
    Set(DateTime<Utc>),
    Clear,
}

/// A planned write of the order/proof status pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub proof_id: ProofId,
    pub transition: Transition,
    pub approval: ApprovalStamp,
}

/// Storage operations the engine needs.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Load an order addressed by `scope`. `None` when the store or order does
    /// not exist or they do not belong together.
    async fn snapshot(
        &self,
        scope: &OrderScope,
        order_id: OrderId,
    ) -> Result<Option<OrderSnapshot>, RepositoryError>;

    /// Effective settings for a store.
    async fn settings(&self, store: &Store) -> Result<StoreSettings, RepositoryError>;

    /// Write both status columns atomically, guarded by
    /// `transition.order_from`/`proof_from` and by `proof_id` still being the
    /// current proof. Returns `false` when the guard did not match.
    async fn apply(&self, change: &StatusChange) -> Result<bool, RepositoryError>;

    /// Comments on a proof, oldest first.
    async fn comments(&self, proof_id: ProofId) -> Result<Vec<Comment>, RepositoryError>;

    /// Append a comment. `author` is `None` for customers.
    async fn add_comment(
        &self,
        proof_id: ProofId,
        author: Option<UserId>,
        body: &CommentBody,
    ) -> Result<Comment, RepositoryError>;
}

// =============================================================================
// Errors and results
// =============================================================================

/// Errors from the status engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No such order in this scope.
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("undo approval is not enabled for this store")]
    UndoDisabled,

    #[error("the undo window has passed")]
    UndoExpired,

    /// Comments are only taken from customers while the proof is out for review.
    #[error("comments are closed for this proof")]
    CommentsClosed,

    /// The order changed between reading and writing.
    #[error("order was updated by another request")]
    Conflict,

    /// The email provider failed. The provider's message is kept verbatim.
    #[error(transparent)]
    Delivery(#[from] MailError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// State after a successful transition.
#[derive(Debug, Clone, Serialize)]
pub struct Applied {
    pub order_id: OrderId,
    pub proof_id: ProofId,
    pub action: Action,
    pub order_status: OrderStatus,
    pub proof_status: ProofStatus,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Result of a proof send.
#[derive(Debug, Clone, Serialize)]
pub struct ProofDispatch {
    #[serde(flatten)]
    pub applied: Applied,
    pub recipient: Email,
    pub message_id: Option<String>,
    /// `true` when the proof was already out and only the email went again.
    pub resent: bool,
}

/// Optional per-send replacements for the stored email settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProofEmailOverrides {
    pub recipient_name: Option<String>,
    pub recipient_email: Option<Email>,
    pub subject: Option<String>,
    pub template: Option<String>,
    pub sender_name: Option<String>,
    pub banner_url: Option<String>,
}

/// Everything the public page needs.
#[derive(Debug, Clone)]
pub struct ProofPage {
    pub store: Store,
    pub order: Order,
    pub settings: StoreSettings,
    pub view: ProofPageView,
    /// Only set when the view shows the proof.
    pub proof: Option<Proof>,
    pub comments: Vec<Comment>,
}

// =============================================================================
// Engine
// =============================================================================

/// The status engine over a store and a notifier.
#[derive(Debug, Clone)]
pub struct ProofWorkflow<S, N> {
    store: S,
    notifier: N,
    base_url: String,
}

impl<S: WorkflowStore, N: ProofNotifier> ProofWorkflow<S, N> {
    #[must_use]
    pub fn new(store: S, notifier: N, base_url: impl Into<String>) -> Self {
        Self {
            store,
            notifier,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn load(&self, scope: &OrderScope, order_id: OrderId) -> Result<OrderSnapshot, WorkflowError> {
        self.store
            .snapshot(scope, order_id)
            .await?
            .ok_or(WorkflowError::NotFound)
    }

    async fn commit(
        &self,
        proof: &Proof,
        transition: Transition,
        approval: ApprovalStamp,
    ) -> Result<Applied, WorkflowError> {
        let change = StatusChange {
            order_id: proof.order_id,
            proof_id: proof.id,
            transition,
            approval,
        };
        if !self.store.apply(&change).await? {
            tracing::warn!(
                order_id = %proof.order_id,
                action = %transition.action,
                "Order changed before the update landed"
            );
            return Err(WorkflowError::Conflict);
        }

        tracing::info!(
            order_id = %proof.order_id,
            proof_id = %proof.id,
            action = %transition.action,
            from = %transition.order_from,
            to = %transition.order_to,
            "Order transitioned"
        );

        let approved_at = match approval {
            ApprovalStamp::Keep => proof.approved_at,
            ApprovalStamp::Set(at) => Some(at),
            ApprovalStamp::Clear => None,
        };
        Ok(Applied {
            order_id: proof.order_id,
            proof_id: proof.id,
            action: transition.action,
            order_status: transition.order_to,
            proof_status: transition.proof_to,
            approved_at,
        })
    }

    /// Email the current proof to the customer and move the order to
    /// `proof_sent`. Re-sending an already sent proof only repeats the email.
    ///
    /// The email goes out before the status write; if the write then fails
    /// the error is returned, never a success.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Transition` when the order is not sendable, `Delivery`
    /// when the provider refuses (state unchanged), `Conflict` or
    /// `Repository` when the write fails.
    #[tracing::instrument(skip_all, fields(store_id = %store_id, order_id = %order_id))]
    pub async fn send_proof(
        &self,
        actor: &Actor,
        store_id: StoreId,
        order_id: OrderId,
        overrides: &ProofEmailOverrides,
        reply_to: Option<Email>,
    ) -> Result<ProofDispatch, WorkflowError> {
        let snapshot = self.load(&OrderScope::Store(store_id), order_id).await?;
        let (transition, proof) = snapshot.plan(Action::SendProof, actor)?;
        let settings = self.store.settings(&snapshot.store).await?;

        let order = &snapshot.order;
        let recipient = overrides
            .recipient_email
            .clone()
            .unwrap_or_else(|| order.customer_email.clone());
        let recipient_name = optional_text(overrides.recipient_name.as_deref())
            .unwrap_or_else(|| order.customer_name.clone());
        let link = snapshot.store.proof_link(&self.base_url, order.id);

        let email = render_email(
            &settings,
            overrides,
            EmailTarget {
                to: recipient.clone(),
                to_name: recipient_name,
                order_number: &order.display_number(),
                proof_link: &link,
                reply_to,
            },
        );
        let delivery = self.notifier.deliver(&email).await?;

        let resent = transition.is_status_noop();
        let applied = if resent {
            Applied {
                order_id: order.id,
                proof_id: proof.id,
                action: Action::SendProof,
                order_status: order.status,
                proof_status: proof.status,
                approved_at: proof.approved_at,
            }
        } else {
            self.commit(proof, transition, ApprovalStamp::Keep).await?
        };

        Ok(ProofDispatch {
            applied,
            recipient,
            message_id: delivery.message_id,
            resent,
        })
    }

    /// Send the configured email to `to` with placeholder values. No order
    /// is read and no state changes.
    ///
    /// # Errors
    ///
    /// `Delivery` when the provider refuses, `Repository` if settings cannot
    /// be read.
    #[tracing::instrument(skip_all, fields(store_id = %store.id, to = %to))]
    pub async fn send_test_email(
        &self,
        store: &Store,
        to: Email,
        overrides: &ProofEmailOverrides,
        reply_to: Option<Email>,
    ) -> Result<Delivery, WorkflowError> {
        let settings = self.store.settings(store).await?;
        let link = format!("{}/test-proof-link", self.base_url);
        let email = render_email(
            &settings,
            overrides,
            EmailTarget {
                to,
                to_name: TEST_RECIPIENT_NAME.to_owned(),
                order_number: TEST_ORDER_NUMBER,
                proof_link: &link,
                reply_to,
            },
        );
        Ok(self.notifier.deliver(&email).await?)
    }

    /// Customer approves the current proof.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Transition` (including `AlreadyDecided`), `Conflict` when
    /// a concurrent decision won, `Repository`.
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn approve(
        &self,
        actor: &Actor,
        scope: &OrderScope,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<Applied, WorkflowError> {
        let snapshot = self.load(scope, order_id).await?;
        let (transition, proof) = snapshot.plan(Action::Approve, actor)?;
        self.commit(proof, transition, ApprovalStamp::Set(now)).await
    }

    /// Customer asks for changes to the current proof.
    ///
    /// # Errors
    ///
    /// Same as [`Self::approve`].
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn request_changes(
        &self,
        actor: &Actor,
        scope: &OrderScope,
        order_id: OrderId,
    ) -> Result<Applied, WorkflowError> {
        let snapshot = self.load(scope, order_id).await?;
        let (transition, proof) = snapshot.plan(Action::RequestChanges, actor)?;
        self.commit(proof, transition, ApprovalStamp::Keep).await
    }

    /// Revert an approval while the store's undo window is open.
    ///
    /// Succeeds iff undo is enabled and `now - approved_at` is strictly less
    /// than the window.
    ///
    /// # Errors
    ///
    /// `UndoDisabled`, `UndoExpired`, plus those of [`Self::approve`].
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn undo_approval(
        &self,
        actor: &Actor,
        scope: &OrderScope,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<Applied, WorkflowError> {
        let snapshot = self.load(scope, order_id).await?;
        let (transition, proof) = snapshot.plan(Action::UndoApproval, actor)?;

        let settings = self.store.settings(&snapshot.store).await?;
        let window = settings.undo_window().ok_or(WorkflowError::UndoDisabled)?;
        let open = proof.approved_at.is_some_and(|at| window.permits(at, now));
        if !open {
            tracing::info!(
                order_id = %order_id,
                window_minutes = window.minutes(),
                "Undo requested after the window closed"
            );
            return Err(WorkflowError::UndoExpired);
        }

        self.commit(proof, transition, ApprovalStamp::Clear).await
    }

    /// Seller closes out an approved order.
    ///
    /// # Errors
    ///
    /// Same as [`Self::approve`].
    #[tracing::instrument(skip_all, fields(store_id = %store_id, order_id = %order_id))]
    pub async fn mark_complete(
        &self,
        actor: &Actor,
        store_id: StoreId,
        order_id: OrderId,
    ) -> Result<Applied, WorkflowError> {
        let snapshot = self.load(&OrderScope::Store(store_id), order_id).await?;
        let (transition, proof) = snapshot.plan(Action::MarkComplete, actor)?;
        self.commit(proof, transition, ApprovalStamp::Keep).await
    }

    /// Add a comment to the current proof.
    ///
    /// Sellers may comment on any current proof; customers only while it is
    /// out for review.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Transition(NoProof)`, `CommentsClosed`, `Repository`.
    pub async fn comment(
        &self,
        actor: &Actor,
        scope: &OrderScope,
        order_id: OrderId,
        body: &CommentBody,
    ) -> Result<Comment, WorkflowError> {
        let snapshot = self.load(scope, order_id).await?;
        let proof = snapshot
            .current_proof
            .as_ref()
            .ok_or(TransitionError::NoProof)?;

        let author = match actor {
            Actor::Seller(user_id) => Some(*user_id),
            Actor::Customer if proof.status == ProofStatus::ProofSent => None,
            Actor::Customer => return Err(WorkflowError::CommentsClosed),
        };

        let comment = self.store.add_comment(proof.id, author, body).await?;
        tracing::info!(
            order_id = %order_id,
            proof_id = %proof.id,
            actor = actor.kind(),
            "Comment added"
        );
        Ok(comment)
    }

    /// Read the public page for `(slug, order_id)`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the slug or order do not exist or do not match.
    pub async fn proof_page(
        &self,
        slug: &Slug,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<ProofPage, WorkflowError> {
        let snapshot = self.load(&OrderScope::Public(slug.clone()), order_id).await?;
        let settings = self.store.settings(&snapshot.store).await?;

        let current = snapshot.current_proof.as_ref();
        let view = ProofPageView::select(
            snapshot.order.status,
            current.map(|p| p.status),
            current.and_then(|p| p.approved_at),
            settings.undo_window(),
            now,
        );

        let proof = match view {
            ProofPageView::NoProof => None,
            _ => snapshot.current_proof,
        };
        let comments = match &proof {
            Some(p) => self.store.comments(p.id).await?,
            None => Vec::new(),
        };

        Ok(ProofPage {
            store: snapshot.store,
            order: snapshot.order,
            settings,
            view,
            proof,
            comments,
        })
    }
}

// =============================================================================
// Email rendering
// =============================================================================

struct EmailTarget<'a> {
    to: Email,
    to_name: String,
    order_number: &'a str,
    proof_link: &'a str,
    reply_to: Option<Email>,
}

fn pick<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(fallback)
}

fn render_email(
    settings: &StoreSettings,
    overrides: &ProofEmailOverrides,
    target: EmailTarget<'_>,
) -> OutboundEmail {
    let sender_name = pick(overrides.sender_name.as_deref(), &settings.email_sender_name);
    let banner_url = overrides
        .banner_url
        .as_deref()
        .or(settings.email_banner_url.as_deref());

    let html = compose_html(&ProofEmailContent {
        template: pick(overrides.template.as_deref(), &settings.email_template),
        customer_name: &target.to_name,
        order_number: target.order_number,
        proof_link: target.proof_link,
        banner_url,
        sender_name: Some(sender_name),
    });

    OutboundEmail {
        to: target.to,
        to_name: target.to_name,
        subject: pick(overrides.subject.as_deref(), &settings.email_subject).to_owned(),
        html,
        sender_name: sender_name.to_owned(),
        reply_to: target.reply_to,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::StoredSettings;

    fn settings() -> StoreSettings {
        StoreSettings::resolve(
            Some(StoredSettings {
                email_subject: Some("Proof for {{order_id}}".into()),
                ..StoredSettings::default()
            }),
            "Sunny Prints",
        )
    }

    fn target(link: &str) -> EmailTarget<'_> {
        EmailTarget {
            to: Email::parse("jane@shop.test").unwrap(),
            to_name: "Jane".into(),
            order_number: "1042",
            proof_link: link,
            reply_to: None,
        }
    }

    #[test]
    fn test_render_uses_settings_by_default() {
        let email = render_email(
            &settings(),
            &ProofEmailOverrides::default(),
            target("https://app.test/p/sunny/1"),
        );
        assert_eq!(email.sender_name, "Sunny Prints");
        assert_eq!(email.subject, "Proof for {{order_id}}");
        assert!(email.html.contains("Hello Jane,"));
        assert!(email.html.contains("https://app.test/p/sunny/1"));
    }

    #[test]
    fn test_render_overrides_win_and_blanks_fall_back() {
        let overrides = ProofEmailOverrides {
            subject: Some("Your mug proof".into()),
            sender_name: Some("  ".into()),
            template: Some("<p>Order {{order_id}}: {{proof_link}}</p>".into()),
            ..ProofEmailOverrides::default()
        };
        let email = render_email(&settings(), &overrides, target("https://app.test/p/sunny/1"));
        assert_eq!(email.subject, "Your mug proof");
        assert_eq!(email.sender_name, "Sunny Prints");
        assert!(email.html.starts_with("<p>Order 1042: https://app.test/p/sunny/1</p>"));
        assert!(!email.html.contains("View and Approve Proof"));
    }

    #[test]
    fn test_overrides_deserialize_partially() {
        let overrides: ProofEmailOverrides =
            serde_json::from_str(r#"{"subject":"Hi there"}"#).unwrap();
        assert_eq!(overrides.subject.as_deref(), Some("Hi there"));
        assert!(overrides.recipient_email.is_none());
        assert!(serde_json::from_str::<ProofEmailOverrides>(r#"{"recipient_email":"nope"}"#).is_err());
    }
}
