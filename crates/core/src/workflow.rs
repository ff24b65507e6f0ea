//! Order/proof transition rules.
//!
//! Pure decision logic for the proof approval state machine. Callers read the
//! current order and proof status, ask [`plan_transition`] whether an action is
//! legal for the acting party, and then persist the returned [`Transition`] as
//! a conditional update (`... WHERE status = from`). Nothing here touches I/O
//! or the clock; times are passed in.
//!
//! ```text
//! awaiting_proof ──send──▶ proof_sent ──approve──────────▶ approved ──complete──▶ completed
//!        ▲                   │    ▲                           │
//!        │                   │    └────────undo (window)──────┘
//!        │                   └──request changes──▶ changes_requested
//!        │                                               │
//!        └───────── (new pending revision) ◀─────────────┘ ──send──▶ proof_sent
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{OrderStatus, ProofStatus, UserId};

/// Who is asking for a transition.
///
/// Identity is request-scoped: handlers build this from the request and pass
/// it in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// An authenticated store owner.
    Seller(UserId),
    /// An anonymous visitor holding the public proof link.
    Customer,
}

impl Actor {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Seller(_) => "seller",
            Self::Customer => "customer",
        }
    }
}

/// A state-changing request on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SendProof,
    Approve,
    RequestChanges,
    UndoApproval,
    MarkComplete,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SendProof => "send_proof",
            Self::Approve => "approve",
            Self::RequestChanges => "request_changes",
            Self::UndoApproval => "undo_approval",
            Self::MarkComplete => "mark_complete",
        }
    }

    const fn allows(self, actor: &Actor) -> bool {
        match self {
            Self::SendProof | Self::MarkComplete => matches!(actor, Actor::Seller(_)),
            Self::Approve | Self::RequestChanges => matches!(actor, Actor::Customer),
            Self::UndoApproval => true,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The acting party may never trigger this action.
    #[error("a {actor} cannot {action}")]
    NotPermitted { action: Action, actor: &'static str },

    /// The order has no proof to act on.
    #[error("order has no proof yet")]
    NoProof,

    /// The customer already approved or rejected the current proof.
    #[error("proof already decided: {0}")]
    AlreadyDecided(ProofStatus),

    /// The action is not legal from the current state.
    #[error("cannot {action} while order is {order} (proof: {proof:?})")]
    InvalidTransition {
        action: Action,
        order: OrderStatus,
        proof: Option<ProofStatus>,
    },
}

/// A legal status change for one order and its current proof.
///
/// `order_from`/`proof_from` are the preconditions the persistence layer must
/// re-check at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub action: Action,
    pub order_from: OrderStatus,
    pub order_to: OrderStatus,
    pub proof_from: ProofStatus,
    pub proof_to: ProofStatus,
}

impl Transition {
    /// Whether this transition dispatches the proof-ready email.
    #[must_use]
    pub const fn notifies(&self) -> bool {
        matches!(self.action, Action::SendProof)
    }

    /// Whether the proof row changes (mark-complete only touches the order).
    #[must_use]
    pub fn touches_proof(&self) -> bool {
        self.proof_from != self.proof_to
    }

    /// A re-send of an already sent proof changes no status.
    #[must_use]
    pub fn is_status_noop(&self) -> bool {
        self.order_from == self.order_to && self.proof_from == self.proof_to
    }
}

/// Decide whether `action` by `actor` is legal for an order in `order` whose
/// current proof is in `proof`.
///
/// # Errors
///
/// Returns a [`TransitionError`] if the actor may not perform the action, the
/// order has no proof, the proof is already decided, or the states do not
/// permit it.
pub fn plan_transition(
    action: Action,
    actor: &Actor,
    order: OrderStatus,
    proof: Option<ProofStatus>,
) -> Result<Transition, TransitionError> {
    if !action.allows(actor) {
        return Err(TransitionError::NotPermitted {
            action,
            actor: actor.kind(),
        });
    }

    let proof_status = proof.ok_or(TransitionError::NoProof)?;
    let invalid = TransitionError::InvalidTransition {
        action,
        order,
        proof,
    };

    let (order_to, proof_to) = match (action, order, proof_status) {
        (
            Action::SendProof,
            OrderStatus::AwaitingProof | OrderStatus::ChangesRequested,
            ProofStatus::Pending,
        ) => (OrderStatus::ProofSent, ProofStatus::ProofSent),
        (Action::SendProof, OrderStatus::ProofSent, ProofStatus::ProofSent) => {
            (OrderStatus::ProofSent, ProofStatus::ProofSent)
        }

        (Action::Approve | Action::RequestChanges, _, decided) if decided.is_decided() => {
            return Err(TransitionError::AlreadyDecided(decided));
        }
        (Action::Approve, OrderStatus::ProofSent, ProofStatus::ProofSent) => {
            (OrderStatus::Approved, ProofStatus::Approved)
        }
        (Action::RequestChanges, OrderStatus::ProofSent, ProofStatus::ProofSent) => {
            (OrderStatus::ChangesRequested, ProofStatus::ChangesRequested)
        }

        (Action::UndoApproval, OrderStatus::Approved, ProofStatus::Approved) => {
            (OrderStatus::ProofSent, ProofStatus::ProofSent)
        }
        (Action::MarkComplete, OrderStatus::Approved, ProofStatus::Approved) => {
            (OrderStatus::Completed, ProofStatus::Approved)
        }

        _ => return Err(invalid),
    };

    Ok(Transition {
        action,
        order_from: order,
        order_to,
        proof_from: proof_status,
        proof_to,
    })
}

/// Whether a new proof revision may be uploaded for an order in `order`.
///
/// Revisions are accepted before the first send and after the customer asked
/// for changes. Uploading while a proof is out for review would silently swap
/// what the customer is looking at.
#[must_use]
pub const fn accepts_revision(order: OrderStatus) -> bool {
    matches!(
        order,
        OrderStatus::AwaitingProof | OrderStatus::ChangesRequested
    )
}

/// Time-boxed undo of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UndoWindow {
    minutes: u32,
}

impl UndoWindow {
    pub const DEFAULT_MINUTES: u32 = 30;
    pub const MIN_MINUTES: u32 = 1;
    pub const MAX_MINUTES: u32 = 1440;

    /// Build a window, clamping into `MIN_MINUTES..=MAX_MINUTES`.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: minutes.clamp(Self::MIN_MINUTES, Self::MAX_MINUTES),
        }
    }

    #[must_use]
    pub const fn minutes(&self) -> u32 {
        self.minutes
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }

    /// Undo is allowed while `now - approved_at < window`. The boundary itself
    /// is already expired.
    #[must_use]
    pub fn permits(&self, approved_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(approved_at) < self.duration()
    }

    /// Time left to undo, or `None` once expired.
    #[must_use]
    pub fn remaining(&self, approved_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        let deadline = approved_at + self.duration();
        (now < deadline).then(|| deadline - now)
    }
}

impl Default for UndoWindow {
    fn default() -> Self {
        Self {
            minutes: Self::DEFAULT_MINUTES,
        }
    }
}

/// Which public proof page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ProofPageView {
    /// No sent proof yet: "We're still working on your proof."
    NoProof,
    /// Proof out for review: show it with both actions.
    Active,
    /// Approved. `undo_minutes` is set while an undo control should be offered.
    Approved { undo_minutes: Option<u32> },
    /// Revision requested: acknowledgement only.
    ChangesRequested,
}

impl ProofPageView {
    /// Pick the view for an order and its current proof.
    ///
    /// An unsent (`pending`) proof is never shown to the customer. The undo
    /// control is only offered when `undo` is configured, the order is still
    /// `approved` (not completed) and the window has not elapsed.
    #[must_use]
    pub fn select(
        order: OrderStatus,
        proof: Option<ProofStatus>,
        approved_at: Option<DateTime<Utc>>,
        undo: Option<UndoWindow>,
        now: DateTime<Utc>,
    ) -> Self {
        match proof {
            None | Some(ProofStatus::Pending) => Self::NoProof,
            Some(ProofStatus::ProofSent) => Self::Active,
            Some(ProofStatus::ChangesRequested) => Self::ChangesRequested,
            Some(ProofStatus::Approved) => {
                let undo_minutes = match (order, undo, approved_at) {
                    (OrderStatus::Approved, Some(window), Some(at)) if window.permits(at, now) => {
                        Some(window.minutes())
                    }
                    _ => None,
                };
                Self::Approved { undo_minutes }
            }
        }
    }

    /// Whether the approve / request-changes buttons are on this view.
    #[must_use]
    pub const fn offers_decision(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn seller() -> Actor {
        Actor::Seller(UserId::generate())
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_send_from_awaiting_proof() {
        let t = plan_transition(
            Action::SendProof,
            &seller(),
            OrderStatus::AwaitingProof,
            Some(ProofStatus::Pending),
        )
        .unwrap();
        assert_eq!(t.order_to, OrderStatus::ProofSent);
        assert_eq!(t.proof_to, ProofStatus::ProofSent);
        assert!(t.notifies());
        assert!(!t.is_status_noop());
    }

    #[test]
    fn test_send_revision_after_changes_requested() {
        let t = plan_transition(
            Action::SendProof,
            &seller(),
            OrderStatus::ChangesRequested,
            Some(ProofStatus::Pending),
        )
        .unwrap();
        assert_eq!(t.order_from, OrderStatus::ChangesRequested);
        assert_eq!(t.order_to, OrderStatus::ProofSent);
    }

    #[test]
    fn test_resend_is_status_noop_but_notifies() {
        let t = plan_transition(
            Action::SendProof,
            &seller(),
            OrderStatus::ProofSent,
            Some(ProofStatus::ProofSent),
        )
        .unwrap();
        assert!(t.is_status_noop());
        assert!(t.notifies());
    }

    #[test]
    fn test_send_without_proof() {
        assert_eq!(
            plan_transition(Action::SendProof, &seller(), OrderStatus::AwaitingProof, None),
            Err(TransitionError::NoProof)
        );
    }

    #[test]
    fn test_customer_decisions() {
        for (action, order_to, proof_to) in [
            (Action::Approve, OrderStatus::Approved, ProofStatus::Approved),
            (
                Action::RequestChanges,
                OrderStatus::ChangesRequested,
                ProofStatus::ChangesRequested,
            ),
        ] {
            let t = plan_transition(
                action,
                &Actor::Customer,
                OrderStatus::ProofSent,
                Some(ProofStatus::ProofSent),
            )
            .unwrap();
            assert_eq!((t.order_to, t.proof_to), (order_to, proof_to));
            assert!(!t.notifies());
            assert!(t.order_to.is_consistent_with(Some(t.proof_to)));
        }
    }

    #[test]
    fn test_repeat_decision_is_already_decided() {
        let err = plan_transition(
            Action::Approve,
            &Actor::Customer,
            OrderStatus::Approved,
            Some(ProofStatus::Approved),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::AlreadyDecided(ProofStatus::Approved));

        let err = plan_transition(
            Action::RequestChanges,
            &Actor::Customer,
            OrderStatus::ChangesRequested,
            Some(ProofStatus::ChangesRequested),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::AlreadyDecided(ProofStatus::ChangesRequested)
        );
    }

    #[test]
    fn test_customer_cannot_decide_unsent_proof() {
        let err = plan_transition(
            Action::Approve,
            &Actor::Customer,
            OrderStatus::AwaitingProof,
            Some(ProofStatus::Pending),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn test_role_restrictions() {
        assert!(matches!(
            plan_transition(
                Action::Approve,
                &seller(),
                OrderStatus::ProofSent,
                Some(ProofStatus::ProofSent)
            ),
            Err(TransitionError::NotPermitted { actor: "seller", .. })
        ));
        assert!(matches!(
            plan_transition(
                Action::MarkComplete,
                &Actor::Customer,
                OrderStatus::Approved,
                Some(ProofStatus::Approved)
            ),
            Err(TransitionError::NotPermitted { actor: "customer", .. })
        ));
        assert!(matches!(
            plan_transition(
                Action::SendProof,
                &Actor::Customer,
                OrderStatus::AwaitingProof,
                Some(ProofStatus::Pending)
            ),
            Err(TransitionError::NotPermitted { .. })
        ));
    }

    #[test]
    fn test_undo_by_either_party() {
        for actor in [seller(), Actor::Customer] {
            let t = plan_transition(
                Action::UndoApproval,
                &actor,
                OrderStatus::Approved,
                Some(ProofStatus::Approved),
            )
            .unwrap();
            assert_eq!(t.order_to, OrderStatus::ProofSent);
            assert_eq!(t.proof_to, ProofStatus::ProofSent);
        }
    }

    #[test]
    fn test_complete_only_from_approved() {
        let t = plan_transition(
            Action::MarkComplete,
            &seller(),
            OrderStatus::Approved,
            Some(ProofStatus::Approved),
        )
        .unwrap();
        assert_eq!(t.order_to, OrderStatus::Completed);
        assert!(!t.touches_proof());
        assert!(t.order_to.is_consistent_with(Some(t.proof_to)));

        assert!(
            plan_transition(
                Action::MarkComplete,
                &seller(),
                OrderStatus::ChangesRequested,
                Some(ProofStatus::ChangesRequested),
            )
            .is_err()
        );
    }

    #[test]
    fn test_completed_is_terminal() {
        let proof = Some(ProofStatus::Approved);
        for action in [Action::UndoApproval, Action::MarkComplete, Action::SendProof] {
            assert!(plan_transition(action, &seller(), OrderStatus::Completed, proof).is_err());
        }
    }

    #[test]
    fn test_every_successful_transition_is_consistent() {
        let actors = [seller(), Actor::Customer];
        let actions = [
            Action::SendProof,
            Action::Approve,
            Action::RequestChanges,
            Action::UndoApproval,
            Action::MarkComplete,
        ];
        let proofs = [
            None,
            Some(ProofStatus::Pending),
            Some(ProofStatus::ProofSent),
            Some(ProofStatus::Approved),
            Some(ProofStatus::ChangesRequested),
        ];
        for order in OrderStatus::ALL {
            for proof in proofs {
                for action in actions {
                    for actor in &actors {
                        if let Ok(t) = plan_transition(action, actor, *order, proof) {
                            assert!(
                                t.order_to.is_consistent_with(Some(t.proof_to)),
                                "{action} from {order}/{proof:?} leaves {}/{}",
                                t.order_to,
                                t.proof_to
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_revision_upload_states() {
        assert!(accepts_revision(OrderStatus::AwaitingProof));
        assert!(accepts_revision(OrderStatus::ChangesRequested));
        assert!(!accepts_revision(OrderStatus::ProofSent));
        assert!(!accepts_revision(OrderStatus::Approved));
        assert!(!accepts_revision(OrderStatus::Completed));
    }

    #[test]
    fn test_undo_window_boundary_is_exclusive() {
        let window = UndoWindow::from_minutes(30);
        let approved = at(0);
        assert!(window.permits(approved, at(0)));
        assert!(window.permits(approved, at(29)));
        assert!(window.permits(approved, at(30) - Duration::seconds(1)));
        assert!(!window.permits(approved, at(30)));
        assert!(!window.permits(approved, at(31)));
    }

    #[test]
    fn test_undo_window_remaining() {
        let window = UndoWindow::from_minutes(30);
        assert_eq!(window.remaining(at(0), at(10)), Some(Duration::minutes(20)));
        assert_eq!(window.remaining(at(0), at(30)), None);
    }

    #[test]
    fn test_undo_window_clamps() {
        assert_eq!(UndoWindow::from_minutes(0).minutes(), 1);
        assert_eq!(UndoWindow::from_minutes(10_000).minutes(), 1440);
        assert_eq!(UndoWindow::default().minutes(), 30);
    }

    #[test]
    fn test_page_view_selection() {
        let now = at(10);
        let undo = Some(UndoWindow::from_minutes(30));

        assert_eq!(
            ProofPageView::select(OrderStatus::AwaitingProof, None, None, undo, now),
            ProofPageView::NoProof
        );
        assert_eq!(
            ProofPageView::select(
                OrderStatus::AwaitingProof,
                Some(ProofStatus::Pending),
                None,
                undo,
                now
            ),
            ProofPageView::NoProof
        );
        assert_eq!(
            ProofPageView::select(
                OrderStatus::ProofSent,
                Some(ProofStatus::ProofSent),
                None,
                undo,
                now
            ),
            ProofPageView::Active
        );
        assert_eq!(
            ProofPageView::select(
                OrderStatus::ChangesRequested,
                Some(ProofStatus::ChangesRequested),
                None,
                undo,
                now
            ),
            ProofPageView::ChangesRequested
        );
        assert_eq!(
            ProofPageView::select(
                OrderStatus::Approved,
                Some(ProofStatus::Approved),
                Some(at(0)),
                undo,
                now
            ),
            ProofPageView::Approved {
                undo_minutes: Some(30)
            }
        );
    }

    #[test]
    fn test_page_view_hides_undo() {
        let approved = Some(at(0));
        let undo = Some(UndoWindow::from_minutes(5));
        let proof = Some(ProofStatus::Approved);

        // disabled
        assert_eq!(
            ProofPageView::select(OrderStatus::Approved, proof, approved, None, at(1)),
            ProofPageView::Approved { undo_minutes: None }
        );
        // expired
        assert_eq!(
            ProofPageView::select(OrderStatus::Approved, proof, approved, undo, at(5)),
            ProofPageView::Approved { undo_minutes: None }
        );
        // completed
        assert_eq!(
            ProofPageView::select(OrderStatus::Completed, proof, approved, undo, at(1)),
            ProofPageView::Approved { undo_minutes: None }
        );
    }

    #[test]
    fn test_only_active_view_offers_decision() {
        assert!(ProofPageView::Active.offers_decision());
        assert!(!ProofPageView::NoProof.offers_decision());
        assert!(!ProofPageView::ChangesRequested.offers_decision());
        assert!(!ProofPageView::Approved { undo_minutes: Some(30) }.offers_decision());
    }
}
