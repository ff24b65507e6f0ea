//! Business logic services.
//!
//! # Services
//!
//! - `workflow` - Order/proof status engine and its persistence seam
//! - `mailer` - Email delivery via Resend or SMTP
//! - `proof_email` - Proof-ready email body assembly
//! - `run_sheet` - Run-sheet CSV rendering
//! - `memory` - In-memory store and recording notifier (tests only)

pub mod mailer;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod proof_email;
pub mod run_sheet;
pub mod workflow;

pub use mailer::{Delivery, MailError, Mailer, OutboundEmail, ProofNotifier};
pub use workflow::{
    Applied, OrderScope, ProofDispatch, ProofEmailOverrides, ProofPage, ProofWorkflow,
    WorkflowError, WorkflowStore,
};
