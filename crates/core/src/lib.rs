//! Simpler Proofs Core - shared domain types and workflow rules.
//!
//! This crate is used by every Simpler Proofs component:
//! - `server` - Public approval pages and the seller API
//! - `cli` - Migrations and store provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Persistence and notification live in the server
//! crate, which feeds the rules defined here with rows it has read.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, slugs and status enums
//! - [`workflow`] - The order/proof transition table, undo window and page view selection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod workflow;

pub use types::*;
pub use workflow::{
    Action, Actor, ProofPageView, Transition, TransitionError, UndoWindow, accepts_revision,
    plan_transition,
};
