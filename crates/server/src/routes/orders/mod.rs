//! Seller order routes.
//!
//! ```text
//! GET  /api/orders?status=         - List orders, newest first
//! POST /api/orders                 - Create an order
//! GET  /api/orders/stats           - Order totals per status
//! GET  /api/orders/{id}            - Order with every proof revision and its comments
//! PUT  /api/orders/{id}/notes      - Replace the notes
//! PUT  /api/orders/{id}/artist     - Assign or clear the artist
//! POST /api/orders/{id}/proofs     - Upload a proof revision
//! POST /api/orders/{id}/send-proof - Email the current proof to the customer
//! POST /api/orders/{id}/complete   - Mark an approved order complete
//! POST /api/orders/{id}/undo-approval
//! POST /api/orders/{id}/comments   - Seller comment on the current proof
//! ```

mod actions;
mod detail;
mod list;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

pub use actions::{CommentInput, ProofUpload};
pub use detail::{ArtistAssignment, NotesInput, OrderDetail};
pub use list::OrdersQuery;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list::index).post(list::create))
        .route("/api/orders/stats", get(list::stats))
        .route("/api/orders/{id}", get(detail::show))
        .route("/api/orders/{id}/notes", put(detail::update_notes))
        .route("/api/orders/{id}/artist", put(detail::assign_artist))
        .route("/api/orders/{id}/proofs", post(actions::upload_proof))
        .route("/api/orders/{id}/send-proof", post(actions::send_proof))
        .route("/api/orders/{id}/complete", post(actions::complete))
        .route("/api/orders/{id}/undo-approval", post(actions::undo_approval))
        .route("/api/orders/{id}/comments", post(actions::comment))
}
