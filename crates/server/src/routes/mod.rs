//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database reachable)
//!
//! # Public approval surface (no authentication)
//! GET  /p/{store_slug}/{order_id}
//! POST /p/{store_slug}/{order_id}/approve
//! POST /p/{store_slug}/{order_id}/request-changes
//! POST /p/{store_slug}/{order_id}/undo-approval
//! POST /p/{store_slug}/{order_id}/comments
//!
//! # Seller API (identity headers required)
//! POST /api/onboarding
//! GET  /api/store, PUT /api/store
//! /api/orders/...                   - See [`orders`]
//! GET  /api/proofs?status=          - Every proof in the store, newest first
//! GET  /api/run-sheet, POST /api/run-sheet
//! /api/settings/...                 - See [`settings`]
//! /api/artists, /api/canned-replies, /api/integrations
//! ```

pub mod artists;
pub mod canned_replies;
pub mod integrations;
pub mod onboarding;
pub mod orders;
pub mod proofs;
pub mod public;
pub mod run_sheet;
pub mod settings;
pub mod store;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Every route, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(public::router())
        .merge(onboarding::router())
        .merge(store::router())
        .merge(orders::router())
        .merge(proofs::router())
        .merge(run_sheet::router())
        .merge(settings::router())
        .merge(artists::router())
        .merge(canned_replies::router())
        .merge(integrations::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
