//! Store-wide proof history.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use simpler_proofs_core::ProofStatus;

use crate::db::ProofRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::StoreProof;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProofsQuery {
    pub status: Option<ProofStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/proofs", get(index))
}

/// GET /api/proofs
#[instrument(skip_all, fields(status = ?query.status))]
async fn index(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Query(query): Query<ProofsQuery>,
) -> Result<Json<Vec<StoreProof>>, AppError> {
    let proofs = ProofRepository::new(state.pool())
        .store_history(store.id, query.status)
        .await?;
    Ok(Json(proofs))
}
