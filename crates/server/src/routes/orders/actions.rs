//! Seller-side transitions, proof uploads and comments.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use simpler_proofs_core::OrderId;

use crate::db::ProofRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::proof::validate_file_url;
use crate::models::{Comment, CommentBody, Proof};
use crate::services::{Applied, OrderScope, ProofDispatch, ProofEmailOverrides};
use crate::state::AppState;

/// Body of `POST /api/orders/{id}/proofs`. The file itself is already in
/// object storage; only its reference is recorded.
#[derive(Debug, Deserialize)]
pub struct ProofUpload {
    pub file_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

/// POST /api/orders/{id}/proofs
///
/// Accepted while the order awaits its first proof or a revision.
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn upload_proof(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<OrderId>,
    Json(input): Json<ProofUpload>,
) -> Result<(StatusCode, Json<Proof>), AppError> {
    let file_url = validate_file_url(&input.file_url)?;
    let proof = ProofRepository::new(state.pool())
        .create_revision(store.id, id, &file_url)
        .await?;
    tracing::info!(order_id = %id, proof_id = %proof.id, "Proof uploaded");
    Ok((StatusCode::CREATED, Json(proof)))
}

/// POST /api/orders/{id}/send-proof
///
/// The body may override any of the stored email settings for this send.
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn send_proof(
    State(state): State<AppState>,
    CurrentStore { seller, store }: CurrentStore,
    Path(id): Path<OrderId>,
    overrides: Option<Json<ProofEmailOverrides>>,
) -> Result<Json<ProofDispatch>, AppError> {
    let overrides = overrides.map(|Json(o)| o).unwrap_or_default();
    let dispatch = state
        .workflow()
        .send_proof(&seller.actor(), store.id, id, &overrides, seller.email)
        .await?;
    Ok(Json(dispatch))
}

/// POST /api/orders/{id}/complete
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn complete(
    State(state): State<AppState>,
    CurrentStore { seller, store }: CurrentStore,
    Path(id): Path<OrderId>,
) -> Result<Json<Applied>, AppError> {
    let applied = state
        .workflow()
        .mark_complete(&seller.actor(), store.id, id)
        .await?;
    Ok(Json(applied))
}

/// POST /api/orders/{id}/undo-approval
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn undo_approval(
    State(state): State<AppState>,
    CurrentStore { seller, store }: CurrentStore,
    Path(id): Path<OrderId>,
) -> Result<Json<Applied>, AppError> {
    let applied = state
        .workflow()
        .undo_approval(&seller.actor(), &OrderScope::Store(store.id), id, Utc::now())
        .await?;
    Ok(Json(applied))
}

/// POST /api/orders/{id}/comments
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn comment(
    State(state): State<AppState>,
    CurrentStore { seller, store }: CurrentStore,
    Path(id): Path<OrderId>,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let body = CommentBody::parse(&input.content)?;
    let comment = state
        .workflow()
        .comment(&seller.actor(), &OrderScope::Store(store.id), id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
