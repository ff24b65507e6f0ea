//! Order detail and seller-owned fields.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use simpler_proofs_core::{ArtistId, OrderId};

use crate::db::{OrderRepository, ProofRepository};
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{Order, ProofWithComments, optional_text};
use crate::state::AppState;

/// An order with its full revision history, newest proof first.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub proofs: Vec<ProofWithComments>,
}

#[derive(Debug, Deserialize)]
pub struct NotesInput {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistAssignment {
    pub artist_id: Option<ArtistId>,
}

/// GET /api/orders/{id}
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn show(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get(store.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;
    let proofs = ProofRepository::new(state.pool()).history(order.id).await?;
    Ok(Json(OrderDetail { order, proofs }))
}

/// PUT /api/orders/{id}/notes
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn update_notes(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<OrderId>,
    Json(input): Json<NotesInput>,
) -> Result<Json<Order>, AppError> {
    let notes = optional_text(input.notes.as_deref());
    let order = OrderRepository::new(state.pool())
        .update_notes(store.id, id, notes.as_deref())
        .await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/artist
///
/// The artist must belong to the same store; anything else is not found.
#[instrument(skip_all, fields(order_id = %id))]
pub(super) async fn assign_artist(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<OrderId>,
    Json(input): Json<ArtistAssignment>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .assign_artist(store.id, id, input.artist_id)
        .await?;
    Ok(Json(order))
}
