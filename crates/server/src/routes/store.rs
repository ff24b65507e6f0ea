//! General store settings: name, slug, logo, accent color.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{Store, StoreUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/store", get(show).put(update))
}

/// GET /api/store
async fn show(CurrentStore { store, .. }: CurrentStore) -> Json<Store> {
    Json(store)
}

/// PUT /api/store
///
/// A slug change re-checks uniqueness; a taken slug is a conflict.
#[instrument(skip_all, fields(store_id = %store.id))]
async fn update(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(input): Json<StoreUpdate>,
) -> Result<Json<Store>, AppError> {
    let update = input.validate()?;
    let updated = StoreRepository::new(state.pool())
        .update(store.id, &update)
        .await?;
    if updated.slug != store.slug {
        tracing::info!(from = %store.slug, to = %updated.slug, "Store slug changed");
    }
    Ok(Json(updated))
}
