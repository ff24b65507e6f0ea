//! Team members that can be assigned to orders.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use simpler_proofs_core::ArtistId;

use crate::db::ArtistRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{Artist, NewArtist};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/artists", get(index).post(create))
        .route("/api/artists/{id}", put(update).delete(remove))
}

async fn index(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
) -> Result<Json<Vec<Artist>>, AppError> {
    Ok(Json(ArtistRepository::new(state.pool()).list(store.id).await?))
}

#[instrument(skip_all, fields(store_id = %store.id))]
async fn create(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(input): Json<NewArtist>,
) -> Result<(StatusCode, Json<Artist>), AppError> {
    let (name, email) = input.validate()?;
    let artist = ArtistRepository::new(state.pool())
        .create(store.id, &name, &email)
        .await?;
    Ok((StatusCode::CREATED, Json(artist)))
}

#[instrument(skip_all, fields(artist_id = %id))]
async fn update(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<ArtistId>,
    Json(input): Json<NewArtist>,
) -> Result<Json<Artist>, AppError> {
    let (name, email) = input.validate()?;
    let artist = ArtistRepository::new(state.pool())
        .update(store.id, id, &name, &email)
        .await?;
    Ok(Json(artist))
}

/// Orders assigned to the artist are unassigned.
#[instrument(skip_all, fields(artist_id = %id))]
async fn remove(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<ArtistId>,
) -> Result<StatusCode, AppError> {
    ArtistRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
