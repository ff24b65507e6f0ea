//! Reusable comment snippets.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use simpler_proofs_core::CannedReplyId;

use crate::db::CannedReplyRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{CannedReply, NewCannedReply};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/canned-replies", get(index).post(create))
        .route("/api/canned-replies/{id}", put(update).delete(remove))
}

async fn index(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
) -> Result<Json<Vec<CannedReply>>, AppError> {
    Ok(Json(
        CannedReplyRepository::new(state.pool()).list(store.id).await?,
    ))
}

async fn create(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(input): Json<NewCannedReply>,
) -> Result<(StatusCode, Json<CannedReply>), AppError> {
    let reply = input.validate()?;
    let reply = CannedReplyRepository::new(state.pool())
        .create(store.id, &reply)
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

async fn update(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<CannedReplyId>,
    Json(input): Json<NewCannedReply>,
) -> Result<Json<CannedReply>, AppError> {
    let reply = input.validate()?;
    let reply = CannedReplyRepository::new(state.pool())
        .update(store.id, id, &reply)
        .await?;
    Ok(Json(reply))
}

async fn remove(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(id): Path<CannedReplyId>,
) -> Result<StatusCode, AppError> {
    CannedReplyRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
