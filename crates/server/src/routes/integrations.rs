//! Order-source integrations (Shopify, Etsy, Zapier).
//!
//! Configuration only; nothing is imported from these services.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use crate::db::IntegrationRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{IntegrationInput, IntegrationKind, IntegrationView};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/integrations", get(index))
        .route("/api/integrations/{kind}", put(save).delete(remove))
}

/// GET /api/integrations
///
/// API keys are masked.
async fn index(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
) -> Result<Json<Vec<IntegrationView>>, AppError> {
    let integrations = IntegrationRepository::new(state.pool())
        .list(store.id)
        .await?;
    Ok(Json(integrations.iter().map(IntegrationView::from).collect()))
}

/// PUT /api/integrations/{kind}
///
/// The body's `type` must match the path.
#[instrument(skip_all, fields(store_id = %store.id, kind = %kind))]
async fn save(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(kind): Path<IntegrationKind>,
    Json(input): Json<IntegrationInput>,
) -> Result<Json<IntegrationView>, AppError> {
    if input.config.kind() != kind {
        return Err(AppError::BadRequest(format!(
            "body type {} does not match {kind}",
            input.config.kind()
        )));
    }
    let config = input.config.validate()?;
    let integration = IntegrationRepository::new(state.pool())
        .save(store.id, input.enabled, &config)
        .await?;
    tracing::info!(enabled = integration.enabled, "Integration saved");
    Ok(Json(IntegrationView::from(&integration)))
}

/// DELETE /api/integrations/{kind}
#[instrument(skip_all, fields(store_id = %store.id, kind = %kind))]
async fn remove(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Path(kind): Path<IntegrationKind>,
) -> Result<StatusCode, AppError> {
    IntegrationRepository::new(state.pool())
        .delete(store.id, kind)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
