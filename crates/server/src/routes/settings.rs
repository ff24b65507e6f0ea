//! Store settings: proof page copy, undo and timer, proof email.
//!
//! ```text
//! GET  /api/settings             - Effective settings (defaults filled in)
//! PUT  /api/settings/proof-page  - Page copy, timer, logo, undo window
//! PUT  /api/settings/email       - Sender, subject, template, banner
//! POST /api/settings/email/test  - Send the email to any address, no state change
//! ```

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use simpler_proofs_core::Email;

use crate::db::SettingsRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{EmailSettingsUpdate, ProofPageSettingsUpdate, StoreSettings};
use crate::services::{Delivery, ProofEmailOverrides};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(show))
        .route("/api/settings/proof-page", put(update_proof_page))
        .route("/api/settings/email", put(update_email))
        .route("/api/settings/email/test", post(send_test))
}

/// Body of the test send. `to` defaults to the seller's own address.
#[derive(Debug, Default, Deserialize)]
pub struct TestEmailRequest {
    pub to: Option<Email>,
    #[serde(flatten)]
    pub overrides: ProofEmailOverrides,
}

#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    pub to: Email,
    #[serde(flatten)]
    pub delivery: Delivery,
}

/// GET /api/settings
async fn show(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
) -> Result<Json<StoreSettings>, AppError> {
    let settings = SettingsRepository::new(state.pool())
        .effective(&store)
        .await?;
    Ok(Json(settings))
}

/// PUT /api/settings/proof-page
#[instrument(skip_all, fields(store_id = %store.id))]
async fn update_proof_page(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(input): Json<ProofPageSettingsUpdate>,
) -> Result<Json<StoreSettings>, AppError> {
    let update = input.validate()?;
    let repo = SettingsRepository::new(state.pool());
    repo.save_proof_page(store.id, &update).await?;
    Ok(Json(repo.effective(&store).await?))
}

/// PUT /api/settings/email
#[instrument(skip_all, fields(store_id = %store.id))]
async fn update_email(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(input): Json<EmailSettingsUpdate>,
) -> Result<Json<StoreSettings>, AppError> {
    let update = input.validate()?;
    let repo = SettingsRepository::new(state.pool());
    repo.save_email(store.id, &update).await?;
    Ok(Json(repo.effective(&store).await?))
}

/// POST /api/settings/email/test
#[instrument(skip_all, fields(store_id = %store.id))]
async fn send_test(
    State(state): State<AppState>,
    CurrentStore { seller, store }: CurrentStore,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<TestEmailResponse>, AppError> {
    let to = request
        .to
        .or_else(|| seller.email.clone())
        .ok_or_else(|| AppError::BadRequest("No recipient email provided".to_owned()))?;

    let delivery = state
        .workflow()
        .send_test_email(&store, to.clone(), &request.overrides, seller.email)
        .await?;
    Ok(Json(TestEmailResponse { to, delivery }))
}
