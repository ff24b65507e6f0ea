//! Onboarding: the first request a new seller makes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use tracing::instrument;

use crate::db::OnboardingRepository;
use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::models::{OnboardingRequest, Store};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/onboarding", post(complete))
}

/// POST /api/onboarding
///
/// Creates the store with its settings, team and integrations. A second
/// submission is a conflict.
#[instrument(skip_all, fields(user_id = %seller.user_id))]
async fn complete(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Json(request): Json<OnboardingRequest>,
) -> Result<(StatusCode, Json<Store>), AppError> {
    let onboarding = request.validate()?;
    let store = OnboardingRepository::new(state.pool())
        .complete(seller.user_id, &onboarding)
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}
