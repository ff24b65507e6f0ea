//! Public approval surface.
//!
//! Customers reach these pages from the link in the proof email. Everything is
//! addressed by `(store slug, order id)`; any mismatch renders the same
//! not-found page as a missing order. Actions are plain form posts that
//! redirect back to the page, so a refresh never re-submits and the page is
//! always rendered from freshly read state.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use simpler_proofs_core::{Actor, OrderId, ProofPageView, Slug};

use crate::filters;
use crate::models::{
    Comment, CommentBody, DEFAULT_ACCENT_COLOR, Store, StoreSettings, proof_link,
};
use crate::services::{OrderScope, ProofPage, WorkflowError};
use crate::state::AppState;

/// Build the public router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/p/{store_slug}/{order_id}", get(show))
        .route("/p/{store_slug}/{order_id}/approve", post(approve))
        .route("/p/{store_slug}/{order_id}/request-changes", post(request_changes))
        .route("/p/{store_slug}/{order_id}/undo-approval", post(undo_approval))
        .route("/p/{store_slug}/{order_id}/comments", post(comment))
}

// =============================================================================
// Templates
// =============================================================================

/// Store branding shown in the page header.
#[derive(Debug, Clone)]
pub struct Branding {
    pub store_name: String,
    pub logo_url: Option<String>,
    pub accent_color: String,
}

impl Branding {
    fn for_store(store: &Store, settings: &StoreSettings) -> Self {
        Self {
            store_name: store.name.clone(),
            logo_url: store.logo_url.clone().filter(|_| settings.show_logo),
            accent_color: store.accent_color_or_default().to_owned(),
        }
    }

    /// Used when no store could be resolved.
    fn neutral() -> Self {
        Self {
            store_name: "Simpler Proofs".to_owned(),
            logo_url: None,
            accent_color: DEFAULT_ACCENT_COLOR.to_owned(),
        }
    }
}

/// A comment as shown to the customer.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub author: String,
    pub posted: String,
    pub content: String,
}

impl CommentView {
    fn new(comment: &Comment, store_name: &str) -> Self {
        Self {
            author: if comment.is_customer {
                "You".to_owned()
            } else {
                store_name.to_owned()
            },
            posted: comment.created_at.format("%b %-d, %Y %-I:%M %p UTC").to_string(),
            content: comment.content.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "proof/no_proof.html")]
pub struct NoProofTemplate {
    pub brand: Branding,
    pub order_number: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "proof/active.html")]
pub struct ActiveProofTemplate {
    pub brand: Branding,
    pub action_base: String,
    pub order_number: String,
    pub customer_name: String,
    pub instructions: String,
    pub timer_hours: Option<i32>,
    pub proof_url: String,
    pub is_pdf: bool,
    /// Oldest first.
    pub comments: Vec<CommentView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "proof/approved.html")]
pub struct ApprovedTemplate {
    pub brand: Branding,
    pub action_base: String,
    pub message: String,
    pub undo_minutes: Option<u32>,
}

#[derive(Template, WebTemplate)]
#[template(path = "proof/changes_requested.html")]
pub struct ChangesRequestedTemplate {
    pub brand: Branding,
    pub message: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub brand: Branding,
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub brand: Branding,
}

/// One of the four customer-facing views of an order.
pub enum PublicPage {
    NoProof(NoProofTemplate),
    Active(ActiveProofTemplate),
    Approved(ApprovedTemplate),
    ChangesRequested(ChangesRequestedTemplate),
}

impl PublicPage {
    /// Build the template for a page read by the status engine.
    #[must_use]
    pub fn from_page(page: &ProofPage) -> Self {
        let brand = Branding::for_store(&page.store, &page.settings);
        let order = &page.order;
        let action_base = proof_link("", &page.store.slug, order.id);

        match (page.view, &page.proof) {
            (ProofPageView::Active, Some(proof)) => Self::Active(ActiveProofTemplate {
                action_base,
                order_number: order.display_number(),
                customer_name: order.customer_name.clone(),
                instructions: page.settings.proof_page_instructions.clone(),
                timer_hours: page
                    .settings
                    .show_timer
                    .then_some(page.settings.timer_duration),
                proof_url: proof.file_url.clone(),
                is_pdf: proof.is_pdf(),
                comments: page
                    .comments
                    .iter()
                    .map(|c| CommentView::new(c, &brand.store_name))
                    .collect(),
                brand,
            }),
            (ProofPageView::Approved { undo_minutes }, _) => Self::Approved(ApprovedTemplate {
                brand,
                action_base,
                message: page.settings.thanks_message.clone(),
                undo_minutes,
            }),
            (ProofPageView::ChangesRequested, _) => {
                Self::ChangesRequested(ChangesRequestedTemplate {
                    brand,
                    message: page.settings.revision_message.clone(),
                })
            }
            (ProofPageView::NoProof | ProofPageView::Active, _) => {
                Self::NoProof(NoProofTemplate {
                    brand,
                    order_number: order.display_number(),
                })
            }
        }
    }

    /// Render to HTML.
    ///
    /// # Errors
    ///
    /// Returns the template engine's error.
    pub fn render(&self) -> askama::Result<String> {
        match self {
            Self::NoProof(t) => t.render(),
            Self::Active(t) => t.render(),
            Self::Approved(t) => t.render(),
            Self::ChangesRequested(t) => t.render(),
        }
    }
}

impl IntoResponse for PublicPage {
    fn into_response(self) -> Response {
        match self {
            Self::NoProof(t) => t.into_response(),
            Self::Active(t) => t.into_response(),
            Self::Approved(t) => t.into_response(),
            Self::ChangesRequested(t) => t.into_response(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Public-surface failures. Never carries details to the customer.
#[derive(Debug)]
pub enum PublicError {
    NotFound,
    Failed,
}

impl From<WorkflowError> for PublicError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound => Self::NotFound,
            other => {
                let event_id = sentry::capture_error(&other);
                tracing::error!(
                    error = %other,
                    sentry_event_id = %event_id,
                    "Public request error"
                );
                Self::Failed
            }
        }
    }
}

impl IntoResponse for PublicError {
    fn into_response(self) -> Response {
        let brand = Branding::neutral();
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, NotFoundTemplate { brand }).into_response(),
            Self::Failed => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorTemplate { brand }).into_response()
            }
        }
    }
}

/// Parse the path. Malformed slugs and ids are indistinguishable from
/// missing ones.
fn address(store_slug: &str, order_id: &str) -> Result<(Slug, OrderId), PublicError> {
    let slug = Slug::parse(store_slug).map_err(|_| PublicError::NotFound)?;
    let order_id = order_id.parse().map_err(|_| PublicError::NotFound)?;
    Ok((slug, order_id))
}

/// Map an action result to a response.
///
/// Success and every "nothing to do" outcome (already decided, expired undo,
/// lost race) redirect to the page, which then shows the current state.
fn after_action<T>(
    slug: &Slug,
    order_id: OrderId,
    result: Result<T, WorkflowError>,
) -> Result<Redirect, PublicError> {
    let page = proof_link("", slug, order_id);
    match result {
        Ok(_) => Ok(Redirect::to(&page)),
        Err(
            e @ (WorkflowError::Transition(_)
            | WorkflowError::UndoDisabled
            | WorkflowError::UndoExpired
            | WorkflowError::CommentsClosed
            | WorkflowError::Conflict),
        ) => {
            tracing::info!(order_id = %order_id, reason = %e, "Customer action ignored");
            Ok(Redirect::to(&page))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /p/{store_slug}/{order_id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path((store_slug, order_id)): Path<(String, String)>,
) -> Result<PublicPage, PublicError> {
    let (slug, order_id) = address(&store_slug, &order_id)?;
    let page = state
        .workflow()
        .proof_page(&slug, order_id, Utc::now())
        .await?;
    Ok(PublicPage::from_page(&page))
}

/// POST /p/{store_slug}/{order_id}/approve
#[instrument(skip(state))]
async fn approve(
    State(state): State<AppState>,
    Path((store_slug, order_id)): Path<(String, String)>,
) -> Result<Redirect, PublicError> {
    let (slug, order_id) = address(&store_slug, &order_id)?;
    let result = state
        .workflow()
        .approve(
            &Actor::Customer,
            &OrderScope::Public(slug.clone()),
            order_id,
            Utc::now(),
        )
        .await;
    after_action(&slug, order_id, result)
}

/// POST /p/{store_slug}/{order_id}/request-changes
#[instrument(skip(state))]
async fn request_changes(
    State(state): State<AppState>,
    Path((store_slug, order_id)): Path<(String, String)>,
) -> Result<Redirect, PublicError> {
    let (slug, order_id) = address(&store_slug, &order_id)?;
    let result = state
        .workflow()
        .request_changes(&Actor::Customer, &OrderScope::Public(slug.clone()), order_id)
        .await;
    after_action(&slug, order_id, result)
}

/// POST /p/{store_slug}/{order_id}/undo-approval
#[instrument(skip(state))]
async fn undo_approval(
    State(state): State<AppState>,
    Path((store_slug, order_id)): Path<(String, String)>,
) -> Result<Redirect, PublicError> {
    let (slug, order_id) = address(&store_slug, &order_id)?;
    let result = state
        .workflow()
        .undo_approval(
            &Actor::Customer,
            &OrderScope::Public(slug.clone()),
            order_id,
            Utc::now(),
        )
        .await;
    after_action(&slug, order_id, result)
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

/// POST /p/{store_slug}/{order_id}/comments
#[instrument(skip(state, form))]
async fn comment(
    State(state): State<AppState>,
    Path((store_slug, order_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, PublicError> {
    let (slug, order_id) = address(&store_slug, &order_id)?;
    // An empty or oversized comment is dropped like any other no-op.
    let Ok(body) = CommentBody::parse(&form.content) else {
        return Ok(Redirect::to(&proof_link("", &slug, order_id)));
    };
    let result = state
        .workflow()
        .comment(
            &Actor::Customer,
            &OrderScope::Public(slug.clone()),
            order_id,
            &body,
        )
        .await;
    after_action(&slug, order_id, result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_addresses_are_not_found() {
        assert!(matches!(
            address("Not A Slug", "7d6f2a64-3a0e-4c55-9a57-0d7f1f0c2b11"),
            Err(PublicError::NotFound)
        ));
        assert!(matches!(
            address("sunny", "42"),
            Err(PublicError::NotFound)
        ));
        assert!(address("sunny", "7d6f2a64-3a0e-4c55-9a57-0d7f1f0c2b11").is_ok());
    }

    #[test]
    fn test_public_errors_render_generic_pages() {
        let not_found = PublicError::NotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let failed = PublicError::Failed.into_response();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_ignored_actions_redirect_to_page() {
        let slug = Slug::parse("sunny").unwrap();
        let order_id = OrderId::generate();
        let redirect = after_action::<()>(&slug, order_id, Err(WorkflowError::UndoExpired))
            .unwrap()
            .into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers()["location"],
            format!("/p/sunny/{order_id}").as_str()
        );
    }

    #[test]
    fn test_comment_view_author() {
        let comment = Comment {
            id: simpler_proofs_core::CommentId::generate(),
            proof_id: simpler_proofs_core::ProofId::generate(),
            is_customer: true,
            user_id: None,
            content: "Can the logo be bigger?".to_owned(),
            created_at: chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 3, 14, 15, 5, 0).unwrap(),
        };
        let view = CommentView::new(&comment, "Sunny Prints");
        assert_eq!(view.author, "You");
        assert_eq!(view.posted, "Mar 14, 2026 3:05 PM UTC");
    }
}
