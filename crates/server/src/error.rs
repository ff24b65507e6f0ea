//! Unified error handling for the seller API.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured to
//! Sentry before responding; their details never reach the client. Upstream
//! email provider failures are the exception: the seller sees the provider's
//! message verbatim.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use simpler_proofs_core::{TransitionError, UserId};

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::{MailError, WorkflowError};

/// Application-level error type for the seller API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// The email provider refused or could not be reached.
    #[error("{0}")]
    Mail(#[from] MailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A request field failed validation.
    #[error("Invalid {}: {}", .0.field, .0.message)]
    Validation(#[from] ValidationError),

    /// The request conflicts with the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound => Self::NotFound("order".to_owned()),
            WorkflowError::Transition(e @ TransitionError::NotPermitted { .. }) => {
                Self::Forbidden(e.to_string())
            }
            WorkflowError::Transition(e) => Self::Conflict(e.to_string()),
            e @ (WorkflowError::UndoDisabled
            | WorkflowError::UndoExpired
            | WorkflowError::CommentsClosed
            | WorkflowError::Conflict) => Self::Conflict(e.to_string()),
            WorkflowError::Delivery(e) => Self::Mail(e),
            WorkflowError::Repository(e) => e.into(),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_) | Self::Mail(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Seller request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let mut body = json!({ "error": message });
        if let Self::Validation(e) = &self {
            body["field"] = json!(e.field);
        }

        (self.status(), Json(body)).into_response()
    }
}

/// Set the Sentry user context from the seller's identity.
pub fn set_sentry_user(user_id: UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use simpler_proofs_core::{Action, ProofStatus};

    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");

        let err = AppError::Mail(MailError::Provider {
            status: 422,
            message: "The to address is invalid".to_string(),
        });
        assert_eq!(err.to_string(), "The to address is invalid");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ValidationError::new("name", "too short")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_statuses() {
        assert_eq!(get_status(RepositoryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(RepositoryError::Conflict("slug is already taken".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_workflow_errors_map_to_statuses() {
        assert_eq!(get_status(WorkflowError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(WorkflowError::Transition(TransitionError::NotPermitted {
                action: Action::Approve,
                actor: "seller",
            })),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(WorkflowError::Transition(TransitionError::AlreadyDecided(
                ProofStatus::Approved
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(get_status(WorkflowError::UndoExpired), StatusCode::CONFLICT);
        assert_eq!(get_status(WorkflowError::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            get_status(WorkflowError::Delivery(MailError::Config("no key".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }
}
