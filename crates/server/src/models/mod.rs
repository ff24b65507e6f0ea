//! Domain models for the proof service.
//!
//! Repositories in [`crate::db`] convert database rows into these types;
//! handlers serialize them straight to JSON.

pub mod artist;
pub mod canned_reply;
pub mod integration;
pub mod onboarding;
pub mod order;
pub mod proof;
pub mod settings;
pub mod store;

pub use artist::{Artist, NewArtist};
pub use canned_reply::{CannedReply, NewCannedReply};
pub use integration::{
    Integration, IntegrationConfig, IntegrationInput, IntegrationKind, IntegrationView,
};
pub use onboarding::{OnboardingRequest, ValidOnboarding};
pub use order::{NewOrder, Order, OrderCounts, ValidNewOrder};
pub use proof::{Comment, CommentBody, Proof, ProofOrder, ProofWithComments, StoreProof};
pub use settings::{EmailSettingsUpdate, ProofPageSettingsUpdate, StoreSettings, StoredSettings};
pub use store::{DEFAULT_ACCENT_COLOR, Store, StoreUpdate, ValidStoreUpdate, proof_link};

/// A request field that failed write-time validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim `value` and require at least `min` characters.
pub(crate) fn require_min_chars(
    field: &'static str,
    value: &str,
    min: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional free-text field, turning blanks into `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_min_chars_trims() {
        assert_eq!(require_min_chars("subject", "  Proof ", 4).unwrap(), "Proof");
        let err = require_min_chars("subject", "  Hi  ", 4).unwrap_err();
        assert_eq!(err.to_string(), "subject: must be at least 4 characters");
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" rush ")), Some("rush".to_owned()));
        assert_eq!(optional_text(None), None);
    }
}
