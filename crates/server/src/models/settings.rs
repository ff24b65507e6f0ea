//! Per-store settings with defaults.
//!
//! A store has at most one settings row and every column is nullable; a
//! missing row or a `NULL` column falls back to the defaults below.

use serde::{Deserialize, Serialize};

use simpler_proofs_core::UndoWindow;

use super::{ValidationError, optional_text, require_min_chars};

pub const DEFAULT_EMAIL_SUBJECT: &str = "Your proof is ready for review";
pub const DEFAULT_EMAIL_TEMPLATE: &str = "<p>Hello {{customer_name}},</p><p>Your proof is ready for review. Please click the button below to view and approve your proof or request changes.</p><p>Thank you for your business!</p>";
pub const DEFAULT_INSTRUCTIONS: &str =
    "Please review your proof carefully. Once approved, we'll begin production.";
pub const DEFAULT_THANKS_MESSAGE: &str =
    "Thank you for approving your proof! We'll begin production right away.";
pub const DEFAULT_REVISION_MESSAGE: &str = "We've received your revision request. We'll get to work on the changes and send you an updated proof soon.";
pub const DEFAULT_TIMER_HOURS: i32 = 24;

/// Settings as stored: `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSettings {
    pub email_template: Option<String>,
    pub email_subject: Option<String>,
    pub email_sender_name: Option<String>,
    pub email_banner_url: Option<String>,
    pub proof_page_instructions: Option<String>,
    pub thanks_message: Option<String>,
    pub revision_message: Option<String>,
    pub show_timer: Option<bool>,
    pub timer_duration: Option<i32>,
    pub show_logo: Option<bool>,
    pub enable_undo_approval: Option<bool>,
    pub undo_approval_time: Option<i32>,
}

/// Effective settings for a store, defaults applied.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoreSettings {
    pub email_template: String,
    pub email_subject: String,
    /// Defaults to the store name.
    pub email_sender_name: String,
    pub email_banner_url: Option<String>,
    pub proof_page_instructions: String,
    pub thanks_message: String,
    pub revision_message: String,
    pub show_timer: bool,
    /// Hours.
    pub timer_duration: i32,
    pub show_logo: bool,
    pub enable_undo_approval: bool,
    /// Minutes.
    pub undo_approval_time: u32,
}

impl StoreSettings {
    /// Resolve stored values against the defaults.
    #[must_use]
    pub fn resolve(stored: Option<StoredSettings>, store_name: &str) -> Self {
        let s = stored.unwrap_or_default();
        let undo_minutes = s
            .undo_approval_time
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(UndoWindow::DEFAULT_MINUTES);

        Self {
            email_template: s
                .email_template
                .unwrap_or_else(|| DEFAULT_EMAIL_TEMPLATE.to_owned()),
            email_subject: s
                .email_subject
                .unwrap_or_else(|| DEFAULT_EMAIL_SUBJECT.to_owned()),
            email_sender_name: s
                .email_sender_name
                .unwrap_or_else(|| store_name.to_owned()),
            email_banner_url: s.email_banner_url,
            proof_page_instructions: s
                .proof_page_instructions
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_owned()),
            thanks_message: s
                .thanks_message
                .unwrap_or_else(|| DEFAULT_THANKS_MESSAGE.to_owned()),
            revision_message: s
                .revision_message
                .unwrap_or_else(|| DEFAULT_REVISION_MESSAGE.to_owned()),
            show_timer: s.show_timer.unwrap_or(false),
            timer_duration: s.timer_duration.unwrap_or(DEFAULT_TIMER_HOURS),
            show_logo: s.show_logo.unwrap_or(true),
            enable_undo_approval: s.enable_undo_approval.unwrap_or(false),
            undo_approval_time: UndoWindow::from_minutes(undo_minutes).minutes(),
        }
    }

    /// The undo window, or `None` when undo is switched off.
    #[must_use]
    pub fn undo_window(&self) -> Option<UndoWindow> {
        self.enable_undo_approval
            .then(|| UndoWindow::from_minutes(self.undo_approval_time))
    }
}

/// Body of `PUT /api/settings/proof-page`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofPageSettingsUpdate {
    pub proof_page_instructions: String,
    pub thanks_message: String,
    pub revision_message: String,
    pub show_timer: bool,
    pub timer_duration: i32,
    pub show_logo: bool,
    pub enable_undo_approval: bool,
    pub undo_approval_time: i32,
}

impl ProofPageSettingsUpdate {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        if self.timer_duration < 1 {
            return Err(ValidationError::new(
                "timer_duration",
                "must be at least 1 hour",
            ));
        }
        let undo_range = i64::from(UndoWindow::MIN_MINUTES)..=i64::from(UndoWindow::MAX_MINUTES);
        if !undo_range.contains(&i64::from(self.undo_approval_time)) {
            return Err(ValidationError::new(
                "undo_approval_time",
                format!(
                    "must be between {} and {} minutes",
                    UndoWindow::MIN_MINUTES,
                    UndoWindow::MAX_MINUTES
                ),
            ));
        }

        Ok(Self {
            proof_page_instructions: require_min_chars(
                "proof_page_instructions",
                &self.proof_page_instructions,
                10,
            )?,
            thanks_message: require_min_chars("thanks_message", &self.thanks_message, 10)?,
            revision_message: require_min_chars("revision_message", &self.revision_message, 10)?,
            ..self.clone()
        })
    }
}

/// Body of `PUT /api/settings/email`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettingsUpdate {
    pub email_sender_name: String,
    pub email_subject: String,
    pub email_template: String,
    #[serde(default)]
    pub email_banner_url: Option<String>,
}

impl EmailSettingsUpdate {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            email_sender_name: require_min_chars("email_sender_name", &self.email_sender_name, 2)?,
            email_subject: require_min_chars("email_subject", &self.email_subject, 4)?,
            email_template: require_min_chars("email_template", &self.email_template, 10)?,
            email_banner_url: optional_text(self.email_banner_url.as_deref()),
        })
    }
}
