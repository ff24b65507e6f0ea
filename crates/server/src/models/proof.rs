//! Proof revisions and their comments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use simpler_proofs_core::{CommentId, Email, OrderId, OrderStatus, ProofId, ProofStatus, UserId};

use super::ValidationError;

/// One uploaded proof revision.
///
/// The file itself lives in external object storage; `file_url` is the
/// reference handed back by the upload widget.
#[derive(Debug, Clone, Serialize)]
pub struct Proof {
    pub id: ProofId,
    pub order_id: OrderId,
    pub file_url: String,
    pub status: ProofStatus,
    /// Set while approved; cleared by an undo.
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proof {
    /// PDFs are embedded; everything else is shown as an image.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        is_pdf(&self.file_url)
    }
}

#[must_use]
pub fn is_pdf(file_url: &str) -> bool {
    let path = file_url.split(['?', '#']).next().unwrap_or(file_url);
    path.to_ascii_lowercase().ends_with(".pdf")
}

/// Validate a proof file reference.
///
/// # Errors
///
/// Returns a [`ValidationError`] for blank references or anything that is not
/// an absolute http(s) URL or a storage path.
pub fn validate_file_url(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new("file_url", "cannot be empty"));
    }
    if value.contains("://") {
        let url = url::Url::parse(value)
            .map_err(|e| ValidationError::new("file_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::new("file_url", "must use http or https"));
        }
    } else if value.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("file_url", "cannot contain whitespace"));
    }
    Ok(value.to_owned())
}

/// A comment on a proof. Immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub proof_id: ProofId,
    pub is_customer: bool,
    /// Seller author; `None` for customers.
    pub user_id: Option<UserId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A proof with its comments, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ProofWithComments {
    #[serde(flatten)]
    pub proof: Proof,
    pub comments: Vec<Comment>,
}

/// A proof in the store-wide history, with the order it was made for.
#[derive(Debug, Clone, Serialize)]
pub struct StoreProof {
    #[serde(flatten)]
    pub proof: Proof,
    pub order: ProofOrder,
    pub comments: Vec<Comment>,
}

/// The order fields shown next to a proof in the history.
#[derive(Debug, Clone, Serialize)]
pub struct ProofOrder {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Email,
    pub status: OrderStatus,
}

/// Validated comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    pub const MAX_LENGTH: usize = 2000;

    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the trimmed text is empty or too long.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let content = raw.trim();
        if content.is_empty() {
            return Err(ValidationError::new("content", "cannot be empty"));
        }
        if content.chars().count() > Self::MAX_LENGTH {
            return Err(ValidationError::new(
                "content",
                format!("must be at most {} characters", Self::MAX_LENGTH),
            ));
        }
        Ok(Self(content.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf("https://files.test/proofs/mug.PDF"));
        assert!(is_pdf("https://files.test/proofs/mug.pdf?token=abc"));
        assert!(!is_pdf("https://files.test/proofs/mug.png"));
        assert!(!is_pdf("https://files.test/pdf/mug.png"));
    }

    #[test]
    fn test_file_url_validation() {
        assert!(validate_file_url("https://files.test/proofs/1.png").is_ok());
        assert!(validate_file_url("proofs/store-1/1.png").is_ok());
        assert!(validate_file_url("  ").is_err());
        assert!(validate_file_url("javascript://alert(1)").is_err());
        assert!(validate_file_url("proofs/my file.png").is_err());
    }

    #[test]
    fn test_comment_body() {
        assert_eq!(CommentBody::parse("  Looks great ").unwrap().as_str(), "Looks great");
        assert!(CommentBody::parse("   ").is_err());
        assert!(CommentBody::parse(&"x".repeat(2001)).is_err());
    }
}
