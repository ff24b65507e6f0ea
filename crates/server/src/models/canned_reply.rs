//! Reusable comment snippets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simpler_proofs_core::{CannedReplyId, StoreId};

use super::{ValidationError, require_min_chars};

#[derive(Debug, Clone, Serialize)]
pub struct CannedReply {
    pub id: CannedReplyId,
    pub store_id: StoreId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCannedReply {
    pub title: String,
    pub content: String,
}

impl NewCannedReply {
    /// # Errors
    ///
    /// Returns the first blank field.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: require_min_chars("title", &self.title, 1)?,
            content: require_min_chars("content", &self.content, 1)?,
        })
    }
}
