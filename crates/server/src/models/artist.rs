//! Team members that orders can be assigned to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simpler_proofs_core::{ArtistId, Email, StoreId};

use super::{ValidationError, require_min_chars};

#[derive(Debug, Clone, Serialize)]
pub struct Artist {
    pub id: ArtistId,
    pub store_id: StoreId,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// Body for creating or replacing an artist.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub email: String,
}

impl NewArtist {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<(String, Email), ValidationError> {
        let name = require_min_chars("name", &self.name, 1)?;
        let email =
            Email::parse(&self.email).map_err(|e| ValidationError::new("email", e.to_string()))?;
        Ok((name, email))
    }
}
