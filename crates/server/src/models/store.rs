//! Store (tenant) types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simpler_proofs_core::{OrderId, Slug, StoreId, UserId};

use super::{ValidationError, optional_text, require_min_chars};

/// Accent color used when a store has not picked one.
pub const DEFAULT_ACCENT_COLOR: &str = "#0f172a";

/// A seller's store. Every other record hangs off one.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    /// Owning identity-provider user.
    pub user_id: UserId,
    pub name: String,
    pub slug: Slug,
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Public approval link for one of this store's orders.
    #[must_use]
    pub fn proof_link(&self, base_url: &str, order_id: OrderId) -> String {
        proof_link(base_url, &self.slug, order_id)
    }

    #[must_use]
    pub fn accent_color_or_default(&self) -> &str {
        self.accent_color.as_deref().unwrap_or(DEFAULT_ACCENT_COLOR)
    }
}

/// `{base_url}/p/{slug}/{order_id}`.
#[must_use]
pub fn proof_link(base_url: &str, slug: &Slug, order_id: OrderId) -> String {
    format!("{}/p/{slug}/{order_id}", base_url.trim_end_matches('/'))
}

/// Partial update from the general settings page.
///
/// Absent fields are left alone. `logo_url`/`accent_color` set to an empty
/// string are cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
}

/// A [`StoreUpdate`] that passed validation.
#[derive(Debug, Clone, Default)]
pub struct ValidStoreUpdate {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub logo_url: Option<Option<String>>,
    pub accent_color: Option<Option<String>>,
}

impl StoreUpdate {
    /// Validate every present field.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<ValidStoreUpdate, ValidationError> {
        let name = self
            .name
            .as_deref()
            .map(|n| require_min_chars("name", n, 2))
            .transpose()?;
        let slug = self
            .slug
            .as_deref()
            .map(|s| Slug::parse(s.trim()).map_err(|e| ValidationError::new("slug", e.to_string())))
            .transpose()?;
        let accent_color = self
            .accent_color
            .as_deref()
            .map(|c| {
                optional_text(Some(c))
                    .map(|c| validate_accent_color(&c).map(|()| c))
                    .transpose()
            })
            .transpose()?;
        let logo_url = self.logo_url.as_deref().map(|u| optional_text(Some(u)));

        Ok(ValidStoreUpdate {
            name,
            slug,
            logo_url,
            accent_color,
        })
    }
}

/// Accept `#rgb` or `#rrggbb`.
///
/// # Errors
///
/// Returns a [`ValidationError`] for anything else.
pub fn validate_accent_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "accent_color",
            "must be a hex color like #0f172a",
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_link_shape() {
        let slug = Slug::parse("sunny-prints").unwrap();
        let order: OrderId = "3f2a9c1e-0000-4000-8000-000000000000".parse().unwrap();
        assert_eq!(
            proof_link("https://app.simplerproofs.com/", &slug, order),
            "https://app.simplerproofs.com/p/sunny-prints/3f2a9c1e-0000-4000-8000-000000000000"
        );
    }

    #[test]
    fn test_accent_color() {
        assert!(validate_accent_color("#0f172a").is_ok());
        assert!(validate_accent_color("#FFF").is_ok());
        assert!(validate_accent_color("0f172a").is_err());
        assert!(validate_accent_color("#12345").is_err());
        assert!(validate_accent_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_store_update_validation() {
        let update = StoreUpdate {
            name: Some(" Sunny Prints ".into()),
            slug: Some("sunny-prints".into()),
            logo_url: Some(String::new()),
            accent_color: Some("#ff0000".into()),
        };
        let valid = update.validate().unwrap();
        assert_eq!(valid.name.as_deref(), Some("Sunny Prints"));
        assert_eq!(valid.slug.unwrap().as_str(), "sunny-prints");
        assert_eq!(valid.logo_url, Some(None));
        assert_eq!(valid.accent_color, Some(Some("#ff0000".into())));

        let bad = StoreUpdate {
            slug: Some("Sunny Prints".into()),
            ..StoreUpdate::default()
        };
        assert_eq!(bad.validate().unwrap_err().field, "slug");
    }
}
