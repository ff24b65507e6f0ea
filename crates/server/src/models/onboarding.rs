//! The onboarding submission: store, email setup, team and integrations in
//! one request.

use serde::Deserialize;

use simpler_proofs_core::{Email, Slug};

use super::settings::DEFAULT_INSTRUCTIONS;
use super::store::validate_accent_color;
use super::{
    EmailSettingsUpdate, IntegrationConfig, IntegrationInput, NewArtist, StoredSettings,
    ValidationError, optional_text, require_min_chars,
};

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub name: String,
    /// Generated from `name` when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub email: Option<EmailSettingsUpdate>,
    #[serde(default)]
    pub team: Vec<NewArtist>,
    #[serde(default)]
    pub integrations: Vec<IntegrationInput>,
}

/// An [`OnboardingRequest`] that passed validation.
#[derive(Debug, Clone)]
pub struct ValidOnboarding {
    pub name: String,
    pub slug: Slug,
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
    pub settings: StoredSettings,
    pub artists: Vec<(String, Email)>,
    pub integrations: Vec<(bool, IntegrationConfig)>,
}

impl OnboardingRequest {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<ValidOnboarding, ValidationError> {
        let name = require_min_chars("name", &self.name, 2)?;
        let slug = match optional_text(self.slug.as_deref()) {
            Some(s) => Slug::parse(&s),
            None => Slug::from_name(&name),
        }
        .map_err(|e| ValidationError::new("slug", e.to_string()))?;

        let accent_color = optional_text(self.accent_color.as_deref());
        if let Some(color) = &accent_color {
            validate_accent_color(color)?;
        }

        let mut settings = StoredSettings {
            proof_page_instructions: Some(DEFAULT_INSTRUCTIONS.to_owned()),
            ..StoredSettings::default()
        };
        if let Some(email) = &self.email {
            let email = email.validate()?;
            settings.email_sender_name = Some(email.email_sender_name);
            settings.email_subject = Some(email.email_subject);
            settings.email_template = Some(email.email_template);
            settings.email_banner_url = email.email_banner_url;
        }

        let artists = self
            .team
            .iter()
            .map(NewArtist::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let mut integrations = Vec::with_capacity(self.integrations.len());
        for input in &self.integrations {
            let config = input.config.validate()?;
            if integrations
                .iter()
                .any(|(_, c): &(bool, IntegrationConfig)| c.kind() == config.kind())
            {
                return Err(ValidationError::new(
                    "integrations",
                    format!("{} listed more than once", config.kind()),
                ));
            }
            integrations.push((input.enabled, config));
        }

        Ok(ValidOnboarding {
            name,
            slug,
            logo_url: optional_text(self.logo_url.as_deref()),
            accent_color,
            settings,
            artists,
            integrations,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: &str) -> OnboardingRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_minimal_request_generates_slug() {
        let valid = request(r#"{"name":"Sunny Prints & Co"}"#).validate().unwrap();
        assert_eq!(valid.slug.as_str(), "sunny-prints-co");
        assert_eq!(
            valid.settings.proof_page_instructions.as_deref(),
            Some(DEFAULT_INSTRUCTIONS)
        );
        assert!(valid.settings.email_subject.is_none());
        assert!(valid.artists.is_empty());
    }

    #[test]
    fn test_full_request() {
        let valid = request(
            r##"{
                "name": "Sunny Prints",
                "slug": "sunny",
                "accent_color": "#ff9900",
                "email": {
                    "email_sender_name": "Sunny",
                    "email_subject": "Your proof",
                    "email_template": "<p>Hi {{customer_name}}</p>"
                },
                "team": [{"name": "Ana", "email": "ana@studio.test"}],
                "integrations": [
                    {"type": "shopify", "api_key": "shpat_1", "store_url": "sunny.myshopify.com"},
                    {"type": "zapier", "enabled": false}
                ]
            }"##,
        )
        .validate()
        .unwrap();

        assert_eq!(valid.slug.as_str(), "sunny");
        assert_eq!(valid.settings.email_sender_name.as_deref(), Some("Sunny"));
        assert_eq!(valid.artists.len(), 1);
        assert_eq!(valid.integrations.len(), 2);
        assert!(!valid.integrations[1].0);
    }

    #[test]
    fn test_rejects_duplicate_integration_and_bad_color() {
        let dup = request(
            r#"{"name":"Sunny","integrations":[{"type":"zapier"},{"type":"zapier"}]}"#,
        );
        assert_eq!(dup.validate().unwrap_err().field, "integrations");

        let color = request(r#"{"name":"Sunny","accent_color":"orange"}"#);
        assert_eq!(color.validate().unwrap_err().field, "accent_color");

        let name = request(r#"{"name":"S"}"#);
        assert_eq!(name.validate().unwrap_err().field, "name");
    }
}
