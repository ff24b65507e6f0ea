//! Sales-channel integration settings.
//!
//! Each integration type has its own config schema. Configs are validated
//! when written and stored as JSON tagged with their `type`. Nothing is
//! imported from these channels yet; the settings are kept for when it is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use simpler_proofs_core::{IntegrationId, StoreId};

use super::ValidationError;

/// Integration type, also the `{kind}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    Shopify,
    Etsy,
    Zapier,
}

impl IntegrationKind {
    pub const ALL: [Self; 3] = [Self::Shopify, Self::Etsy, Self::Zapier];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shopify => "shopify",
            Self::Etsy => "etsy",
            Self::Zapier => "zapier",
        }
    }
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IntegrationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown integration type: {s}"))
    }
}

/// Per-type configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrationConfig {
    Shopify { api_key: String, store_url: String },
    Etsy { api_key: String, store_id: String },
    Zapier {},
}

impl IntegrationConfig {
    #[must_use]
    pub const fn kind(&self) -> IntegrationKind {
        match self {
            Self::Shopify { .. } => IntegrationKind::Shopify,
            Self::Etsy { .. } => IntegrationKind::Etsy,
            Self::Zapier {} => IntegrationKind::Zapier,
        }
    }

    /// Check and normalize the config.
    ///
    /// Shopify store URLs may be given as a bare domain
    /// (`sunny.myshopify.com`); they are stored as `https://` origins.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        match self {
            Self::Shopify { api_key, store_url } => Ok(Self::Shopify {
                api_key: require_key(api_key)?,
                store_url: normalize_store_url(store_url)?,
            }),
            Self::Etsy { api_key, store_id } => {
                let store_id = store_id.trim();
                if store_id.is_empty() {
                    return Err(ValidationError::new("store_id", "cannot be empty"));
                }
                Ok(Self::Etsy {
                    api_key: require_key(api_key)?,
                    store_id: store_id.to_owned(),
                })
            }
            Self::Zapier {} => Ok(Self::Zapier {}),
        }
    }

    /// Copy with API keys masked to their last four characters.
    #[must_use]
    pub fn redacted(&self) -> Self {
        match self {
            Self::Shopify { api_key, store_url } => Self::Shopify {
                api_key: mask(api_key),
                store_url: store_url.clone(),
            },
            Self::Etsy { api_key, store_id } => Self::Etsy {
                api_key: mask(api_key),
                store_id: store_id.clone(),
            },
            Self::Zapier {} => Self::Zapier {},
        }
    }
}

fn require_key(api_key: &str) -> Result<String, ValidationError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ValidationError::new("api_key", "cannot be empty"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("api_key", "cannot contain whitespace"));
    }
    Ok(key.to_owned())
}

fn normalize_store_url(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| ValidationError::new("store_url", format!("invalid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new("store_url", "must use http or https"));
    }
    let host = url
        .host_str()
        .filter(|h| h.contains('.'))
        .ok_or_else(|| ValidationError::new("store_url", "must include a domain"))?;
    Ok(format!("https://{host}"))
}

fn mask(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

/// A stored integration.
#[derive(Debug, Clone)]
pub struct Integration {
    pub id: IntegrationId,
    pub store_id: StoreId,
    pub enabled: bool,
    pub config: IntegrationConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the API returns: the integration with secrets masked.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationView {
    pub id: IntegrationId,
    pub enabled: bool,
    pub config: IntegrationConfig,
    pub updated_at: DateTime<Utc>,
}

impl From<&Integration> for IntegrationView {
    fn from(integration: &Integration) -> Self {
        Self {
            id: integration.id,
            enabled: integration.enabled,
            config: integration.config.redacted(),
            updated_at: integration.updated_at,
        }
    }
}

/// Body of `PUT /api/integrations/{kind}` and an onboarding entry.
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationInput {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub config: IntegrationConfig,
}

const fn default_enabled() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json_shape() {
        let config: IntegrationConfig = serde_json::from_str(
            r#"{"type":"shopify","api_key":"shpat_123","store_url":"sunny.myshopify.com"}"#,
        )
        .unwrap();
        assert_eq!(config.kind(), IntegrationKind::Shopify);

        let zapier: IntegrationConfig = serde_json::from_str(r#"{"type":"zapier"}"#).unwrap();
        assert_eq!(zapier, IntegrationConfig::Zapier {});

        assert!(serde_json::from_str::<IntegrationConfig>(r#"{"type":"ebay"}"#).is_err());
        assert!(
            serde_json::from_str::<IntegrationConfig>(r#"{"type":"etsy","api_key":"k"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_shopify_url_normalized() {
        let config = IntegrationConfig::Shopify {
            api_key: " shpat_123 ".into(),
            store_url: "sunny.myshopify.com".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(
            config,
            IntegrationConfig::Shopify {
                api_key: "shpat_123".into(),
                store_url: "https://sunny.myshopify.com".into(),
            }
        );
    }

    #[test]
    fn test_validation_failures() {
        let err = IntegrationConfig::Shopify {
            api_key: String::new(),
            store_url: "sunny.myshopify.com".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "api_key");

        let err = IntegrationConfig::Shopify {
            api_key: "shpat_123".into(),
            store_url: "not a url".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "store_url");

        let err = IntegrationConfig::Etsy {
            api_key: "etsy_key".into(),
            store_id: " ".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "store_id");
    }

    #[test]
    fn test_redacted() {
        let config = IntegrationConfig::Etsy {
            api_key: "etsy_secret_9876".into(),
            store_id: "4242".into(),
        };
        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(json.contains("****9876"));
        assert!(!json.contains("etsy_secret"));
    }

    #[test]
    fn test_input_flattens_config() {
        let input: IntegrationInput =
            serde_json::from_str(r#"{"type":"etsy","api_key":"k1","store_id":"s1"}"#).unwrap();
        assert!(input.enabled);
        assert_eq!(input.config.kind(), IntegrationKind::Etsy);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("zapier".parse::<IntegrationKind>().unwrap(), IntegrationKind::Zapier);
        assert!("Zapier".parse::<IntegrationKind>().is_err());
    }
}
