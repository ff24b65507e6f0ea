//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `BASE_URL` - Public root used to build proof links (e.g. `https://app.simplerproofs.com`)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `IDENTITY_USER_HEADER` - Header carrying the authenticated user id (default: `x-auth-user-id`)
//! - `IDENTITY_EMAIL_HEADER` - Header carrying the authenticated email (default: `x-auth-user-email`)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Email
//! - `EMAIL_PROVIDER` - `resend` (default) or `smtp`
//! - `RESEND_API_KEY` - Required for `resend`
//! - `RESEND_FROM_EMAIL` - Sender address (default: proofs@simplerproofs.com)
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` - Required for `smtp`
//! - `SMTP_PORT` - SMTP port (default: 587)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_FROM_EMAIL: &str = "proofs@simplerproofs.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    pub identity: IdentityConfig,
    pub email: EmailConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Names of the headers the fronting identity provider sets on seller requests.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub user_header: String,
    pub email_header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_header: "x-auth-user-id".to_owned(),
            email_header: "x-auth-user-email".to_owned(),
        }
    }
}

/// Outbound email provider.
#[derive(Debug, Clone)]
pub enum EmailConfig {
    Resend(ResendConfig),
    Smtp(SmtpConfig),
}

/// Resend transactional email API.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url(&get_required_env("BASE_URL")?)?;

        let defaults = IdentityConfig::default();
        let identity = IdentityConfig {
            user_header: get_env_or_default("IDENTITY_USER_HEADER", &defaults.user_header)
                .to_ascii_lowercase(),
            email_header: get_env_or_default("IDENTITY_EMAIL_HEADER", &defaults.email_header)
                .to_ascii_lowercase(),
        };

        let email = EmailConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            identity,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("EMAIL_PROVIDER", "resend")
            .to_ascii_lowercase()
            .as_str()
        {
            "resend" => Ok(Self::Resend(ResendConfig {
                api_key: get_validated_secret("RESEND_API_KEY")?,
                from_address: get_env_or_default("RESEND_FROM_EMAIL", DEFAULT_FROM_EMAIL),
            })),
            "smtp" => {
                let port = get_env_or_default("SMTP_PORT", "587")
                    .parse::<u16>()
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string())
                    })?;
                Ok(Self::Smtp(SmtpConfig {
                    host: get_required_env("SMTP_HOST")?,
                    port,
                    username: get_required_env("SMTP_USERNAME")?,
                    password: get_validated_secret("SMTP_PASSWORD")?,
                    from_address: get_required_env("SMTP_FROM")?,
                }))
            }
            other => Err(ConfigError::InvalidEnvVar(
                "EMAIL_PROVIDER".to_string(),
                format!("unknown provider '{other}' (expected resend or smtp)"),
            )),
        }
    }

    /// The sender address used on every outbound email.
    #[must_use]
    pub fn from_address(&self) -> &str {
        match self {
            Self::Resend(c) => &c.from_address,
            Self::Smtp(c) => &c.from_address,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Validate the public base URL and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "BASE_URL".to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_owned())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let err = validate_secret_strength("re_your-api-key", "RESEND_API_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "SMTP_PASSWORD").is_err());
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "RESEND_API_KEY").is_err());
    }

    #[test]
    fn test_realistic_secret_accepted() {
        assert!(validate_secret_strength("re_Zq8mK2nL5pQ7rT0uW4zC6aB3", "RESEND_API_KEY").is_ok());
    }

    #[test]
    fn test_base_url_normalized() {
        assert_eq!(
            parse_base_url("https://app.simplerproofs.com/").unwrap(),
            "https://app.simplerproofs.com"
        );
        assert!(parse_base_url("app.simplerproofs.com").is_err());
        assert!(parse_base_url("ftp://app.simplerproofs.com").is_err());
    }

    #[test]
    fn test_resend_config_debug_redacts_key() {
        let config = ResendConfig {
            api_key: SecretString::from("re_super_secret_resend_key"),
            from_address: "proofs@simplerproofs.com".to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("proofs@simplerproofs.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("re_super_secret_resend_key"));
    }

    #[test]
    fn test_smtp_config_debug_redacts_password() {
        let config = SmtpConfig {
            host: "smtp.mailhost.test".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: SecretString::from("super_secret_smtp_password"),
            from_address: "proofs@simplerproofs.com".to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.mailhost.test"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/proofs"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            identity: IdentityConfig::default(),
            email: EmailConfig::Resend(ResendConfig {
                api_key: SecretString::from("re_Zq8mK2nL5pQ7rT0uW4zC6aB3"),
                from_address: DEFAULT_FROM_EMAIL.to_string(),
            }),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };
        assert_eq!(config.socket_addr().port(), 3000);
        assert_eq!(config.email.from_address(), "proofs@simplerproofs.com");
    }
}
