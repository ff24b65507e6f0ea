//! Outbound email delivery.
//!
//! Two providers are supported:
//! - **Resend** (default): `POST https://api.resend.com/emails` with a bearer key.
//! - **SMTP**: STARTTLS relay via lettre.
//!
//! Provider error messages are kept verbatim in [`MailError`] so the seller
//! sees exactly what the provider said.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use simpler_proofs_core::Email;

use crate::config::{EmailConfig, ResendConfig, SmtpConfig};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// The provider rejected the message. `message` is the provider's own text.
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// HTTP request to the provider failed.
    #[error("email provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("invalid email configuration: {0}")]
    Config(String),
}

/// A rendered email ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Email,
    pub to_name: String,
    pub subject: String,
    pub html: String,
    /// Display name on the `From` header.
    pub sender_name: String,
    pub reply_to: Option<Email>,
}

/// Provider acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub message_id: Option<String>,
}

/// Delivers proof-ready emails.
#[async_trait]
pub trait ProofNotifier: Send + Sync {
    /// Hand one email to the provider.
    async fn deliver(&self, email: &OutboundEmail) -> Result<Delivery, MailError>;
}

/// The configured provider.
#[derive(Clone)]
pub enum Mailer {
    Resend(ResendMailer),
    Smtp(SmtpMailer),
}

impl Mailer {
    /// Build the provider selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the HTTP client or SMTP transport cannot be built.
    pub fn from_config(config: &EmailConfig) -> Result<Self, MailError> {
        match config {
            EmailConfig::Resend(c) => ResendMailer::new(c).map(Self::Resend),
            EmailConfig::Smtp(c) => SmtpMailer::new(c).map(Self::Smtp),
        }
    }
}

#[async_trait]
impl ProofNotifier for Mailer {
    async fn deliver(&self, email: &OutboundEmail) -> Result<Delivery, MailError> {
        let delivery = match self {
            Self::Resend(m) => m.send(email).await,
            Self::Smtp(m) => m.send(email).await,
        }?;
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            message_id = delivery.message_id.as_deref().unwrap_or(""),
            "Email sent"
        );
        Ok(delivery)
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resend(m) => f
                .debug_struct("Mailer::Resend")
                .field("from_address", &m.inner.from_address)
                .finish_non_exhaustive(),
            Self::Smtp(m) => f
                .debug_struct("Mailer::Smtp")
                .field("from_address", &m.from_address)
                .finish_non_exhaustive(),
        }
    }
}

/// Format `Name <address>` for a `From` header.
fn from_header(sender_name: &str, address: &str) -> String {
    let name = sender_name.replace(['"', '<', '>', '\r', '\n'], "");
    let name = name.trim();
    if name.is_empty() {
        address.to_owned()
    } else {
        format!("{name} <{address}>")
    }
}

// =============================================================================
// Resend
// =============================================================================

#[derive(Clone)]
pub struct ResendMailer {
    inner: Arc<ResendMailerInner>,
}

struct ResendMailerInner {
    client: reqwest::Client,
    from_address: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    message: Option<String>,
}

impl ResendMailer {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ResendConfig) -> Result<Self, MailError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| MailError::Config(format!("invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(ResendMailerInner {
                client,
                from_address: config.from_address.clone(),
            }),
        })
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailError> {
        let body = ResendRequest {
            from: from_header(&email.sender_name, &self.inner.from_address),
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_ref().map(Email::as_str),
        };

        let response = self
            .inner
            .client
            .post(RESEND_API_URL)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            // Accepted is accepted; an unreadable body only loses the id.
            let text = response.text().await.unwrap_or_default();
            return Ok(accepted(&text));
        }

        let text = response.text().await.unwrap_or_default();
        Err(provider_error(status.as_u16(), &text))
    }
}

fn accepted(body: &str) -> Delivery {
    let message_id = serde_json::from_str::<ResendResponse>(body)
        .ok()
        .and_then(|r| r.id);
    if message_id.is_none() {
        tracing::warn!("Email accepted without a readable message id");
    }
    Delivery { message_id }
}

/// Pull the provider's `message` out of an error body, falling back to the raw text.
fn provider_error(status: u16, body: &str) -> MailError {
    let message = serde_json::from_str::<ResendErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Failed to send email".to_owned()
            } else {
                body.trim().to_owned()
            }
        });
    MailError::Provider { status, message }
}

// =============================================================================
// SMTP
// =============================================================================

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailError> {
        let from = from_header(&email.sender_name, &self.from_address);
        let mut builder = Message::builder()
            .from(parse_mailbox(&from)?)
            .to(parse_mailbox(email.to.as_str())?)
            .subject(email.subject.as_str());
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to.as_str())?);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())?;

        let response = self.transport.send(message).await?;
        Ok(Delivery {
            message_id: response.message().next().map(str::to_owned),
        })
    }
}

fn parse_mailbox(value: &str) -> Result<Mailbox, MailError> {
    value
        .parse()
        .map_err(|_| MailError::InvalidAddress(value.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_body_without_id_is_still_delivered() {
        assert_eq!(
            accepted(r#"{"id":"49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#).message_id.as_deref(),
            Some("49a3999c-0ce1-4ea6-ab68-afcd6dc2e794")
        );
        assert_eq!(accepted("").message_id, None);
        assert_eq!(accepted("<html>ok</html>").message_id, None);
    }

    #[test]
    fn test_from_header() {
        assert_eq!(
            from_header("Sunny Prints", "proofs@simplerproofs.com"),
            "Sunny Prints <proofs@simplerproofs.com>"
        );
        assert_eq!(
            from_header("  ", "proofs@simplerproofs.com"),
            "proofs@simplerproofs.com"
        );
        assert_eq!(
            from_header("Evil\r\nBcc: x", "proofs@simplerproofs.com"),
            "EvilBcc: x <proofs@simplerproofs.com>"
        );
    }

    #[test]
    fn test_provider_error_keeps_message_verbatim() {
        let err = provider_error(
            422,
            r#"{"statusCode":422,"name":"validation_error","message":"The `to` field is invalid."}"#,
        );
        assert_eq!(err.to_string(), "The `to` field is invalid.");
        assert!(matches!(err, MailError::Provider { status: 422, .. }));
    }

    #[test]
    fn test_provider_error_falls_back_to_body() {
        assert_eq!(provider_error(500, "upstream timeout").to_string(), "upstream timeout");
        assert_eq!(provider_error(500, "").to_string(), "Failed to send email");
    }

    #[test]
    fn test_resend_request_shape() {
        let to = Email::parse("jane@shop.test").unwrap();
        let body = ResendRequest {
            from: from_header("Sunny Prints", "proofs@simplerproofs.com"),
            to: [to.as_str()],
            subject: "Your proof is ready for review",
            html: "<p>Hi</p>",
            reply_to: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0], "jane@shop.test");
        assert_eq!(json["from"], "Sunny Prints <proofs@simplerproofs.com>");
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn test_smtp_mailbox_parsing() {
        assert!(parse_mailbox("Sunny Prints <proofs@simplerproofs.com>").is_ok());
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(MailError::InvalidAddress(_))
        ));
    }
}
