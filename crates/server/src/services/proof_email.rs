//! Proof-ready email content.
//!
//! The seller's template is plain HTML with three placeholders:
//! `{{customer_name}}`, `{{order_id}}` and `{{proof_link}}`. Assembly is:
//!
//! 1. replace every placeholder in one left-to-right pass, so substituted
//!    values are never scanned for placeholders again,
//! 2. prepend the banner image when one is configured,
//! 3. append a "View and Approve Proof" button unless the template already
//!    links to the proof (`href="<link>"`),
//! 4. append the footer.
//!
//! The result always contains a working link to the approval page.

use std::fmt::Write as _;

pub const CUSTOMER_NAME: &str = "{{customer_name}}";
pub const ORDER_ID: &str = "{{order_id}}";
pub const PROOF_LINK: &str = "{{proof_link}}";

/// Values for one proof-ready email.
#[derive(Debug, Clone, Copy)]
pub struct ProofEmailContent<'a> {
    pub template: &'a str,
    pub customer_name: &'a str,
    /// Human order number, see [`crate::models::order::display_number`].
    pub order_number: &'a str,
    pub proof_link: &'a str,
    pub banner_url: Option<&'a str>,
    pub sender_name: Option<&'a str>,
}

/// Build the HTML body.
#[must_use]
pub fn compose_html(content: &ProofEmailContent<'_>) -> String {
    let mut html = substitute(content);

    let sender = content
        .sender_name
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(banner) = content.banner_url.map(str::trim).filter(|b| !b.is_empty()) {
        html = format!(
            r#"<img src="{}" alt="{}" style="max-width: 100%; margin-bottom: 20px;" />{html}"#,
            escape_html(banner),
            escape_html(sender.unwrap_or("Proof")),
        );
    }

    if !html.contains(&format!(r#"href="{}""#, content.proof_link)) {
        let _ = write!(
            html,
            r#"
<div style="text-align: center; margin: 30px 0;">
  <a href="{link}" style="background-color: #0f172a; color: white; padding: 12px 20px; text-decoration: none; border-radius: 4px; font-weight: bold;">View and Approve Proof</a>
</div>"#,
            link = content.proof_link,
        );
    }

    let _ = write!(
        html,
        r#"
<div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eaeaea; font-size: 12px; color: #666;">
  <p>This email was sent by {} using Simpler Proofs.</p>
</div>"#,
        escape_html(sender.unwrap_or("your seller")),
    );

    html
}

/// Replace placeholders in a single scan of the template.
fn substitute(content: &ProofEmailContent<'_>) -> String {
    let customer_name = escape_html(content.customer_name);
    let order_number = escape_html(content.order_number);
    let values = [
        (CUSTOMER_NAME, customer_name.as_str()),
        (ORDER_ID, order_number.as_str()),
        (PROOF_LINK, content.proof_link),
    ];

    let mut out = String::with_capacity(content.template.len());
    let mut rest = content.template;
    while let Some(start) = rest.find("{{") {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = tail.get(key.len()..).unwrap_or_default();
            }
            None => {
                out.push_str("{{");
                rest = tail.get(2..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
