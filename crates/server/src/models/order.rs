//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simpler_proofs_core::{ArtistId, Email, OrderId, OrderStatus, StoreId};

use super::{ValidationError, optional_text, require_min_chars};

/// A customer order awaiting (or past) proof approval.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    /// Order number in the seller's shop, when imported or typed in.
    pub external_id: Option<String>,
    pub customer_name: String,
    pub customer_email: Email,
    pub status: OrderStatus,
    pub artist_id: Option<ArtistId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Number shown to customers: the shop's order number, or `#` plus the
    /// first eight characters of the id.
    #[must_use]
    pub fn display_number(&self) -> String {
        display_number(self.external_id.as_deref(), self.id)
    }
}

#[must_use]
pub fn display_number(external_id: Option<&str>, id: OrderId) -> String {
    external_id
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map_or_else(|| format!("#{}", id.short()), str::to_owned)
}

/// Number of orders in each status, plus the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderCounts {
    pub awaiting_proof: i64,
    pub proof_sent: i64,
    pub approved: i64,
    pub changes_requested: i64,
    pub completed: i64,
    pub total: i64,
}

impl OrderCounts {
    /// Fold `(status, count)` groups; statuses with no orders stay at zero.
    #[must_use]
    pub fn from_groups(groups: impl IntoIterator<Item = (OrderStatus, i64)>) -> Self {
        let mut counts = Self::default();
        for (status, n) in groups {
            let slot = match status {
                OrderStatus::AwaitingProof => &mut counts.awaiting_proof,
                OrderStatus::ProofSent => &mut counts.proof_sent,
                OrderStatus::Approved => &mut counts.approved,
                OrderStatus::ChangesRequested => &mut counts.changes_requested,
                OrderStatus::Completed => &mut counts.completed,
            };
            *slot += n;
            counts.total += n;
        }
        counts
    }
}

/// Request body for creating an order by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub artist_id: Option<ArtistId>,
}

/// A [`NewOrder`] that passed validation.
#[derive(Debug, Clone)]
pub struct ValidNewOrder {
    pub customer_name: String,
    pub customer_email: Email,
    pub external_id: Option<String>,
    pub notes: Option<String>,
    pub artist_id: Option<ArtistId>,
}

impl NewOrder {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<ValidNewOrder, ValidationError> {
        Ok(ValidNewOrder {
            customer_name: require_min_chars("customer_name", &self.customer_name, 1)?,
            customer_email: Email::parse(&self.customer_email)
                .map_err(|e| ValidationError::new("customer_email", e.to_string()))?,
            external_id: optional_text(self.external_id.as_deref()),
            notes: optional_text(self.notes.as_deref()),
            artist_id: self.artist_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_fill_missing_statuses_with_zero() {
        let counts = OrderCounts::from_groups([
            (OrderStatus::ProofSent, 3),
            (OrderStatus::Completed, 2),
        ]);
        assert_eq!(counts.proof_sent, 3);
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.awaiting_proof, 0);
        assert_eq!(counts.total, 5);

        let json = serde_json::to_value(OrderCounts::default()).unwrap();
        assert_eq!(json["changes_requested"], 0);
        assert_eq!(json["total"], 0);
    }

    #[test]
    fn test_display_number_prefers_external_id() {
        let id: OrderId = "3f2a9c1e-0000-4000-8000-000000000000".parse().unwrap();
        assert_eq!(display_number(Some("1042"), id), "1042");
        assert_eq!(display_number(Some("  "), id), "#3f2a9c1e");
        assert_eq!(display_number(None, id), "#3f2a9c1e");
    }

    #[test]
    fn test_new_order_validation() {
        let order = NewOrder {
            customer_name: " Jane ".into(),
            customer_email: "jane@shop.test".into(),
            external_id: Some(String::new()),
            notes: Some(" gift wrap ".into()),
            artist_id: None,
        };
        let valid = order.validate().unwrap();
        assert_eq!(valid.customer_name, "Jane");
        assert_eq!(valid.external_id, None);
        assert_eq!(valid.notes.as_deref(), Some("gift wrap"));

        let bad = NewOrder {
            customer_email: "jane".into(),
            ..order
        };
        assert_eq!(bad.validate().unwrap_err().field, "customer_email");
    }
}
