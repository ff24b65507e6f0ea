//! Status enums for orders and proofs.
//!
//! Both are stored as `TEXT` columns (guarded by `CHECK` constraints) using
//! their `snake_case` names, which are also their wire and display form.

use serde::{Deserialize, Serialize};

/// Implements `Display`, `FromStr`, `as_str` and text-backed sqlx support
/// for a fieldless status enum.
macro_rules! text_status {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored/wire representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

/// Customer-facing status of an order.
///
/// This is a projection of the current proof's [`ProofStatus`], plus the
/// seller-only terminal state [`OrderStatus::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// No proof yet, or the current proof has not been sent.
    #[default]
    AwaitingProof,
    /// The current proof has been emailed to the customer.
    ProofSent,
    /// The customer accepted the current proof.
    Approved,
    /// The customer asked for a revision.
    ChangesRequested,
    /// Production finished. Terminal.
    Completed,
}

text_status!(OrderStatus {
    AwaitingProof => "awaiting_proof",
    ProofSent => "proof_sent",
    Approved => "approved",
    ChangesRequested => "changes_requested",
    Completed => "completed",
});

impl OrderStatus {
    /// The proof status an order in this state must carry on its current proof.
    ///
    /// `None` means the order may have no proof at all.
    #[must_use]
    pub const fn expected_proof_status(self) -> Option<ProofStatus> {
        match self {
            Self::AwaitingProof => None,
            Self::ProofSent => Some(ProofStatus::ProofSent),
            Self::Approved | Self::Completed => Some(ProofStatus::Approved),
            Self::ChangesRequested => Some(ProofStatus::ChangesRequested),
        }
    }

    /// Whether this order status agrees with the status of its current proof.
    ///
    /// An order waiting for a proof may have no proof or a `pending` one. A
    /// `changes_requested` order may also have a fresh `pending` revision
    /// uploaded but not yet sent.
    #[must_use]
    pub fn is_consistent_with(self, current_proof: Option<ProofStatus>) -> bool {
        match (self, current_proof) {
            (Self::AwaitingProof, None | Some(ProofStatus::Pending))
            | (Self::ChangesRequested, Some(ProofStatus::Pending)) => true,
            (status, proof) => proof.is_some() && status.expected_proof_status() == proof,
        }
    }
}

/// Status of a single proof revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    /// Uploaded, not yet sent.
    #[default]
    Pending,
    /// Emailed to the customer, awaiting a decision.
    ProofSent,
    /// Accepted by the customer.
    Approved,
    /// Rejected by the customer.
    ChangesRequested,
}

text_status!(ProofStatus {
    Pending => "pending",
    ProofSent => "proof_sent",
    Approved => "approved",
    ChangesRequested => "changes_requested",
});

impl ProofStatus {
    /// A decided proof accepts no further customer decision.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Approved | Self::ChangesRequested)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_form_round_trips() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        for status in ProofStatus::ALL {
            assert_eq!(status.as_str().parse::<ProofStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_serde_matches_text_form() {
        let json = serde_json::to_string(&OrderStatus::ChangesRequested).unwrap();
        assert_eq!(json, "\"changes_requested\"");
        let parsed: ProofStatus = serde_json::from_str("\"proof_sent\"").unwrap();
        assert_eq!(parsed, ProofStatus::ProofSent);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert!(err.contains("shipped"));
    }

    #[test]
    fn test_consistency_projection() {
        assert!(OrderStatus::AwaitingProof.is_consistent_with(None));
        assert!(OrderStatus::AwaitingProof.is_consistent_with(Some(ProofStatus::Pending)));
        assert!(OrderStatus::ProofSent.is_consistent_with(Some(ProofStatus::ProofSent)));
        assert!(OrderStatus::Approved.is_consistent_with(Some(ProofStatus::Approved)));
        assert!(OrderStatus::Completed.is_consistent_with(Some(ProofStatus::Approved)));
        assert!(
            OrderStatus::ChangesRequested.is_consistent_with(Some(ProofStatus::ChangesRequested))
        );
        assert!(OrderStatus::ChangesRequested.is_consistent_with(Some(ProofStatus::Pending)));

        assert!(!OrderStatus::ProofSent.is_consistent_with(None));
        assert!(!OrderStatus::Approved.is_consistent_with(Some(ProofStatus::ProofSent)));
        assert!(!OrderStatus::AwaitingProof.is_consistent_with(Some(ProofStatus::Approved)));
    }

    #[test]
    fn test_decided() {
        assert!(ProofStatus::Approved.is_decided());
        assert!(ProofStatus::ChangesRequested.is_decided());
        assert!(!ProofStatus::ProofSent.is_decided());
        assert!(!ProofStatus::Pending.is_decided());
    }
}
