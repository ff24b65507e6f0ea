//! Seller identity extractors.
//!
//! Authentication happens upstream: the identity provider in front of the
//! service sets the user id (and usually the email) as request headers. The
//! header names come from [`IdentityConfig`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use simpler_proofs_core::{Actor, Email, UserId};

use crate::config::IdentityConfig;
use crate::db::StoreRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::Store;
use crate::state::AppState;

/// The authenticated seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerIdentity {
    pub user_id: UserId,
    /// Used as the Reply-To of proof emails when present.
    pub email: Option<Email>,
}

impl SellerIdentity {
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::Seller(self.user_id)
    }
}

/// Extractor that requires a seller identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSeller(seller): RequireSeller) -> impl IntoResponse {
///     seller.user_id.to_string()
/// }
/// ```
pub struct RequireSeller(pub SellerIdentity);

/// Error returned when no usable identity is on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerAuthRejection {
    /// The user header is absent.
    Missing,
    /// The user header is not a valid user id.
    Invalid,
}

impl IntoResponse for SellerAuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "authentication required",
            Self::Invalid => "invalid identity",
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

/// Read the identity headers.
///
/// A malformed email header is ignored rather than rejected; only the user id
/// is required.
///
/// # Errors
///
/// Returns a rejection if the user header is missing or not a UUID.
pub fn identity_from_headers(
    headers: &HeaderMap,
    config: &IdentityConfig,
) -> Result<SellerIdentity, SellerAuthRejection> {
    let raw = headers
        .get(config.user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SellerAuthRejection::Missing)?;
    let user_id = raw
        .parse::<UserId>()
        .map_err(|_| SellerAuthRejection::Invalid)?;

    let email = headers
        .get(config.email_header.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Email>().ok());

    Ok(SellerIdentity { user_id, email })
}

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = SellerAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = identity_from_headers(&parts.headers, &state.config().identity)?;
        set_sentry_user(
            identity.user_id,
            identity.email.as_ref().map(Email::as_str),
        );
        Ok(Self(identity))
    }
}

/// Extractor for handlers that act on the seller's store.
///
/// Rejects with 401 without an identity and 404 until onboarding has created
/// the store.
pub struct CurrentStore {
    pub seller: SellerIdentity,
    pub store: Store,
}

impl FromRequestParts<AppState> for CurrentStore {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireSeller(seller) = RequireSeller::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let store = StoreRepository::new(state.pool())
            .get_by_user(seller.user_id)
            .await
            .map_err(|e| AppError::from(e).into_response())?
            .ok_or_else(|| AppError::NotFound("store not set up".to_owned()).into_response())?;

        tracing::Span::current().record("store_id", tracing::field::display(store.id));
        Ok(Self { seller, store })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const USER: &str = "7d6f2a64-3a0e-4c55-9a57-0d7f1f0c2b11";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_identity_with_email() {
        let config = IdentityConfig::default();
        let identity = identity_from_headers(
            &headers(&[
                ("x-auth-user-id", USER),
                ("x-auth-user-email", "owner@sunny.test"),
            ]),
            &config,
        )
        .unwrap();

        assert_eq!(identity.user_id.to_string(), USER);
        assert_eq!(identity.email.unwrap().as_str(), "owner@sunny.test");
    }

    #[test]
    fn test_bad_email_is_dropped() {
        let config = IdentityConfig::default();
        let identity = identity_from_headers(
            &headers(&[("x-auth-user-id", USER), ("x-auth-user-email", "nope")]),
            &config,
        )
        .unwrap();
        assert!(identity.email.is_none());
    }

    #[test]
    fn test_missing_or_invalid_user() {
        let config = IdentityConfig::default();
        assert_eq!(
            identity_from_headers(&HeaderMap::new(), &config),
            Err(SellerAuthRejection::Missing)
        );
        assert_eq!(
            identity_from_headers(&headers(&[("x-auth-user-id", "admin")]), &config),
            Err(SellerAuthRejection::Invalid)
        );
    }

    #[test]
    fn test_custom_header_names() {
        let config = IdentityConfig {
            user_header: "x-forwarded-user".to_owned(),
            email_header: "x-forwarded-email".to_owned(),
        };
        assert!(identity_from_headers(&headers(&[("x-forwarded-user", USER)]), &config).is_ok());
        assert!(identity_from_headers(&headers(&[("x-auth-user-id", USER)]), &config).is_err());
    }

    #[test]
    fn test_rejection_is_unauthorized() {
        assert_eq!(
            SellerAuthRejection::Missing.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
