//! HTTP middleware for the proof service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (record on span, tag Sentry, echo in response)
//! 4. Security headers
//!
//! Seller routes authenticate per handler through the [`auth`] extractors.

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{CurrentStore, RequireSeller, SellerIdentity};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
