//! CLI command implementations.

pub mod migrate;
pub mod store;

/// Read `DATABASE_URL`, loading `.env` first.
pub(crate) fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok()
}
