//! Run-sheet CSV export of approved orders.

use axum::{
    Json, Router,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use simpler_proofs_core::OrderId;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::services::run_sheet::{self, RunSheetRow};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/run-sheet", get(export_all).post(export_selected))
}

#[derive(Debug, Deserialize)]
pub struct RunSheetSelection {
    pub order_ids: Vec<OrderId>,
}

/// GET /api/run-sheet
///
/// Every exportable order, most recently approved first.
#[instrument(skip_all, fields(store_id = %store.id))]
async fn export_all(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
) -> Result<Response, AppError> {
    let rows = OrderRepository::new(state.pool())
        .run_sheet_all(store.id)
        .await?;
    Ok(csv_response(&rows))
}

/// POST /api/run-sheet
///
/// The selected orders in the order given. Ids that are not exportable are
/// left out.
#[instrument(skip_all, fields(store_id = %store.id, selected = selection.order_ids.len()))]
async fn export_selected(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(selection): Json<RunSheetSelection>,
) -> Result<Response, AppError> {
    if selection.order_ids.is_empty() {
        return Err(AppError::BadRequest("No orders provided".to_owned()));
    }
    let rows = OrderRepository::new(state.pool())
        .run_sheet_for(store.id, &selection.order_ids)
        .await?;
    Ok(csv_response(&rows))
}

fn csv_response(rows: &[RunSheetRow]) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        run_sheet::file_name(Utc::now().date_naive())
    );
    tracing::info!(rows = rows.len(), "Run sheet exported");
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (CONTENT_DISPOSITION, disposition),
        ],
        run_sheet::render_csv(rows),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_csv_response_headers_and_body() {
        let response = csv_response(&[RunSheetRow {
            order_number: "1001".to_owned(),
            customer_name: "Ana".to_owned(),
            approved_at: None,
            notes: None,
            proof_url: "https://files.test/p.png".to_owned(),
        }]);

        assert_eq!(response.headers()[CONTENT_TYPE], "text/csv; charset=utf-8");
        let disposition = response.headers()[CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"run-sheet-"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with(run_sheet::HEADER));
        assert!(text.contains("\"Ana\""));
    }
}
