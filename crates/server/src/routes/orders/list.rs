//! Order listing and creation.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use simpler_proofs_core::OrderStatus;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::CurrentStore;
use crate::models::{NewOrder, Order, OrderCounts};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
}

/// GET /api/orders
#[instrument(skip_all, fields(status = ?query.status))]
pub(super) async fn index(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list(store.id, query.status)
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/stats
#[instrument(skip_all)]
pub(super) async fn stats(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
) -> Result<Json<OrderCounts>, AppError> {
    let counts = OrderRepository::new(state.pool())
        .status_counts(store.id)
        .await?;
    Ok(Json(counts))
}

/// POST /api/orders
#[instrument(skip_all)]
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentStore { store, .. }: CurrentStore,
    Json(input): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = input.validate()?;
    let order = OrderRepository::new(state.pool())
        .create(store.id, &order)
        .await?;
    tracing::info!(order_id = %order.id, store_id = %store.id, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}
