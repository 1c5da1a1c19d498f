//! Order creation and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use common::{ChargeCode, OrderRequest};
use order_ledger::{Order, OrderStatus};
use serde::Serialize;

use crate::clients::{OrdersClient, PaymentsClient};
use crate::error::ApiError;
use crate::orchestrator::{OrderOutcome, Orchestrator};

/// Orchestrator over type-erased downstream clients.
pub type GatewayOrchestrator = Orchestrator<Arc<dyn OrdersClient>, Arc<dyn PaymentsClient>>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: GatewayOrchestrator,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub order_status: OrderStatus,
    pub payment_success: bool,
    pub payment_code: ChargeCode,
}

impl From<OrderOutcome> for CreateOrderResponse {
    fn from(outcome: OrderOutcome) -> Self {
        Self {
            order_id: outcome.order_id.to_string(),
            order_status: outcome.order_status,
            payment_success: outcome.payment_success,
            payment_code: outcome.payment_code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub idempotency_key: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            user_id: order.user_id,
            amount_cents: order.amount_cents,
            currency: order.currency,
            status: order.status,
            idempotency_key: order.idempotency_key,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders: create an order and charge it.
///
/// The body is decoded whatever its content type. A declined charge is
/// still a 200; the decline is in the body.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let request: OrderRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        ApiError::BadRequest("invalid JSON".to_string())
    })?;

    let outcome = state.orchestrator.create_order(request).await?;
    Ok(Json(outcome.into()))
}

/// GET /orders/{id}: look up a stored order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orchestrator.get_order(&id).await?;
    Ok(Json(order.into()))
}

/// GET /orders/: the empty id, rejected as malformed.
#[tracing::instrument(skip(state))]
pub async fn get_empty(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orchestrator.get_order("").await?;
    Ok(Json(order.into()))
}
