//! Gateway orchestrator: order creation, payment with retry, receipt.

pub mod error;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use common::{ChargeCode, OrderId, OrderRequest};
use notifications::ReceiptRequest;
use order_ledger::{Order, OrderStatus};
use payments::{ChargeDecision, ChargeRequest};
use tracing::Instrument;

use crate::clients::{
    CallCode, CallError, NotificationsClient, OrdersClient, PaymentsClient, with_deadline,
};

pub use error::GatewayError;
pub use retry::RetryPolicy;

/// Default deadline for every outbound call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// What the client gets back from a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderOutcome {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub payment_success: bool,
    pub payment_code: ChargeCode,
}

/// Sequences Order Ledger, Payment Authorizer and Notification Sink calls
/// for each client request.
///
/// Within one request the calls are strictly ordered (order, charge, notify);
/// unrelated requests share nothing but the clients. The client's
/// idempotency key travels unchanged to both the ledger and the authorizer,
/// so a retried request converges on the same order and the same decision.
pub struct Orchestrator<O, P> {
    orders: O,
    payments: P,
    notifications: Option<Arc<dyn NotificationsClient>>,
    retry: RetryPolicy,
    call_timeout: Duration,
    notify_timeout: Duration,
}

impl<O, P> Orchestrator<O, P>
where
    O: OrdersClient,
    P: PaymentsClient,
{
    /// Creates an orchestrator with the default retry policy and deadlines
    /// and no notification sink.
    pub fn new(orders: O, payments: P) -> Self {
        Self {
            orders,
            payments,
            notifications: None,
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            notify_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationsClient>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_notify_timeout(mut self, notify_timeout: Duration) -> Self {
        self.notify_timeout = notify_timeout;
        self
    }

    /// Creates an order and charges it.
    ///
    /// Invalid input is rejected before any downstream call. A ledger
    /// failure aborts the request before payment. A decline is returned as a
    /// normal outcome. The receipt is dispatched afterwards on a detached
    /// task and cannot affect the result.
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %request.user_id, idempotency_key = %request.idempotency_key)
    )]
    pub async fn create_order(&self, request: OrderRequest) -> Result<OrderOutcome, GatewayError> {
        request.validate()?;

        let created = with_deadline(self.call_timeout, self.orders.create_order(&request))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "order creation failed");
                GatewayError::OrderCreate(e)
            })?;
        metrics::counter!("gateway_orders_created_total").increment(1);

        let charge = ChargeRequest::new(
            created.order_id,
            request.amount_cents,
            request.currency.clone(),
            request.idempotency_key.clone(),
        );
        let decision = self.charge_with_retry(&charge).await.map_err(|e| {
            tracing::error!(order_id = %created.order_id, error = %e, "payment failed");
            GatewayError::Payment(e)
        })?;

        self.notify(created.order_id, &request.user_id);

        tracing::info!(
            order_id = %created.order_id,
            payment_code = %decision.code,
            "order processed"
        );
        Ok(OrderOutcome {
            order_id: created.order_id,
            order_status: created.status,
            payment_success: decision.success,
            payment_code: decision.code,
        })
    }

    /// Charges with bounded retry on transient failures only.
    ///
    /// Each attempt carries its own deadline. A decline is a successful
    /// call and is returned on the first attempt.
    pub async fn charge_with_retry(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeDecision, CallError> {
        self.retry
            .run(|attempt| {
                metrics::counter!("gateway_charge_attempts_total").increment(1);
                tracing::debug!(attempt, "charging");
                with_deadline(self.call_timeout, self.payments.charge(request))
            })
            .await
    }

    /// Looks up an order by its client-facing identifier.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, raw_id: &str) -> Result<Order, GatewayError> {
        let id = parse_order_id(raw_id)?;

        with_deadline(self.call_timeout, self.orders.get_order(id))
            .await
            .map_err(|e| match e.code {
                CallCode::NotFound => GatewayError::NotFound(id),
                _ => {
                    tracing::error!(error = %e, "order lookup failed");
                    GatewayError::Lookup(e)
                }
            })
    }

    fn notify(&self, order_id: OrderId, user_id: &str) {
        let Some(client) = self.notifications.clone() else {
            return;
        };
        let receipt = ReceiptRequest {
            order_id,
            user_id: user_id.to_string(),
        };
        let deadline = self.notify_timeout;

        tokio::spawn(
            async move {
                match with_deadline(deadline, client.send_receipt(&receipt)).await {
                    Ok(_) => tracing::debug!("receipt delivered"),
                    Err(e) => tracing::warn!(error = %e, "receipt delivery failed, ignoring"),
                }
            }
            .instrument(tracing::info_span!("send_receipt", %order_id)),
        );
    }
}

/// Rejects identifiers that are empty, contain a path separator, or are not
/// an order id at all.
pub fn parse_order_id(raw: &str) -> Result<OrderId, GatewayError> {
    if raw.is_empty() || raw.contains('/') {
        return Err(GatewayError::InvalidOrderId(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| GatewayError::InvalidOrderId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_order_id_rejects_malformed_input() {
        for raw in ["", "a/b", "/", "not-a-uuid"] {
            assert!(
                matches!(parse_order_id(raw), Err(GatewayError::InvalidOrderId(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn parse_order_id_accepts_uuid() {
        let id = OrderId::new();
        assert_eq!(parse_order_id(&id.to_string()).unwrap(), id);
    }
}
