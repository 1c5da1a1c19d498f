//! Edge gateway for order creation and payment.
//!
//! Accepts client orders over HTTP, persists them idempotently in the Order
//! Ledger, charges them through the Payment Authorizer with bounded retry,
//! and dispatches a best-effort receipt. Structured logging (tracing) and
//! Prometheus metrics are wired in.

pub mod clients;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use notifications::LoggingReceiptService;
use order_ledger::OrderLedger;
use payments::{FaultSource, PaymentAuthorizer};
use tower_http::trace::TraceLayer;

use clients::{
    AuthorizerClient, LedgerClient, NotificationsClient, OrdersClient, PaymentsClient,
    ReceiptClient,
};
use config::Config;
use orchestrator::Orchestrator;
use routes::orders::AppState;

pub use config::Config as GatewayConfig;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    // The lookup takes the rest of the path, and `/orders/` is mounted
    // separately, so empty ids and ids containing `/` reach validation
    // instead of falling through to a 404.
    Router::new()
        .route("/orders", post(routes::orders::create))
        .route("/orders/", get(routes::orders::get_empty))
        .route("/orders/{*id}", get(routes::orders::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given downstream clients.
pub fn create_state(
    config: &Config,
    orders: Arc<dyn OrdersClient>,
    payments: Arc<dyn PaymentsClient>,
    notifications: Option<Arc<dyn NotificationsClient>>,
) -> Arc<AppState> {
    let mut orchestrator = Orchestrator::new(orders, payments)
        .with_call_timeout(config.call_timeout)
        .with_notify_timeout(config.notify_timeout);

    if config.notifications_enabled
        && let Some(notifications) = notifications
    {
        orchestrator = orchestrator.with_notifications(notifications);
    }

    Arc::new(AppState { orchestrator })
}

/// Creates state with every service bound in-process.
pub fn create_in_process_state<L, F>(
    config: &Config,
    ledger: L,
    authorizer: PaymentAuthorizer<F>,
) -> Arc<AppState>
where
    L: OrderLedger + 'static,
    F: FaultSource + 'static,
{
    create_state(
        config,
        Arc::new(LedgerClient::new(ledger)),
        Arc::new(AuthorizerClient::new(authorizer)),
        Some(Arc::new(ReceiptClient::new(LoggingReceiptService::new()))),
    )
}

/// Creates the default application state: the given ledger, a payment
/// authorizer driven by `PAYMENTS_*` variables, and logged receipts.
pub fn create_default_state<L: OrderLedger + 'static>(config: &Config, ledger: L) -> Arc<AppState> {
    create_in_process_state(config, ledger, PaymentAuthorizer::from_env())
}
