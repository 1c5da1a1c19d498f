//! Orchestrator behavior against scripted downstream services.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{ChargeCode, OrderId, OrderRequest};
use futures_util::future::join_all;
use gateway::clients::{
    CallCode, CallError, LedgerClient, NotificationsClient, OrdersClient, PaymentsClient,
};
use gateway::orchestrator::{GatewayError, Orchestrator, RetryPolicy};
use notifications::{ReceiptAck, ReceiptRequest};
use order_ledger::{CreatedOrder, InMemoryOrderLedger, Order};
use payments::{ChargeDecision, ChargeRequest, FaultConfig, PaymentAuthorizer};
use tokio::sync::mpsc;

// -- Scripted services --

struct ScriptedOrders {
    inner: LedgerClient<InMemoryOrderLedger>,
    ledger: InMemoryOrderLedger,
    failure: Option<CallError>,
    calls: AtomicUsize,
}

impl ScriptedOrders {
    fn healthy() -> Arc<Self> {
        let ledger = InMemoryOrderLedger::new();
        Arc::new(Self {
            inner: LedgerClient::new(ledger.clone()),
            ledger,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(err: CallError) -> Arc<Self> {
        let ledger = InMemoryOrderLedger::new();
        Arc::new(Self {
            inner: LedgerClient::new(ledger.clone()),
            ledger,
            failure: Some(err),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrdersClient for ScriptedOrders {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => self.inner.create_order(request).await,
        }
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => self.inner.get_order(id).await,
        }
    }
}

/// Fails the first `failures` calls with `error`, then delegates to a real
/// authorizer.
struct FlakyPayments {
    authorizer: PaymentAuthorizer<FaultConfig>,
    error: CallError,
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyPayments {
    fn new(faults: FaultConfig, error: CallError, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            authorizer: PaymentAuthorizer::with_seed(faults, 11),
            error,
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    fn reliable(faults: FaultConfig) -> Arc<Self> {
        Self::new(faults, CallError::unavailable("unused"), 0)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentsClient for FlakyPayments {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeDecision, CallError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(self.error.clone());
        }
        self.authorizer
            .charge(request)
            .await
            .map_err(CallError::from)
    }
}

struct RecordingNotifier {
    delivered: mpsc::UnboundedSender<ReceiptRequest>,
    delay: Duration,
    fail: bool,
}

impl RecordingNotifier {
    fn new(delay: Duration, fail: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<ReceiptRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(Self {
            delivered: tx,
            delay,
            fail,
        });
        (notifier, rx)
    }
}

#[async_trait]
impl NotificationsClient for RecordingNotifier {
    async fn send_receipt(&self, receipt: &ReceiptRequest) -> Result<ReceiptAck, CallError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(CallError::unavailable("mail relay down"));
        }
        let _ = self.delivered.send(receipt.clone());
        Ok(ReceiptAck { ok: true })
    }
}

fn request(key: &str) -> OrderRequest {
    OrderRequest::new("u1", 1299, "USD", key)
}

// -- create_order --

#[tokio::test]
async fn test_approved_order_end_to_end() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let (notifier, mut receipts) = RecordingNotifier::new(Duration::ZERO, false);
    let orchestrator = Orchestrator::new(orders.clone(), payments.clone())
        .with_notifications(notifier);

    let outcome = orchestrator.create_order(request("k-approved")).await.unwrap();

    assert!(outcome.payment_success);
    assert_eq!(outcome.payment_code, ChargeCode::Approved);
    assert_eq!(outcome.order_status.as_str(), "CREATED");
    assert_eq!(payments.calls(), 1);

    let receipt = receipts.recv().await.unwrap();
    assert_eq!(receipt.order_id, outcome.order_id);
    assert_eq!(receipt.user_id, "u1");
}

#[tokio::test]
async fn test_validation_failure_makes_no_downstream_calls() {
    let invalid = [
        OrderRequest::new("u1", 0, "USD", "k"),
        OrderRequest::new("u1", 1299, "USD", ""),
    ];

    for request in invalid {
        let orders = ScriptedOrders::healthy();
        let payments = FlakyPayments::reliable(FaultConfig::disabled());
        let orchestrator = Orchestrator::new(orders.clone(), payments.clone());

        let result = orchestrator.create_order(request.clone()).await;

        assert!(
            matches!(result, Err(GatewayError::Validation(_))),
            "{request:?}"
        );
        assert_eq!(orders.calls(), 0, "{request:?}");
        assert_eq!(payments.calls(), 0, "{request:?}");
    }
}

#[tokio::test]
async fn test_ledger_failure_skips_payment_and_receipt() {
    let orders = ScriptedOrders::failing(CallError::new(CallCode::Internal, "disk full"));
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let (notifier, mut receipts) = RecordingNotifier::new(Duration::ZERO, false);
    let orchestrator =
        Orchestrator::new(orders.clone(), payments.clone()).with_notifications(notifier);

    let result = orchestrator.create_order(request("k")).await;

    assert!(matches!(result, Err(GatewayError::OrderCreate(_))));
    assert_eq!(payments.calls(), 0);
    drop(orchestrator);
    assert!(receipts.recv().await.is_none());
}

#[tokio::test]
async fn test_decline_is_returned_without_retry() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled().with_force_fail(true));
    let orchestrator = Orchestrator::new(orders, payments.clone());

    let outcome = orchestrator.create_order(request("k-declined")).await.unwrap();

    assert!(!outcome.payment_success);
    assert_eq!(outcome.payment_code, ChargeCode::Declined);
    assert_eq!(payments.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_payment_failures_are_retried() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::new(
        FaultConfig::disabled(),
        CallError::unavailable("payments restarting"),
        2,
    );
    let orchestrator = Orchestrator::new(orders, payments.clone());

    let outcome = orchestrator.create_order(request("k-flaky")).await.unwrap();

    assert!(outcome.payment_success);
    assert_eq!(payments.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::new(
        FaultConfig::disabled(),
        CallError::unavailable("payments down"),
        usize::MAX,
    );
    let orchestrator = Orchestrator::new(orders.clone(), payments.clone());

    let result = orchestrator.create_order(request("k-down")).await;

    match result {
        Err(GatewayError::Payment(err)) => assert_eq!(err.code, CallCode::Unavailable),
        other => panic!("expected payment failure, got {other:?}"),
    }
    assert_eq!(payments.calls(), 3);
    // The order row stays behind.
    assert_eq!(orders.ledger.rows_for_key("k-down").await, 1);
}

#[tokio::test]
async fn test_custom_retry_policy_bounds_attempts() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::new(
        FaultConfig::disabled(),
        CallError::unavailable("payments down"),
        usize::MAX,
    );
    let no_retries = RetryPolicy {
        max_retries: 0,
        ..RetryPolicy::default()
    };
    let orchestrator = Orchestrator::new(orders, payments.clone()).with_retry_policy(no_retries);

    let result = orchestrator.create_order(request("k-no-retry")).await;

    assert!(matches!(result, Err(GatewayError::Payment(_))));
    assert_eq!(payments.calls(), 1);
}

#[tokio::test]
async fn test_permanent_payment_failure_is_not_retried() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::new(
        FaultConfig::disabled(),
        CallError::new(CallCode::InvalidArgument, "bad currency"),
        usize::MAX,
    );
    let orchestrator = Orchestrator::new(orders, payments.clone());

    let result = orchestrator.create_order(request("k")).await;

    assert!(matches!(result, Err(GatewayError::Payment(_))));
    assert_eq!(payments.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_payment_hits_deadline_and_is_retried() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(
        FaultConfig::disabled().with_latency(Duration::from_secs(30)),
    );
    let orchestrator = Orchestrator::new(orders, payments.clone())
        .with_call_timeout(Duration::from_secs(1));

    let result = orchestrator.create_order(request("k-slow")).await;

    match result {
        Err(GatewayError::Payment(err)) => assert_eq!(err.code, CallCode::DeadlineExceeded),
        other => panic!("expected deadline failure, got {other:?}"),
    }
    assert_eq!(payments.calls(), 3);
}

#[tokio::test]
async fn test_receipt_failure_does_not_affect_outcome() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let (notifier, _receipts) = RecordingNotifier::new(Duration::ZERO, true);
    let orchestrator = Orchestrator::new(orders, payments).with_notifications(notifier);

    let outcome = orchestrator.create_order(request("k")).await.unwrap();

    assert!(outcome.payment_success);
}

#[tokio::test(start_paused = true)]
async fn test_slow_receipt_is_not_awaited() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let (notifier, mut receipts) = RecordingNotifier::new(Duration::from_secs(60), false);
    let orchestrator = Orchestrator::new(orders, payments)
        .with_notifications(notifier)
        .with_notify_timeout(Duration::from_secs(5));

    let start = tokio::time::Instant::now();
    orchestrator.create_order(request("k")).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));

    // The detached delivery gives up at its own deadline.
    drop(orchestrator);
    assert!(receipts.recv().await.is_none());
}

#[tokio::test]
async fn test_concurrent_duplicates_converge() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled().with_error_rate(0.5));
    let orchestrator = Arc::new(Orchestrator::new(orders.clone(), payments.clone()));

    let outcomes = join_all((0..16).map(|_| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.create_order(request("k1")).await })
    }))
    .await;

    let outcomes: Vec<_> = outcomes
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();
    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(orders.ledger.rows_for_key("k1").await, 1);
    assert_eq!(payments.authorizer.decisions_made(), 1);
}

// -- get_order --

#[tokio::test]
async fn test_get_order_returns_created_record() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let orchestrator = Orchestrator::new(orders, payments);

    let outcome = orchestrator.create_order(request("k-get")).await.unwrap();
    let order = orchestrator
        .get_order(&outcome.order_id.to_string())
        .await
        .unwrap();

    assert_eq!(order.id, outcome.order_id);
    assert_eq!(order.amount_cents, 1299);
    assert_eq!(order.idempotency_key, "k-get");
}

#[tokio::test]
async fn test_get_order_not_found() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let orchestrator = Orchestrator::new(orders, payments);

    let id = OrderId::new();
    let result = orchestrator.get_order(&id.to_string()).await;

    assert!(matches!(result, Err(GatewayError::NotFound(missing)) if missing == id));
}

#[tokio::test]
async fn test_get_order_rejects_malformed_id_locally() {
    let orders = ScriptedOrders::healthy();
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let orchestrator = Orchestrator::new(orders.clone(), payments);

    for raw in ["", "a/b"] {
        let result = orchestrator.get_order(raw).await;
        assert!(matches!(result, Err(GatewayError::InvalidOrderId(_))));
    }
    assert_eq!(orders.calls(), 0);
}

#[tokio::test]
async fn test_get_order_storage_failure() {
    let orders = ScriptedOrders::failing(CallError::new(CallCode::Internal, "connection reset"));
    let payments = FlakyPayments::reliable(FaultConfig::disabled());
    let orchestrator = Orchestrator::new(orders, payments);

    let result = orchestrator.get_order(&OrderId::new().to_string()).await;

    assert!(matches!(result, Err(GatewayError::Lookup(_))));
}
