//! Downstream service seams and their in-process bindings.
//!
//! The orchestrator only sees these traits. Every failure is a [`CallError`]
//! carrying a transport-style status code, which is what the retry policy
//! classifies on.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, OrderRequest};
use notifications::{ReceiptAck, ReceiptRequest, ReceiptService};
use order_ledger::{CreatedOrder, LedgerError, Order, OrderLedger};
use payments::{ChargeDecision, ChargeRequest, FaultSource, PaymentAuthorizer, PaymentError};
use thiserror::Error;

/// Status class of a failed downstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallCode {
    InvalidArgument,
    NotFound,
    Unavailable,
    DeadlineExceeded,
    Internal,
    /// The failure carried no recognizable status.
    Unknown,
}

impl std::fmt::Display for CallCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallCode::InvalidArgument => "invalid argument",
            CallCode::NotFound => "not found",
            CallCode::Unavailable => "unavailable",
            CallCode::DeadlineExceeded => "deadline exceeded",
            CallCode::Internal => "internal",
            CallCode::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed call to another service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CallError {
    pub code: CallCode,
    pub message: String,
}

impl CallError {
    pub fn new(code: CallCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CallCode::Unavailable, message)
    }

    pub fn deadline_exceeded(deadline: Duration) -> Self {
        Self::new(
            CallCode::DeadlineExceeded,
            format!("no response within {}ms", deadline.as_millis()),
        )
    }

    /// Whether the failure is safe to retry: service unavailable or
    /// deadline exceeded, nothing else.
    pub fn is_transient(&self) -> bool {
        matches!(self.code, CallCode::Unavailable | CallCode::DeadlineExceeded)
    }
}

/// Runs `call` under `deadline`; expiry cancels it and reads as
/// `DeadlineExceeded`.
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, CallError>>,
) -> Result<T, CallError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(CallError::deadline_exceeded(deadline)),
    }
}

/// The Order Ledger as seen from the gateway.
#[async_trait]
pub trait OrdersClient: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, CallError>;

    async fn get_order(&self, id: OrderId) -> Result<Order, CallError>;
}

/// The Payment Authorizer as seen from the gateway.
#[async_trait]
pub trait PaymentsClient: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeDecision, CallError>;
}

/// The Notification Sink as seen from the gateway.
#[async_trait]
pub trait NotificationsClient: Send + Sync {
    async fn send_receipt(&self, receipt: &ReceiptRequest) -> Result<ReceiptAck, CallError>;
}

#[async_trait]
impl<T: OrdersClient + ?Sized> OrdersClient for Arc<T> {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, CallError> {
        (**self).create_order(request).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, CallError> {
        (**self).get_order(id).await
    }
}

#[async_trait]
impl<T: PaymentsClient + ?Sized> PaymentsClient for Arc<T> {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeDecision, CallError> {
        (**self).charge(request).await
    }
}

impl From<LedgerError> for CallError {
    fn from(err: LedgerError) -> Self {
        let code = match &err {
            LedgerError::InvalidArgument(_) => CallCode::InvalidArgument,
            LedgerError::NotFound(_) => CallCode::NotFound,
            LedgerError::Database(_) | LedgerError::Migration(_) | LedgerError::CorruptRow(_) => {
                CallCode::Internal
            }
        };
        CallError::new(code, err.to_string())
    }
}

impl From<PaymentError> for CallError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidArgument(msg) => CallError::new(CallCode::InvalidArgument, msg),
        }
    }
}

/// Binds an [`OrderLedger`] running in this process.
#[derive(Clone)]
pub struct LedgerClient<L> {
    ledger: L,
}

impl<L: OrderLedger> LedgerClient<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl<L: OrderLedger> OrdersClient for LedgerClient<L> {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, CallError> {
        Ok(self.ledger.create_order(request).await?)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, CallError> {
        Ok(self.ledger.get_order(id).await?)
    }
}

/// Binds a [`PaymentAuthorizer`] running in this process.
#[derive(Clone)]
pub struct AuthorizerClient<F> {
    authorizer: PaymentAuthorizer<F>,
}

impl<F: FaultSource> AuthorizerClient<F> {
    pub fn new(authorizer: PaymentAuthorizer<F>) -> Self {
        Self { authorizer }
    }
}

#[async_trait]
impl<F: FaultSource> PaymentsClient for AuthorizerClient<F> {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeDecision, CallError> {
        Ok(self.authorizer.charge(request).await?)
    }
}

/// Binds a [`ReceiptService`] running in this process.
#[derive(Clone)]
pub struct ReceiptClient<R> {
    service: R,
}

impl<R: ReceiptService> ReceiptClient<R> {
    pub fn new(service: R) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: ReceiptService> NotificationsClient for ReceiptClient<R> {
    async fn send_receipt(&self, receipt: &ReceiptRequest) -> Result<ReceiptAck, CallError> {
        self.service
            .send_receipt(receipt)
            .await
            .map_err(|e| CallError::new(CallCode::Internal, e.to_string()))
    }
}
