//! Receipt delivery.
//!
//! Callers treat every outcome of this service as advisory: a failed or
//! slow receipt never changes the result of the order it describes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A receipt to deliver for a completed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRequest {
    pub order_id: OrderId,
    pub user_id: String,
}

/// Acknowledgement of a delivered receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAck {
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Receipt delivery failed: {0}")]
    Delivery(String),
}

/// Trait for receipt delivery.
#[async_trait]
pub trait ReceiptService: Send + Sync {
    async fn send_receipt(&self, receipt: &ReceiptRequest) -> Result<ReceiptAck, NotificationError>;
}

/// Delivers receipts as structured `receipt_sent` log events.
#[derive(Debug, Clone, Default)]
pub struct LoggingReceiptService {
    sent: Arc<AtomicU64>,
}

impl LoggingReceiptService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of receipts delivered so far.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReceiptService for LoggingReceiptService {
    async fn send_receipt(&self, receipt: &ReceiptRequest) -> Result<ReceiptAck, NotificationError> {
        tracing::info!(
            event = "receipt_sent",
            order_id = %receipt.order_id,
            user_id = %receipt.user_id,
            "receipt_sent"
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(ReceiptAck { ok: true })
    }
}
