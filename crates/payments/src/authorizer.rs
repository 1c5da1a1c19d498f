//! The idempotent charge-decision engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::ChargeCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, OnceCell, RwLock};

use crate::decision::{ChargeDecision, ChargeRequest};
use crate::error::Result;
use crate::faults::{EnvFaultSource, FaultConfig, FaultSource};

type DecisionCell = Arc<OnceCell<ChargeDecision>>;

struct DecisionTable {
    cells: RwLock<HashMap<String, DecisionCell>>,
    rng: Mutex<StdRng>,
    decisions_made: AtomicU64,
}

/// Makes at most one charge decision per idempotency key.
///
/// Decisions live in a process-wide table guarded by one read-shared,
/// write-exclusive lock. Each key maps to its own once-cell, and the
/// check, fault injection and store all happen inside that cell's one-time
/// initializer. Two concurrent first calls for one key therefore share a
/// single decision instead of racing to overwrite each other; calls for
/// different keys only contend on the brief table lookup.
///
/// Decided results are never evicted and accumulate for the life of the
/// process.
#[derive(Clone)]
pub struct PaymentAuthorizer<F = EnvFaultSource> {
    faults: F,
    table: Arc<DecisionTable>,
}

impl PaymentAuthorizer<EnvFaultSource> {
    /// Creates an authorizer driven by the `PAYMENTS_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EnvFaultSource)
    }
}

impl<F: FaultSource> PaymentAuthorizer<F> {
    /// Creates an authorizer with an entropy-seeded sampler.
    pub fn new(faults: F) -> Self {
        Self::with_rng(faults, StdRng::from_entropy())
    }

    /// Creates an authorizer whose random declines replay deterministically.
    pub fn with_seed(faults: F, seed: u64) -> Self {
        Self::with_rng(faults, StdRng::seed_from_u64(seed))
    }

    fn with_rng(faults: F, rng: StdRng) -> Self {
        Self {
            faults,
            table: Arc::new(DecisionTable {
                cells: RwLock::new(HashMap::new()),
                rng: Mutex::new(rng),
                decisions_made: AtomicU64::new(0),
            }),
        }
    }

    /// Charges an order, deciding at most once per idempotency key.
    ///
    /// A key that already has a decision gets it back verbatim without
    /// running fault injection again. A new key runs the decision path:
    /// the configured latency, then a forced decline if enabled, otherwise
    /// one uniform sample compared against the error rate.
    #[tracing::instrument(
        skip(self, request),
        fields(order_id = %request.order_id, idempotency_key = %request.idempotency_key)
    )]
    pub async fn charge(&self, request: &ChargeRequest) -> Result<ChargeDecision> {
        request.validate()?;

        // Fast path
        if let Some(decision) = self.decision_for(&request.idempotency_key).await {
            tracing::debug!(code = %decision.code, "returning recorded decision");
            return Ok(decision);
        }

        let cell = self.cell_for(&request.idempotency_key).await;
        let decision = cell.get_or_init(|| self.decide(request)).await;
        Ok(decision.clone())
    }

    /// Returns the recorded decision for a key, if any.
    pub async fn decision_for(&self, idempotency_key: &str) -> Option<ChargeDecision> {
        self.table
            .cells
            .read()
            .await
            .get(idempotency_key)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of times the decision path has run.
    pub fn decisions_made(&self) -> u64 {
        self.table.decisions_made.load(Ordering::Relaxed)
    }

    async fn cell_for(&self, idempotency_key: &str) -> DecisionCell {
        let mut cells = self.table.cells.write().await;
        cells
            .entry(idempotency_key.to_string())
            .or_default()
            .clone()
    }

    async fn decide(&self, request: &ChargeRequest) -> ChargeDecision {
        let faults: FaultConfig = self.faults.snapshot();
        self.table.decisions_made.fetch_add(1, Ordering::Relaxed);

        if !faults.latency.is_zero() {
            tokio::time::sleep(faults.latency).await;
        }

        let code = if faults.force_fail {
            ChargeCode::Declined
        } else if self.sample().await < faults.error_rate {
            ChargeCode::Declined
        } else {
            ChargeCode::Approved
        };

        if code == ChargeCode::Declined {
            metrics::counter!("payments_declined_total").increment(1);
        }
        tracing::info!(%code, force_fail = faults.force_fail, "charge decided");

        ChargeDecision::new(request.idempotency_key.clone(), code)
    }

    async fn sample(&self) -> f64 {
        self.table.rng.lock().await.gen_range(0.0..1.0)
    }
}
