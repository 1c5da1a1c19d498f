//! Fault-injection parameters and where they are read from.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Environment variable holding the artificial latency in milliseconds.
pub const LATENCY_MS_VAR: &str = "PAYMENTS_LATENCY_MS";
/// Environment variable that forces every new decision to `DECLINED`.
pub const FORCE_FAIL_VAR: &str = "PAYMENTS_FORCE_FAIL";
/// Environment variable holding the random decline fraction.
pub const ERROR_RATE_VAR: &str = "PAYMENTS_ERROR_RATE";

/// One snapshot of the fault-injection knobs.
///
/// `error_rate` is either `0.0` (disabled) or a fraction in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaultConfig {
    pub latency: Duration,
    pub force_fail: bool,
    pub error_rate: f64,
}

impl FaultConfig {
    /// No latency, no forced failure, no random declines.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Builds a snapshot, disabling an error rate outside `(0, 1]`.
    pub fn new(latency: Duration, force_fail: bool, error_rate: f64) -> Self {
        let error_rate = if error_rate > 0.0 && error_rate <= 1.0 {
            error_rate
        } else {
            0.0
        };
        Self {
            latency,
            force_fail,
            error_rate,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_force_fail(mut self, force_fail: bool) -> Self {
        self.force_fail = force_fail;
        self
    }

    pub fn with_error_rate(self, error_rate: f64) -> Self {
        Self::new(self.latency, self.force_fail, error_rate)
    }

    /// Parses the knobs from a variable lookup.
    ///
    /// Unparseable or negative latency reads as zero, the force-fail flag
    /// accepts `true` or `1`, and an unparseable error rate reads as disabled.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let latency_ms = lookup(LATENCY_MS_VAR)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(0) as u64;
        let force_fail = lookup(FORCE_FAIL_VAR)
            .map(|raw| matches!(raw.trim(), "true" | "1"))
            .unwrap_or(false);
        let error_rate = lookup(ERROR_RATE_VAR)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        Self::new(Duration::from_millis(latency_ms), force_fail, error_rate)
    }
}

/// Supplies the current fault configuration.
///
/// The authorizer calls [`FaultSource::snapshot`] on every decision, never
/// caching the result, so changes apply to the next undecided key.
pub trait FaultSource: Send + Sync {
    fn snapshot(&self) -> FaultConfig;
}

impl FaultSource for FaultConfig {
    fn snapshot(&self) -> FaultConfig {
        *self
    }
}

/// Reads the knobs from the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFaultSource;

impl FaultSource for EnvFaultSource {
    fn snapshot(&self) -> FaultConfig {
        FaultConfig::from_lookup(|name| std::env::var(name).ok())
    }
}

/// An in-memory fault configuration that can be replaced at runtime.
#[derive(Debug, Clone, Default)]
pub struct SharedFaultConfig {
    current: Arc<RwLock<FaultConfig>>,
}

impl SharedFaultConfig {
    pub fn new(config: FaultConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
        }
    }

    /// Replaces the configuration seen by subsequent decisions.
    ///
    /// An error rate outside `(0, 1]` is disabled, as in [`FaultConfig::new`].
    pub fn set(&self, config: FaultConfig) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) =
            FaultConfig::new(config.latency, config.force_fail, config.error_rate);
    }

    /// Applies an in-place change to the configuration.
    pub fn update(&self, change: impl FnOnce(&mut FaultConfig)) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut current);
        *current = FaultConfig::new(current.latency, current.force_fail, current.error_rate);
    }
}

impl FaultSource for SharedFaultConfig {
    fn snapshot(&self) -> FaultConfig {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}
