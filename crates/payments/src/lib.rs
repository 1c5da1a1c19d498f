//! Payment Authorizer: idempotent charge decisions plus fault injection.
//!
//! A decision is made at most once per idempotency key and returned verbatim
//! for every later call with that key. The decision itself is driven by a
//! fault-injection harness (artificial latency, forced decline, random
//! decline rate) whose parameters are re-read on every decision, so they can
//! be tuned while the service runs.

pub mod authorizer;
pub mod decision;
pub mod error;
pub mod faults;

pub use authorizer::PaymentAuthorizer;
pub use common::ChargeCode;
pub use decision::{ChargeDecision, ChargeRequest};
pub use error::PaymentError;
pub use faults::{EnvFaultSource, FaultConfig, FaultSource, SharedFaultConfig};
