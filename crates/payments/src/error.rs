//! Payment error types.

use thiserror::Error;

/// Errors returned by the payment authorizer.
///
/// A decline is not an error; it is a successful decision with code
/// `DECLINED`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The charge request is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
