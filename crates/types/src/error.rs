use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error taxonomy the recovery engine maps raised errors into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    InsufficientFunds,
    NetworkError,
    BackendUnavailable,
    SignatureTimeout,
    UserRejected,
    ExecutionReverted,
    ConfigurationError,
    Unknown,
}

/// Typed errors raised anywhere in the payment flow.
///
/// Variants carry only owned data so flow states and snapshots can hold a
/// copy of the active error.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PaymentError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u128, available: u128 },

    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("signing backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("no signature after {attempts} polls")]
    SignatureTimeout { attempts: u32 },

    #[error("user rejected the signing request")]
    UserRejected,

    #[error("transaction {tx_hash} reverted: {reason}")]
    ExecutionReverted { tx_hash: String, reason: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("current price {current} exceeds quoted amount {quoted} beyond slippage tolerance")]
    SlippageExceeded { quoted: u128, current: u128 },

    #[error("payment deadline has passed")]
    DeadlineExceeded,

    #[error("confirmation of {tx_hash} timed out")]
    ConfirmationTimeout { tx_hash: String },

    #[error("payment cancelled")]
    Cancelled,

    #[error("{reason}")]
    Unknown { reason: String },
}

impl PaymentError {
    pub fn network(reason: impl Into<String>) -> Self {
        PaymentError::Network {
            reason: reason.into(),
        }
    }

    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        PaymentError::BackendUnavailable {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        PaymentError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether the error came from a transient transport problem that may
    /// clear on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PaymentError::Network { .. } | PaymentError::BackendUnavailable { .. }
        )
    }
}
