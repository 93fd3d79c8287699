use payflow_types::{
    ErrorCategory, PaymentError, RecoveryAttempt, RecoveryStrategy, UserAction,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Silent retries before a would-be automatic retry turns fatal
    pub max_auto_retries: u32,

    /// Minimum wait between automatic retries when the health monitor has
    /// no backoff of its own to suggest
    pub retry_floor: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_auto_retries: 3,
            retry_floor: Duration::from_millis(500),
        }
    }
}

/// What the engine proposes for a raised error
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryPlan {
    pub category: ErrorCategory,
    pub strategy: RecoveryStrategy,
    pub actions: Vec<UserAction>,
    pub message: String,

    /// Whether `retry_payment` is meaningful after a fatal outcome
    pub can_retry: bool,
}

/// Classifies raised errors and proposes recovery actions.
///
/// Classification is rule-based matching over the error's type and message,
/// never learned. The engine also keeps the attempt history surfaced in the
/// final PaymentResult.
pub struct RecoveryEngine {
    config: RecoveryConfig,
    history: Mutex<Vec<RecoveryAttempt>>,
}

impl RecoveryEngine {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            config,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn max_auto_retries(&self) -> u32 {
        self.config.max_auto_retries
    }

    pub fn retry_floor(&self) -> Duration {
        self.config.retry_floor
    }

    /// Map a raised error into the coarse taxonomy
    pub fn classify(error: &PaymentError) -> ErrorCategory {
        match error {
            PaymentError::InsufficientFunds { .. } => ErrorCategory::InsufficientFunds,
            PaymentError::Network { .. } | PaymentError::ConfirmationTimeout { .. } => {
                ErrorCategory::NetworkError
            }
            PaymentError::BackendUnavailable { .. } => ErrorCategory::BackendUnavailable,
            PaymentError::SignatureTimeout { .. } => ErrorCategory::SignatureTimeout,
            PaymentError::UserRejected | PaymentError::Cancelled => ErrorCategory::UserRejected,
            PaymentError::ExecutionReverted { reason, .. } => {
                if reason.to_lowercase().contains("insufficient") {
                    ErrorCategory::InsufficientFunds
                } else {
                    ErrorCategory::ExecutionReverted
                }
            }
            PaymentError::SlippageExceeded { .. } => ErrorCategory::ExecutionReverted,
            PaymentError::Configuration { .. } | PaymentError::DeadlineExceeded => {
                ErrorCategory::ConfigurationError
            }
            PaymentError::Unknown { reason } => classify_message(reason),
        }
    }

    /// Propose a recovery for the error, given how many recovery attempts
    /// this payment attempt has already consumed (1-based for the current
    /// one). Attempt max+1 is always terminal.
    pub fn plan(&self, error: &PaymentError, attempt: u32) -> RecoveryPlan {
        let category = Self::classify(error);
        let mut plan = self.base_plan(error, category);

        if plan.strategy == RecoveryStrategy::AutomaticRetry
            && attempt > self.config.max_auto_retries
        {
            debug!(
                attempt,
                max = self.config.max_auto_retries,
                "automatic retry budget exhausted, escalating to fatal"
            );
            plan.strategy = RecoveryStrategy::Fatal;
            plan.can_retry = true;
            plan.message = format!("Payment failed after {} retries: {error}", attempt - 1);
        }

        plan
    }

    fn base_plan(&self, error: &PaymentError, category: ErrorCategory) -> RecoveryPlan {
        match category {
            ErrorCategory::InsufficientFunds => RecoveryPlan {
                category,
                strategy: RecoveryStrategy::UserIntervention,
                actions: vec![UserAction::AddFunds, UserAction::Abort],
                message: "Insufficient funds. Add funds to your wallet and retry.".to_string(),
                can_retry: true,
            },
            ErrorCategory::NetworkError => {
                if matches!(error, PaymentError::ConfirmationTimeout { .. }) {
                    // The transaction may still confirm; resubmitting silently
                    // could double-pay
                    RecoveryPlan {
                        category,
                        strategy: RecoveryStrategy::UserIntervention,
                        actions: vec![UserAction::RetryPayment, UserAction::Abort],
                        message: "The transaction is taking longer than expected.".to_string(),
                        can_retry: true,
                    }
                } else {
                    RecoveryPlan {
                        category,
                        strategy: RecoveryStrategy::AutomaticRetry,
                        actions: Vec::new(),
                        message: "Network hiccup, retrying automatically.".to_string(),
                        can_retry: true,
                    }
                }
            }
            ErrorCategory::BackendUnavailable => RecoveryPlan {
                category,
                strategy: RecoveryStrategy::AutomaticRetry,
                actions: Vec::new(),
                message: "Payment service temporarily unavailable, retrying.".to_string(),
                can_retry: true,
            },
            ErrorCategory::SignatureTimeout => RecoveryPlan {
                category,
                strategy: RecoveryStrategy::UserIntervention,
                actions: vec![UserAction::RetryPayment, UserAction::Abort],
                message: "Payment authorization timed out. Retry the payment.".to_string(),
                can_retry: true,
            },
            ErrorCategory::UserRejected => RecoveryPlan {
                category,
                strategy: RecoveryStrategy::Fatal,
                actions: Vec::new(),
                message: "Payment was cancelled.".to_string(),
                can_retry: true,
            },
            ErrorCategory::ExecutionReverted => {
                if matches!(error, PaymentError::SlippageExceeded { .. }) {
                    RecoveryPlan {
                        category,
                        strategy: RecoveryStrategy::UserIntervention,
                        actions: vec![UserAction::RetryPayment, UserAction::Abort],
                        message: "The price moved beyond your slippage tolerance.".to_string(),
                        can_retry: true,
                    }
                } else {
                    RecoveryPlan {
                        category,
                        strategy: RecoveryStrategy::Fatal,
                        actions: Vec::new(),
                        message: format!("Transaction reverted: {error}"),
                        can_retry: true,
                    }
                }
            }
            ErrorCategory::ConfigurationError => RecoveryPlan {
                category,
                strategy: RecoveryStrategy::Fatal,
                actions: Vec::new(),
                message: format!("Payment cannot proceed: {error}"),
                can_retry: false,
            },
            ErrorCategory::Unknown => RecoveryPlan {
                category,
                strategy: RecoveryStrategy::AutomaticRetry,
                actions: Vec::new(),
                message: "Unexpected error, retrying.".to_string(),
                can_retry: true,
            },
        }
    }

    pub fn record_attempt(&self, attempt: RecoveryAttempt) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(attempt);
    }

    /// Mark the most recent recorded attempt as having gotten the flow past
    /// the failing step
    pub fn mark_last_succeeded(&self) {
        if let Some(last) = self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_mut()
        {
            last.succeeded = true;
        }
    }

    pub fn history(&self) -> Vec<RecoveryAttempt> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn reset(&self) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new(RecoveryConfig::default())
    }
}

/// Last-resort message sniffing for untyped errors
fn classify_message(reason: &str) -> ErrorCategory {
    let lower = reason.to_lowercase();
    if lower.contains("network") || lower.contains("connection") || lower.contains("timeout") {
        ErrorCategory::NetworkError
    } else if lower.contains("rejected") || lower.contains("denied") {
        ErrorCategory::UserRejected
    } else if lower.contains("insufficient") {
        ErrorCategory::InsufficientFunds
    } else {
        ErrorCategory::Unknown
    }
}
