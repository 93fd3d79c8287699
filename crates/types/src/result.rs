use crate::{ErrorCategory, PaymentError, PaymentStrategy, PhaseTimings, RecoveryStrategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One recorded recovery decision and its outcome, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAttempt {
    /// 1-based attempt counter within the payment attempt
    pub attempt: u32,

    pub category: ErrorCategory,
    pub strategy: RecoveryStrategy,
    pub error: PaymentError,

    /// Whether the flow subsequently made it past the failing step
    pub succeeded: bool,

    /// Unix millis
    pub at: u64,
}

/// Terminal record of one payment attempt, produced exactly once on success
/// or terminal failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    pub strategy: Option<PaymentStrategy>,
    pub intent_id: Option<String>,
    pub tx_hash: Option<String>,
    pub signature: Option<String>,

    /// Total wall-clock duration of the attempt
    pub total_duration: Duration,

    pub timings: PhaseTimings,
    pub recovery_attempts: Vec<RecoveryAttempt>,
    pub error_category: Option<ErrorCategory>,
    pub error: Option<PaymentError>,
}

impl PaymentResult {
    /// Success requires a confirmed transaction hash
    pub fn succeeded(
        strategy: PaymentStrategy,
        intent_id: String,
        tx_hash: String,
        signature: Option<String>,
        total_duration: Duration,
        timings: PhaseTimings,
        recovery_attempts: Vec<RecoveryAttempt>,
    ) -> Self {
        Self {
            success: true,
            strategy: Some(strategy),
            intent_id: Some(intent_id),
            tx_hash: Some(tx_hash),
            signature,
            total_duration,
            timings,
            recovery_attempts,
            error_category: None,
            error: None,
        }
    }

    pub fn failed(
        strategy: Option<PaymentStrategy>,
        intent_id: Option<String>,
        tx_hash: Option<String>,
        total_duration: Duration,
        timings: PhaseTimings,
        recovery_attempts: Vec<RecoveryAttempt>,
        category: ErrorCategory,
        error: PaymentError,
    ) -> Self {
        Self {
            success: false,
            strategy,
            intent_id,
            tx_hash,
            signature: None,
            total_duration,
            timings,
            recovery_attempts,
            error_category: Some(category),
            error: Some(error),
        }
    }

    pub fn recovery_count(&self) -> u32 {
        self.recovery_attempts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimedPhase;

    #[test]
    fn test_succeeded_shape() {
        let mut timings = PhaseTimings::default();
        timings.record(TimedPhase::Execution, Duration::from_secs(1));

        let result = PaymentResult::succeeded(
            PaymentStrategy::PermitSignature,
            "intent-1".to_string(),
            "0xabc".to_string(),
            Some("0xsig".to_string()),
            Duration::from_secs(12),
            timings,
            Vec::new(),
        );

        assert!(result.success);
        assert_eq!(result.tx_hash.as_deref(), Some("0xabc"));
        assert!(result.error.is_none());
        assert!(result.error_category.is_none());
    }

    #[test]
    fn test_failed_shape() {
        let result = PaymentResult::failed(
            Some(PaymentStrategy::ApproveThenExecute),
            None,
            None,
            Duration::from_secs(3),
            PhaseTimings::default(),
            Vec::new(),
            ErrorCategory::UserRejected,
            PaymentError::UserRejected,
        );

        assert!(!result.success);
        assert!(result.tx_hash.is_none());
        assert_eq!(result.error_category, Some(ErrorCategory::UserRejected));
    }
}
