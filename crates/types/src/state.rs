use crate::{PaymentError, PaymentStrategy, RecoveryStrategy};
use serde::{Deserialize, Serialize};

/// The orchestrator's authoritative step; exactly one variant is active per
/// attempt.
///
/// Transitions are strictly forward except `Recovering` (which re-enters an
/// earlier phase) and `Failed -> Idle` on manual retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum PaymentFlowState {
    Idle,
    DetectingAccount,
    ChoosingStrategy {
        candidates: Vec<PaymentStrategy>,
    },
    SigningPermit,
    ApprovingTokens,
    ExecutingBatch,
    CreatingIntent {
        strategy: PaymentStrategy,
    },
    WaitingSignature {
        intent_id: String,
    },
    ExecutingPurchase {
        tx_hash: Option<String>,
    },
    Confirming {
        tx_hash: String,
    },
    Completed {
        tx_hash: String,
    },
    Recovering {
        error: PaymentError,
        strategy: RecoveryStrategy,
    },
    Failed {
        error: PaymentError,
        can_retry: bool,
    },
}

/// Coarse grouping of flow states for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowPhase {
    Idle,
    Preparing,
    Authorizing,
    Executing,
    Confirming,
    Completed,
    Recovering,
    Failed,
}

impl PaymentFlowState {
    pub fn phase(&self) -> FlowPhase {
        match self {
            PaymentFlowState::Idle => FlowPhase::Idle,
            PaymentFlowState::DetectingAccount
            | PaymentFlowState::ChoosingStrategy { .. }
            | PaymentFlowState::SigningPermit
            | PaymentFlowState::ApprovingTokens
            | PaymentFlowState::ExecutingBatch => FlowPhase::Preparing,
            PaymentFlowState::CreatingIntent { .. } | PaymentFlowState::WaitingSignature { .. } => {
                FlowPhase::Authorizing
            }
            PaymentFlowState::ExecutingPurchase { .. } => FlowPhase::Executing,
            PaymentFlowState::Confirming { .. } => FlowPhase::Confirming,
            PaymentFlowState::Completed { .. } => FlowPhase::Completed,
            PaymentFlowState::Recovering { .. } => FlowPhase::Recovering,
            PaymentFlowState::Failed { .. } => FlowPhase::Failed,
        }
    }

    /// Fixed per-phase progress percentage; never derived from elapsed time.
    ///
    /// `Recovering` and `Failed` report 0 here; the orchestrator keeps the
    /// last value instead of regressing.
    pub fn progress(&self) -> u8 {
        match self {
            PaymentFlowState::Idle => 0,
            PaymentFlowState::DetectingAccount => 5,
            PaymentFlowState::ChoosingStrategy { .. } => 10,
            PaymentFlowState::SigningPermit
            | PaymentFlowState::ApprovingTokens
            | PaymentFlowState::ExecutingBatch => 18,
            PaymentFlowState::CreatingIntent { .. } => 25,
            PaymentFlowState::WaitingSignature { .. } => 40,
            PaymentFlowState::ExecutingPurchase { .. } => 80,
            PaymentFlowState::Confirming { .. } => 90,
            PaymentFlowState::Completed { .. } => 100,
            PaymentFlowState::Recovering { .. } | PaymentFlowState::Failed { .. } => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentFlowState::Completed { .. } | PaymentFlowState::Failed { .. }
        )
    }

    /// Active means an attempt is in flight (anything but idle/terminal)
    pub fn is_active(&self) -> bool {
        !matches!(self, PaymentFlowState::Idle) && !self.is_terminal()
    }

    /// Human-readable status line for the snapshot
    pub fn message(&self) -> String {
        match self {
            PaymentFlowState::Idle => "Ready".to_string(),
            PaymentFlowState::DetectingAccount => "Detecting wallet type".to_string(),
            PaymentFlowState::ChoosingStrategy { .. } => "Choosing payment method".to_string(),
            PaymentFlowState::SigningPermit => "Waiting for permit signature".to_string(),
            PaymentFlowState::ApprovingTokens => "Approving token spend".to_string(),
            PaymentFlowState::ExecutingBatch => "Preparing batched transaction".to_string(),
            PaymentFlowState::CreatingIntent { strategy } => {
                format!("Creating payment intent ({strategy})")
            }
            PaymentFlowState::WaitingSignature { .. } => {
                "Waiting for payment authorization".to_string()
            }
            PaymentFlowState::ExecutingPurchase { .. } => "Executing purchase".to_string(),
            PaymentFlowState::Confirming { tx_hash } => format!("Confirming transaction {tx_hash}"),
            PaymentFlowState::Completed { .. } => "Payment complete".to_string(),
            PaymentFlowState::Recovering { error, .. } => {
                format!("Recovering from error: {error}")
            }
            PaymentFlowState::Failed { error, .. } => format!("Payment failed: {error}"),
        }
    }
}
