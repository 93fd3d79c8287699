use crate::{ErrorCategory, FlowPhase, HealthMetrics, PaymentError, PaymentStrategy, PhaseTimings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the flow proposes to recover from a raised error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStrategy {
    /// Silent retry with backoff, up to the configured cap
    AutomaticRetry,

    /// Pause and wait for an explicit user decision
    UserIntervention,

    /// Terminal; the attempt ends with a failed result
    Fatal,
}

/// Actions the presentation layer may offer the user while intervening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserAction {
    RetryPayment,
    AddFunds,
    Reconnect,
    Abort,
}

/// Coarse booleans that only flip false -> true within one attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentProgress {
    pub intent_created: bool,
    pub signature_received: bool,
    pub executed: bool,
    pub confirmed: bool,

    /// Rough wall-clock estimate until completion
    pub estimated_remaining: Option<Duration>,
}

/// Recovery bookkeeping surfaced to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryContext {
    pub is_recovering: bool,
    pub category: Option<ErrorCategory>,
    pub strategy: Option<RecoveryStrategy>,

    /// Number of recovery attempts so far; never exceeds the configured max
    pub attempt: u32,

    pub available_actions: Vec<UserAction>,
}

/// Whether and how the user needs to act right now
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInteraction {
    pub action_required: bool,
    pub action_type: Option<UserAction>,

    /// False once a transaction has been broadcast; it cannot be un-sent
    pub can_cancel: bool,
}

impl Default for UserInteraction {
    fn default() -> Self {
        Self {
            action_required: false,
            action_type: None,
            can_cancel: true,
        }
    }
}

/// The externally-observable aggregate of one payment attempt.
///
/// Derived from the authoritative `PaymentFlowState` after every transition;
/// callers read this and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratedSnapshot {
    pub phase: FlowPhase,

    /// 0-100, monotonically non-decreasing within one attempt
    pub progress: u8,

    pub message: String,
    pub error: Option<PaymentError>,
    pub strategy: Option<PaymentStrategy>,
    pub health: HealthMetrics,
    pub payment: PaymentProgress,
    pub recovery: RecoveryContext,
    pub timings: PhaseTimings,
    pub interaction: UserInteraction,
}

impl Default for OrchestratedSnapshot {
    fn default() -> Self {
        Self {
            phase: FlowPhase::Idle,
            progress: 0,
            message: "Ready".to_string(),
            error: None,
            strategy: None,
            health: HealthMetrics::default(),
            payment: PaymentProgress::default(),
            recovery: RecoveryContext::default(),
            timings: PhaseTimings::default(),
            interaction: UserInteraction::default(),
        }
    }
}
