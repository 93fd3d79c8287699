use async_trait::async_trait;
use payflow_types::{OrchestratedSnapshot, PaymentResult, RecoveryAttempt, UserInteraction};

/// Hooks the orchestrator calls at defined points.
///
/// The presentation layer implements this to render completion, recovery
/// and intervention prompts; all methods default to no-ops so embedders
/// only override what they need.
#[async_trait]
pub trait PaymentObserver: Send + Sync {
    /// A terminal result was produced, successful or not
    async fn on_payment_completed(&self, _result: &PaymentResult) {}

    /// A recovery decision was made for a raised error
    async fn on_recovery_attempt(
        &self,
        _attempt: &RecoveryAttempt,
        _snapshot: &OrchestratedSnapshot,
    ) {
    }

    /// The flow is paused waiting for the user.
    ///
    /// Return true to resume the flow (the user confirmed the surfaced
    /// action), false to abort the attempt.
    async fn on_user_action_required(
        &self,
        _interaction: &UserInteraction,
        _message: &str,
    ) -> bool {
        false
    }
}

/// Observer that ignores everything; the default when none is injected
pub struct NoopObserver;

#[async_trait]
impl PaymentObserver for NoopObserver {}
