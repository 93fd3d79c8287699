use crate::{LedgerClient, WalletSigner};
use async_trait::async_trait;
use payflow_health::HealthMonitor;
use payflow_signing::{SignaturePoller, SigningBackend};
use payflow_types::{
    PaymentError, PaymentFlowState, PaymentRequest, PaymentStrategy, PhaseTimings, TimedPhase,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// On-chain addresses the strategies submit against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub token: String,
    pub marketplace: String,
}

impl ContractAddresses {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.token.is_empty() {
            return Err(PaymentError::configuration("token address not configured"));
        }
        if self.marketplace.is_empty() {
            return Err(PaymentError::configuration(
                "marketplace address not configured",
            ));
        }
        Ok(())
    }
}

/// Independent per-suspension-point budgets; a slow approval never eats
/// into the purchase confirmation's own budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowTimeouts {
    pub approval_confirmation: Duration,
    pub purchase_confirmation: Duration,

    /// Lifetime granted to a freshly signed permit
    pub permit_ttl: Duration,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            approval_confirmation: Duration::from_secs(60),
            purchase_confirmation: Duration::from_secs(60),
            permit_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Receives flow transitions as a strategy runs; implemented by the
/// orchestrator to keep its snapshot current
pub trait FlowListener: Send + Sync {
    fn on_transition(&self, state: PaymentFlowState);

    fn on_signature_poll(&self, _attempt: u32, _max_attempts: u32) {}
}

/// Identifiers produced along the way, kept even when the attempt fails
/// part-way so the result can reference them
#[derive(Debug, Default)]
pub struct AttemptArtifacts {
    pub intent_id: Option<String>,
    pub signature: Option<String>,
    pub tx_hash: Option<String>,
}

/// Phase-entry/exit stopwatch feeding bottleneck analysis
pub struct PhaseClock {
    inner: Mutex<ClockInner>,
}

struct ClockInner {
    timings: PhaseTimings,
    current: Option<(TimedPhase, Instant)>,
}

impl PhaseClock {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ClockInner {
                timings: PhaseTimings::default(),
                current: None,
            }),
        }
    }

    /// Close the running phase, if any, and enter a new one
    pub fn start(&self, phase: TimedPhase) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if let Some((previous, entered)) = inner.current.take() {
            inner.timings.record(previous, now - entered);
        }
        inner.current = Some((phase, now));
    }

    /// Close the running phase without entering another
    pub fn finish(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((phase, entered)) = inner.current.take() {
            let elapsed = Instant::now() - entered;
            inner.timings.record(phase, elapsed);
        }
    }

    pub fn timings(&self) -> PhaseTimings {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .timings
            .clone()
    }
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything an execution strategy needs, injected per attempt
pub struct StrategyContext<'a> {
    pub ledger: &'a dyn LedgerClient,
    pub signer: &'a dyn WalletSigner,
    pub backend: &'a dyn SigningBackend,
    pub poller: &'a SignaturePoller,
    pub health: &'a HealthMonitor,
    pub listener: &'a dyn FlowListener,
    pub clock: &'a PhaseClock,
    pub artifacts: &'a Mutex<AttemptArtifacts>,
    pub cancel: watch::Receiver<bool>,
    pub timeouts: &'a FlowTimeouts,
    pub contracts: &'a ContractAddresses,
}

impl StrategyContext<'_> {
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn record_intent(&self, intent_id: &str) {
        self.artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .intent_id = Some(intent_id.to_string());
    }

    pub fn record_signature(&self, signature: &str) {
        self.artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .signature = Some(signature.to_string());
    }

    pub fn record_tx_hash(&self, tx_hash: &str) {
        self.artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .tx_hash = Some(tx_hash.to_string());
    }
}

/// What a strategy hands back after running to completion
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub intent_id: String,
    pub tx_hash: String,
    pub signature: Option<String>,
}

/// One interchangeable payment execution procedure.
///
/// Strategies run to completion or failure; the orchestrator never
/// interleaves two of them.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn kind(&self) -> PaymentStrategy;

    async fn execute(
        &self,
        request: &PaymentRequest,
        ctx: &StrategyContext<'_>,
    ) -> Result<StrategyOutcome, PaymentError>;
}
