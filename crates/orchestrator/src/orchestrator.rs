use crate::events::{NoopObserver, PaymentObserver};
use crate::recovery::{RecoveryConfig, RecoveryEngine, RecoveryPlan};
use crate::store::{SessionRecord, SessionStore, StoreError};
use payflow_execution::{
    strategy_for, AttemptArtifacts, ContractAddresses, FlowListener, FlowTimeouts, PhaseClock,
    StrategyContext, StrategyOutcome, StrategySelector,
};
use payflow_execution::{LedgerClient, WalletSigner};
use payflow_health::HealthMonitor;
use payflow_signing::{PollerConfig, SignaturePoller, SigningBackend};
use payflow_types::{
    FlowPhase, HealthMetrics, OrchestratedSnapshot, PaymentError, PaymentFlowState, PaymentRequest,
    PaymentResult, PaymentStrategy, RecoveryAttempt, RecoveryStrategy, TimedPhase, UserInteraction,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for the payment orchestrator
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Addresses the execution strategies submit against
    pub contracts: ContractAddresses,

    /// Per-suspension-point timeout budgets
    pub timeouts: FlowTimeouts,

    /// Recovery engine settings
    pub recovery: RecoveryConfig,

    /// Baseline wall-clock estimate for a healthy flow
    pub base_estimate: Duration,
}

impl OrchestratorConfig {
    pub fn with_contracts(mut self, contracts: ContractAddresses) -> Self {
        self.contracts = contracts;
        self
    }
}

fn default_base_estimate() -> Duration {
    Duration::from_secs(45)
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Orchestrator-level errors: misuse of the public API, never payment
/// failures (those terminate through a PaymentResult)
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("a payment attempt is already active")]
    AlreadyActive,

    #[error("cannot cancel: {reason}")]
    CannotCancel { reason: String },

    #[error("no previous payment request to retry")]
    NothingToRetry,

    #[error("no session store configured")]
    NoSessionStore,

    #[error("no persisted session found for id {session_id}")]
    SessionNotFound { session_id: String },

    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

/// Builder for PaymentOrchestrator
pub struct PaymentOrchestratorBuilder {
    ledger: Option<Arc<dyn LedgerClient>>,
    backend: Option<Arc<dyn SigningBackend>>,
    signer: Option<Arc<dyn WalletSigner>>,
    health: Option<Arc<HealthMonitor>>,
    observer: Option<Arc<dyn PaymentObserver>>,
    store: Option<Arc<dyn SessionStore>>,
    poller_config: PollerConfig,
    config: OrchestratorConfig,
}

impl PaymentOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            ledger: None,
            backend: None,
            signer: None,
            health: None,
            observer: None,
            store: None,
            poller_config: PollerConfig::default(),
            config: OrchestratorConfig {
                base_estimate: default_base_estimate(),
                ..Default::default()
            },
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn SigningBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn WalletSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_health(mut self, health: Arc<HealthMonitor>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PaymentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_poller_config(mut self, poller_config: PollerConfig) -> Self {
        self.poller_config = poller_config;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<PaymentOrchestrator, BuilderError> {
        let ledger = self
            .ledger
            .ok_or(BuilderError::MissingField { field: "ledger" })?;
        let backend = self
            .backend
            .ok_or(BuilderError::MissingField { field: "backend" })?;
        let signer = self
            .signer
            .ok_or(BuilderError::MissingField { field: "signer" })?;

        let health = self.health.unwrap_or_default();
        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopObserver));

        let mut config = self.config;
        if config.base_estimate.is_zero() {
            config.base_estimate = default_base_estimate();
        }

        Ok(PaymentOrchestrator::new(
            ledger,
            backend,
            signer,
            health,
            observer,
            self.store,
            self.poller_config,
            config,
        ))
    }
}

impl Default for PaymentOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the public surface and the in-flight attempt
struct FlowShared {
    active: AtomicBool,
    state: RwLock<PaymentFlowState>,
    snapshot: RwLock<OrchestratedSnapshot>,
    cancel: Mutex<watch::Sender<bool>>,
    last_request: Mutex<Option<PaymentRequest>>,
}

/// Flow listener that keeps the snapshot coherent with the authoritative
/// state after every transition
struct SnapshotSink {
    shared: Arc<FlowShared>,
    health: Arc<HealthMonitor>,
    base_estimate: Duration,
}

impl SnapshotSink {
    fn apply(&self, state: PaymentFlowState) {
        let mut snapshot = self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(|e| e.into_inner());

        let progress = state.progress();
        let keep_progress = matches!(
            state,
            PaymentFlowState::Recovering { .. } | PaymentFlowState::Failed { .. }
        );
        if !keep_progress && progress > snapshot.progress {
            snapshot.progress = progress;
        }

        snapshot.phase = state.phase();
        snapshot.message = state.message();
        snapshot.health = self.health.metrics();

        match &state {
            PaymentFlowState::Idle => {
                snapshot.error = None;
                snapshot.interaction = UserInteraction::default();
            }
            PaymentFlowState::ChoosingStrategy { candidates } => {
                snapshot.strategy = candidates.first().copied();
            }
            PaymentFlowState::CreatingIntent { strategy } => {
                snapshot.strategy = Some(*strategy);
            }
            PaymentFlowState::WaitingSignature { .. } => {
                snapshot.payment.intent_created = true;
            }
            PaymentFlowState::ExecutingPurchase { tx_hash } => {
                snapshot.payment.signature_received = true;
                if tx_hash.is_some() {
                    snapshot.payment.executed = true;
                    snapshot.interaction.can_cancel = false;
                }
            }
            PaymentFlowState::Confirming { .. } => {
                snapshot.payment.executed = true;
                snapshot.interaction.can_cancel = false;
            }
            PaymentFlowState::Completed { .. } => {
                snapshot.progress = 100;
                snapshot.payment.confirmed = true;
                snapshot.error = None;
                snapshot.recovery.is_recovering = false;
                snapshot.interaction.can_cancel = false;
            }
            PaymentFlowState::Recovering { error, strategy } => {
                snapshot.error = Some(error.clone());
                snapshot.recovery.is_recovering = true;
                snapshot.recovery.strategy = Some(*strategy);
            }
            PaymentFlowState::Failed { error, .. } => {
                snapshot.error = Some(error.clone());
                snapshot.recovery.is_recovering = false;
                snapshot.interaction.can_cancel = false;
            }
            _ => {}
        }

        snapshot.payment.estimated_remaining = match snapshot.phase {
            FlowPhase::Idle | FlowPhase::Completed | FlowPhase::Failed => None,
            _ => {
                let mut estimate = match snapshot.strategy {
                    Some(PaymentStrategy::ApproveThenExecute) => self.base_estimate * 2,
                    _ => self.base_estimate,
                };
                if snapshot.health.circuit_open {
                    estimate *= 2;
                }
                Some(estimate * (100 - snapshot.progress as u32) / 100)
            }
        };

        drop(snapshot);
        *self.shared.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

impl FlowListener for SnapshotSink {
    fn on_transition(&self, state: PaymentFlowState) {
        self.apply(state);
    }

    fn on_signature_poll(&self, attempt: u32, max_attempts: u32) {
        let mut snapshot = self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if snapshot.phase != FlowPhase::Authorizing {
            return;
        }
        // Signature wait ramps 40 -> 70 as attempts are spent
        let ramp = 40 + ((attempt as u64 * 30) / max_attempts.max(1) as u64).min(30) as u8;
        if ramp > snapshot.progress {
            snapshot.progress = ramp;
        }
    }
}

/// The payment flow state machine: sequences strategy selection, execution,
/// signature acquisition, confirmation, timing, and recovery, publishing a
/// single coherent snapshot throughout.
///
/// One attempt runs at a time per instance; a second `execute_payment`
/// while one is active fails fast without side effects.
pub struct PaymentOrchestrator {
    ledger: Arc<dyn LedgerClient>,
    backend: Arc<dyn SigningBackend>,
    signer: Arc<dyn WalletSigner>,
    health: Arc<HealthMonitor>,
    poller: SignaturePoller,
    recovery: RecoveryEngine,
    observer: Arc<dyn PaymentObserver>,
    store: Option<Arc<dyn SessionStore>>,
    config: OrchestratorConfig,
    shared: Arc<FlowShared>,
    sink: SnapshotSink,
}

impl PaymentOrchestrator {
    pub fn builder() -> PaymentOrchestratorBuilder {
        PaymentOrchestratorBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        backend: Arc<dyn SigningBackend>,
        signer: Arc<dyn WalletSigner>,
        health: Arc<HealthMonitor>,
        observer: Arc<dyn PaymentObserver>,
        store: Option<Arc<dyn SessionStore>>,
        poller_config: PollerConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let poller = SignaturePoller::new(backend.clone(), health.clone(), poller_config);
        let recovery = RecoveryEngine::new(config.recovery.clone());
        let (cancel_tx, _) = watch::channel(false);

        let shared = Arc::new(FlowShared {
            active: AtomicBool::new(false),
            state: RwLock::new(PaymentFlowState::Idle),
            snapshot: RwLock::new(OrchestratedSnapshot::default()),
            cancel: Mutex::new(cancel_tx),
            last_request: Mutex::new(None),
        });

        let sink = SnapshotSink {
            shared: shared.clone(),
            health: health.clone(),
            base_estimate: config.base_estimate,
        };

        Self {
            ledger,
            backend,
            signer,
            health,
            poller,
            recovery,
            observer,
            store,
            config,
            shared,
            sink,
        }
    }

    /// Drive one payment request to a terminal PaymentResult.
    ///
    /// Rejects immediately if an attempt is already active.
    pub async fn execute_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResult, OrchestratorError> {
        if self.shared.active.swap(true, Ordering::SeqCst) {
            return Err(OrchestratorError::AlreadyActive);
        }

        let result = self.run_flow(request).await;
        self.shared.active.store(false, Ordering::SeqCst);
        Ok(result)
    }

    /// Signal cancellation to the in-flight attempt.
    ///
    /// Only effective while nothing has been broadcast; once a transaction
    /// hash exists the flow runs to its terminal outcome and this returns
    /// an error the caller can detect alongside `can_cancel = false`.
    pub fn cancel_payment(&self) -> Result<(), OrchestratorError> {
        let can_cancel = self
            .shared
            .snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .interaction
            .can_cancel;
        if !can_cancel {
            return Err(OrchestratorError::CannotCancel {
                reason: "transaction already broadcast and awaiting confirmation".to_string(),
            });
        }

        info!("cancellation requested");
        self.shared
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send_replace(true);
        Ok(())
    }

    /// Re-run the last request with fresh recovery counters
    pub async fn retry_payment(&self) -> Result<PaymentResult, OrchestratorError> {
        let request = self
            .shared
            .last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(OrchestratorError::NothingToRetry)?;

        info!(fingerprint = %request.fingerprint(), "retrying payment");
        self.execute_payment(request).await
    }

    /// Restore a persisted in-flight request by session id and resume it
    pub async fn resume_payment(
        &self,
        session_id: &str,
    ) -> Result<PaymentResult, OrchestratorError> {
        let store = self
            .store
            .as_ref()
            .ok_or(OrchestratorError::NoSessionStore)?;

        let record = store
            .load(session_id)
            .await?
            .ok_or_else(|| OrchestratorError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        info!(session_id = %session_id, "resuming persisted payment session");
        self.execute_payment(record.request).await
    }

    pub fn get_system_health(&self) -> HealthMetrics {
        self.health.metrics()
    }

    pub fn refresh_system_health(&self) -> HealthMetrics {
        self.health.force_health_check()
    }

    /// Hard reset to idle: stops any in-flight waits and clears counters.
    /// The attempt task observes the cancellation and winds down on its own.
    pub fn reset_state(&self) {
        self.shared
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send_replace(true);
        self.recovery.reset();
        *self.shared.state.write().unwrap_or_else(|e| e.into_inner()) = PaymentFlowState::Idle;
        *self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(|e| e.into_inner()) = OrchestratedSnapshot {
            health: self.health.metrics(),
            ..Default::default()
        };
    }

    /// The externally-observable aggregate; the only thing callers should
    /// poll
    pub fn snapshot(&self) -> OrchestratedSnapshot {
        self.shared
            .snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The authoritative flow state
    pub fn state(&self) -> PaymentFlowState {
        self.shared
            .state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Rough wall-clock estimate for the current (or a fresh) attempt;
    /// at least doubled while the backend circuit breaker is open
    pub fn get_estimated_duration(&self) -> Duration {
        let strategy = self
            .shared
            .snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .strategy;
        let base = match strategy {
            Some(PaymentStrategy::ApproveThenExecute) => self.config.base_estimate * 2,
            _ => self.config.base_estimate,
        };
        if self.health.metrics().circuit_open {
            base * 2
        } else {
            base
        }
    }

    async fn run_flow(&self, request: PaymentRequest) -> PaymentResult {
        let attempt_id = Uuid::new_v4();
        info!(
            attempt_id = %attempt_id,
            content_id = %request.content_id,
            amount = request.amount,
            "starting payment attempt"
        );

        // Fresh per-attempt state
        {
            let (cancel_tx, _) = watch::channel(false);
            *self.shared.cancel.lock().unwrap_or_else(|e| e.into_inner()) = cancel_tx;
            *self.shared.state.write().unwrap_or_else(|e| e.into_inner()) =
                PaymentFlowState::Idle;
            *self
                .shared
                .snapshot
                .write()
                .unwrap_or_else(|e| e.into_inner()) = OrchestratedSnapshot {
                health: self.health.metrics(),
                ..Default::default()
            };
        }
        self.recovery.reset();
        *self
            .shared
            .last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        self.persist_session(&request, PaymentFlowState::DetectingAccount)
            .await;

        let clock = PhaseClock::new();
        let artifacts = Mutex::new(AttemptArtifacts::default());
        let started = tokio::time::Instant::now();
        let mut recovery_attempt = 0u32;

        loop {
            let attempt_result = self.run_attempt(&request, &clock, &artifacts).await;
            clock.finish();

            let err = match attempt_result {
                Ok((strategy, outcome)) => {
                    return self
                        .finish_success(strategy, outcome, &clock, started, recovery_attempt)
                        .await;
                }
                Err(err) => err,
            };

            let tx_broadcast = artifacts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .tx_hash
                .is_some();

            if matches!(err, PaymentError::Cancelled) && !tx_broadcast {
                return self.finish_cancelled(&request, &clock, started, &artifacts).await;
            }

            recovery_attempt += 1;
            let plan = self.recovery.plan(&err, recovery_attempt);
            warn!(
                attempt_id = %attempt_id,
                error = %err,
                category = ?plan.category,
                recovery = ?plan.strategy,
                recovery_attempt,
                "payment step failed"
            );

            self.sink.apply(PaymentFlowState::Recovering {
                error: err.clone(),
                strategy: plan.strategy,
            });
            self.update_recovery_context(&plan, recovery_attempt);

            let record = RecoveryAttempt {
                attempt: recovery_attempt,
                category: plan.category,
                strategy: plan.strategy,
                error: err.clone(),
                succeeded: false,
                at: now_ms(),
            };
            self.recovery.record_attempt(record.clone());
            self.observer
                .on_recovery_attempt(&record, &self.snapshot())
                .await;

            match plan.strategy {
                RecoveryStrategy::AutomaticRetry => {
                    let delay = self
                        .health
                        .current_retry_delay()
                        .max(self.recovery.retry_floor());
                    debug!(delay_ms = delay.as_millis() as u64, "automatic retry after backoff");
                    if self.wait_or_cancelled(delay).await && !tx_broadcast {
                        return self
                            .finish_cancelled(&request, &clock, started, &artifacts)
                            .await;
                    }
                    continue;
                }
                RecoveryStrategy::UserIntervention => {
                    let interaction = UserInteraction {
                        action_required: true,
                        action_type: plan.actions.first().copied(),
                        can_cancel: !tx_broadcast,
                    };
                    {
                        let mut snapshot = self
                            .shared
                            .snapshot
                            .write()
                            .unwrap_or_else(|e| e.into_inner());
                        snapshot.interaction = interaction.clone();
                        snapshot.message = plan.message.clone();
                    }

                    let mut cancel_rx = self.cancel_receiver();
                    let proceed = tokio::select! {
                        decision = self
                            .observer
                            .on_user_action_required(&interaction, &plan.message) => decision,
                        _ = cancel_rx.changed() => false,
                    };

                    {
                        let mut snapshot = self
                            .shared
                            .snapshot
                            .write()
                            .unwrap_or_else(|e| e.into_inner());
                        snapshot.interaction.action_required = false;
                        snapshot.interaction.action_type = None;
                    }

                    if self.cancel_requested() && !tx_broadcast {
                        return self
                            .finish_cancelled(&request, &clock, started, &artifacts)
                            .await;
                    }
                    if proceed {
                        info!("user confirmed, resuming flow");
                        continue;
                    }
                }
                RecoveryStrategy::Fatal => {}
            }

            return self
                .finish_failed(&request, err, &plan, &clock, started, &artifacts)
                .await;
        }
    }

    async fn run_attempt(
        &self,
        request: &PaymentRequest,
        clock: &PhaseClock,
        artifacts: &Mutex<AttemptArtifacts>,
    ) -> Result<(PaymentStrategy, StrategyOutcome), PaymentError> {
        let cancel_rx = self.cancel_receiver();
        if *cancel_rx.borrow() {
            return Err(PaymentError::Cancelled);
        }

        if request.is_expired(chrono::Utc::now().timestamp() as u64) {
            return Err(PaymentError::DeadlineExceeded);
        }

        self.sink.apply(PaymentFlowState::DetectingAccount);
        clock.start(TimedPhase::AccountDetection);
        let account = self.signer.account_type().await?;
        debug!(account = ?account, "account type detected");

        let wallet_chain = self.signer.chain_id().await?;
        let ledger_chain = self.ledger.chain_id().await?;
        if wallet_chain != ledger_chain {
            return Err(PaymentError::configuration(format!(
                "wallet is on chain {wallet_chain} but the ledger client targets {ledger_chain}"
            )));
        }

        clock.start(TimedPhase::StrategySelection);
        let candidates = StrategySelector::eligible(account);
        self.sink.apply(PaymentFlowState::ChoosingStrategy {
            candidates: candidates.clone(),
        });
        let kind = StrategySelector::select(account)?;
        info!(strategy = %kind, "execution strategy selected");

        let strategy = strategy_for(kind);
        let ctx = StrategyContext {
            ledger: self.ledger.as_ref(),
            signer: self.signer.as_ref(),
            backend: self.backend.as_ref(),
            poller: &self.poller,
            health: self.health.as_ref(),
            listener: &self.sink,
            clock,
            artifacts,
            cancel: cancel_rx,
            timeouts: &self.config.timeouts,
            contracts: &self.config.contracts,
        };

        let outcome = strategy.execute(request, &ctx).await?;
        Ok((kind, outcome))
    }

    async fn finish_success(
        &self,
        strategy: PaymentStrategy,
        outcome: StrategyOutcome,
        clock: &PhaseClock,
        started: tokio::time::Instant,
        recovery_attempts_used: u32,
    ) -> PaymentResult {
        if recovery_attempts_used > 0 {
            self.recovery.mark_last_succeeded();
        }

        self.sink.apply(PaymentFlowState::Completed {
            tx_hash: outcome.tx_hash.clone(),
        });

        let timings = clock.timings();
        if let Some(bottleneck) = timings.bottleneck() {
            info!(
                bottleneck = ?bottleneck,
                total_ms = started.elapsed().as_millis() as u64,
                "payment completed"
            );
        }

        let result = PaymentResult::succeeded(
            strategy,
            outcome.intent_id,
            outcome.tx_hash,
            outcome.signature,
            started.elapsed(),
            timings,
            self.recovery.history(),
        );

        let last_request = self
            .shared
            .last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(request) = last_request {
            self.clear_session(&request).await;
        }
        self.observer.on_payment_completed(&result).await;
        result
    }

    async fn finish_cancelled(
        &self,
        request: &PaymentRequest,
        clock: &PhaseClock,
        started: tokio::time::Instant,
        artifacts: &Mutex<AttemptArtifacts>,
    ) -> PaymentResult {
        info!("payment cancelled before broadcast, returning to idle");

        let intent_id = artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .intent_id
            .clone();

        let result = PaymentResult::failed(
            self.snapshot().strategy,
            intent_id,
            None,
            started.elapsed(),
            clock.timings(),
            self.recovery.history(),
            RecoveryEngine::classify(&PaymentError::Cancelled),
            PaymentError::Cancelled,
        );

        self.clear_session(request).await;
        self.sink.apply(PaymentFlowState::Idle);
        {
            let mut snapshot = self
                .shared
                .snapshot
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *snapshot = OrchestratedSnapshot {
                health: self.health.metrics(),
                ..Default::default()
            };
        }
        self.observer.on_payment_completed(&result).await;
        result
    }

    async fn finish_failed(
        &self,
        request: &PaymentRequest,
        error: PaymentError,
        plan: &RecoveryPlan,
        clock: &PhaseClock,
        started: tokio::time::Instant,
        artifacts: &Mutex<AttemptArtifacts>,
    ) -> PaymentResult {
        self.sink.apply(PaymentFlowState::Failed {
            error: error.clone(),
            can_retry: plan.can_retry,
        });
        self.persist_session(
            request,
            PaymentFlowState::Failed {
                error: error.clone(),
                can_retry: plan.can_retry,
            },
        )
        .await;

        let (intent_id, tx_hash) = {
            let artifacts = artifacts.lock().unwrap_or_else(|e| e.into_inner());
            (artifacts.intent_id.clone(), artifacts.tx_hash.clone())
        };

        let result = PaymentResult::failed(
            self.snapshot().strategy,
            intent_id,
            tx_hash,
            started.elapsed(),
            clock.timings(),
            self.recovery.history(),
            plan.category,
            error,
        );

        self.observer.on_payment_completed(&result).await;
        result
    }

    fn update_recovery_context(&self, plan: &RecoveryPlan, attempt: u32) {
        let mut snapshot = self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(|e| e.into_inner());
        snapshot.recovery.category = Some(plan.category);
        snapshot.recovery.attempt = attempt.min(self.recovery.max_auto_retries());
        snapshot.recovery.available_actions = plan.actions.clone();
    }

    fn cancel_receiver(&self) -> watch::Receiver<bool> {
        self.shared
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .subscribe()
    }

    fn cancel_requested(&self) -> bool {
        *self.cancel_receiver().borrow()
    }

    /// Returns true when cancellation arrived during the wait
    async fn wait_or_cancelled(&self, delay: Duration) -> bool {
        let mut cancel_rx = self.cancel_receiver();
        if *cancel_rx.borrow() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = cancel_rx.changed() => *cancel_rx.borrow(),
        }
    }

    async fn persist_session(&self, request: &PaymentRequest, state: PaymentFlowState) {
        let (Some(store), Some(session_id)) = (&self.store, &request.session_id) else {
            return;
        };

        let record = SessionRecord {
            session_id: session_id.clone(),
            request: request.clone(),
            state,
            updated_at: chrono::Utc::now().timestamp(),
        };
        if let Err(e) = store.save(&record).await {
            warn!(session_id = %session_id, error = %e, "failed to persist session");
        }
    }

    async fn clear_session(&self, request: &PaymentRequest) {
        let (Some(store), Some(session_id)) = (&self.store, &request.session_id) else {
            return;
        };
        if let Err(e) = store.delete(session_id).await {
            warn!(session_id = %session_id, error = %e, "failed to clear session");
        }
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
