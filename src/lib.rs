//! Payflow drives a multi-step, multi-party crypto payment from user intent
//! to on-chain settlement, tolerating failures at every step: wallet
//! rejection, backend unavailability, network congestion, stale quotes.
//!
//! The crate reconciles three independently-failing actors (a ledger, a
//! signing backend, and a user-controlled wallet) into a single consistent
//! outcome while publishing continuous, truthful progress through an
//! [`OrchestratedSnapshot`].
//!
//! Embedders inject the external seams ([`LedgerClient`], [`SigningBackend`],
//! [`WalletSigner`]) and drive payments through a [`PaymentOrchestrator`]:
//!
//! ```ignore
//! let config = ConfigLoader::from_file(Path::new("payflow.toml"))?;
//! let orchestrator = payflow::orchestrator_from_config(
//!     &config, ledger, backend, signer, None, None,
//! )?;
//! let result = orchestrator.execute_payment(request).await?;
//! ```

pub mod telemetry;

pub use payflow_config::{validate_config, AppConfig, ConfigError, ConfigLoader};
pub use payflow_execution::{
    strategy_for, ContractAddresses, ExecutionStrategy, FlowListener, FlowTimeouts, LedgerClient,
    PermitRequest, StrategySelector, TxReceipt, TxStatus, WalletSigner,
};
pub use payflow_health::{ExponentialBackoff, HealthConfig, HealthMonitor};
pub use payflow_orchestrator::{
    MemorySessionStore, NoopObserver, OrchestratorConfig, OrchestratorError, PaymentObserver,
    PaymentOrchestrator, PaymentOrchestratorBuilder, RecoveryConfig, RecoveryEngine, SessionRecord,
    SessionStore, SqliteSessionStore,
};
pub use payflow_signing::{PollerConfig, SignaturePoller, SignatureStatus, SigningBackend};
pub use payflow_types::*;

use std::sync::Arc;
use std::time::Duration;

/// Translate the file-level configuration into the health monitor's shape
pub fn health_config(app: &AppConfig) -> HealthConfig {
    HealthConfig {
        failure_threshold: app.health.failure_threshold,
        base_retry_delay: Duration::from_millis(app.health.base_retry_delay_ms),
        max_retry_delay: Duration::from_millis(app.health.max_retry_delay_ms),
        degraded_latency: Duration::from_millis(app.health.degraded_latency_ms),
        degraded_success_rate: app.health.degraded_success_rate,
    }
}

/// Translate the file-level configuration into the poller's shape
pub fn poller_config(app: &AppConfig) -> PollerConfig {
    PollerConfig {
        max_attempts: app.poller.max_attempts,
        base_interval: Duration::from_millis(app.poller.base_interval_ms),
        max_interval: Duration::from_millis(app.poller.max_interval_ms),
        transient_retry_limit: app.poller.transient_retry_limit,
        max_consecutive_failures: app.poller.max_consecutive_failures,
    }
}

/// Translate the file-level configuration into the orchestrator's shape
pub fn orchestrator_config(app: &AppConfig) -> OrchestratorConfig {
    OrchestratorConfig {
        contracts: ContractAddresses {
            token: app.contracts.token_address.clone(),
            marketplace: app.contracts.marketplace_address.clone(),
        },
        timeouts: FlowTimeouts {
            approval_confirmation: Duration::from_secs(app.timeouts.approval_confirmation_secs),
            purchase_confirmation: Duration::from_secs(app.timeouts.purchase_confirmation_secs),
            permit_ttl: Duration::from_secs(app.timeouts.permit_ttl_secs),
        },
        recovery: RecoveryConfig {
            max_auto_retries: app.recovery.max_auto_retries,
            retry_floor: Duration::from_millis(app.recovery.retry_floor_ms),
        },
        base_estimate: Duration::from_secs(app.estimates.base_estimate_secs),
    }
}

/// Validate the configuration and assemble a ready orchestrator around the
/// injected external seams
pub fn orchestrator_from_config(
    app: &AppConfig,
    ledger: Arc<dyn LedgerClient>,
    backend: Arc<dyn SigningBackend>,
    signer: Arc<dyn WalletSigner>,
    observer: Option<Arc<dyn PaymentObserver>>,
    store: Option<Arc<dyn SessionStore>>,
) -> anyhow::Result<PaymentOrchestrator> {
    validate_config(app)?;

    let health = Arc::new(HealthMonitor::new(health_config(app)));
    let mut builder = PaymentOrchestrator::builder()
        .with_ledger(ledger)
        .with_backend(backend)
        .with_signer(signer)
        .with_health(health)
        .with_poller_config(poller_config(app))
        .with_config(orchestrator_config(app));

    if let Some(observer) = observer {
        builder = builder.with_observer(observer);
    }
    if let Some(store) = store {
        builder = builder.with_store(store);
    }

    Ok(builder.build()?)
}
