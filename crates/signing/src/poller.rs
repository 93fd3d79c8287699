use crate::SigningBackend;
use payflow_health::HealthMonitor;
use payflow_types::{BackendStatus, PaymentError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Caller-visible poll budget
    pub max_attempts: u32,

    /// Interval between polls while the backend is healthy
    pub base_interval: Duration,

    /// Interval ceiling, also used right after a failed poll
    pub max_interval: Duration,

    /// In-place retries for one poll that hits a transient error
    pub transient_retry_limit: u32,

    /// Consecutive failed polls before the underlying error is surfaced
    /// instead of burning the remaining attempt budget
    pub max_consecutive_failures: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 45,
            base_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            transient_retry_limit: 3,
            max_consecutive_failures: 5,
        }
    }
}

/// Repeatedly asks the backend whether an intent has been authorized.
///
/// The interval adapts to the health monitor's view: short while healthy,
/// stretched by reported latency, longest immediately after a failed poll.
/// Cancellation is observed at every suspension point.
pub struct SignaturePoller {
    backend: Arc<dyn SigningBackend>,
    health: Arc<HealthMonitor>,
    config: PollerConfig,
}

impl SignaturePoller {
    pub fn new(
        backend: Arc<dyn SigningBackend>,
        health: Arc<HealthMonitor>,
        config: PollerConfig,
    ) -> Self {
        Self {
            backend,
            health,
            config,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll until a signature arrives, the attempt budget is exhausted
    /// (`SignatureTimeout`), the backend stays unreachable
    /// (`BackendUnavailable`), or the caller cancels.
    pub async fn wait_for_signature(
        &self,
        intent_id: &str,
        cancel: &mut watch::Receiver<bool>,
        on_attempt: &(dyn Fn(u32, u32) + Send + Sync),
    ) -> Result<String, PaymentError> {
        let mut consecutive_failures = 0u32;
        let mut last_error: Option<PaymentError> = None;

        for attempt in 1..=self.config.max_attempts {
            if *cancel.borrow() {
                return Err(PaymentError::Cancelled);
            }
            on_attempt(attempt, self.config.max_attempts);

            match self.poll_once(intent_id, cancel).await {
                Ok(Some(signature)) => {
                    debug!(intent_id = %intent_id, attempt, "signature received");
                    return Ok(signature);
                }
                Ok(None) => {
                    consecutive_failures = 0;
                    last_error = None;
                }
                Err(PaymentError::Cancelled) => return Err(PaymentError::Cancelled),
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        warn!(
                            intent_id = %intent_id,
                            attempt,
                            error = %e,
                            "giving up polling, backend persistently failing"
                        );
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }

            let interval = self.poll_interval(last_error.is_some());
            sleep_cancellable(interval, cancel).await?;
        }

        Err(PaymentError::SignatureTimeout {
            attempts: self.config.max_attempts,
        })
    }

    /// One caller-visible poll; transient network errors are retried in
    /// place without touching the attempt budget
    async fn poll_once(
        &self,
        intent_id: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Option<String>, PaymentError> {
        let mut transient = 0u32;
        loop {
            if *cancel.borrow() {
                return Err(PaymentError::Cancelled);
            }

            match self
                .health
                .call(|| self.backend.signature_status(intent_id))
                .await
            {
                Ok(status) => {
                    return Ok(if status.is_signed { status.signature } else { None });
                }
                Err(e @ PaymentError::Network { .. }) => {
                    transient += 1;
                    if transient >= self.config.transient_retry_limit {
                        return Err(e);
                    }
                    debug!(
                        intent_id = %intent_id,
                        retry = transient,
                        error = %e,
                        "transient poll error, retrying in place"
                    );
                    sleep_cancellable(Duration::from_millis(250), cancel).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn poll_interval(&self, last_poll_failed: bool) -> Duration {
        if last_poll_failed {
            return self.config.max_interval;
        }

        let metrics = self.health.metrics();
        let base = match metrics.status {
            BackendStatus::Healthy | BackendStatus::Unknown => self.config.base_interval,
            BackendStatus::Degraded | BackendStatus::Recovering => self.config.base_interval * 2,
            BackendStatus::Unavailable => metrics.retry_delay.max(self.config.base_interval),
        };

        // Slow backends get proportionally more room between polls
        (base + metrics.avg_response_time).min(self.config.max_interval)
    }
}

async fn sleep_cancellable(
    duration: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), PaymentError> {
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        changed = cancel.changed() => {
            if changed.is_err() || *cancel.borrow() {
                Err(PaymentError::Cancelled)
            } else {
                Ok(())
            }
        }
    }
}
