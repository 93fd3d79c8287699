use crate::ExponentialBackoff;
use payflow_types::{BackendStatus, HealthMetrics, PaymentError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const STATE_CLOSED: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_HALF_OPEN: u8 = 2;

/// Weight of the newest sample in the rolling averages
const EWMA_ALPHA: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// Base delay for the retry/backoff schedule
    pub base_retry_delay: Duration,

    /// Cap for the retry/backoff schedule
    pub max_retry_delay: Duration,

    /// Average latency above which the backend is reported degraded
    pub degraded_latency: Duration,

    /// Success rate below which the backend is reported degraded
    pub degraded_success_rate: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            base_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
            degraded_latency: Duration::from_secs(2),
            degraded_success_rate: 0.9,
        }
    }
}

/// Tracks the signing backend's recent reliability across all payment
/// attempts in the process.
///
/// All state is atomic; attempts update it concurrently without locking.
/// The breaker opens after `failure_threshold` consecutive failures and
/// admits one probe per backoff window thereafter (half-open), closing again
/// on the first probe success.
pub struct HealthMonitor {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    /// How many times the breaker has opened without an intervening success;
    /// drives the backoff exponent
    open_count: AtomicU32,
    next_retry_at_ms: AtomicU64,
    avg_latency_us: AtomicU64,
    /// Success-rate EWMA scaled by 1000
    success_rate_milli: AtomicU64,
    total_calls: AtomicU64,
    backoff: ExponentialBackoff,
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        let backoff = ExponentialBackoff::new(config.base_retry_delay, config.max_retry_delay);
        Self {
            state: AtomicU8::new(STATE_CLOSED),
            consecutive_failures: AtomicU32::new(0),
            open_count: AtomicU32::new(0),
            next_retry_at_ms: AtomicU64::new(0),
            avg_latency_us: AtomicU64::new(0),
            success_rate_milli: AtomicU64::new(1000),
            total_calls: AtomicU64::new(0),
            backoff,
            config,
        }
    }

    /// Mediate one backend operation: reject without calling while the
    /// circuit is open, otherwise time the call and record its outcome.
    ///
    /// The operation must enforce its own timeout; the monitor never blocks.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T, PaymentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PaymentError>>,
    {
        if !self.admit() {
            return Err(PaymentError::backend_unavailable(
                "circuit breaker open, backend calls suspended",
            ));
        }

        let started = tokio::time::Instant::now();
        match op().await {
            Ok(value) => {
                self.record_success(started.elapsed());
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Whether a call would currently be admitted
    pub fn is_available(&self) -> bool {
        match self.state.load(Ordering::Relaxed) {
            STATE_CLOSED => true,
            _ => now_ms() >= self.next_retry_at_ms.load(Ordering::Relaxed),
        }
    }

    fn admit(&self) -> bool {
        match self.state.load(Ordering::Relaxed) {
            STATE_CLOSED => true,
            STATE_OPEN => self.try_probe(STATE_OPEN),
            _ => self.try_probe(STATE_HALF_OPEN),
        }
    }

    /// Admit a single probe per backoff window: the winning caller moves the
    /// retry horizon forward so concurrent attempts keep being rejected
    fn try_probe(&self, from_state: u8) -> bool {
        let now = now_ms();
        let next_retry = self.next_retry_at_ms.load(Ordering::Relaxed);
        if now < next_retry {
            return false;
        }

        let horizon = now + self.config.base_retry_delay.as_millis() as u64;
        if self
            .next_retry_at_ms
            .compare_exchange(next_retry, horizon, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        if from_state == STATE_OPEN {
            self.state.store(STATE_HALF_OPEN, Ordering::SeqCst);
            tracing::info!("backend circuit breaker half-open, probing");
        }
        true
    }

    pub fn record_success(&self, latency: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.update_latency(latency);
        self.update_success_rate(true);

        let prev = self.state.swap(STATE_CLOSED, Ordering::SeqCst);
        if prev != STATE_CLOSED {
            self.open_count.store(0, Ordering::Relaxed);
            self.next_retry_at_ms.store(0, Ordering::Relaxed);
            tracing::info!("backend circuit breaker closed");
        }
    }

    pub fn record_failure(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.update_success_rate(false);
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;

        match self.state.load(Ordering::Relaxed) {
            STATE_CLOSED => {
                if failures >= self.config.failure_threshold {
                    self.open(failures);
                }
            }
            STATE_HALF_OPEN => {
                // Failed probe goes straight back to open with a longer wait
                self.open(failures);
            }
            _ => {}
        }
    }

    fn open(&self, failures: u32) {
        let opens = self.open_count.fetch_add(1, Ordering::SeqCst);
        let delay = self.backoff.delay_for(opens);
        self.next_retry_at_ms
            .store(now_ms() + delay.as_millis() as u64, Ordering::SeqCst);
        self.state.store(STATE_OPEN, Ordering::SeqCst);
        tracing::warn!(
            consecutive_failures = failures,
            retry_in_ms = delay.as_millis() as u64,
            "backend circuit breaker opened"
        );
    }

    /// Re-arm the probe window immediately so the next mediated call goes
    /// through regardless of the backoff horizon
    pub fn force_health_check(&self) -> HealthMetrics {
        if self.state.load(Ordering::Relaxed) != STATE_CLOSED {
            self.next_retry_at_ms.store(now_ms(), Ordering::SeqCst);
        }
        self.metrics()
    }

    /// Backoff-derived delay callers should wait before their next retry
    pub fn current_retry_delay(&self) -> Duration {
        let failures = self.consecutive_failures.load(Ordering::Relaxed);
        if failures == 0 {
            return Duration::ZERO;
        }
        self.backoff.delay_for(failures.saturating_sub(1))
    }

    pub fn metrics(&self) -> HealthMetrics {
        let state = self.state.load(Ordering::Relaxed);
        let total = self.total_calls.load(Ordering::Relaxed);
        let success_rate = self.success_rate_milli.load(Ordering::Relaxed) as f64 / 1000.0;
        let avg_latency = Duration::from_micros(self.avg_latency_us.load(Ordering::Relaxed));
        let next_retry = self.next_retry_at_ms.load(Ordering::Relaxed);
        let circuit_open = state != STATE_CLOSED;

        let status = if total == 0 {
            BackendStatus::Unknown
        } else if state == STATE_HALF_OPEN {
            BackendStatus::Recovering
        } else if state == STATE_OPEN {
            if now_ms() >= next_retry {
                BackendStatus::Recovering
            } else {
                BackendStatus::Unavailable
            }
        } else if success_rate < self.config.degraded_success_rate
            || avg_latency > self.config.degraded_latency
        {
            BackendStatus::Degraded
        } else {
            BackendStatus::Healthy
        };

        HealthMetrics {
            status,
            retry_delay: self.current_retry_delay(),
            avg_response_time: avg_latency,
            success_rate,
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            circuit_open,
            next_retry_at: circuit_open.then_some(next_retry),
        }
    }

    fn update_latency(&self, sample: Duration) {
        let sample_us = sample.as_micros() as u64;
        let old = self.avg_latency_us.load(Ordering::Relaxed);
        let new = if old == 0 {
            sample_us
        } else {
            (old as f64 * (1.0 - EWMA_ALPHA) + sample_us as f64 * EWMA_ALPHA) as u64
        };
        self.avg_latency_us.store(new, Ordering::Relaxed);
    }

    fn update_success_rate(&self, success: bool) {
        let sample = if success { 1000.0 } else { 0.0 };
        let old = self.success_rate_milli.load(Ordering::Relaxed) as f64;
        let new = (old * (1.0 - EWMA_ALPHA) + sample * EWMA_ALPHA) as u64;
        self.success_rate_milli.store(new, Ordering::Relaxed);
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
