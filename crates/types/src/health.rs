use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Signing backend availability as seen by the health monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendStatus {
    Healthy,
    Degraded,
    Unavailable,
    Recovering,
    Unknown,
}

/// Read-only view of the health monitor's rolling state.
///
/// Mutated only by the monitor after every mediated backend call; read by
/// the signature poller and the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub status: BackendStatus,

    /// Backoff-derived delay callers should wait before retrying
    pub retry_delay: Duration,

    /// Exponentially-weighted rolling average response time
    pub avg_response_time: Duration,

    /// Rolling success rate in [0, 1]
    pub success_rate: f64,

    pub consecutive_failures: u32,

    /// True while the circuit breaker rejects calls
    pub circuit_open: bool,

    /// Unix millis after which a probe call is admitted, when open
    pub next_retry_at: Option<u64>,
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self {
            status: BackendStatus::Unknown,
            retry_delay: Duration::ZERO,
            avg_response_time: Duration::ZERO,
            success_rate: 1.0,
            consecutive_failures: 0,
            circuit_open: false,
            next_retry_at: None,
        }
    }
}

impl HealthMetrics {
    pub fn is_available(&self) -> bool {
        !self.circuit_open
    }
}
