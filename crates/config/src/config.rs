//! Core configuration structures for Payflow

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Network/logging configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// On-chain contract addresses
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Signing backend health tracking
    #[serde(default)]
    pub health: HealthSettings,

    /// Signature polling
    #[serde(default)]
    pub poller: PollerSettings,

    /// Error recovery
    #[serde(default)]
    pub recovery: RecoverySettings,

    /// Per-step timeout budgets
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Duration estimation shown to users
    #[serde(default)]
    pub estimates: EstimateSettings,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

/// Network environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Contract addresses the execution strategies submit against
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractsConfig {
    #[serde(default)]
    pub token_address: String,

    #[serde(default)]
    pub marketplace_address: String,
}

/// Health monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_base_retry_delay_ms")]
    pub base_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Average latency above which the backend is reported degraded
    #[serde(default = "default_degraded_latency_ms")]
    pub degraded_latency_ms: u64,

    /// Success rate below which the backend is reported degraded
    #[serde(default = "default_degraded_success_rate")]
    pub degraded_success_rate: f64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            base_retry_delay_ms: default_base_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            degraded_latency_ms: default_degraded_latency_ms(),
            degraded_success_rate: default_degraded_success_rate(),
        }
    }
}

/// Signature poller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// In-place retries for a poll that hits a transient error
    #[serde(default = "default_transient_retry_limit")]
    pub transient_retry_limit: u32,

    /// Consecutive failed polls before the underlying error is surfaced
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_interval_ms: default_base_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            transient_retry_limit: default_transient_retry_limit(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Recovery engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySettings {
    /// Silent retries before a would-be automatic retry turns fatal
    #[serde(default = "default_max_auto_retries")]
    pub max_auto_retries: u32,

    /// Minimum wait between automatic retries
    #[serde(default = "default_retry_floor_ms")]
    pub retry_floor_ms: u64,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            max_auto_retries: default_max_auto_retries(),
            retry_floor_ms: default_retry_floor_ms(),
        }
    }
}

/// Per-suspension-point timeout budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_confirmation_secs")]
    pub approval_confirmation_secs: u64,

    #[serde(default = "default_confirmation_secs")]
    pub purchase_confirmation_secs: u64,

    /// Lifetime granted to a freshly signed permit
    #[serde(default = "default_permit_ttl_secs")]
    pub permit_ttl_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            approval_confirmation_secs: default_confirmation_secs(),
            purchase_confirmation_secs: default_confirmation_secs(),
            permit_ttl_secs: default_permit_ttl_secs(),
        }
    }
}

/// Duration estimation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateSettings {
    /// Baseline wall-clock estimate for a healthy flow
    #[serde(default = "default_base_estimate_secs")]
    pub base_estimate_secs: u64,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        Self {
            base_estimate_secs: default_base_estimate_secs(),
        }
    }
}

fn default_environment() -> Environment {
    Environment::Testnet
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_base_retry_delay_ms() -> u64 {
    1_000
}

fn default_max_retry_delay_ms() -> u64 {
    60_000
}

fn default_degraded_latency_ms() -> u64 {
    2_000
}

fn default_degraded_success_rate() -> f64 {
    0.9
}

fn default_max_attempts() -> u32 {
    45
}

fn default_base_interval_ms() -> u64 {
    2_000
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_transient_retry_limit() -> u32 {
    3
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_max_auto_retries() -> u32 {
    3
}

fn default_retry_floor_ms() -> u64 {
    500
}

fn default_confirmation_secs() -> u64 {
    60
}

fn default_permit_ttl_secs() -> u64 {
    1_800
}

fn default_base_estimate_secs() -> u64 {
    45
}
