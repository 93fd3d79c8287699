//! Configuration validation

use crate::{AppConfig, ConfigError, Result};

/// Validate a loaded configuration before it is wired into components.
///
/// Catches values that would make the flow misbehave silently rather than
/// fail loudly at runtime.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.poller.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "poller.max_attempts must be greater than zero".to_string(),
        ));
    }

    if config.poller.base_interval_ms > config.poller.max_interval_ms {
        return Err(ConfigError::ValidationError(
            "poller.base_interval_ms must not exceed poller.max_interval_ms".to_string(),
        ));
    }

    if config.health.failure_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "health.failure_threshold must be greater than zero".to_string(),
        ));
    }

    if config.health.base_retry_delay_ms > config.health.max_retry_delay_ms {
        return Err(ConfigError::ValidationError(
            "health.base_retry_delay_ms must not exceed health.max_retry_delay_ms".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.health.degraded_success_rate) {
        return Err(ConfigError::ValidationError(
            "health.degraded_success_rate must be within [0, 1]".to_string(),
        ));
    }

    if config.timeouts.approval_confirmation_secs == 0
        || config.timeouts.purchase_confirmation_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "confirmation timeouts must be greater than zero".to_string(),
        ));
    }

    if config.contracts.token_address.is_empty() != config.contracts.marketplace_address.is_empty()
    {
        return Err(ConfigError::ValidationError(
            "contracts require both token_address and marketplace_address".to_string(),
        ));
    }

    Ok(())
}
