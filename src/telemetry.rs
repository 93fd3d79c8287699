//! Tracing bootstrap for binaries and embedders

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize tracing: {0}")]
    Init(String),
}

/// Initialize the global tracing subscriber.
///
/// `default_directive` applies when RUST_LOG is unset, e.g.
/// "info,payflow=debug". Set `json_logs` for machine-readable output.
pub fn init(default_directive: &str, json_logs: bool) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json_logs {
        registry
            .with(fmt::layer().with_target(true).json())
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))
}
