//! Health tracking for the Payflow signing backend
//!
//! This crate wraps every call to the signing backend and keeps a rolling
//! picture of its reliability:
//!
//! - `HealthMonitor`: three-state circuit breaker with rolling latency and
//!   success-rate metrics, shared across concurrent payment attempts
//! - `ExponentialBackoff`: retry delay schedule derived from consecutive
//!   failures

pub mod backoff;
pub mod monitor;

pub use backoff::ExponentialBackoff;
pub use monitor::{HealthConfig, HealthMonitor};
