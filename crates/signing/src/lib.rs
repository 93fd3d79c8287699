pub mod client;
pub mod poller;

pub use client::{SignatureStatus, SigningBackend};
pub use poller::{PollerConfig, SignaturePoller};
