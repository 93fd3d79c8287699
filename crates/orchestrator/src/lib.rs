pub mod events;
pub mod orchestrator;
pub mod recovery;
pub mod sqlite_store;
pub mod store;


// Re-export main types
pub use events::{NoopObserver, PaymentObserver};
pub use orchestrator::{
    BuilderError, OrchestratorConfig, OrchestratorError, PaymentOrchestrator,
    PaymentOrchestratorBuilder,
};
pub use recovery::{RecoveryConfig, RecoveryEngine, RecoveryPlan};
pub use sqlite_store::SqliteSessionStore;
pub use store::{MemorySessionStore, SessionRecord, SessionStore, StoreError};
