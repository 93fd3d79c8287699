pub mod approve;
pub mod batched;
pub mod context;
pub mod direct;
pub mod ledger;
pub mod permit;
pub mod pipeline;
pub mod selector;
pub mod signer;

#[cfg(test)]
pub(crate) mod testutil;

pub use approve::ApproveThenExecuteStrategy;
pub use batched::BatchedStrategy;
pub use context::{
    AttemptArtifacts, ContractAddresses, ExecutionStrategy, FlowListener, FlowTimeouts, PhaseClock,
    StrategyContext, StrategyOutcome,
};
pub use direct::{DelegatedStrategy, DirectCallStrategy};
pub use ledger::{LedgerClient, TxReceipt, TxStatus};
pub use permit::PermitStrategy;
pub use pipeline::run_backend_pipeline;
pub use selector::StrategySelector;
pub use signer::{PermitRequest, WalletSigner};

use payflow_types::PaymentStrategy;

/// Instantiate the execution procedure for a selected strategy
pub fn strategy_for(kind: PaymentStrategy) -> Box<dyn ExecutionStrategy> {
    match kind {
        PaymentStrategy::PermitSignature => Box::new(PermitStrategy),
        PaymentStrategy::ApproveThenExecute => Box::new(ApproveThenExecuteStrategy),
        PaymentStrategy::Batched => Box::new(BatchedStrategy),
        PaymentStrategy::Delegated => Box::new(DelegatedStrategy),
        PaymentStrategy::DirectCall => Box::new(DirectCallStrategy),
    }
}
