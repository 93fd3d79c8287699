use crate::context::{ExecutionStrategy, StrategyContext, StrategyOutcome};
use crate::pipeline::run_backend_pipeline;
use crate::ApproveThenExecuteStrategy;
use async_trait::async_trait;
use payflow_types::{
    IntentSubmission, PaymentError, PaymentFlowState, PaymentRequest, PaymentStrategy, TimedPhase,
};
use tracing::warn;

/// Batched flow: approval and purchase submitted as one atomic multi-call.
///
/// When the account turns out not to support atomic batches at submission
/// time, the flow falls back to approve-then-execute rather than failing
/// closed: the capability probe can race account upgrades, and the approve
/// flow is always sound.
pub struct BatchedStrategy;

#[async_trait]
impl ExecutionStrategy for BatchedStrategy {
    fn kind(&self) -> PaymentStrategy {
        PaymentStrategy::Batched
    }

    async fn execute(
        &self,
        request: &PaymentRequest,
        ctx: &StrategyContext<'_>,
    ) -> Result<StrategyOutcome, PaymentError> {
        ctx.contracts.validate()?;

        if !ctx.ledger.supports_atomic_batch(&request.payer).await? {
            warn!(
                payer = %request.payer,
                "account does not support atomic batching, falling back to approve-then-execute"
            );
            return ApproveThenExecuteStrategy.execute(request, ctx).await;
        }

        ctx.listener.on_transition(PaymentFlowState::ExecutingBatch);
        ctx.clock.start(TimedPhase::Preparation);

        let balance = ctx.ledger.balance_of(&request.payer).await?;
        if balance < request.amount {
            return Err(PaymentError::InsufficientFunds {
                required: request.amount,
                available: balance,
            });
        }

        run_backend_pipeline(
            request,
            IntentSubmission::plain(PaymentStrategy::Batched),
            ctx,
        )
        .await
    }
}
