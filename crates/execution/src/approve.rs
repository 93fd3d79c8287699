use crate::context::{ExecutionStrategy, StrategyContext, StrategyOutcome};
use crate::pipeline::{await_receipt, run_backend_pipeline};
use async_trait::async_trait;
use payflow_types::{
    IntentSubmission, PaymentError, PaymentFlowState, PaymentRequest, PaymentStrategy, TimedPhase,
};
use tracing::{debug, info};

/// Approve-then-execute flow: a separate approval transaction when the
/// current allowance is short, then the purchase.
///
/// Two sequential confirmations sit on the critical path, making this the
/// slowest strategy; each confirmation gets its own bounded timeout.
pub struct ApproveThenExecuteStrategy;

#[async_trait]
impl ExecutionStrategy for ApproveThenExecuteStrategy {
    fn kind(&self) -> PaymentStrategy {
        PaymentStrategy::ApproveThenExecute
    }

    async fn execute(
        &self,
        request: &PaymentRequest,
        ctx: &StrategyContext<'_>,
    ) -> Result<StrategyOutcome, PaymentError> {
        ctx.contracts.validate()?;
        ctx.clock.start(TimedPhase::Preparation);

        let balance = ctx.ledger.balance_of(&request.payer).await?;
        if balance < request.amount {
            return Err(PaymentError::InsufficientFunds {
                required: request.amount,
                available: balance,
            });
        }

        let allowance = ctx
            .ledger
            .allowance(&request.payer, &ctx.contracts.marketplace)
            .await?;

        if allowance < request.amount {
            ctx.listener.on_transition(PaymentFlowState::ApprovingTokens);
            debug!(
                payer = %request.payer,
                allowance,
                required = request.amount,
                "allowance insufficient, submitting approval"
            );

            let approval_tx = ctx
                .ledger
                .submit_approval(&request.payer, &ctx.contracts.marketplace, request.amount)
                .await?;
            await_receipt(ctx.ledger, &approval_tx, ctx.timeouts.approval_confirmation).await?;
            info!(tx_hash = %approval_tx, "approval confirmed");
        } else {
            debug!(
                payer = %request.payer,
                allowance,
                "allowance sufficient, skipping approval"
            );
        }

        run_backend_pipeline(
            request,
            IntentSubmission::plain(PaymentStrategy::ApproveThenExecute),
            ctx,
        )
        .await
    }
}
