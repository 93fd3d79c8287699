use crate::context::{ExecutionStrategy, StrategyContext, StrategyOutcome};
use crate::pipeline::run_backend_pipeline;
use async_trait::async_trait;
use payflow_types::{
    IntentSubmission, PaymentError, PaymentRequest, PaymentStrategy, TimedPhase,
};

/// Direct flow: a plain ledger call intent with no on-chain preparation
pub struct DirectCallStrategy;

#[async_trait]
impl ExecutionStrategy for DirectCallStrategy {
    fn kind(&self) -> PaymentStrategy {
        PaymentStrategy::DirectCall
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

        run_backend_pipeline(
            request,
            IntentSubmission::plain(PaymentStrategy::DirectCall),
            ctx,
        )
        .await
    }
}

/// Delegated flow for custodial social accounts: the custodian co-signs
/// the intent, so no wallet prompt and no on-chain preparation
pub struct DelegatedStrategy;

#[async_trait]
impl ExecutionStrategy for DelegatedStrategy {
    fn kind(&self) -> PaymentStrategy {
        PaymentStrategy::Delegated
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

        run_backend_pipeline(
            request,
            IntentSubmission::plain(PaymentStrategy::Delegated),
            ctx,
        )
        .await
    }
}
