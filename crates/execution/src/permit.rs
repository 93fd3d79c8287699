use crate::context::{ExecutionStrategy, StrategyContext, StrategyOutcome};
use crate::pipeline::run_backend_pipeline;
use crate::signer::PermitRequest;
use async_trait::async_trait;
use payflow_types::{
    IntentSubmission, PaymentError, PaymentFlowState, PaymentRequest, PaymentStrategy,
    PermitPayload, TimedPhase,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Permit flow: one off-chain authorization covering token, amount,
/// spender, deadline and replay counter, consumed by a single transaction.
///
/// The fastest strategy when available: no separate approval confirmation
/// sits on the critical path.
pub struct PermitStrategy;

#[async_trait]
impl ExecutionStrategy for PermitStrategy {
    fn kind(&self) -> PaymentStrategy {
        PaymentStrategy::PermitSignature
    }

    async fn execute(
        &self,
        request: &PaymentRequest,
        ctx: &StrategyContext<'_>,
    ) -> Result<StrategyOutcome, PaymentError> {
        ctx.contracts.validate()?;

        let now = now_secs();
        if request.is_expired(now) {
            return Err(PaymentError::DeadlineExceeded);
        }

        ctx.listener.on_transition(PaymentFlowState::SigningPermit);
        ctx.clock.start(TimedPhase::Preparation);

        // The quote must still be honest before asking the user to sign
        let current_price = ctx.ledger.current_price(&request.content_id).await?;
        check_slippage(request, current_price)?;

        let nonce = ctx.ledger.permit_nonce(&request.payer).await?;
        let deadline = request
            .deadline
            .min(now + ctx.timeouts.permit_ttl.as_secs());

        let permit_request = PermitRequest {
            token: ctx.contracts.token.clone(),
            spender: ctx.contracts.marketplace.clone(),
            amount: request.amount,
            nonce,
            deadline,
        };

        debug!(payer = %request.payer, nonce, deadline, "requesting permit signature");
        let signature = ctx.signer.sign_permit(&permit_request).await?;

        let submission = IntentSubmission::with_permit(PermitPayload {
            token: permit_request.token,
            spender: permit_request.spender,
            amount: permit_request.amount,
            nonce: permit_request.nonce,
            deadline: permit_request.deadline,
            signature,
        });

        run_backend_pipeline(request, submission, ctx).await
    }
}

/// Reject when the live price drifted above the requested amount by more
/// than the allowed slippage
pub(crate) fn check_slippage(
    request: &PaymentRequest,
    current_price: u128,
) -> Result<(), PaymentError> {
    let bps = (request.max_slippage * Decimal::from(10_000u64))
        .to_u128()
        .unwrap_or(0);
    let allowed = request
        .amount
        .saturating_add(request.amount.saturating_mul(bps) / 10_000);

    if current_price > allowed {
        return Err(PaymentError::SlippageExceeded {
            quoted: request.amount,
            current: current_price,
        });
    }
    Ok(())
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
