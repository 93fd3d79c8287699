use crate::{LedgerClient, StrategyContext, StrategyOutcome, TxReceipt, TxStatus};
use payflow_types::{IntentSubmission, PaymentError, PaymentFlowState, PaymentRequest, TimedPhase};
use std::time::Duration;
use tracing::{debug, info};

/// The backend pipeline shared by every strategy once its preparation is
/// done: create intent, wait for the authorization signature, execute the
/// purchase, await the receipt.
///
/// Cancellation is honored up to the point a transaction hash exists;
/// after broadcast the flow runs to its terminal outcome.
pub async fn run_backend_pipeline(
    request: &PaymentRequest,
    submission: IntentSubmission,
    ctx: &StrategyContext<'_>,
) -> Result<StrategyOutcome, PaymentError> {
    let strategy = submission.strategy;

    if ctx.is_cancelled() {
        return Err(PaymentError::Cancelled);
    }

    // Intent creation, mediated by the health monitor: an open breaker
    // rejects here without a live backend call
    ctx.listener
        .on_transition(PaymentFlowState::CreatingIntent { strategy });
    ctx.clock.start(TimedPhase::IntentCreation);
    let intent_id = ctx
        .health
        .call(|| ctx.backend.create_intent(request, &submission))
        .await?;
    ctx.record_intent(&intent_id);
    debug!(intent_id = %intent_id, strategy = %strategy, "payment intent created");

    // Signature acquisition
    ctx.listener.on_transition(PaymentFlowState::WaitingSignature {
        intent_id: intent_id.clone(),
    });
    ctx.clock.start(TimedPhase::SignatureWait);
    let listener = ctx.listener;
    let mut cancel = ctx.cancel.clone();
    let signature = ctx
        .poller
        .wait_for_signature(&intent_id, &mut cancel, &|attempt, max| {
            listener.on_signature_poll(attempt, max)
        })
        .await?;
    ctx.record_signature(&signature);

    if ctx.is_cancelled() {
        return Err(PaymentError::Cancelled);
    }

    // Execution: once this returns a hash the transaction is broadcast and
    // cancellation is no longer possible
    ctx.listener
        .on_transition(PaymentFlowState::ExecutingPurchase { tx_hash: None });
    ctx.clock.start(TimedPhase::Execution);
    let tx_hash = ctx
        .health
        .call(|| ctx.backend.execute_with_signature(&intent_id, &signature))
        .await?;
    ctx.record_tx_hash(&tx_hash);
    ctx.listener.on_transition(PaymentFlowState::ExecutingPurchase {
        tx_hash: Some(tx_hash.clone()),
    });

    // Confirmation
    ctx.listener.on_transition(PaymentFlowState::Confirming {
        tx_hash: tx_hash.clone(),
    });
    ctx.clock.start(TimedPhase::Confirmation);
    let receipt = await_receipt(ctx.ledger, &tx_hash, ctx.timeouts.purchase_confirmation).await?;
    ctx.clock.finish();

    info!(
        intent_id = %intent_id,
        tx_hash = %tx_hash,
        block = receipt.block_number,
        "purchase confirmed"
    );

    Ok(StrategyOutcome {
        intent_id,
        tx_hash,
        signature: Some(signature),
    })
}

/// Wait for a receipt under a hard deadline enforced on our side as well,
/// mapping a reverted transaction to its typed error
pub async fn await_receipt(
    ledger: &dyn LedgerClient,
    tx_hash: &str,
    timeout: Duration,
) -> Result<TxReceipt, PaymentError> {
    let receipt = match tokio::time::timeout(timeout, ledger.wait_for_receipt(tx_hash, timeout))
        .await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(PaymentError::ConfirmationTimeout {
                tx_hash: tx_hash.to_string(),
            })
        }
    };

    match receipt.status {
        TxStatus::Confirmed => Ok(receipt),
        TxStatus::Reverted { ref reason } => Err(PaymentError::ExecutionReverted {
            tx_hash: tx_hash.to_string(),
            reason: reason.clone(),
        }),
    }
}
