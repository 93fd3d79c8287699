use async_trait::async_trait;
use payflow_types::PaymentError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final state of a submitted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TxStatus {
    Confirmed,
    Reverted { reason: String },
}

/// Receipt returned once a transaction is included on the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub status: TxStatus,
    pub block_number: u64,
}

impl TxReceipt {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, TxStatus::Confirmed)
    }
}

/// Read/write access to the on-chain ledger.
///
/// Implementations must distinguish a reverted transaction from a generic
/// failure and must honor the caller-supplied receipt timeout.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current purchase price of the content in token base units
    async fn current_price(&self, content_id: &str) -> Result<u128, PaymentError>;

    /// Payer's token balance
    async fn balance_of(&self, owner: &str) -> Result<u128, PaymentError>;

    /// Current spending allowance granted by `owner` to `spender`
    async fn allowance(&self, owner: &str, spender: &str) -> Result<u128, PaymentError>;

    /// Replay-protection counter for permit authorizations
    async fn permit_nonce(&self, owner: &str) -> Result<u64, PaymentError>;

    /// Submit an approval transaction, returning its hash
    async fn submit_approval(
        &self,
        owner: &str,
        spender: &str,
        amount: u128,
    ) -> Result<String, PaymentError>;

    /// Wait until the transaction is included, up to `timeout`
    async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
    ) -> Result<TxReceipt, PaymentError>;

    /// Whether the account can execute atomic multi-call batches
    async fn supports_atomic_batch(&self, account: &str) -> Result<bool, PaymentError>;

    /// Identifier of the chain this client is connected to
    async fn chain_id(&self) -> Result<u64, PaymentError>;
}
