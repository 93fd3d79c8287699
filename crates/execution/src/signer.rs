use async_trait::async_trait;
use payflow_types::{AccountType, PaymentError};
use serde::{Deserialize, Serialize};

/// Payload the wallet is asked to authorize off-chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitRequest {
    pub token: String,
    pub spender: String,
    pub amount: u128,
    pub nonce: u64,
    pub deadline: u64,
}

/// The connected wallet.
///
/// `sign_permit` may never resolve on its own timetable: the user can sit
/// on the prompt indefinitely or dismiss it, which implementations must
/// surface as `PaymentError::UserRejected`.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Currently connected address
    fn address(&self) -> String;

    /// Detect what kind of account is connected
    async fn account_type(&self) -> Result<AccountType, PaymentError>;

    /// Chain the wallet is currently on
    async fn chain_id(&self) -> Result<u64, PaymentError>;

    /// Produce a typed-data signature over the permit payload
    async fn sign_permit(&self, permit: &PermitRequest) -> Result<String, PaymentError>;
}
