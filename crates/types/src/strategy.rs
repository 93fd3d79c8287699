use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment execution strategies, not all available to all account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStrategy {
    /// Off-chain signed authorization consumed by a single transaction
    PermitSignature,

    /// Separate approval transaction followed by the purchase
    ApproveThenExecute,

    /// Approval and purchase submitted as one atomic batch
    Batched,

    /// Custodial backend signs on the user's behalf
    Delegated,

    /// Plain ledger call with no preparation
    DirectCall,
}

impl PaymentStrategy {
    /// Fixed global preference order; lower ranks are preferred
    pub fn priority(&self) -> u8 {
        match self {
            PaymentStrategy::PermitSignature => 0,
            PaymentStrategy::Batched => 1,
            PaymentStrategy::ApproveThenExecute => 2,
            PaymentStrategy::Delegated => 3,
            PaymentStrategy::DirectCall => 4,
        }
    }
}

impl fmt::Display for PaymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStrategy::PermitSignature => "permit-signature",
            PaymentStrategy::ApproveThenExecute => "approve-then-execute",
            PaymentStrategy::Batched => "batched",
            PaymentStrategy::Delegated => "delegated",
            PaymentStrategy::DirectCall => "direct-call",
        };
        f.write_str(name)
    }
}

/// Off-chain permit authorization produced by the wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitPayload {
    pub token: String,
    pub spender: String,
    pub amount: u128,
    pub nonce: u64,
    pub deadline: u64,
    pub signature: String,
}

/// Strategy-specific artifacts attached when creating a backend intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSubmission {
    pub strategy: PaymentStrategy,
    pub permit: Option<PermitPayload>,
}

impl IntentSubmission {
    pub fn plain(strategy: PaymentStrategy) -> Self {
        Self {
            strategy,
            permit: None,
        }
    }

    pub fn with_permit(permit: PermitPayload) -> Self {
        Self {
            strategy: PaymentStrategy::PermitSignature,
            permit: Some(permit),
        }
    }
}
