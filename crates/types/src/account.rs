use serde::{Deserialize, Serialize};

/// Kind of account the payer is connected with, detected at the start of
/// each attempt; determines which execution strategies are eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    /// Ordinary externally-owned account (key-pair wallet)
    ExternallyOwned,

    /// Smart/programmable account capable of atomic batched calls
    Smart,

    /// Custodial account behind a social login provider
    CustodialSocial,

    /// No wallet connected
    Disconnected,
}

impl AccountType {
    pub fn is_connected(&self) -> bool {
        !matches!(self, AccountType::Disconnected)
    }
}
