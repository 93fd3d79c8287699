use payflow_types::{AccountType, PaymentError, PaymentStrategy};

/// Maps the detected account type to the ordered list of viable strategies
pub struct StrategySelector;

impl StrategySelector {
    /// Eligible strategies for the account, highest preference first.
    ///
    /// Disconnected accounts get an empty list; callers must fail fast.
    pub fn eligible(account: AccountType) -> Vec<PaymentStrategy> {
        let mut candidates = match account {
            AccountType::Smart => vec![PaymentStrategy::Batched, PaymentStrategy::DirectCall],
            AccountType::CustodialSocial => {
                vec![PaymentStrategy::Delegated, PaymentStrategy::DirectCall]
            }
            AccountType::ExternallyOwned => vec![
                PaymentStrategy::PermitSignature,
                PaymentStrategy::ApproveThenExecute,
                PaymentStrategy::DirectCall,
            ],
            AccountType::Disconnected => Vec::new(),
        };
        candidates.sort_by_key(|s| s.priority());
        candidates
    }

    /// Pick the best eligible strategy, or a configuration error when the
    /// candidate list is empty
    pub fn select(account: AccountType) -> Result<PaymentStrategy, PaymentError> {
        Self::eligible(account)
            .into_iter()
            .next()
            .ok_or_else(|| {
                PaymentError::configuration(format!(
                    "no payment strategy available for account type {account:?}"
                ))
            })
    }
}
