use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A user's request to purchase a piece of content, fixed for the lifetime
/// of one payment attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Content being purchased
    pub content_id: String,

    /// Creator receiving the payment
    pub creator: String,

    /// Payment amount in token base units
    pub amount: u128,

    /// Maximum acceptable slippage as a fraction (e.g. 0.01 = 1%)
    pub max_slippage: Decimal,

    /// Absolute deadline (unix seconds) after which the payment must not settle
    pub deadline: u64,

    /// Paying user's address
    pub payer: String,

    /// Session identifier for resumable flows
    pub session_id: Option<String>,

    /// Free-form metadata passed through to the backend
    pub metadata: Option<serde_json::Value>,
}

impl PaymentRequest {
    pub fn builder() -> PaymentRequestBuilder {
        PaymentRequestBuilder::default()
    }

    /// Canonical fingerprint over the economically meaningful fields,
    /// stable across serialization formats
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content_id.as_bytes());
        hasher.update(self.creator.as_bytes());
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.deadline.to_le_bytes());
        hasher.update(self.payer.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check whether the request deadline has passed
    pub fn is_expired(&self, current_time: u64) -> bool {
        current_time >= self.deadline
    }
}

/// Builder error
#[derive(Debug, Error)]
pub enum RequestBuildError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("max_slippage must be non-negative")]
    NegativeSlippage,
}

/// Builder for payment requests
#[derive(Debug, Default)]
pub struct PaymentRequestBuilder {
    content_id: Option<String>,
    creator: Option<String>,
    amount: Option<u128>,
    max_slippage: Option<Decimal>,
    deadline: Option<u64>,
    payer: Option<String>,
    session_id: Option<String>,
    metadata: Option<serde_json::Value>,
}

impl PaymentRequestBuilder {
    pub fn content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn amount(mut self, amount: u128) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn max_slippage(mut self, max_slippage: Decimal) -> Self {
        self.max_slippage = Some(max_slippage);
        self
    }

    pub fn deadline(mut self, deadline: u64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> Result<PaymentRequest, RequestBuildError> {
        let content_id = self
            .content_id
            .ok_or(RequestBuildError::MissingField { field: "content_id" })?;
        let creator = self
            .creator
            .ok_or(RequestBuildError::MissingField { field: "creator" })?;
        let amount = self
            .amount
            .ok_or(RequestBuildError::MissingField { field: "amount" })?;
        let deadline = self
            .deadline
            .ok_or(RequestBuildError::MissingField { field: "deadline" })?;
        let payer = self
            .payer
            .ok_or(RequestBuildError::MissingField { field: "payer" })?;

        if amount == 0 {
            return Err(RequestBuildError::ZeroAmount);
        }

        let max_slippage = self.max_slippage.unwrap_or_default();
        if max_slippage.is_sign_negative() {
            return Err(RequestBuildError::NegativeSlippage);
        }

        Ok(PaymentRequest {
            content_id,
            creator,
            amount,
            max_slippage,
            deadline,
            payer,
            session_id: self.session_id,
            metadata: self.metadata,
        })
    }
}
