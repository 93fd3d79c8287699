use async_trait::async_trait;
use payflow_types::{IntentSubmission, PaymentError, PaymentRequest};
use serde::{Deserialize, Serialize};

/// Authorization state of a payment intent on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureStatus {
    pub is_signed: bool,
    pub signature: Option<String>,
}

impl SignatureStatus {
    pub fn pending() -> Self {
        Self {
            is_signed: false,
            signature: None,
        }
    }

    pub fn signed(signature: impl Into<String>) -> Self {
        Self {
            is_signed: true,
            signature: Some(signature.into()),
        }
    }
}

/// The signing/authorization backend.
///
/// Reachability is exactly what the health monitor tracks; every call made
/// through the orchestrator is mediated by it.
#[async_trait]
pub trait SigningBackend: Send + Sync {
    /// Register a payment intent, returning its identifier
    async fn create_intent(
        &self,
        request: &PaymentRequest,
        submission: &IntentSubmission,
    ) -> Result<String, PaymentError>;

    /// Ask whether the intent has been authorized yet
    async fn signature_status(&self, intent_id: &str) -> Result<SignatureStatus, PaymentError>;

    /// Consume the authorization and execute the purchase, returning the
    /// transaction hash
    async fn execute_with_signature(
        &self,
        intent_id: &str,
        signature: &str,
    ) -> Result<String, PaymentError>;
}
