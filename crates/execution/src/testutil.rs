use crate::context::{
    AttemptArtifacts, ContractAddresses, FlowListener, FlowTimeouts, PhaseClock, StrategyContext,
};
use crate::ledger::{LedgerClient, TxReceipt, TxStatus};
use crate::signer::{PermitRequest, WalletSigner};
use async_trait::async_trait;
use payflow_health::HealthMonitor;
use payflow_signing::{PollerConfig, SignaturePoller, SignatureStatus, SigningBackend};
use payflow_types::{
    AccountType, IntentSubmission, PaymentError, PaymentFlowState, PaymentRequest,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Ledger mock with scripted balances, allowance, and batch support
pub struct MockLedger {
    pub price: AtomicU64,
    pub balance: AtomicU64,
    pub allowance: AtomicU64,
    pub nonce: AtomicU64,
    pub supports_batch: std::sync::atomic::AtomicBool,
    pub approvals: Mutex<Vec<(String, String, u128)>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            price: AtomicU64::new(1_000_000),
            balance: AtomicU64::new(10_000_000),
            allowance: AtomicU64::new(0),
            nonce: AtomicU64::new(7),
            supports_batch: std::sync::atomic::AtomicBool::new(false),
            approvals: Mutex::new(Vec::new()),
        }
    }

    pub fn approval_count(&self) -> usize {
        self.approvals.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn current_price(&self, _content_id: &str) -> Result<u128, PaymentError> {
        Ok(self.price.load(Ordering::SeqCst) as u128)
    }

    async fn balance_of(&self, _owner: &str) -> Result<u128, PaymentError> {
        Ok(self.balance.load(Ordering::SeqCst) as u128)
    }

    async fn allowance(&self, _owner: &str, _spender: &str) -> Result<u128, PaymentError> {
        Ok(self.allowance.load(Ordering::SeqCst) as u128)
    }

    async fn permit_nonce(&self, _owner: &str) -> Result<u64, PaymentError> {
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn submit_approval(
        &self,
        owner: &str,
        spender: &str,
        amount: u128,
    ) -> Result<String, PaymentError> {
        let mut approvals = self.approvals.lock().unwrap();
        approvals.push((owner.to_string(), spender.to_string(), amount));
        Ok(format!("0xapproval{}", approvals.len()))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        _timeout: Duration,
    ) -> Result<TxReceipt, PaymentError> {
        Ok(TxReceipt {
            tx_hash: tx_hash.to_string(),
            status: TxStatus::Confirmed,
            block_number: 1,
        })
    }

    async fn supports_atomic_batch(&self, _account: &str) -> Result<bool, PaymentError> {
        Ok(self.supports_batch.load(Ordering::SeqCst))
    }

    async fn chain_id(&self) -> Result<u64, PaymentError> {
        Ok(1)
    }
}

/// Backend mock that signs every intent immediately
pub struct MockBackend {
    pub intents: Mutex<Vec<IntentSubmission>>,
    pub next_intent: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            intents: Mutex::new(Vec::new()),
            next_intent: AtomicU32::new(1),
        }
    }

    pub fn last_submission(&self) -> Option<IntentSubmission> {
        self.intents.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SigningBackend for MockBackend {
    async fn create_intent(
        &self,
        _request: &PaymentRequest,
        submission: &IntentSubmission,
    ) -> Result<String, PaymentError> {
        self.intents.lock().unwrap().push(submission.clone());
        let n = self.next_intent.fetch_add(1, Ordering::SeqCst);
        Ok(format!("intent-{n}"))
    }

    async fn signature_status(&self, _intent_id: &str) -> Result<SignatureStatus, PaymentError> {
        Ok(SignatureStatus::signed("0xsig"))
    }

    async fn execute_with_signature(
        &self,
        intent_id: &str,
        _signature: &str,
    ) -> Result<String, PaymentError> {
        Ok(format!("0xpurchase-{intent_id}"))
    }
}

/// Wallet mock for an externally-owned account
pub struct MockSigner {
    pub account: AccountType,
    pub reject_permit: std::sync::atomic::AtomicBool,
    pub permits: Mutex<Vec<PermitRequest>>,
}

impl MockSigner {
    pub fn new(account: AccountType) -> Self {
        Self {
            account,
            reject_permit: std::sync::atomic::AtomicBool::new(false),
            permits: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WalletSigner for MockSigner {
    fn address(&self) -> String {
        "0xpayer".to_string()
    }

    async fn account_type(&self) -> Result<AccountType, PaymentError> {
        Ok(self.account)
    }

    async fn chain_id(&self) -> Result<u64, PaymentError> {
        Ok(1)
    }

    async fn sign_permit(&self, permit: &PermitRequest) -> Result<String, PaymentError> {
        if self.reject_permit.load(Ordering::SeqCst) {
            return Err(PaymentError::UserRejected);
        }
        self.permits.lock().unwrap().push(permit.clone());
        Ok("0xpermitsig".to_string())
    }
}

/// Listener that records every transition for assertions
#[derive(Default)]
pub struct RecordingListener {
    pub transitions: Mutex<Vec<PaymentFlowState>>,
}

impl RecordingListener {
    pub fn saw(&self, predicate: impl Fn(&PaymentFlowState) -> bool) -> bool {
        self.transitions.lock().unwrap().iter().any(|s| predicate(s))
    }
}

impl FlowListener for RecordingListener {
    fn on_transition(&self, state: PaymentFlowState) {
        self.transitions.lock().unwrap().push(state);
    }
}

/// Bundle owning everything a StrategyContext borrows
pub struct TestHarness {
    pub ledger: Arc<MockLedger>,
    pub backend: Arc<MockBackend>,
    pub signer: Arc<MockSigner>,
    pub health: Arc<HealthMonitor>,
    pub poller: SignaturePoller,
    pub listener: RecordingListener,
    pub clock: PhaseClock,
    pub artifacts: Mutex<AttemptArtifacts>,
    pub timeouts: FlowTimeouts,
    pub contracts: ContractAddresses,
    pub cancel_tx: watch::Sender<bool>,
    pub cancel_rx: watch::Receiver<bool>,
}

impl TestHarness {
    pub fn new(account: AccountType) -> Self {
        let backend = Arc::new(MockBackend::new());
        let health = Arc::new(HealthMonitor::default());
        let poller = SignaturePoller::new(
            backend.clone(),
            health.clone(),
            PollerConfig {
                max_attempts: 10,
                base_interval: Duration::from_millis(2),
                max_interval: Duration::from_millis(10),
                ..Default::default()
            },
        );
        let (cancel_tx, cancel_rx) = watch::channel(false);

        Self {
            ledger: Arc::new(MockLedger::new()),
            backend,
            signer: Arc::new(MockSigner::new(account)),
            health,
            poller,
            listener: RecordingListener::default(),
            clock: PhaseClock::new(),
            artifacts: Mutex::new(AttemptArtifacts::default()),
            timeouts: FlowTimeouts::default(),
            contracts: ContractAddresses {
                token: "0xtoken".to_string(),
                marketplace: "0xmarket".to_string(),
            },
            cancel_tx,
            cancel_rx,
        }
    }

    pub fn context(&self) -> StrategyContext<'_> {
        StrategyContext {
            ledger: self.ledger.as_ref(),
            signer: self.signer.as_ref(),
            backend: self.backend.as_ref(),
            poller: &self.poller,
            health: self.health.as_ref(),
            listener: &self.listener,
            clock: &self.clock,
            artifacts: &self.artifacts,
            cancel: self.cancel_rx.clone(),
            timeouts: &self.timeouts,
            contracts: &self.contracts,
        }
    }
}

pub fn test_request(amount: u128) -> PaymentRequest {
    PaymentRequest::builder()
        .content_id("content-1")
        .creator("0xcreator")
        .amount(amount)
        .max_slippage(Decimal::from_str("0.01").unwrap())
        .deadline(u64::MAX)
        .payer("0xpayer")
        .build()
        .unwrap()
}
