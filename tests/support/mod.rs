//! Scripted mock collaborators for end-to-end payment flow tests
#![allow(dead_code)]

use async_trait::async_trait;
use payflow::{
    AccountType, ContractAddresses, FlowTimeouts, HealthConfig, HealthMonitor, IntentSubmission,
    LedgerClient, OrchestratorConfig, PaymentError, PaymentObserver, PaymentOrchestrator,
    PaymentRequest, PermitRequest, PollerConfig, RecoveryConfig, SignatureStatus, SigningBackend,
    TxReceipt, TxStatus, UserInteraction, WalletSigner,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct TestLedger {
    pub balance: AtomicU64,
    pub allowance: AtomicU64,
    pub price: AtomicU64,
    pub supports_batch: AtomicBool,
    pub approvals: AtomicU32,
    pub receipt_delay: Mutex<Duration>,
    pub revert_reason: Mutex<Option<String>>,
}

impl TestLedger {
    pub fn new() -> Self {
        Self {
            balance: AtomicU64::new(100_000_000),
            allowance: AtomicU64::new(100_000_000),
            price: AtomicU64::new(1_000_000),
            supports_batch: AtomicBool::new(false),
            approvals: AtomicU32::new(0),
            receipt_delay: Mutex::new(Duration::ZERO),
            revert_reason: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LedgerClient for TestLedger {
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
        Ok(42)
    }

    async fn submit_approval(
        &self,
        _owner: &str,
        _spender: &str,
        _amount: u128,
    ) -> Result<String, PaymentError> {
        let n = self.approvals.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("0xapproval{n}"))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        _timeout: Duration,
    ) -> Result<TxReceipt, PaymentError> {
        let delay = *self.receipt_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let status = match self.revert_reason.lock().unwrap().clone() {
            Some(reason) if tx_hash.starts_with("0xtx") => TxStatus::Reverted { reason },
            _ => TxStatus::Confirmed,
        };
        Ok(TxReceipt {
            tx_hash: tx_hash.to_string(),
            status,
            block_number: 99,
        })
    }

    async fn supports_atomic_batch(&self, _account: &str) -> Result<bool, PaymentError> {
        Ok(self.supports_batch.load(Ordering::SeqCst))
    }

    async fn chain_id(&self) -> Result<u64, PaymentError> {
        Ok(1)
    }
}

pub struct TestBackend {
    pub create_calls: AtomicU32,
    pub poll_calls: AtomicU32,
    pub execute_calls: AtomicU32,
    /// Polls needed before the signature appears; u32::MAX means never
    pub polls_until_signed: AtomicU32,
    /// Per-poll artificial latency
    pub poll_delay: Mutex<Duration>,
    pub fail_create_times: AtomicU32,
    pub last_submission: Mutex<Option<IntentSubmission>>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            execute_calls: AtomicU32::new(0),
            polls_until_signed: AtomicU32::new(1),
            poll_delay: Mutex::new(Duration::ZERO),
            fail_create_times: AtomicU32::new(0),
            last_submission: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SigningBackend for TestBackend {
    async fn create_intent(
        &self,
        _request: &PaymentRequest,
        submission: &IntentSubmission,
    ) -> Result<String, PaymentError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_times.load(Ordering::SeqCst) > 0 {
            self.fail_create_times.fetch_sub(1, Ordering::SeqCst);
            return Err(PaymentError::network("backend connection refused"));
        }
        *self.last_submission.lock().unwrap() = Some(submission.clone());
        Ok("intent-1".to_string())
    }

    async fn signature_status(&self, _intent_id: &str) -> Result<SignatureStatus, PaymentError> {
        let delay = *self.poll_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let polls = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if polls >= self.polls_until_signed.load(Ordering::SeqCst) {
            Ok(SignatureStatus::signed("0xsignature"))
        } else {
            Ok(SignatureStatus::pending())
        }
    }

    async fn execute_with_signature(
        &self,
        _intent_id: &str,
        _signature: &str,
    ) -> Result<String, PaymentError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        Ok("0xtx1".to_string())
    }
}

pub struct TestWallet {
    pub account: Mutex<AccountType>,
    pub reject_permit: AtomicBool,
    pub permit_prompts: AtomicU32,
    pub chain: AtomicU64,
}

impl TestWallet {
    pub fn new(account: AccountType) -> Self {
        Self {
            account: Mutex::new(account),
            reject_permit: AtomicBool::new(false),
            permit_prompts: AtomicU32::new(0),
            chain: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl WalletSigner for TestWallet {
    fn address(&self) -> String {
        "0xpayer".to_string()
    }

    async fn account_type(&self) -> Result<AccountType, PaymentError> {
        Ok(*self.account.lock().unwrap())
    }

    async fn chain_id(&self) -> Result<u64, PaymentError> {
        Ok(self.chain.load(Ordering::SeqCst))
    }

    async fn sign_permit(&self, _permit: &PermitRequest) -> Result<String, PaymentError> {
        self.permit_prompts.fetch_add(1, Ordering::SeqCst);
        if self.reject_permit.load(Ordering::SeqCst) {
            return Err(PaymentError::UserRejected);
        }
        Ok("0xpermitsig".to_string())
    }
}

/// Observer answering every intervention prompt with a fixed decision
pub struct DecisionObserver {
    pub proceed: AtomicBool,
    pub prompts: AtomicU32,
}

impl DecisionObserver {
    pub fn new(proceed: bool) -> Self {
        Self {
            proceed: AtomicBool::new(proceed),
            prompts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl PaymentObserver for DecisionObserver {
    async fn on_user_action_required(&self, _interaction: &UserInteraction, _message: &str) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.proceed.load(Ordering::SeqCst)
    }
}

pub struct Rig {
    pub ledger: Arc<TestLedger>,
    pub backend: Arc<TestBackend>,
    pub wallet: Arc<TestWallet>,
    pub health: Arc<HealthMonitor>,
    pub observer: Arc<DecisionObserver>,
    pub orchestrator: PaymentOrchestrator,
}

pub fn rig(account: AccountType) -> Rig {
    rig_with(account, fast_poller(), false)
}

pub fn fast_poller() -> PollerConfig {
    PollerConfig {
        max_attempts: 45,
        base_interval: Duration::from_millis(2),
        max_interval: Duration::from_millis(10),
        transient_retry_limit: 3,
        max_consecutive_failures: 5,
    }
}

pub fn rig_with(account: AccountType, poller: PollerConfig, proceed: bool) -> Rig {
    rig_custom(
        account,
        poller,
        proceed,
        HealthConfig {
            failure_threshold: 3,
            base_retry_delay: Duration::from_millis(20),
            max_retry_delay: Duration::from_secs(2),
            ..Default::default()
        },
        RecoveryConfig {
            max_auto_retries: 3,
            retry_floor: Duration::from_millis(5),
        },
    )
}

pub fn rig_custom(
    account: AccountType,
    poller: PollerConfig,
    proceed: bool,
    health_config: HealthConfig,
    recovery: RecoveryConfig,
) -> Rig {
    let ledger = Arc::new(TestLedger::new());
    let backend = Arc::new(TestBackend::new());
    let wallet = Arc::new(TestWallet::new(account));
    let health = Arc::new(HealthMonitor::new(health_config));
    let observer = Arc::new(DecisionObserver::new(proceed));

    let orchestrator = PaymentOrchestrator::builder()
        .with_ledger(ledger.clone())
        .with_backend(backend.clone())
        .with_signer(wallet.clone())
        .with_health(health.clone())
        .with_observer(observer.clone())
        .with_poller_config(poller)
        .with_config(OrchestratorConfig {
            contracts: ContractAddresses {
                token: "0xtoken".to_string(),
                marketplace: "0xmarket".to_string(),
            },
            timeouts: FlowTimeouts::default(),
            recovery,
            base_estimate: Duration::from_secs(45),
        })
        .build()
        .expect("rig builder");

    Rig {
        ledger,
        backend,
        wallet,
        health,
        observer,
        orchestrator,
    }
}

pub fn request() -> PaymentRequest {
    PaymentRequest::builder()
        .content_id("content-42")
        .creator("0xcreator")
        .amount(1_000_000)
        .max_slippage(Decimal::new(1, 2))
        .deadline(u64::MAX)
        .payer("0xpayer")
        .session_id("session-42")
        .build()
        .unwrap()
}
