#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use hive_market_core::{
    AccountPort, AccountRecord, ActiveUser, Asset, ClockPort, MarketOperation, PortError,
    RatePort, RateQuote, RateSync, RateSyncConfig, Receipt, SignMethod, SigningPort, SwapWizard,
    TimestampMs,
};

pub const T0: u64 = 1_739_750_400_000;

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + T0)
    }
}

/// Clock whose reads always fail.
#[derive(Debug, Default)]
pub struct BrokenClock;

impl ClockPort for BrokenClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Err(PortError::Transport("clock unavailable".to_owned()))
    }
}

pub struct FixedRates {
    pub rate: f64,
    pub usd: (f64, f64),
    pub fail: bool,
}

impl FixedRates {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            usd: (0.3, 1.0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            rate: 0.0,
            usd: (0.0, 0.0),
            fail: true,
        }
    }
}

#[async_trait]
impl RatePort for FixedRates {
    async fn fetch_rate(&self, _asset: Asset) -> Result<f64, PortError> {
        if self.fail {
            return Err(PortError::Transport("timeout".to_owned()));
        }
        Ok(self.rate)
    }

    async fn fetch_usd_rates(&self, _from: Asset, _to: Asset) -> Result<(f64, f64), PortError> {
        Ok(self.usd)
    }
}

pub struct StaticAccounts {
    pub account: AccountRecord,
    pub fail: bool,
}

#[async_trait]
impl AccountPort for StaticAccounts {
    async fn fetch_full_account(&self, username: &str) -> Result<AccountRecord, PortError> {
        if self.fail || username != self.account.name {
            return Err(PortError::NotFound(format!("account {username}")));
        }
        Ok(self.account.clone())
    }
}

/// Signer that either confirms every operation or rejects it with a reason.
pub struct ScriptedSigner {
    pub reject: Option<String>,
    pub seen: Mutex<Vec<MarketOperation>>,
}

impl ScriptedSigner {
    pub fn confirming() -> Self {
        Self {
            reject: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject: Some(reason.to_owned()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().expect("signer lock").len()
    }
}

#[async_trait]
impl SigningPort for ScriptedSigner {
    fn method(&self) -> SignMethod {
        SignMethod::Key
    }

    async fn execute(
        &self,
        _username: &str,
        operation: &MarketOperation,
    ) -> Result<Receipt, PortError> {
        self.seen
            .lock()
            .expect("signer lock")
            .push(operation.clone());
        if let Some(reason) = &self.reject {
            return Err(PortError::Rejected(reason.clone()));
        }
        Ok(Receipt {
            tx_id: format!("tx-{}", self.calls()),
            method: SignMethod::Key,
            operation_kind: operation.kind().to_owned(),
        })
    }
}

pub fn account(hive: &str, hbd: &str) -> AccountRecord {
    AccountRecord {
        name: "alice".to_owned(),
        balance: format!("{hive} HIVE"),
        hbd_balance: format!("{hbd} HBD"),
    }
}

pub fn quote(rate: f64) -> Result<RateQuote, PortError> {
    Ok(RateQuote {
        rate,
        usd_from: 0.3,
        usd_to: 1.0,
    })
}

pub fn sync_with_rate(rate: f64) -> RateSync {
    let mut sync = RateSync::new(RateSyncConfig::default(), Asset::Hive).expect("default pairs");
    let ticket = sync.begin_refresh();
    sync.complete_refresh(ticket, quote(rate), TimestampMs(T0))
        .expect("rate applied");
    sync
}

pub fn wizard_with_rate(rate: f64, hive: &str, hbd: &str) -> SwapWizard {
    SwapWizard::new(sync_with_rate(rate), ActiveUser::new(account(hive, hbd)))
}
