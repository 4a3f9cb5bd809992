//! Scriptable in-memory rate and account sources.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use hive_market_core::{AccountPort, AccountRecord, Asset, PortError, RatePort};

#[derive(Debug, Default)]
struct RateBook {
    rates: HashMap<Asset, f64>,
    usd: HashMap<Asset, f64>,
    failures: VecDeque<PortError>,
}

/// Rate source backed by a table. Queued failures are returned, one per
/// call, before the table is consulted again.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateSource {
    book: Arc<Mutex<RateBook>>,
}

impl InMemoryRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Market rate for `asset` in units of its counter-asset.
    pub fn set_rate(&self, asset: Asset, rate: f64) -> Result<(), PortError> {
        self.lock()?.rates.insert(asset, rate);
        Ok(())
    }

    pub fn set_usd(&self, asset: Asset, usd: f64) -> Result<(), PortError> {
        self.lock()?.usd.insert(asset, usd);
        Ok(())
    }

    pub fn fail_next(&self, err: PortError) -> Result<(), PortError> {
        self.lock()?.failures.push_back(err);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, RateBook>, PortError> {
        self.book
            .lock()
            .map_err(|e| PortError::Transport(format!("rate book lock poisoned: {e}")))
    }
}

#[async_trait]
impl RatePort for InMemoryRateSource {
    async fn fetch_rate(&self, asset: Asset) -> Result<f64, PortError> {
        let mut book = self.lock()?;
        if let Some(err) = book.failures.pop_front() {
            debug!(%asset, "serving queued rate failure");
            return Err(err);
        }
        book.rates
            .get(&asset)
            .copied()
            .ok_or_else(|| PortError::NotFound(format!("rate for {asset}")))
    }

    async fn fetch_usd_rates(&self, from: Asset, to: Asset) -> Result<(f64, f64), PortError> {
        let book = self.lock()?;
        let usd = |asset: Asset| {
            book.usd
                .get(&asset)
                .copied()
                .ok_or_else(|| PortError::NotFound(format!("usd price for {asset}")))
        };
        Ok((usd(from)?, usd(to)?))
    }
}

#[derive(Debug, Default)]
struct AccountBook {
    accounts: HashMap<String, AccountRecord>,
    failures: VecDeque<PortError>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAccounts {
    book: Arc<Mutex<AccountBook>>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: AccountRecord) -> Result<(), PortError> {
        self.lock()?.accounts.insert(account.name.clone(), account);
        Ok(())
    }

    pub fn fail_next(&self, err: PortError) -> Result<(), PortError> {
        self.lock()?.failures.push_back(err);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, AccountBook>, PortError> {
        self.book
            .lock()
            .map_err(|e| PortError::Transport(format!("account book lock poisoned: {e}")))
    }
}

#[async_trait]
impl AccountPort for InMemoryAccounts {
    async fn fetch_full_account(&self, username: &str) -> Result<AccountRecord, PortError> {
        let mut book = self.lock()?;
        if let Some(err) = book.failures.pop_front() {
            return Err(err);
        }
        book.accounts
            .get(username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("account {username}")))
    }
}
