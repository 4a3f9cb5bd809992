#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use hive_market_adapters::{InMemoryAccounts, InMemoryRateSource};
use hive_market_core::{
    AccountRecord, Asset, ClockPort, LimitOrder, MarketOperation, AssetAmount, PortError,
    TimestampMs,
};

pub const T0: u64 = 1_739_750_400_000;
pub const VALID_WIF: &str = "5JdeC9P7Pbd1uGdFVEsJ41EkEnADbbHGq6p1BwFxm6txNBsQnsw";

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + T0)
    }
}

pub fn account(name: &str, hive: &str, hbd: &str) -> AccountRecord {
    AccountRecord {
        name: name.to_owned(),
        balance: format!("{hive} HIVE"),
        hbd_balance: format!("{hbd} HBD"),
    }
}

pub fn sell_order(owner: &str) -> MarketOperation {
    MarketOperation::LimitOrderCreate(LimitOrder {
        owner: owner.to_owned(),
        order_id: 7,
        amount_to_sell: AssetAmount::new(10.0, Asset::Hive),
        min_to_receive: AssetAmount::new(2.5, Asset::Hbd),
        fill_or_kill: false,
        expiration: TimestampMs(T0),
    })
}

/// HIVE trades at 0.25 HBD; HBD at 4 HIVE.
pub fn market() -> InMemoryRateSource {
    let rates = InMemoryRateSource::new();
    rates.set_rate(Asset::Hive, 0.25).expect("hive rate");
    rates.set_rate(Asset::Hbd, 4.0).expect("hbd rate");
    rates.set_usd(Asset::Hive, 0.25).expect("hive usd");
    rates.set_usd(Asset::Hbd, 1.0).expect("hbd usd");
    rates
}

pub fn accounts_with(record: AccountRecord) -> InMemoryAccounts {
    let accounts = InMemoryAccounts::new();
    accounts.insert(record).expect("insert account");
    accounts
}
