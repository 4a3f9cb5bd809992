use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

impl TimestampMs {
    pub fn as_secs(self) -> u64 {
        self.0 / 1_000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    #[serde(rename = "HIVE")]
    Hive,
    #[serde(rename = "HBD")]
    Hbd,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Hive, Asset::Hbd];

    pub fn symbol(self) -> &'static str {
        match self {
            Asset::Hive => "HIVE",
            Asset::Hbd => "HBD",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIVE" => Ok(Asset::Hive),
            "HBD" => Ok(Asset::Hbd),
            other => Err(format!("unknown asset: {other}")),
        }
    }
}

/// The two linked amount fields of the swap form, kept as display strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmountPair {
    pub from: String,
    pub to: String,
}

impl AmountPair {
    pub fn zeroed() -> Self {
        Self {
            from: "0".to_owned(),
            to: "0".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketRate {
    pub rate: f64,
    pub usd_from: f64,
    pub usd_to: f64,
    pub fetched_at: TimestampMs,
}

impl MarketRate {
    pub fn is_usable(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0
    }

    /// Rate for the opposite direction of the same pair.
    pub fn inverted(&self) -> Self {
        Self {
            rate: if self.is_usable() { 1.0 / self.rate } else { 0.0 },
            usd_from: self.usd_to,
            usd_to: self.usd_from,
            fetched_at: self.fetched_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: f64,
    pub asset: Asset,
}

impl Balance {
    /// Parses the `"<amount> <symbol>"` form used by account records.
    /// Returns `None` when the amount part is not a number or the symbol is unknown.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let amount_part = parts.next()?;
        let asset = parts.next()?.parse::<Asset>().ok()?;
        let amount = amount_part.replace(',', "").parse::<f64>().ok()?;
        if !amount.is_finite() {
            return None;
        }
        Some(Self { amount, asset })
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {}", self.amount, self.asset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    pub balance: String,
    pub hbd_balance: String,
}

impl AccountRecord {
    pub fn balance_of(&self, asset: Asset) -> Option<Balance> {
        let raw = match asset {
            Asset::Hive => &self.balance,
            Asset::Hbd => &self.hbd_balance,
        };
        Balance::parse(raw).filter(|b| b.asset == asset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Buy,
    Sell,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMethod {
    Key,
    Hosted,
    Keychain,
}

impl FromStr for SignMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "key" => Ok(SignMethod::Key),
            "hosted" | "hivesigner" => Ok(SignMethod::Hosted),
            "keychain" => Ok(SignMethod::Keychain),
            other => Err(format!("unknown sign method: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub amount: f64,
    pub asset: Asset,
}

impl AssetAmount {
    pub fn new(amount: f64, asset: Asset) -> Self {
        Self { amount, asset }
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {}", self.amount, self.asset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub owner: String,
    pub order_id: u32,
    pub amount_to_sell: AssetAmount,
    pub min_to_receive: AssetAmount,
    pub fill_or_kill: bool,
    pub expiration: TimestampMs,
}

/// Payload handed to a signing strategy. Opaque to the core beyond its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketOperation {
    LimitOrderCreate(LimitOrder),
    LimitOrderCancel { owner: String, order_id: u32 },
}

impl MarketOperation {
    pub fn owner(&self) -> &str {
        match self {
            MarketOperation::LimitOrderCreate(order) => &order.owner,
            MarketOperation::LimitOrderCancel { owner, .. } => owner,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MarketOperation::LimitOrderCreate(_) => "limit_order_create",
            MarketOperation::LimitOrderCancel { .. } => "limit_order_cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: String,
    pub method: SignMethod,
    pub operation_kind: String,
}

/// Values of a limit order as entered in the trading panel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderValues {
    pub total: f64,
    pub amount: f64,
    pub price: f64,
    pub available: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub seq: u64,
    pub flow: String,
    pub state_before: String,
    pub state_after: String,
    pub reason: String,
}

/// Builds a limit order in the direction implied by `kind`: a buy sells `total` HBD
/// for `amount` HIVE, a sell sells `amount` HIVE for `total` HBD.
pub fn limit_order_for(
    owner: &str,
    kind: TransactionKind,
    total: f64,
    amount: f64,
    now: TimestampMs,
    expiration_days: u64,
) -> Option<LimitOrder> {
    let (amount_to_sell, min_to_receive) = match kind {
        TransactionKind::Buy => (
            AssetAmount::new(total, Asset::Hbd),
            AssetAmount::new(amount, Asset::Hive),
        ),
        TransactionKind::Sell => (
            AssetAmount::new(amount, Asset::Hive),
            AssetAmount::new(total, Asset::Hbd),
        ),
        TransactionKind::Cancel => return None,
    };
    Some(LimitOrder {
        owner: owner.to_owned(),
        order_id: order_id_at(now),
        amount_to_sell,
        min_to_receive,
        fill_or_kill: false,
        expiration: TimestampMs(
            now.0
                .saturating_add(expiration_days.saturating_mul(24 * 60 * 60 * 1_000)),
        ),
    })
}

/// Order ids are the unix time in seconds, truncated to the chain's u32 field.
pub fn order_id_at(now: TimestampMs) -> u32 {
    (now.as_secs() % (u32::MAX as u64 + 1)) as u32
}
