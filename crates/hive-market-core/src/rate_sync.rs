//! Linked from/to amounts reconciled against the market rate.
//!
//! Three signals feed [`RateSync`]: the user edits `from`, the user edits `to`,
//! or a refreshed [`MarketRate`] arrives. Edits recompute the opposite field
//! from the stored rate; a new rate never rewrites amounts already shown.

use serde::Serialize;
use tracing::{debug, warn};

use crate::amount::{format_amount, parse_amount};
use crate::domain::{AccountRecord, AmountPair, Asset, Balance, MarketRate, TimestampMs};
use crate::pairs::{PairError, PairTable};
use crate::ports::{PortError, RatePort};
use crate::state_machine::SideEffect;

pub const DEFAULT_STALE_AFTER_MS: u64 = 20_000;

#[derive(Debug, Clone)]
pub struct RateSyncConfig {
    pub pairs: PairTable,
    pub stale_after_ms: u64,
}

impl Default for RateSyncConfig {
    fn default() -> Self {
        Self {
            pairs: PairTable::default(),
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateStatus {
    Missing,
    Fresh,
    Failed,
}

/// Rate values as returned by the rate source, before they are stamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub rate: f64,
    pub usd_from: f64,
    pub usd_to: f64,
}

/// Identifies one refresh; completions for anything but the latest ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
    from: Asset,
    to: Asset,
}

impl RefreshTicket {
    pub fn from_asset(&self) -> Asset {
        self.from
    }

    pub fn to_asset(&self) -> Asset {
        self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshOutcome {
    Applied(MarketRate),
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketSummary {
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub rate: f64,
    pub usd_from: f64,
    pub usd_to: f64,
    pub from_usd_value: f64,
    pub to_usd_value: f64,
}

/// Pure balance check: does the typed amount exceed what the user holds?
pub fn validate_balance(from: &str, balance: &Balance) -> bool {
    parse_amount(from) > balance.amount
}

/// Fetches a rate and both USD rates for the pair. A non-positive rate is a
/// failed fetch so it can never replace a good one.
pub async fn fetch_quote(
    source: &dyn RatePort,
    from: Asset,
    to: Asset,
) -> Result<RateQuote, PortError> {
    let rate = source.fetch_rate(from).await?;
    let (usd_from, usd_to) = source.fetch_usd_rates(from, to).await?;
    let quote = RateQuote {
        rate,
        usd_from,
        usd_to,
    };
    check_quote(&quote)?;
    Ok(quote)
}

fn check_quote(quote: &RateQuote) -> Result<(), PortError> {
    if !(quote.rate.is_finite() && quote.rate > 0.0) {
        return Err(PortError::Validation(format!(
            "unusable market rate: {}",
            quote.rate
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RateSync {
    pairs: PairTable,
    stale_after_ms: u64,
    from_asset: Asset,
    to_asset: Asset,
    amounts: AmountPair,
    rate: Option<MarketRate>,
    status: RateStatus,
    balance: Option<Balance>,
    exceeds_balance: bool,
    available_assets: Vec<Asset>,
    generation: u64,
    in_flight: Option<u64>,
}

impl RateSync {
    pub fn new(config: RateSyncConfig, from_asset: Asset) -> Result<Self, PairError> {
        let to_asset = config.pairs.default_counter(from_asset)?;
        let available_assets = config.pairs.allowed(from_asset).to_vec();
        Ok(Self {
            pairs: config.pairs,
            stale_after_ms: config.stale_after_ms,
            from_asset,
            to_asset,
            amounts: AmountPair::default(),
            rate: None,
            status: RateStatus::Missing,
            balance: None,
            exceeds_balance: false,
            available_assets,
            generation: 0,
            in_flight: None,
        })
    }

    pub fn from_asset(&self) -> Asset {
        self.from_asset
    }

    pub fn to_asset(&self) -> Asset {
        self.to_asset
    }

    pub fn amounts(&self) -> &AmountPair {
        &self.amounts
    }

    pub fn market_rate(&self) -> Option<&MarketRate> {
        self.rate.as_ref()
    }

    /// Current rate, or `0` while none has been fetched.
    pub fn rate(&self) -> f64 {
        self.rate.map(|r| r.rate).unwrap_or(0.0)
    }

    pub fn rate_status(&self) -> RateStatus {
        self.status
    }

    pub fn balance(&self) -> Option<&Balance> {
        self.balance.as_ref()
    }

    pub fn exceeds_balance(&self) -> bool {
        self.exceeds_balance
    }

    pub fn available_assets(&self) -> &[Asset] {
        &self.available_assets
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn from_amount(&self) -> f64 {
        parse_amount(&self.amounts.from)
    }

    pub fn is_stale(&self, now: TimestampMs) -> bool {
        match (self.status, self.rate) {
            (RateStatus::Failed, _) | (_, None) => true,
            (_, Some(rate)) => now.0.saturating_sub(rate.fetched_at.0) >= self.stale_after_ms,
        }
    }

    pub fn set_from(&mut self, value: &str) {
        self.amounts.from = value.to_owned();
        self.amounts.to = format_amount(self.rate() * parse_amount(value));
        self.revalidate();
    }

    pub fn set_to(&mut self, value: &str) {
        let rate = self.rate();
        self.amounts.to = value.to_owned();
        self.amounts.from = if rate > 0.0 {
            format_amount(parse_amount(value) / rate)
        } else {
            "0".to_owned()
        };
        self.revalidate();
    }

    /// Flips direction: assets, amounts, USD rates, and the rate itself (inverted),
    /// all in one step.
    pub fn swap(&mut self) -> Result<(), PairError> {
        self.pairs.ensure_allowed(self.to_asset, self.from_asset)?;
        let (from, to) = (self.to_asset, self.from_asset);
        self.retarget(from, to);
        std::mem::swap(&mut self.amounts.from, &mut self.amounts.to);
        self.drop_foreign_balance();
        self.revalidate();
        Ok(())
    }

    pub fn change_from_asset(
        &mut self,
        asset: Asset,
        account: Option<&AccountRecord>,
    ) -> Result<Vec<SideEffect>, PairError> {
        let first = self.pairs.default_counter(asset)?;
        let to = if asset != self.to_asset && self.pairs.is_allowed(asset, self.to_asset) {
            self.to_asset
        } else {
            first
        };

        let mut effects = Vec::new();
        if self.retarget(asset, to) {
            effects.push(SideEffect::RefreshRate);
        }
        self.available_assets = self.pairs.allowed(asset).to_vec();
        match account {
            Some(account) => self.update_balance(account.balance_of(asset)),
            None => {
                self.drop_foreign_balance();
                self.revalidate();
            }
        }
        Ok(effects)
    }

    pub fn change_to_asset(&mut self, asset: Asset) -> Result<Vec<SideEffect>, PairError> {
        self.pairs.ensure_allowed(self.from_asset, asset)?;
        if self.retarget(self.from_asset, asset) {
            return Ok(vec![SideEffect::RefreshRate]);
        }
        Ok(Vec::new())
    }

    pub fn update_balance(&mut self, balance: Option<Balance>) {
        self.balance = balance.filter(|b| b.asset == self.from_asset);
        if self.balance.is_none() {
            self.exceeds_balance = false;
        }
        self.revalidate();
    }

    pub fn reset_amounts(&mut self) {
        self.amounts = AmountPair::zeroed();
        self.revalidate();
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = Some(self.generation);
        RefreshTicket {
            generation: self.generation,
            from: self.from_asset,
            to: self.to_asset,
        }
    }

    /// Applies a finished fetch. Displayed amounts are left alone; the new rate
    /// takes effect on the next edit. On failure the previous rate is kept and
    /// marked stale, and the error is handed back for the caller to surface.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<RateQuote, PortError>,
        now: TimestampMs,
    ) -> Result<RefreshOutcome, PortError> {
        if self.in_flight != Some(ticket.generation)
            || ticket.from != self.from_asset
            || ticket.to != self.to_asset
        {
            debug!(
                generation = ticket.generation,
                "discarding superseded rate refresh"
            );
            return Ok(RefreshOutcome::Superseded);
        }
        self.in_flight = None;

        let quote = match result.and_then(|q| check_quote(&q).map(|_| q)) {
            Ok(quote) => quote,
            Err(err) => {
                warn!(from = %self.from_asset, to = %self.to_asset, error = %err, "rate refresh failed");
                self.status = RateStatus::Failed;
                return Err(err);
            }
        };

        let rate = MarketRate {
            rate: quote.rate,
            usd_from: quote.usd_from,
            usd_to: quote.usd_to,
            fetched_at: now,
        };
        debug!(from = %self.from_asset, to = %self.to_asset, rate = rate.rate, "rate refreshed");
        self.rate = Some(rate);
        self.status = RateStatus::Fresh;
        Ok(RefreshOutcome::Applied(rate))
    }

    pub async fn refresh_rate(
        &mut self,
        source: &dyn RatePort,
        now: TimestampMs,
    ) -> Result<RefreshOutcome, PortError> {
        let ticket = self.begin_refresh();
        let result = fetch_quote(source, ticket.from, ticket.to).await;
        self.complete_refresh(ticket, result, now)
    }

    pub fn summary(&self) -> MarketSummary {
        let (rate, usd_from, usd_to) = self
            .rate
            .map(|r| (r.rate, r.usd_from, r.usd_to))
            .unwrap_or((0.0, 0.0, 0.0));
        MarketSummary {
            from_asset: self.from_asset,
            to_asset: self.to_asset,
            rate,
            usd_from,
            usd_to,
            from_usd_value: parse_amount(&self.amounts.from) * usd_from,
            to_usd_value: parse_amount(&self.amounts.to) * usd_to,
        }
    }

    /// Points the sync at a new pair. The rate is inverted when the pair is just
    /// reversed and dropped otherwise. Any in-flight refresh is invalidated.
    fn retarget(&mut self, from: Asset, to: Asset) -> bool {
        if from == self.from_asset && to == self.to_asset {
            return false;
        }
        let reversed = from == self.to_asset && to == self.from_asset;
        if reversed {
            self.rate = self.rate.map(|r| r.inverted());
        } else {
            self.rate = None;
            self.status = RateStatus::Missing;
        }
        self.from_asset = from;
        self.to_asset = to;
        self.available_assets = self.pairs.allowed(from).to_vec();
        self.in_flight = None;
        true
    }

    fn drop_foreign_balance(&mut self) {
        if self.balance.is_some_and(|b| b.asset != self.from_asset) {
            self.balance = None;
            self.exceeds_balance = false;
        }
    }

    fn revalidate(&mut self) {
        if let Some(balance) = &self.balance {
            self.exceeds_balance = validate_balance(&self.amounts.from, balance);
        }
    }
}
