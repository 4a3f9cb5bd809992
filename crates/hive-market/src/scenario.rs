//! JSON scenario replay.
//!
//! A scenario names the user, the market table and a list of events. Each
//! event is applied to the swap wizard or to the open order dialog and yields
//! a [`StepReport`] with the outcome and the resulting state.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hive_market_adapters::{
    build_signers, Credentials, InMemoryAccounts, InMemoryRateSource, MarketAdapterConfig,
};
use hive_market_core::{
    format_error, AccountRecord, ActiveUser, Asset, ClockPort, ConfirmationCopy,
    ConfirmationPrompt, OrderDialog, OrderStep, OrderValues, Outcome, PortError, RateSync,
    Receipt, SideEffect, SignMethod, SignerSet, SwapSnapshot, SwapWizard, TransactionKind,
};

/// Clock that only moves when the scenario says so.
#[derive(Debug)]
pub struct ReplayClock {
    now: AtomicU64,
}

impl ReplayClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockPort for ReplayClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

fn default_start_ms() -> u64 {
    1_739_750_400_000
}

fn default_from_asset() -> Asset {
    Asset::Hive
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub user: AccountRecord,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub hosted_token: Option<String>,
    #[serde(default)]
    pub rates: BTreeMap<Asset, f64>,
    #[serde(default)]
    pub usd: BTreeMap<Asset, f64>,
    #[serde(default = "default_from_asset")]
    pub from_asset: Asset,
    #[serde(default = "default_start_ms")]
    pub start_ms: u64,
    #[serde(default)]
    pub copy: Option<ConfirmationCopy>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Refresh,
    /// Advances the clock and refreshes the rate when the refresh interval has elapsed.
    Tick { elapsed_ms: u64 },
    SetRate { asset: Asset, rate: f64 },
    FailNextRate { message: String },
    SetFrom { value: String },
    SetTo { value: String },
    Swap,
    ChangeFromAsset { asset: Asset },
    ChangeToAsset { asset: Asset },
    Submit,
    Sign {
        #[serde(default)]
        method: Option<SignMethod>,
    },
    Back,
    Reset,
    Dismiss,
    /// Account state returned by the next account fetch.
    SetAccount { account: AccountRecord },
    FailNextAccount { message: String },
    PlaceOrder {
        kind: TransactionKind,
        values: OrderValues,
    },
    CancelOrder {
        #[serde(default)]
        order_id: Option<u32>,
    },
    OrderContinue,
    OrderBack,
    OrderSign {
        #[serde(default)]
        method: Option<SignMethod>,
    },
    OrderDismiss,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Refresh => "refresh",
            Event::Tick { .. } => "tick",
            Event::SetRate { .. } => "set_rate",
            Event::FailNextRate { .. } => "fail_next_rate",
            Event::SetFrom { .. } => "set_from",
            Event::SetTo { .. } => "set_to",
            Event::Swap => "swap",
            Event::ChangeFromAsset { .. } => "change_from_asset",
            Event::ChangeToAsset { .. } => "change_to_asset",
            Event::Submit => "submit",
            Event::Sign { .. } => "sign",
            Event::Back => "back",
            Event::Reset => "reset",
            Event::Dismiss => "dismiss",
            Event::SetAccount { .. } => "set_account",
            Event::FailNextAccount { .. } => "fail_next_account",
            Event::PlaceOrder { .. } => "place_order",
            Event::CancelOrder { .. } => "cancel_order",
            Event::OrderContinue => "order_continue",
            Event::OrderBack => "order_back",
            Event::OrderSign { .. } => "order_sign",
            Event::OrderDismiss => "order_dismiss",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub kind: TransactionKind,
    pub step: OrderStep,
    pub prompt: ConfirmationPrompt,
    pub message: String,
    pub last_error: Option<String>,
    pub notice: Option<String>,
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub seq: usize,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub swap: SwapSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderView>,
}

pub struct ScenarioRunner {
    events: Vec<Event>,
    config: MarketAdapterConfig,
    copy: ConfirmationCopy,
    rates: InMemoryRateSource,
    accounts: InMemoryAccounts,
    signers: SignerSet,
    clock: ReplayClock,
    wizard: SwapWizard,
    order: Option<OrderDialog>,
    last_refresh_ms: Option<u64>,
}

impl ScenarioRunner {
    pub fn new(scenario: Scenario, config: MarketAdapterConfig) -> eyre::Result<Self> {
        let rates = InMemoryRateSource::new();
        for (asset, rate) in &scenario.rates {
            rates.set_rate(*asset, *rate)?;
        }
        for (asset, usd) in &scenario.usd {
            rates.set_usd(*asset, *usd)?;
        }
        let accounts = InMemoryAccounts::new();
        accounts.insert(scenario.user.clone())?;

        let credentials = Credentials {
            username: scenario.user.name.clone(),
            private_key: scenario.private_key.clone(),
            hosted_token: scenario.hosted_token.clone(),
        };
        let signers = build_signers(&config, &credentials)?;

        let sync = RateSync::new(config.rate_sync_config(), scenario.from_asset)
            .map_err(|e| eyre!("invalid starting pair: {e}"))?;
        let wizard = SwapWizard::new(sync, ActiveUser::new(scenario.user))
            .with_expiration_days(config.order_expiration_days);

        info!(
            events = scenario.events.len(),
            methods = ?signers.methods(),
            "scenario loaded"
        );

        Ok(Self {
            events: scenario.events,
            config,
            copy: scenario.copy.unwrap_or_default(),
            rates,
            accounts,
            signers,
            clock: ReplayClock::new(scenario.start_ms),
            wizard,
            order: None,
            last_refresh_ms: None,
        })
    }

    pub async fn run(&mut self) -> eyre::Result<Vec<StepReport>> {
        let events = std::mem::take(&mut self.events);
        let mut reports = Vec::with_capacity(events.len());
        for (idx, event) in events.into_iter().enumerate() {
            let name = event.name();
            debug!(seq = idx + 1, event = name, "applying event");
            let (outcome, error) = match self.apply(event).await {
                Ok(outcome) => (outcome, None),
                Err(err) => (None, Some(format_error(&err))),
            };
            reports.push(StepReport {
                seq: idx + 1,
                event: name,
                outcome,
                error,
                swap: self.wizard.snapshot(),
                order: self.order_view(),
            });
        }
        Ok(reports)
    }

    async fn apply(&mut self, event: Event) -> Result<Option<Outcome>, PortError> {
        match event {
            Event::Refresh => {
                self.refresh().await?;
                Ok(None)
            }
            Event::Tick { elapsed_ms } => {
                self.clock.advance(elapsed_ms);
                if self.refresh_due()? {
                    self.refresh().await?;
                }
                Ok(None)
            }
            Event::SetRate { asset, rate } => {
                self.rates.set_rate(asset, rate)?;
                Ok(None)
            }
            Event::FailNextRate { message } => {
                self.rates.fail_next(PortError::Transport(message))?;
                Ok(None)
            }
            Event::SetFrom { value } => Ok(Some(self.wizard.set_from(&value))),
            Event::SetTo { value } => Ok(Some(self.wizard.set_to(&value))),
            Event::Swap => Ok(Some(self.wizard.swap())),
            Event::ChangeFromAsset { asset } => {
                let outcome = self.wizard.change_from_asset(asset);
                self.follow_up(&outcome).await?;
                Ok(Some(outcome))
            }
            Event::ChangeToAsset { asset } => {
                let outcome = self.wizard.change_to_asset(asset);
                self.follow_up(&outcome).await?;
                Ok(Some(outcome))
            }
            Event::Submit => Ok(Some(self.wizard.submit())),
            Event::Sign { method } => {
                let signer = self.signers.select(self.method(method))?;
                let outcome = self
                    .wizard
                    .sign(signer.as_ref(), &self.accounts, &self.clock)
                    .await?;
                Ok(Some(outcome))
            }
            Event::Back => Ok(Some(self.wizard.back())),
            Event::Reset => {
                let outcome = self.wizard.reset();
                self.follow_up(&outcome).await?;
                Ok(Some(outcome))
            }
            Event::Dismiss => Ok(Some(self.wizard.dismiss())),
            Event::SetAccount { account } => {
                self.accounts.insert(account)?;
                Ok(None)
            }
            Event::FailNextAccount { message } => {
                self.accounts.fail_next(PortError::Transport(message))?;
                Ok(None)
            }
            Event::PlaceOrder { kind, values } => {
                let dialog = OrderDialog::place(kind, values, self.wizard.user().clone())
                    .with_expiration_days(self.config.order_expiration_days);
                self.order = Some(dialog);
                Ok(None)
            }
            Event::CancelOrder { order_id } => {
                self.order = Some(OrderDialog::cancel(order_id, self.wizard.user().clone()));
                Ok(None)
            }
            Event::OrderContinue => Ok(Some(self.dialog()?.proceed())),
            Event::OrderBack => Ok(Some(self.dialog()?.back())),
            Event::OrderSign { method } => {
                let signer = self.signers.select(self.method(method))?;
                let dialog = self
                    .order
                    .as_mut()
                    .ok_or_else(|| PortError::NotFound("open order dialog".to_owned()))?;
                let outcome = dialog
                    .sign(signer.as_ref(), &self.accounts, &self.clock)
                    .await?;
                if let Some(account) = dialog.refreshed_account() {
                    self.wizard.apply_account(account.clone());
                }
                Ok(Some(outcome))
            }
            Event::OrderDismiss => Ok(Some(self.dialog()?.dismiss())),
        }
    }

    fn method(&self, requested: Option<SignMethod>) -> SignMethod {
        requested.unwrap_or(self.config.default_sign_method)
    }

    fn dialog(&mut self) -> Result<&mut OrderDialog, PortError> {
        self.order
            .as_mut()
            .ok_or_else(|| PortError::NotFound("open order dialog".to_owned()))
    }

    async fn follow_up(&mut self, outcome: &Outcome) -> Result<(), PortError> {
        if outcome.effects().contains(&SideEffect::RefreshRate) {
            self.refresh().await?;
        }
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), PortError> {
        let now = self.clock.now_ms()?;
        self.last_refresh_ms = Some(now);
        self.wizard.refresh_rate(&self.rates, &self.clock).await?;
        Ok(())
    }

    fn refresh_due(&self) -> Result<bool, PortError> {
        let now = self.clock.now_ms()?;
        Ok(match self.last_refresh_ms {
            Some(last) => now.saturating_sub(last) >= self.config.rate_refresh_interval_ms,
            None => true,
        })
    }

    fn order_view(&self) -> Option<OrderView> {
        self.order.as_ref().map(|dialog| OrderView {
            kind: dialog.kind(),
            step: dialog.step(),
            prompt: dialog.prompt(),
            message: dialog.message(&self.copy),
            last_error: dialog.last_error().map(str::to_owned),
            notice: dialog.notice().map(str::to_owned),
            receipt: dialog.last_receipt().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hive_market_core::SwapStep;

    const SCENARIO: &str = r#"{
        "user": { "name": "alice", "balance": "100.000 HIVE", "hbd_balance": "5.000 HBD" },
        "private_key": "5JdeC9P7Pbd1uGdFVEsJ41EkEnADbbHGq6p1BwFxm6txNBsQnsw",
        "rates": { "HIVE": 0.25, "HBD": 4.0 },
        "usd": { "HIVE": 0.25, "HBD": 1.0 },
        "events": [
            { "event": "refresh" },
            { "event": "set_from", "value": "40" },
            { "event": "submit" },
            { "event": "set_account", "account": { "name": "alice", "balance": "60.000 HIVE", "hbd_balance": "15.000 HBD" } },
            { "event": "sign" },
            { "event": "reset" },
            { "event": "place_order", "kind": "buy", "values": { "total": 1.0, "amount": 4.0, "price": 0.25, "available": 15.0 } },
            { "event": "order_continue" },
            { "event": "order_sign", "method": "key" }
        ]
    }"#;

    fn scenario() -> Scenario {
        serde_json::from_str(SCENARIO).expect("scenario parses")
    }

    #[test]
    fn events_parse_by_tag() {
        let scenario = scenario();
        assert_eq!(scenario.events.len(), 9);
        assert_eq!(scenario.from_asset, Asset::Hive);
        assert_eq!(scenario.rates.get(&Asset::Hbd), Some(&4.0));
        assert!(matches!(
            &scenario.events[1],
            Event::SetFrom { value } if value == "40"
        ));
        assert!(matches!(
            scenario.events[6],
            Event::PlaceOrder {
                kind: TransactionKind::Buy,
                ..
            }
        ));
        assert!(serde_json::from_str::<Event>(r#"{ "event": "warp" }"#).is_err());
    }

    #[tokio::test]
    async fn replay_runs_swap_and_order() {
        let mut runner =
            ScenarioRunner::new(scenario(), MarketAdapterConfig::default()).expect("runner");
        let reports = runner.run().await.expect("run");
        assert_eq!(reports.len(), 9);

        assert_eq!(reports[1].swap.to, "10");
        assert_eq!(reports[2].swap.step, SwapStep::Sign);
        assert_eq!(reports[4].swap.step, SwapStep::Success);
        assert!(reports[4].error.is_none());
        assert_eq!(
            reports[5].outcome.as_ref().map(Outcome::effects),
            Some(&[SideEffect::ClearAmounts, SideEffect::RefreshRate][..])
        );
        assert_eq!(reports[5].swap.from, "0");

        let order = reports[8].order.as_ref().expect("order view");
        assert_eq!(order.step, OrderStep::Closed);
        assert!(order.receipt.is_some());
        assert_eq!(runner.wizard.user().account.hbd_balance, "15.000 HBD");
    }

    #[tokio::test]
    async fn tick_refreshes_once_interval_elapses() {
        let mut scenario = scenario();
        scenario.events = vec![
            Event::Tick { elapsed_ms: 0 },
            Event::SetRate {
                asset: Asset::Hive,
                rate: 0.5,
            },
            Event::Tick { elapsed_ms: 5_000 },
            Event::Tick { elapsed_ms: 15_000 },
        ];
        let mut runner =
            ScenarioRunner::new(scenario, MarketAdapterConfig::default()).expect("runner");
        let reports = runner.run().await.expect("run");
        assert_eq!(reports[0].swap.rate, 0.25);
        assert_eq!(reports[2].swap.rate, 0.25);
        assert_eq!(reports[3].swap.rate, 0.5);
    }

    #[tokio::test]
    async fn missing_signer_is_reported_not_fatal() {
        let mut scenario = scenario();
        scenario.private_key = None;
        scenario.events = vec![
            Event::Refresh,
            Event::SetFrom {
                value: "4".to_owned(),
            },
            Event::Submit,
            Event::Sign { method: None },
            Event::OrderContinue,
        ];
        let mut runner =
            ScenarioRunner::new(scenario, MarketAdapterConfig::default()).expect("runner");
        let reports = runner.run().await.expect("run");
        assert!(reports[3].error.is_some());
        assert_eq!(reports[3].swap.step, SwapStep::Sign);
        assert!(reports[4].error.is_some());
        assert!(runner.order.is_none());
    }

    #[tokio::test]
    async fn confirmed_order_balance_reaches_swap_form() {
        let mut scenario = scenario();
        scenario.events = vec![
            Event::Refresh,
            Event::SetAccount {
                account: AccountRecord {
                    name: "alice".to_owned(),
                    balance: "20.000 HIVE".to_owned(),
                    hbd_balance: "25.000 HBD".to_owned(),
                },
            },
            Event::PlaceOrder {
                kind: TransactionKind::Sell,
                values: OrderValues {
                    total: 20.0,
                    amount: 80.0,
                    price: 0.25,
                    available: 100.0,
                },
            },
            Event::OrderContinue,
            Event::OrderSign { method: None },
            Event::SetFrom {
                value: "50".to_owned(),
            },
            Event::Submit,
        ];
        let mut runner =
            ScenarioRunner::new(scenario, MarketAdapterConfig::default()).expect("runner");
        let reports = runner.run().await.expect("run");

        let order = reports[4].order.as_ref().expect("order view");
        assert_eq!(order.step, OrderStep::Closed);
        assert_eq!(runner.wizard.user().account.balance, "20.000 HIVE");
        assert!(reports[5].swap.exceeds_balance);
        assert_eq!(
            reports[6].outcome,
            Some(Outcome::Ignored(hive_market_core::Blocked::AmountExceedsBalance))
        );
        assert_eq!(reports[6].swap.step, SwapStep::Form);
    }
}
