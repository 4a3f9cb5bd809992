use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::amount::{format_fixed3, sanitize};
use crate::domain::{
    limit_order_for, AccountRecord, MarketOperation, OrderValues, Receipt, TimestampMs,
    TransactionKind, TransitionRecord,
};
use crate::flow::{ActiveUser, Blocked, FlowState, Outcome, SignTicket};
use crate::ports::{format_error, AccountPort, ClockPort, PortError, SigningPort};
use crate::state_machine::{order_transition, OrderAction, OrderStep, SideEffect};
use crate::wizard::DEFAULT_ORDER_EXPIRATION_DAYS;

/// Confirmation texts per transaction kind. Placeholders: `{amount}`,
/// `{price}`, `{total}`, `{balance}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationCopy {
    pub buy: String,
    pub sell: String,
    pub cancel: String,
    pub insufficient: String,
}

impl Default for ConfirmationCopy {
    fn default() -> Self {
        Self {
            buy: "Buy {amount} HIVE at {price} HBD each for {total} HBD. Remaining balance: {balance} HBD"
                .to_owned(),
            sell: "Sell {amount} HIVE at {price} HBD each for {total} HBD. Remaining balance: {balance} HIVE"
                .to_owned(),
            cancel: "Are you sure you want to cancel this order?".to_owned(),
            insufficient: "Your balance is too low for this transaction".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "snake_case")]
pub enum ConfirmationPrompt {
    Buy {
        amount: f64,
        price: f64,
        total: f64,
        balance_after: f64,
    },
    Sell {
        amount: f64,
        price: f64,
        total: f64,
        balance_after: f64,
    },
    Cancel {
        order_id: Option<u32>,
    },
    InsufficientFunds,
}

impl ConfirmationPrompt {
    pub fn render(&self, copy: &ConfirmationCopy) -> String {
        let fill = |template: &str, amount: f64, price: f64, total: f64, balance: f64| {
            template
                .replace("{amount}", &format_fixed3(amount))
                .replace("{price}", &format!("{price:.6}"))
                .replace("{total}", &format_fixed3(total))
                .replace("{balance}", &format_fixed3(balance))
        };
        match *self {
            ConfirmationPrompt::Buy {
                amount,
                price,
                total,
                balance_after,
            } => fill(&copy.buy, amount, price, total, balance_after),
            ConfirmationPrompt::Sell {
                amount,
                price,
                total,
                balance_after,
            } => fill(&copy.sell, amount, price, total, balance_after),
            ConfirmationPrompt::Cancel { .. } => copy.cancel.clone(),
            ConfirmationPrompt::InsufficientFunds => copy.insufficient.clone(),
        }
    }
}

/// Limit-order placement or cancellation dialog: `Confirm -> Signing -> Closed`.
#[derive(Debug, Clone)]
pub struct OrderDialog {
    kind: TransactionKind,
    values: OrderValues,
    order_id: Option<u32>,
    user: ActiveUser,
    step: OrderStep,
    flow: FlowState,
    last_receipt: Option<Receipt>,
    account_refreshed: bool,
    expiration_days: u64,
}

impl OrderDialog {
    pub fn place(kind: TransactionKind, values: OrderValues, user: ActiveUser) -> Self {
        Self::new(kind, values, None, user)
    }

    pub fn cancel(order_id: Option<u32>, user: ActiveUser) -> Self {
        Self::new(TransactionKind::Cancel, OrderValues::default(), order_id, user)
    }

    fn new(
        kind: TransactionKind,
        values: OrderValues,
        order_id: Option<u32>,
        user: ActiveUser,
    ) -> Self {
        Self {
            kind,
            values,
            order_id,
            user,
            step: OrderStep::Confirm,
            flow: FlowState::new("order"),
            last_receipt: None,
            account_refreshed: false,
            expiration_days: DEFAULT_ORDER_EXPIRATION_DAYS,
        }
    }

    pub fn with_expiration_days(mut self, days: u64) -> Self {
        self.expiration_days = days;
        self
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn step(&self) -> OrderStep {
        self.step
    }

    pub fn user(&self) -> &ActiveUser {
        &self.user
    }

    pub fn in_progress(&self) -> bool {
        self.flow.in_progress
    }

    pub fn last_error(&self) -> Option<&str> {
        self.flow.last_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.flow.notice.as_deref()
    }

    pub fn last_receipt(&self) -> Option<&Receipt> {
        self.last_receipt.as_ref()
    }

    /// Account fetched after a confirmed order. The owner of the swap form
    /// hands it to [`crate::SwapWizard::apply_account`] so both read one record.
    pub fn refreshed_account(&self) -> Option<&AccountRecord> {
        self.account_refreshed.then_some(&self.user.account)
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.flow.log
    }

    /// What the order spends: HBD `total` for a buy, HIVE `amount` for a sell.
    fn spend(&self) -> f64 {
        sanitize(match self.kind {
            TransactionKind::Buy => self.values.total,
            TransactionKind::Sell => self.values.amount,
            TransactionKind::Cancel => 0.0,
        })
    }

    pub fn prompt(&self) -> ConfirmationPrompt {
        let OrderValues {
            total,
            amount,
            price,
            ..
        } = self.values;
        let available = sanitize(self.values.available);
        match self.kind {
            TransactionKind::Cancel => ConfirmationPrompt::Cancel {
                order_id: self.order_id,
            },
            _ if available < self.spend() => ConfirmationPrompt::InsufficientFunds,
            TransactionKind::Buy => ConfirmationPrompt::Buy {
                amount,
                price,
                total,
                balance_after: available - self.spend(),
            },
            TransactionKind::Sell => ConfirmationPrompt::Sell {
                amount,
                price,
                total,
                balance_after: available - self.spend(),
            },
        }
    }

    pub fn message(&self, copy: &ConfirmationCopy) -> String {
        self.prompt().render(copy)
    }

    pub fn continue_blocker(&self) -> Option<Blocked> {
        if !self.flow.active {
            return Some(Blocked::Dismissed);
        }
        if self.step != OrderStep::Confirm {
            return Some(Blocked::NotAllowedInStep);
        }
        match self.kind {
            TransactionKind::Cancel if self.order_id.is_none() => Some(Blocked::MissingOrderId),
            TransactionKind::Cancel => None,
            _ if self.spend() <= 0.0 => Some(Blocked::AmountBelowMinimum),
            _ if sanitize(self.values.available) < self.spend() => {
                Some(Blocked::InsufficientFunds)
            }
            _ => None,
        }
    }

    pub fn proceed(&mut self) -> Outcome {
        if let Some(reason) = self.continue_blocker() {
            debug!(?reason, kind = ?self.kind, "order continue ignored");
            return Outcome::Ignored(reason);
        }
        self.apply(OrderAction::Continue)
    }

    pub fn back(&mut self) -> Outcome {
        if self.flow.in_progress {
            return Outcome::Ignored(Blocked::SigningInProgress);
        }
        self.apply(OrderAction::Back)
    }

    pub fn dismiss(&mut self) -> Outcome {
        if !self.flow.active {
            return Outcome::Ignored(Blocked::Dismissed);
        }
        let outcome = self.apply(OrderAction::Dismiss);
        self.flow.active = false;
        outcome
    }

    pub fn operation(&self, now: TimestampMs) -> Option<MarketOperation> {
        match self.kind {
            TransactionKind::Cancel => {
                self.order_id
                    .map(|order_id| MarketOperation::LimitOrderCancel {
                        owner: self.user.username.clone(),
                        order_id,
                    })
            }
            kind => limit_order_for(
                &self.user.username,
                kind,
                self.values.total,
                self.values.amount,
                now,
                self.expiration_days,
            )
            .map(MarketOperation::LimitOrderCreate),
        }
    }

    pub fn begin_signing(
        &mut self,
        now: TimestampMs,
    ) -> Result<(SignTicket, MarketOperation), Blocked> {
        if !self.flow.active {
            return Err(Blocked::Dismissed);
        }
        if self.step != OrderStep::Signing {
            return Err(Blocked::NotAllowedInStep);
        }
        if self.flow.in_progress {
            return Err(Blocked::SigningInProgress);
        }
        let operation = self.operation(now).ok_or(Blocked::MissingOrderId)?;
        let ticket = self.flow.start_attempt();
        Ok((ticket, operation))
    }

    /// A receipt closes the dialog; an error sends it back to `Confirm` with a
    /// message and the same values.
    pub fn complete_signing(
        &mut self,
        ticket: SignTicket,
        result: Result<Receipt, PortError>,
    ) -> Outcome {
        if let Err(reason) = self.flow.finish_attempt(ticket) {
            debug!(?reason, "discarding order signing completion");
            return Outcome::Ignored(reason);
        }
        match result {
            Ok(receipt) => {
                info!(tx_id = %receipt.tx_id, kind = ?self.kind, "order confirmed");
                self.last_receipt = Some(receipt);
                let outcome = self.apply(OrderAction::SignConfirmed);
                self.flow.active = false;
                outcome
            }
            Err(err) => {
                let message = format_error(&err);
                warn!(error = %err, kind = ?self.kind, "order signing failed");
                self.flow.last_error = Some(message.clone());
                self.apply(OrderAction::SignFailed { message })
            }
        }
    }

    pub fn apply_account(&mut self, account: AccountRecord) {
        if !self.flow.active {
            return;
        }
        self.user.account = account;
        self.account_refreshed = true;
    }

    pub async fn sign(
        &mut self,
        signer: &dyn SigningPort,
        accounts: &dyn AccountPort,
        clock: &dyn ClockPort,
    ) -> Result<Outcome, PortError> {
        let now = TimestampMs(clock.now_ms()?);
        let (ticket, operation) = match self.begin_signing(now) {
            Ok(started) => started,
            Err(reason) => return Ok(Outcome::Ignored(reason)),
        };

        let username = self.user.username.clone();
        let result = signer.execute(&username, &operation).await;
        if result.is_ok() && self.flow.active {
            match accounts.fetch_full_account(&username).await {
                Ok(account) => self.apply_account(account),
                Err(err) => {
                    warn!(error = %err, "account refresh after order failed");
                    self.flow.notice = Some(format_error(&err));
                }
            }
        }

        Ok(match self.complete_signing(ticket, result) {
            Outcome::Applied(effects) => Outcome::Applied(
                effects
                    .into_iter()
                    .filter(|e| *e != SideEffect::RefreshAccount)
                    .collect(),
            ),
            ignored => ignored,
        })
    }

    fn apply(&mut self, action: OrderAction) -> Outcome {
        let reason = action.name();
        match order_transition(self.step, action) {
            Ok((next, effects)) => {
                self.flow.record(self.step, next, reason);
                debug!(from = ?self.step, to = ?next, reason, "order transition");
                self.step = next;
                Outcome::Applied(effects)
            }
            Err(err) => {
                debug!(error = %err, "order action ignored");
                Outcome::Ignored(Blocked::NotAllowedInStep)
            }
        }
    }
}
