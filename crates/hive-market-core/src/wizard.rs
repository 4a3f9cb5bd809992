//! Swap form wizard: `Form -> Sign -> Success`.
//!
//! The wizard owns the step and the in-progress flag and wraps a [`RateSync`]
//! for the amounts. Every user or timer event is one method call; each call
//! either applies a transition and returns its side effects or is a no-op
//! reported as [`Outcome::Ignored`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    limit_order_for, AccountRecord, Asset, MarketOperation, Receipt, TimestampMs, TransactionKind,
    TransitionRecord,
};
use crate::flow::{ActiveUser, Blocked, FlowState, Outcome, SignTicket};
use crate::ports::{format_error, AccountPort, ClockPort, PortError, RatePort, SigningPort};
use crate::rate_sync::{
    fetch_quote, RateQuote, RateStatus, RateSync, RefreshOutcome, RefreshTicket,
};
use crate::state_machine::{swap_transition, SideEffect, SwapAction, SwapStep};

pub const DEFAULT_ORDER_EXPIRATION_DAYS: u64 = 27;

#[derive(Debug, Clone, Serialize)]
pub struct SwapSnapshot {
    pub step: SwapStep,
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub rate_status: RateStatus,
    pub exceeds_balance: bool,
    pub in_progress: bool,
    pub can_submit: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SwapWizard {
    sync: RateSync,
    step: SwapStep,
    user: ActiveUser,
    flow: FlowState,
    last_receipt: Option<Receipt>,
    expiration_days: u64,
}

impl SwapWizard {
    pub fn new(mut sync: RateSync, user: ActiveUser) -> Self {
        sync.update_balance(user.account.balance_of(sync.from_asset()));
        Self {
            sync,
            step: SwapStep::Form,
            user,
            flow: FlowState::new("swap"),
            last_receipt: None,
            expiration_days: DEFAULT_ORDER_EXPIRATION_DAYS,
        }
    }

    pub fn with_expiration_days(mut self, days: u64) -> Self {
        self.expiration_days = days;
        self
    }

    pub fn step(&self) -> SwapStep {
        self.step
    }

    pub fn sync(&self) -> &RateSync {
        &self.sync
    }

    pub fn user(&self) -> &ActiveUser {
        &self.user
    }

    pub fn in_progress(&self) -> bool {
        self.flow.in_progress
    }

    pub fn is_active(&self) -> bool {
        self.flow.active
    }

    pub fn last_error(&self) -> Option<&str> {
        self.flow.last_error.as_deref()
    }

    /// Set when a transaction went through but the follow-up account refresh did not.
    pub fn notice(&self) -> Option<&str> {
        self.flow.notice.as_deref()
    }

    pub fn last_receipt(&self) -> Option<&Receipt> {
        self.last_receipt.as_ref()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.flow.log
    }

    pub fn snapshot(&self) -> SwapSnapshot {
        let amounts = self.sync.amounts();
        SwapSnapshot {
            step: self.step,
            from_asset: self.sync.from_asset(),
            to_asset: self.sync.to_asset(),
            from: amounts.from.clone(),
            to: amounts.to.clone(),
            rate: self.sync.rate(),
            rate_status: self.sync.rate_status(),
            exceeds_balance: self.sync.exceeds_balance(),
            in_progress: self.flow.in_progress,
            can_submit: self.can_submit(),
            last_error: self.flow.last_error.clone(),
        }
    }

    pub fn submit_blocker(&self) -> Option<Blocked> {
        if !self.flow.active {
            return Some(Blocked::Dismissed);
        }
        if self.step != SwapStep::Form {
            return Some(Blocked::NotAllowedInStep);
        }
        if self.flow.in_progress {
            return Some(Blocked::SigningInProgress);
        }
        if self.sync.from_amount() <= 0.0 {
            return Some(Blocked::AmountBelowMinimum);
        }
        if self.sync.exceeds_balance() {
            return Some(Blocked::AmountExceedsBalance);
        }
        if self.sync.refresh_in_flight() {
            return Some(Blocked::RateRefreshInFlight);
        }
        if self.sync.rate() <= 0.0 {
            return Some(Blocked::RateUnavailable);
        }
        None
    }

    pub fn can_submit(&self) -> bool {
        self.submit_blocker().is_none()
    }

    fn edit_blocker(&self) -> Option<Blocked> {
        if !self.flow.active {
            Some(Blocked::Dismissed)
        } else if self.flow.in_progress {
            Some(Blocked::SigningInProgress)
        } else if self.step != SwapStep::Form {
            Some(Blocked::EditingLocked)
        } else {
            None
        }
    }

    pub fn set_from(&mut self, value: &str) -> Outcome {
        if let Some(reason) = self.edit_blocker() {
            return Outcome::Ignored(reason);
        }
        self.sync.set_from(value);
        Outcome::applied()
    }

    pub fn set_to(&mut self, value: &str) -> Outcome {
        if let Some(reason) = self.edit_blocker() {
            return Outcome::Ignored(reason);
        }
        self.sync.set_to(value);
        Outcome::applied()
    }

    pub fn swap(&mut self) -> Outcome {
        if let Some(reason) = self.edit_blocker() {
            return Outcome::Ignored(reason);
        }
        if self.sync.swap().is_err() {
            return Outcome::Ignored(Blocked::PairNotAllowed);
        }
        self.sync
            .update_balance(self.user.account.balance_of(self.sync.from_asset()));
        Outcome::applied()
    }

    pub fn change_from_asset(&mut self, asset: Asset) -> Outcome {
        if let Some(reason) = self.edit_blocker() {
            return Outcome::Ignored(reason);
        }
        match self.sync.change_from_asset(asset, Some(&self.user.account)) {
            Ok(effects) => Outcome::Applied(effects),
            Err(err) => {
                debug!(%asset, error = %err, "from asset change rejected");
                Outcome::Ignored(Blocked::PairNotAllowed)
            }
        }
    }

    pub fn change_to_asset(&mut self, asset: Asset) -> Outcome {
        if let Some(reason) = self.edit_blocker() {
            return Outcome::Ignored(reason);
        }
        match self.sync.change_to_asset(asset) {
            Ok(effects) => Outcome::Applied(effects),
            Err(err) => {
                debug!(%asset, error = %err, "to asset change rejected");
                Outcome::Ignored(Blocked::PairNotAllowed)
            }
        }
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.sync.begin_refresh()
    }

    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<RateQuote, PortError>,
        now: TimestampMs,
    ) -> Result<RefreshOutcome, PortError> {
        if !self.flow.active {
            debug!("dropping rate refresh for dismissed swap form");
            return Ok(RefreshOutcome::Superseded);
        }
        self.sync.complete_refresh(ticket, result, now)
    }

    pub async fn refresh_rate(
        &mut self,
        source: &dyn RatePort,
        clock: &dyn ClockPort,
    ) -> Result<RefreshOutcome, PortError> {
        let ticket = self.begin_refresh();
        let result = fetch_quote(source, ticket.from_asset(), ticket.to_asset()).await;
        match clock.now_ms() {
            Ok(now) => self.complete_refresh(ticket, result, TimestampMs(now)),
            // Settle the ticket anyway or submit stays blocked; a failure is never stamped.
            Err(err) => self.complete_refresh(ticket, Err(err), TimestampMs(0)),
        }
    }

    pub fn submit(&mut self) -> Outcome {
        if let Some(reason) = self.submit_blocker() {
            debug!(?reason, "swap submit ignored");
            return Outcome::Ignored(reason);
        }
        self.apply(SwapAction::Submit)
    }

    pub fn back(&mut self) -> Outcome {
        if self.flow.in_progress {
            return Outcome::Ignored(Blocked::SigningInProgress);
        }
        self.apply(SwapAction::Back)
    }

    /// Starts over after a completed swap: amounts go to zero and a fresh
    /// rate is requested.
    pub fn reset(&mut self) -> Outcome {
        if !self.flow.active {
            return Outcome::Ignored(Blocked::Dismissed);
        }
        let outcome = self.apply(SwapAction::Reset);
        if outcome.effects().contains(&SideEffect::ClearAmounts) {
            self.sync.reset_amounts();
        }
        outcome
    }

    /// Closes the form. Completions still in flight are discarded when they land.
    pub fn dismiss(&mut self) -> Outcome {
        if !self.flow.active {
            return Outcome::Ignored(Blocked::Dismissed);
        }
        self.flow.active = false;
        self.flow.record(self.step, self.step, "dismiss");
        Outcome::Applied(vec![SideEffect::Close])
    }

    /// The order a confirmed swap submits: sell `from` of the from-asset for
    /// `to` of the to-asset.
    pub fn operation(&self, now: TimestampMs) -> Option<MarketOperation> {
        let from = self.sync.from_amount();
        let to = crate::amount::parse_amount(&self.sync.amounts().to);
        let (kind, total, amount) = match self.sync.from_asset() {
            Asset::Hive => (TransactionKind::Sell, to, from),
            Asset::Hbd => (TransactionKind::Buy, from, to),
        };
        limit_order_for(
            &self.user.username,
            kind,
            total,
            amount,
            now,
            self.expiration_days,
        )
        .map(MarketOperation::LimitOrderCreate)
    }

    pub fn begin_signing(
        &mut self,
        now: TimestampMs,
    ) -> Result<(SignTicket, MarketOperation), Blocked> {
        if !self.flow.active {
            return Err(Blocked::Dismissed);
        }
        if self.step != SwapStep::Sign {
            return Err(Blocked::NotAllowedInStep);
        }
        if self.flow.in_progress {
            return Err(Blocked::SigningInProgress);
        }
        if self.sync.from_amount() <= 0.0 {
            return Err(Blocked::AmountBelowMinimum);
        }
        let operation = self.operation(now).ok_or(Blocked::AmountBelowMinimum)?;
        let ticket = self.flow.start_attempt();
        debug!(attempt = ticket.attempt, "swap signing started");
        Ok((ticket, operation))
    }

    /// Lands a signing result. A receipt moves the wizard to `Success`; an error
    /// keeps it in `Sign` with the amounts intact and a message to show.
    pub fn complete_signing(
        &mut self,
        ticket: SignTicket,
        result: Result<Receipt, PortError>,
    ) -> Outcome {
        if let Err(reason) = self.flow.finish_attempt(ticket) {
            debug!(?reason, "discarding swap signing completion");
            return Outcome::Ignored(reason);
        }
        match result {
            Ok(receipt) => {
                info!(tx_id = %receipt.tx_id, method = ?receipt.method, "swap confirmed");
                self.last_receipt = Some(receipt);
                self.apply(SwapAction::SignConfirmed)
            }
            Err(err) => {
                let message = format_error(&err);
                warn!(error = %err, "swap signing failed");
                self.flow.last_error = Some(message.clone());
                self.apply(SwapAction::SignFailed { message })
            }
        }
    }

    /// Writes the shared account record after a confirmed transaction, whether
    /// it came from this form or from an order dialog.
    pub fn apply_account(&mut self, account: AccountRecord) {
        if !self.flow.active {
            return;
        }
        self.sync
            .update_balance(account.balance_of(self.sync.from_asset()));
        self.user.account = account;
    }

    /// Runs one signing attempt end to end. On a receipt the account is
    /// re-fetched before the step advances, so the returned effects no longer
    /// include `RefreshAccount`.
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
                    warn!(error = %err, "account refresh after swap failed");
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

    fn apply(&mut self, action: SwapAction) -> Outcome {
        let reason = action.name();
        match swap_transition(self.step, action) {
            Ok((next, effects)) => {
                self.flow.record(self.step, next, reason);
                debug!(from = ?self.step, to = ?next, reason, "swap transition");
                self.step = next;
                Outcome::Applied(effects)
            }
            Err(err) => {
                debug!(error = %err, "swap action ignored");
                Outcome::Ignored(Blocked::NotAllowedInStep)
            }
        }
    }
}
