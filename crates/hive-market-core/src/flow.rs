use serde::{Deserialize, Serialize};

use crate::domain::{AccountRecord, TransitionRecord};
use crate::state_machine::SideEffect;

/// The signed-in user a dialog acts for. Injected by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub username: String,
    pub account: AccountRecord,
}

impl ActiveUser {
    pub fn new(account: AccountRecord) -> Self {
        Self {
            username: account.name.clone(),
            account,
        }
    }
}

/// Why a button-level action was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocked {
    AmountBelowMinimum,
    AmountExceedsBalance,
    InsufficientFunds,
    MissingOrderId,
    RateRefreshInFlight,
    RateUnavailable,
    SigningInProgress,
    EditingLocked,
    PairNotAllowed,
    NotAllowedInStep,
    StaleTicket,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Applied(Vec<SideEffect>),
    Ignored(Blocked),
}

impl Outcome {
    pub fn applied() -> Self {
        Outcome::Applied(Vec::new())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn effects(&self) -> &[SideEffect] {
        match self {
            Outcome::Applied(effects) => effects,
            Outcome::Ignored(_) => &[],
        }
    }

    pub fn blocked(&self) -> Option<Blocked> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Ignored(reason) => Some(*reason),
        }
    }
}

/// Identifies one signing attempt of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignTicket {
    pub(crate) attempt: u64,
}

/// Bookkeeping shared by the swap wizard and the order dialog: in-progress flag,
/// pending attempt, mounted flag, last error and the transition log.
#[derive(Debug, Clone)]
pub(crate) struct FlowState {
    pub flow: &'static str,
    pub in_progress: bool,
    pub active: bool,
    pub attempts: u64,
    pub pending: Option<u64>,
    pub last_error: Option<String>,
    pub notice: Option<String>,
    pub log: Vec<TransitionRecord>,
}

impl FlowState {
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            in_progress: false,
            active: true,
            attempts: 0,
            pending: None,
            last_error: None,
            notice: None,
            log: Vec::new(),
        }
    }

    pub fn start_attempt(&mut self) -> SignTicket {
        self.attempts = self.attempts.saturating_add(1);
        self.pending = Some(self.attempts);
        self.in_progress = true;
        self.last_error = None;
        self.notice = None;
        SignTicket {
            attempt: self.attempts,
        }
    }

    /// Checks a completion against the pending attempt. A dismissed dialog
    /// keeps its state untouched.
    pub fn finish_attempt(&mut self, ticket: SignTicket) -> Result<(), Blocked> {
        if self.pending != Some(ticket.attempt) {
            return Err(Blocked::StaleTicket);
        }
        if !self.active {
            return Err(Blocked::Dismissed);
        }
        self.pending = None;
        self.in_progress = false;
        Ok(())
    }

    pub fn record(&mut self, before: impl std::fmt::Debug, after: impl std::fmt::Debug, reason: &str) {
        let seq = self.log.last().map(|r| r.seq + 1).unwrap_or(1);
        self.log.push(TransitionRecord {
            seq,
            flow: self.flow.to_owned(),
            state_before: format!("{before:?}"),
            state_after: format!("{after:?}"),
            reason: reason.to_owned(),
        });
    }
}
