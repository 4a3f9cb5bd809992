pub mod amount;
pub mod domain;
pub mod flow;
pub mod order_dialog;
pub mod pairs;
pub mod ports;
pub mod rate_sync;
pub mod state_machine;
pub mod wizard;

pub use amount::{format_amount, parse_amount};
pub use domain::{
    limit_order_for, AccountRecord, AmountPair, Asset, AssetAmount, Balance, LimitOrder,
    MarketOperation, MarketRate, OrderValues, Receipt, SignMethod, TimestampMs, TransactionKind,
    TransitionRecord,
};
pub use flow::{ActiveUser, Blocked, Outcome, SignTicket};
pub use order_dialog::{ConfirmationCopy, ConfirmationPrompt, OrderDialog};
pub use pairs::{PairError, PairTable};
pub use ports::{
    format_error, AccountPort, ClockPort, PortError, RatePort, SignerSet, SigningPort,
};
pub use rate_sync::{
    validate_balance, MarketSummary, RateQuote, RateStatus, RateSync, RateSyncConfig,
    RefreshOutcome, RefreshTicket,
};
pub use state_machine::{
    order_transition, swap_transition, OrderAction, OrderStep, SideEffect, SwapAction, SwapStep,
    TransitionError,
};
pub use wizard::{SwapSnapshot, SwapWizard};
