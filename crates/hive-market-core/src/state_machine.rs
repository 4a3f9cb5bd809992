use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapStep {
    Form,
    Sign,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapAction {
    Submit,
    SignConfirmed,
    SignFailed { message: String },
    Back,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStep {
    Confirm,
    Signing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    Continue,
    Back,
    SignConfirmed,
    SignFailed { message: String },
    Dismiss,
}

/// Work the caller must carry out after a transition has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    RefreshRate,
    RefreshAccount,
    ClearAmounts,
    NotifyError(String),
    NotifySuccess,
    Close,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("illegal swap transition: {from:?} on {action}")]
    Swap { from: SwapStep, action: &'static str },
    #[error("illegal order transition: {from:?} on {action}")]
    Order { from: OrderStep, action: &'static str },
}

impl SwapAction {
    pub fn name(&self) -> &'static str {
        match self {
            SwapAction::Submit => "submit",
            SwapAction::SignConfirmed => "sign_confirmed",
            SwapAction::SignFailed { .. } => "sign_failed",
            SwapAction::Back => "back",
            SwapAction::Reset => "reset",
        }
    }
}

impl OrderAction {
    pub fn name(&self) -> &'static str {
        match self {
            OrderAction::Continue => "continue",
            OrderAction::Back => "back",
            OrderAction::SignConfirmed => "sign_confirmed",
            OrderAction::SignFailed { .. } => "sign_failed",
            OrderAction::Dismiss => "dismiss",
        }
    }
}

/// Swap form graph: `Form -> Sign -> Success`, with `Sign -> Form` on back and
/// `Success -> Form` on reset. Guards on amounts and balance live in the wizard.
pub fn swap_transition(
    from: SwapStep,
    action: SwapAction,
) -> Result<(SwapStep, Vec<SideEffect>), TransitionError> {
    use SwapAction as A;
    use SwapStep as S;

    let next = match (from, action) {
        (S::Form, A::Submit) => (S::Sign, vec![]),
        (S::Sign, A::SignConfirmed) => (S::Success, vec![SideEffect::RefreshAccount]),
        (S::Sign, A::SignFailed { message }) => (S::Sign, vec![SideEffect::NotifyError(message)]),
        (S::Sign, A::Back) => (S::Form, vec![]),
        (S::Success, A::Reset) => (
            S::Form,
            vec![SideEffect::ClearAmounts, SideEffect::RefreshRate],
        ),
        (from, action) => {
            return Err(TransitionError::Swap {
                from,
                action: action.name(),
            })
        }
    };
    Ok(next)
}

/// Order dialog graph: `Confirm -> Signing -> Closed`. A failed signature
/// returns to `Confirm`; dismiss closes from any open step.
pub fn order_transition(
    from: OrderStep,
    action: OrderAction,
) -> Result<(OrderStep, Vec<SideEffect>), TransitionError> {
    use OrderAction as A;
    use OrderStep as S;

    let next = match (from, action) {
        (S::Confirm, A::Continue) => (S::Signing, vec![]),
        (S::Signing, A::Back) => (S::Confirm, vec![]),
        (S::Signing, A::SignConfirmed) => (
            S::Closed,
            vec![
                SideEffect::RefreshAccount,
                SideEffect::NotifySuccess,
                SideEffect::Close,
            ],
        ),
        (S::Signing, A::SignFailed { message }) => {
            (S::Confirm, vec![SideEffect::NotifyError(message)])
        }
        (S::Confirm | S::Signing, A::Dismiss) => (S::Closed, vec![SideEffect::Close]),
        (from, action) => {
            return Err(TransitionError::Order {
                from,
                action: action.name(),
            })
        }
    };
    Ok(next)
}
