use hive_market_core::{
    order_transition, swap_transition, OrderAction, OrderStep, SideEffect, SwapAction, SwapStep,
};

#[test]
fn swap_happy_path_transitions() {
    let (s1, fx) = swap_transition(SwapStep::Form, SwapAction::Submit).expect("form -> sign");
    assert_eq!(s1, SwapStep::Sign);
    assert!(fx.is_empty());
    let (s2, fx) = swap_transition(s1, SwapAction::SignConfirmed).expect("sign -> success");
    assert_eq!(s2, SwapStep::Success);
    assert_eq!(fx, vec![SideEffect::RefreshAccount]);
    let (s3, fx) = swap_transition(s2, SwapAction::Reset).expect("success -> form");
    assert_eq!(s3, SwapStep::Form);
    assert_eq!(fx, vec![SideEffect::ClearAmounts, SideEffect::RefreshRate]);
}

#[test]
fn swap_failure_stays_in_sign() {
    let (step, fx) = swap_transition(
        SwapStep::Sign,
        SwapAction::SignFailed {
            message: "denied".to_owned(),
        },
    )
    .expect("sign failure is a legal edge");
    assert_eq!(step, SwapStep::Sign);
    assert_eq!(fx, vec![SideEffect::NotifyError("denied".to_owned())]);
}

#[test]
fn swap_cannot_skip_sign() {
    let err = swap_transition(SwapStep::Form, SwapAction::SignConfirmed).expect_err("must fail");
    assert!(err.to_string().contains("illegal swap transition"));
    assert!(swap_transition(SwapStep::Success, SwapAction::Submit).is_err());
    assert!(swap_transition(SwapStep::Form, SwapAction::Back).is_err());
    assert!(swap_transition(SwapStep::Sign, SwapAction::Reset).is_err());
}

#[test]
fn success_only_reachable_from_sign_via_confirmation() {
    let steps = [SwapStep::Form, SwapStep::Sign, SwapStep::Success];
    let actions = [
        SwapAction::Submit,
        SwapAction::SignConfirmed,
        SwapAction::SignFailed {
            message: "x".to_owned(),
        },
        SwapAction::Back,
        SwapAction::Reset,
    ];
    for step in steps {
        for action in actions.iter().cloned() {
            let label = action.name();
            if let Ok((SwapStep::Success, _)) = swap_transition(step, action) {
                assert_eq!(step, SwapStep::Sign);
                assert_eq!(label, "sign_confirmed");
            }
        }
    }
}

#[test]
fn order_happy_path_closes_with_refresh() {
    let (s1, _) = order_transition(OrderStep::Confirm, OrderAction::Continue).expect("continue");
    assert_eq!(s1, OrderStep::Signing);
    let (s2, fx) = order_transition(s1, OrderAction::SignConfirmed).expect("confirmed");
    assert_eq!(s2, OrderStep::Closed);
    assert_eq!(
        fx,
        vec![
            SideEffect::RefreshAccount,
            SideEffect::NotifySuccess,
            SideEffect::Close
        ]
    );
}

#[test]
fn order_failure_returns_to_confirm() {
    let (step, fx) = order_transition(
        OrderStep::Signing,
        OrderAction::SignFailed {
            message: "nope".to_owned(),
        },
    )
    .expect("failure edge");
    assert_eq!(step, OrderStep::Confirm);
    assert_eq!(fx, vec![SideEffect::NotifyError("nope".to_owned())]);
}

#[test]
fn order_closed_is_terminal() {
    let err = order_transition(OrderStep::Closed, OrderAction::Continue).expect_err("must fail");
    assert!(err.to_string().contains("illegal order transition"));
    assert!(order_transition(OrderStep::Closed, OrderAction::Dismiss).is_err());
    assert!(order_transition(OrderStep::Confirm, OrderAction::SignConfirmed).is_err());
}
