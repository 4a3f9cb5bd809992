use std::collections::HashMap;

use hive_market_adapters::{ConfigError, MarketAdapterConfig};
use hive_market_core::SignMethod;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |var| map.get(var).cloned()
}

#[test]
fn defaults_apply_without_overrides() {
    let cfg = MarketAdapterConfig::from_lookup(lookup(&[])).expect("defaults");
    assert_eq!(cfg.rate_stale_after_ms, 20_000);
    assert_eq!(cfg.order_expiration_days, 27);
    assert_eq!(cfg.default_sign_method, SignMethod::Key);
    assert!(!cfg.keychain_available);
    assert_eq!(cfg.rate_sync_config().stale_after_ms, 20_000);
}

#[test]
fn overrides_are_parsed() {
    let cfg = MarketAdapterConfig::from_lookup(lookup(&[
        ("HIVE_MARKET_RATE_STALE_AFTER_MS", "5000"),
        ("HIVE_MARKET_RATE_REFRESH_INTERVAL_MS", " 7500 "),
        ("HIVE_MARKET_SIGN_METHOD", "keychain"),
        ("HIVE_MARKET_ORDER_EXPIRATION_DAYS", "3"),
        ("HIVE_MARKET_HOSTED_APP", "dex.app"),
        ("HIVE_MARKET_KEYCHAIN", "yes"),
    ]))
    .expect("overrides");
    assert_eq!(cfg.rate_stale_after_ms, 5_000);
    assert_eq!(cfg.rate_refresh_interval_ms, 7_500);
    assert_eq!(cfg.default_sign_method, SignMethod::Keychain);
    assert_eq!(cfg.order_expiration_days, 3);
    assert_eq!(cfg.hosted_signer_app, "dex.app");
    assert!(cfg.keychain_available);
    assert_eq!(cfg.rate_sync_config().stale_after_ms, 5_000);
}

#[test]
fn invalid_values_are_reported() {
    let err = MarketAdapterConfig::from_lookup(lookup(&[("HIVE_MARKET_SIGN_METHOD", "ledger")]))
        .expect_err("bad method");
    assert_eq!(
        err,
        ConfigError::Invalid {
            var: "HIVE_MARKET_SIGN_METHOD",
            value: "ledger".to_owned(),
        }
    );

    let err =
        MarketAdapterConfig::from_lookup(lookup(&[("HIVE_MARKET_RATE_STALE_AFTER_MS", "0")]))
            .expect_err("zero");
    assert_eq!(
        err,
        ConfigError::Zero {
            var: "HIVE_MARKET_RATE_STALE_AFTER_MS"
        }
    );

    assert!(
        MarketAdapterConfig::from_lookup(lookup(&[("HIVE_MARKET_KEYCHAIN", "maybe")])).is_err()
    );
}
