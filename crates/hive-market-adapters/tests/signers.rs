mod common;

use hive_market_adapters::{
    build_signers, Credentials, HostedSigner, KeySigner, KeychainSigner, MarketAdapterConfig,
    SignerMode, SigningKey,
};
use hive_market_core::{PortError, SignMethod, SigningPort};

use common::{sell_order, VALID_WIF};

#[test]
fn key_must_look_like_wif() {
    assert!(SigningKey::parse(VALID_WIF).is_ok());
    assert!(SigningKey::parse(&format!(" {VALID_WIF}\n")).is_ok());
    let bad = vec![
        String::new(),
        "not a key".to_owned(),
        VALID_WIF[..50].to_owned(),
        format!("6{}", &VALID_WIF[1..]),
        format!("{}0", &VALID_WIF[..50]),
    ];
    for raw in &bad {
        let err = KeySigner::new(raw).expect_err("invalid key");
        assert!(matches!(err, PortError::Validation(m) if m == "INVALID_PRIVATE_KEY_FORMAT"));
    }
}

#[test]
fn key_is_never_printed() {
    let signer = KeySigner::new(VALID_WIF).expect("key signer");
    let printed = format!("{signer:?}");
    assert!(!printed.contains(VALID_WIF));
    assert!(printed.contains("redacted"));
}

#[tokio::test]
async fn key_signer_receipts_are_deterministic() {
    let signer = KeySigner::new(VALID_WIF).expect("key signer");
    let op = sell_order("alice");
    let first = signer.execute("alice", &op).await.expect("sign");
    let second = signer.execute("alice", &op).await.expect("sign again");
    assert_eq!(first, second);
    assert_eq!(first.tx_id.len(), 40);
    assert!(first.tx_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(first.method, SignMethod::Key);
    assert_eq!(first.operation_kind, "limit_order_create");
}

#[tokio::test]
async fn receipts_differ_per_method() {
    let op = sell_order("alice");
    let key = KeySigner::new(VALID_WIF)
        .expect("key signer")
        .execute("alice", &op)
        .await
        .expect("key");
    let keychain = KeychainSigner::new(true)
        .execute("alice", &op)
        .await
        .expect("keychain");
    assert_ne!(key.tx_id, keychain.tx_id);
}

#[tokio::test]
async fn owner_must_match_signing_user() {
    let signer = KeySigner::new(VALID_WIF).expect("key signer");
    let err = signer
        .execute("mallory", &sell_order("alice"))
        .await
        .expect_err("owner mismatch");
    assert!(matches!(err, PortError::Validation(_)));
}

#[tokio::test]
async fn rejecting_mode_reports_rejection() {
    let signer = KeychainSigner::new(true).with_mode(SignerMode::Rejecting("user cancelled".to_owned()));
    let err = signer
        .execute("alice", &sell_order("alice"))
        .await
        .expect_err("rejected");
    assert!(matches!(err, PortError::Rejected(m) if m == "user cancelled"));
}

#[tokio::test]
async fn keychain_without_extension_is_disabled() {
    let err = KeychainSigner::new(false)
        .execute("alice", &sell_order("alice"))
        .await
        .expect_err("disabled");
    assert!(matches!(err, PortError::Policy(_)));
}

#[tokio::test]
async fn hosted_signer_needs_session() {
    let signer = HostedSigner::new("hive-market");
    let op = sell_order("alice");
    let err = signer.execute("alice", &op).await.expect_err("no session");
    assert!(matches!(err, PortError::Policy(_)));

    signer.login("alice", "token-1").expect("login");
    let receipt = signer.execute("alice", &op).await.expect("signed");
    assert_eq!(receipt.method, SignMethod::Hosted);

    signer.logout("alice").expect("logout");
    assert!(signer.execute("alice", &op).await.is_err());
    assert!(signer.login("alice", "  ").is_err());
}

#[tokio::test]
async fn hosted_signer_without_app_is_disabled() {
    let signer = HostedSigner::new("");
    signer.login("alice", "token").expect("login");
    let err = signer
        .execute("alice", &sell_order("alice"))
        .await
        .expect_err("disabled");
    assert!(matches!(err, PortError::Policy(_)));
}

#[test]
fn registry_builds_signers_from_credentials() {
    let cfg = MarketAdapterConfig {
        keychain_available: true,
        ..MarketAdapterConfig::default()
    };
    let creds = Credentials {
        username: "alice".to_owned(),
        private_key: Some(VALID_WIF.to_owned()),
        hosted_token: Some("token".to_owned()),
    };
    let signers = build_signers(&cfg, &creds).expect("signers");
    assert_eq!(
        signers.methods(),
        vec![SignMethod::Key, SignMethod::Hosted, SignMethod::Keychain]
    );
    assert!(!format!("{creds:?}").contains(VALID_WIF));

    let without_key = Credentials {
        username: "alice".to_owned(),
        ..Credentials::default()
    };
    let signers = build_signers(&cfg, &without_key).expect("signers");
    assert!(matches!(
        signers.select(SignMethod::Key),
        Err(PortError::Policy(_))
    ));
}

#[test]
fn registry_rejects_malformed_key() {
    let creds = Credentials {
        username: "alice".to_owned(),
        private_key: Some("bogus".to_owned()),
        hosted_token: None,
    };
    assert!(build_signers(&MarketAdapterConfig::default(), &creds).is_err());
}

#[tokio::test]
async fn receipts_are_bound_to_the_signing_key() {
    let other_wif = format!("{}x", &VALID_WIF[..50]);
    let first = KeySigner::new(VALID_WIF).expect("first key");
    let second = KeySigner::new(&other_wif).expect("second key");
    assert_ne!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.fingerprint().len(), 16);
    assert!(!VALID_WIF.contains(&first.fingerprint()));

    let op = sell_order("alice");
    let a = first.execute("alice", &op).await.expect("first signs");
    let b = second.execute("alice", &op).await.expect("second signs");
    assert_ne!(a.tx_id, b.tx_id);
}
