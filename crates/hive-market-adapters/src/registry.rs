use std::sync::Arc;

use tracing::{debug, warn};

use hive_market_core::{PortError, SignerSet};

use crate::config::MarketAdapterConfig;
use crate::hosted_signer::HostedSigner;
use crate::key_signer::KeySigner;
use crate::keychain_signer::KeychainSigner;

/// Secrets a user supplied for this session.
#[derive(Default)]
pub struct Credentials {
    pub username: String,
    pub private_key: Option<String>,
    pub hosted_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("hosted_token", &self.hosted_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builds every signing strategy the credentials allow. The keychain signer is
/// always present; it reports a policy error when the extension is missing.
pub fn build_signers(
    config: &MarketAdapterConfig,
    credentials: &Credentials,
) -> Result<SignerSet, PortError> {
    let mut signers = SignerSet::new();

    if let Some(raw) = &credentials.private_key {
        signers.insert(Arc::new(KeySigner::new(raw)?));
    }

    let hosted = HostedSigner::new(&config.hosted_signer_app);
    match &credentials.hosted_token {
        Some(token) => hosted.login(&credentials.username, token)?,
        None => debug!(user = %credentials.username, "no hosted signer session"),
    }
    signers.insert(Arc::new(hosted));

    if !config.keychain_available {
        warn!("keychain extension unavailable");
    }
    signers.insert(Arc::new(KeychainSigner::new(config.keychain_available)));

    Ok(signers)
}
