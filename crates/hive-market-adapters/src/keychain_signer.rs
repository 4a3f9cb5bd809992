use async_trait::async_trait;
use tracing::debug;

use hive_market_core::{MarketOperation, PortError, Receipt, SignMethod, SigningPort};

use crate::receipt::{deterministic_receipt, ensure_owner, SignerMode};

/// Browser-extension keychain signer, keyed by username.
#[derive(Debug, Clone)]
pub struct KeychainSigner {
    mode: SignerMode,
}

impl KeychainSigner {
    pub fn new(extension_available: bool) -> Self {
        let mode = if extension_available {
            SignerMode::Deterministic
        } else {
            SignerMode::Disabled("keychain extension not detected".to_owned())
        };
        Self { mode }
    }

    pub fn with_mode(mut self, mode: SignerMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl SigningPort for KeychainSigner {
    fn method(&self) -> SignMethod {
        SignMethod::Keychain
    }

    async fn execute(
        &self,
        username: &str,
        operation: &MarketOperation,
    ) -> Result<Receipt, PortError> {
        ensure_owner(username, operation)?;
        self.mode.check()?;
        debug!(%username, kind = operation.kind(), "signing through keychain");
        deterministic_receipt(SignMethod::Keychain, "keychain", username, operation)
    }
}
