use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use hive_market_core::{MarketOperation, PortError, Receipt, SignMethod, SigningPort};

use crate::receipt::{deterministic_receipt, ensure_owner, hex_prefix, SignerMode};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const WIF_LEN: usize = 51;

/// Private key material. Never printed.
#[derive(Clone)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn parse(raw: &str) -> Result<Self, PortError> {
        let raw = raw.trim();
        if raw.len() != WIF_LEN
            || !raw.starts_with('5')
            || !raw.chars().all(|c| BASE58_ALPHABET.contains(c))
        {
            return Err(PortError::Validation("INVALID_PRIVATE_KEY_FORMAT".to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Short public identifier of the key, safe to log.
    pub fn fingerprint(&self) -> String {
        hex_prefix(&Sha256::digest(self.0.as_bytes()), 8)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Signs with a private key the user typed into the dialog.
#[derive(Debug, Clone)]
pub struct KeySigner {
    key: SigningKey,
    mode: SignerMode,
}

impl KeySigner {
    pub fn new(raw_key: &str) -> Result<Self, PortError> {
        Ok(Self {
            key: SigningKey::parse(raw_key)?,
            mode: SignerMode::Deterministic,
        })
    }

    pub fn with_mode(mut self, mode: SignerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn fingerprint(&self) -> String {
        self.key.fingerprint()
    }
}

#[async_trait]
impl SigningPort for KeySigner {
    fn method(&self) -> SignMethod {
        SignMethod::Key
    }

    async fn execute(
        &self,
        username: &str,
        operation: &MarketOperation,
    ) -> Result<Receipt, PortError> {
        ensure_owner(username, operation)?;
        self.mode.check()?;
        let fingerprint = self.key.fingerprint();
        debug!(%username, %fingerprint, kind = operation.kind(), "signing with private key");
        deterministic_receipt(SignMethod::Key, &fingerprint, username, operation)
    }
}
