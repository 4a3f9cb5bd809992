use sha2::{Digest, Sha256};

use hive_market_core::{MarketOperation, PortError, Receipt, SignMethod};

/// How a signing adapter answers `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerMode {
    /// Confirms with a receipt derived from the request.
    Deterministic,
    /// Declines every request, as a user closing the signer would.
    Rejecting(String),
    Disabled(String),
}

impl SignerMode {
    pub(crate) fn check(&self) -> Result<(), PortError> {
        match self {
            SignerMode::Deterministic => Ok(()),
            SignerMode::Rejecting(reason) => Err(PortError::Rejected(reason.clone())),
            SignerMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }
}

pub(crate) fn ensure_owner(username: &str, operation: &MarketOperation) -> Result<(), PortError> {
    if operation.owner() != username {
        return Err(PortError::Validation(format!(
            "operation owner {} does not match signing account {username}",
            operation.owner()
        )));
    }
    Ok(())
}

/// Receipt whose id is the first 20 bytes of sha256(method, signer, user,
/// operation), hex encoded like a chain transaction id. `signer` identifies the
/// authority that signed: a key fingerprint, a hosted app, the keychain.
pub(crate) fn deterministic_receipt(
    method: SignMethod,
    signer: &str,
    username: &str,
    operation: &MarketOperation,
) -> Result<Receipt, PortError> {
    let payload = serde_json::to_vec(operation)
        .map_err(|e| PortError::Validation(format!("operation serialization failed: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(format!("{method:?}").as_bytes());
    hasher.update(signer.as_bytes());
    hasher.update(username.as_bytes());
    hasher.update(&payload);
    Ok(Receipt {
        tx_id: hex_prefix(&hasher.finalize(), 20),
        method,
        operation_kind: operation.kind().to_owned(),
    })
}

pub(crate) fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes.iter().take(len).map(|b| format!("{b:02x}")).collect()
}
