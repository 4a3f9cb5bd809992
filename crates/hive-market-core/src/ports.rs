use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AccountRecord, Asset, MarketOperation, Receipt, SignMethod};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Human-readable message surfaced to the user after a failed submission.
pub fn format_error(err: &PortError) -> String {
    match err {
        PortError::Rejected(reason) => format!("Transaction was rejected: {reason}"),
        PortError::Transport(reason) => format!("Network error, please try again: {reason}"),
        PortError::Policy(reason) => format!("Signing method unavailable: {reason}"),
        PortError::Validation(reason) => format!("Invalid transaction: {reason}"),
        PortError::NotFound(what) => format!("Not found: {what}"),
        PortError::NotImplemented(what) => format!("Operation not supported: {what}"),
    }
}

#[async_trait]
pub trait RatePort: Send + Sync {
    /// Amount of the counter-asset received per unit of `asset`.
    async fn fetch_rate(&self, asset: Asset) -> Result<f64, PortError>;
    async fn fetch_usd_rates(&self, from: Asset, to: Asset) -> Result<(f64, f64), PortError>;
}

#[async_trait]
pub trait AccountPort: Send + Sync {
    async fn fetch_full_account(&self, username: &str) -> Result<AccountRecord, PortError>;
}

#[async_trait]
pub trait SigningPort: Send + Sync {
    fn method(&self) -> SignMethod;
    async fn execute(
        &self,
        username: &str,
        operation: &MarketOperation,
    ) -> Result<Receipt, PortError>;
}

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> Result<u64, PortError>;
}

/// Signing strategies available to a dialog, at most one per method.
#[derive(Clone, Default)]
pub struct SignerSet {
    signers: BTreeMap<SignMethod, Arc<dyn SigningPort>>,
}

impl SignerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, signer: Arc<dyn SigningPort>) -> Self {
        self.insert(signer);
        self
    }

    pub fn insert(&mut self, signer: Arc<dyn SigningPort>) {
        self.signers.insert(signer.method(), signer);
    }

    pub fn methods(&self) -> Vec<SignMethod> {
        self.signers.keys().copied().collect()
    }

    pub fn select(&self, method: SignMethod) -> Result<Arc<dyn SigningPort>, PortError> {
        self.signers
            .get(&method)
            .cloned()
            .ok_or_else(|| PortError::Policy(format!("no signer configured for {method:?}")))
    }
}

impl std::fmt::Debug for SignerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerSet")
            .field("methods", &self.methods())
            .finish()
    }
}
