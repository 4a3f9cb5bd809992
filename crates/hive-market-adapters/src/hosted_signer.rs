use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use hive_market_core::{MarketOperation, PortError, Receipt, SignMethod, SigningPort};

use crate::receipt::{deterministic_receipt, ensure_owner, SignerMode};

/// Hosted third-party signer. Each user needs a session token issued to `app`.
#[derive(Debug, Clone)]
pub struct HostedSigner {
    app: String,
    sessions: Arc<Mutex<HashMap<String, String>>>,
    mode: SignerMode,
}

impl HostedSigner {
    pub fn new(app: &str) -> Self {
        let mode = if app.trim().is_empty() {
            SignerMode::Disabled("hosted signer app name not configured".to_owned())
        } else {
            SignerMode::Deterministic
        };
        Self {
            app: app.trim().to_owned(),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            mode,
        }
    }

    pub fn with_mode(mut self, mode: SignerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn login(&self, username: &str, token: &str) -> Result<(), PortError> {
        if token.trim().is_empty() {
            return Err(PortError::Validation("empty hosted signer token".to_owned()));
        }
        let mut g = self
            .sessions
            .lock()
            .map_err(|e| PortError::Transport(format!("hosted session lock poisoned: {e}")))?;
        g.insert(username.to_owned(), token.to_owned());
        Ok(())
    }

    pub fn logout(&self, username: &str) -> Result<(), PortError> {
        let mut g = self
            .sessions
            .lock()
            .map_err(|e| PortError::Transport(format!("hosted session lock poisoned: {e}")))?;
        g.remove(username);
        Ok(())
    }

    fn has_session(&self, username: &str) -> Result<bool, PortError> {
        let g = self
            .sessions
            .lock()
            .map_err(|e| PortError::Transport(format!("hosted session lock poisoned: {e}")))?;
        Ok(g.contains_key(username))
    }
}

#[async_trait]
impl SigningPort for HostedSigner {
    fn method(&self) -> SignMethod {
        SignMethod::Hosted
    }

    async fn execute(
        &self,
        username: &str,
        operation: &MarketOperation,
    ) -> Result<Receipt, PortError> {
        ensure_owner(username, operation)?;
        self.mode.check()?;
        if !self.has_session(username)? {
            return Err(PortError::Policy(format!(
                "no {} session for {username}",
                self.app
            )));
        }
        debug!(%username, app = %self.app, kind = operation.kind(), "signing through hosted signer");
        deterministic_receipt(SignMethod::Hosted, &self.app, username, operation)
    }
}
