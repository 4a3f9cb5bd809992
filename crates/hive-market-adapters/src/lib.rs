pub mod clock;
pub mod config;
pub mod hosted_signer;
pub mod key_signer;
pub mod keychain_signer;
pub mod memory;
pub mod receipt;
pub mod registry;

pub use clock::SystemClockAdapter;
pub use config::{ConfigError, MarketAdapterConfig};
pub use hosted_signer::HostedSigner;
pub use key_signer::{KeySigner, SigningKey};
pub use keychain_signer::KeychainSigner;
pub use memory::{InMemoryAccounts, InMemoryRateSource};
pub use receipt::SignerMode;
pub use registry::{build_signers, Credentials};
