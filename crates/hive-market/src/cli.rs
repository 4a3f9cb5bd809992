//! Command-line arguments for the scenario driver.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use hive_market_core::SignMethod;

/// Replays a swap/order scenario against in-memory market adapters and prints
/// one JSON report per event.
#[derive(Debug, Parser)]
#[command(name = "hive-market", version, about = "Hive market swap and order dialog driver")]
pub struct Cli {
    /// Scenario file (JSON).
    pub scenario: PathBuf,

    /// Signing method used when an event does not name one.
    #[arg(long, value_enum)]
    pub sign_method: Option<MethodArg>,

    /// Pretty-print each report.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Key,
    Hosted,
    Keychain,
}

impl From<MethodArg> for SignMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Key => SignMethod::Key,
            MethodArg::Hosted => SignMethod::Hosted,
            MethodArg::Keychain => SignMethod::Keychain,
        }
    }
}
