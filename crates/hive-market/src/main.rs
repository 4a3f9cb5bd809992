//! Hive market: headless driver for the swap wizard and order dialogs.

use clap::Parser;
use eyre::WrapErr;

use hive_market_adapters::MarketAdapterConfig;

mod cli;
mod scenario;

use crate::cli::Cli;
use crate::scenario::{Scenario, ScenarioRunner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Hive market driver");

    let cli = Cli::parse();
    let mut config = MarketAdapterConfig::from_env().wrap_err("reading market configuration")?;
    if let Some(method) = cli.sign_method {
        config.default_sign_method = method.into();
    }

    let raw = std::fs::read_to_string(&cli.scenario)
        .wrap_err_with(|| format!("reading scenario {}", cli.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw).wrap_err("parsing scenario")?;

    let mut runner = ScenarioRunner::new(scenario, config)?;
    for report in runner.run().await? {
        let line = if cli.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{line}");
    }
    Ok(())
}
