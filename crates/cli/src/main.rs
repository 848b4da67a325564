//! `taxi-cli` — local REPL shell around `BookingOrchestrator` for
//! manual/local testing.
//!
//! # Env vars
//!
//! | Variable             | Description                                         | Default      |
//! |-----------------------|------------------------------------------------------|--------------|
//! | `TAXI_CONFIG`         | Path to a TOML config file (retry caps, fare params)  | `config.toml`|
//! | `TAXI_GEOCODER_URL`   | Base URL of a real geocoder vendor API                | (use stub)   |
//! | `TAXI_DISPATCH_URL`   | Base URL of a real fleet dispatch API                 | (use stub)   |
//! | `TAXI_FLEET_API_KEY`  | Bearer token shared by the dispatch/amend/geocode APIs| (none)       |

mod cli;
mod config_cmd;
mod repl;
mod stub;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand};
use taxi_collaborators::{HttpAmender, HttpDispatcher, HttpGeocoder, LoggingTransferSink, UkAddressParser, UkPickupTimeParser};
use taxi_core::BookingOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = Cli::parse();

    match parsed.command {
        None | Some(Command::Chat { .. }) => {
            init_tracing();
            let call_id = match parsed.command {
                Some(Command::Chat { call_id }) => call_id,
                _ => "cli:local".to_string(),
            };
            run_chat(call_id).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            if !config_cmd::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _path) = cli::load_config()?;
            config_cmd::show(&config);
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn run_chat(call_id: String) -> anyhow::Result<()> {
    let (config, config_path) = cli::load_config()?;
    let issues = config.validate();
    for issue in issues.iter().filter(|e| e.severity == taxi_domain::config::ConfigSeverity::Error) {
        anyhow::bail!("invalid config ({config_path}): {issue}");
    }
    for issue in issues.iter().filter(|e| e.severity == taxi_domain::config::ConfigSeverity::Warning) {
        tracing::warn!(%issue, "config warning");
    }

    let api_key = std::env::var("TAXI_FLEET_API_KEY").ok();
    let timeout = Duration::from_secs(10);

    let geocoder: Box<dyn taxi_domain::contracts::Geocoder> =
        match std::env::var("TAXI_GEOCODER_URL") {
            Ok(url) => Box::new(HttpGeocoder::new(url, api_key.clone(), timeout)?),
            Err(_) => Box::new(stub::StubGeocoder),
        };
    let dispatcher: Box<dyn taxi_domain::contracts::Dispatcher> =
        match std::env::var("TAXI_DISPATCH_URL") {
            Ok(url) => Box::new(HttpDispatcher::new(url, api_key.clone(), timeout)?),
            Err(_) => Box::new(stub::StubDispatcher),
        };
    let amender: Box<dyn taxi_domain::contracts::Amender> = match std::env::var("TAXI_DISPATCH_URL")
    {
        Ok(url) => Box::new(HttpAmender::new(url, api_key, timeout)?),
        Err(_) => Box::new(stub::StubAmender),
    };

    let backends = repl::Backends {
        geocoder,
        dispatcher,
        amender,
        transfer_sink: Box::new(LoggingTransferSink),
    };

    let orch = BookingOrchestrator::new(
        call_id,
        config.retry,
        config.fare,
        Box::new(UkPickupTimeParser),
        Box::new(UkAddressParser),
    );

    repl::chat(orch, backends).await
}
