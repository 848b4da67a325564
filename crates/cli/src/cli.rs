use clap::{Parser, Subcommand};

/// taxi-cli — local REPL shell for the voice taxi booking orchestrator.
#[derive(Debug, Parser)]
#[command(name = "taxi-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive booking session (default when no subcommand is given).
    Chat {
        /// Caller id used as the orchestrator's call_id.
        #[arg(long, default_value = "cli:local")]
        call_id: String,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load configuration from the path named by `TAXI_CONFIG` (default
/// `config.toml`). Falls back to defaults when the file doesn't exist —
/// a missing config file is not a hard error for local/manual runs.
pub fn load_config() -> anyhow::Result<(taxi_domain::config::Config, String)> {
    let config_path = std::env::var("TAXI_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        taxi_domain::config::Config::load_from_file(std::path::Path::new(&config_path))
            .map_err(|e| anyhow::anyhow!("{e}"))?
    } else {
        taxi_domain::config::Config::default()
    };

    Ok((config, config_path))
}
