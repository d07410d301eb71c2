//! CLI command implementations.

pub mod config;
pub mod init;
pub mod shop;
pub mod simulate;

use clap::{Args, Subcommand};

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Store name written to the config.
    #[arg(short, long, default_value = "Jazzy's Boutique")]
    pub name: String,

    /// Force overwrite existing config.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Validate the config file.
    Validate,
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Script file (TOML). Runs the built-in demo when omitted.
    pub script: Option<String>,

    /// Print the built-in demo script and exit.
    #[arg(long)]
    pub print_default: bool,
}

/// Arguments for the shop command.
#[derive(Args)]
pub struct ShopArgs {
    /// Simulated gateway latency in milliseconds.
    #[arg(long, default_value = "800")]
    pub latency_ms: u64,
}
