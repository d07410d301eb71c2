//! Boutique CLI - Terminal harness for the Jazzy's Boutique storefront.
//!
//! Commands:
//! - `boutique init` - Write a default boutique.toml
//! - `boutique config` - Show or validate configuration
//! - `boutique simulate` - Run a scripted shopping session
//! - `boutique shop` - Shop interactively against the sandbox gateway

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{ConfigArgs, InitArgs, ShopArgs, SimulateArgs};

/// Boutique CLI - Drive the storefront cart and checkout from a terminal
#[derive(Parser)]
#[command(name = "boutique")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default boutique.toml
    Init(InitArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Run a scripted shopping session against the sandbox gateway
    Simulate(SimulateArgs),

    /// Shop interactively against the sandbox gateway
    Shop(ShopArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
        Commands::Shop(args) => commands::shop::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "boutique_storefront=debug,boutique_commerce=debug"
    } else {
        "boutique_storefront=warn,boutique_commerce=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
