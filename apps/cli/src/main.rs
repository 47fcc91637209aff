//! Terra CLI - Command-line demo for the batched countries GraphQL client
//!
//! This CLI provides a `terra` command that loads countries and continents
//! through the critical queue and country details through the general queue
//! or the cached single-request path.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Terra CLI - Browse the countries GraphQL API
#[derive(Parser, Debug)]
#[command(name = "terra", author, version, about = "Terra - batched GraphQL client for the countries API")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// GraphQL endpoint (overrides the configuration file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Configuration file (defaults to ./.terrarc, then ~/.terra/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every country
    Countries,

    /// List every continent with its countries
    Continents,

    /// Load countries and continents together, as the home page does
    ///
    /// Both queries share one critical batch.
    Overview,

    /// Show details for one or more countries
    ///
    /// Codes are fetched together in one general batch, or one by one through
    /// the response cache with `--cached`.
    Country {
        /// ISO country codes (e.g., NL JP BR)
        #[arg(required = true)]
        codes: Vec<String>,

        /// Fetch through the response cache (1 hour revalidation)
        #[arg(long)]
        cached: bool,

        /// Record a view of each country (failures are ignored)
        #[arg(long)]
        track: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client_config = config::load_config(args.config.as_deref(), args.endpoint)?;
    let clients = config::Clients::build(&client_config)?;

    match args.command {
        Command::Countries => commands::listing::countries(&clients, args.json).await,
        Command::Continents => commands::listing::continents(&clients, args.json).await,
        Command::Overview => commands::listing::overview(&clients, args.json).await,
        Command::Country { codes, cached, track } => {
            commands::country::execute(&clients, &codes, cached, track, args.json).await
        }
    }
}
