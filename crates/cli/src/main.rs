//! banter CLI — the main entry point.
//!
//! Commands:
//! - `init`   — Create the config file and seed the record store
//! - `run`    — Start the full runtime (channel intake + dashboard)
//! - `status` — Show configuration and store summary

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "banter",
    about = "banter — a chat-platform response agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config file and seed the record store
    Init,

    /// Start the full runtime (channel intake + dashboard)
    Run,

    /// Show configuration and store summary
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Run => commands::run::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
