//! Countdown Wallet CLI - Main Entry Point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use countdown_common::{IdentityContext, IdentityStore, OnboardingState};

use countdown_cli::client::ApiClient;
use countdown_cli::commands::{countdown, generate, wallet};
use countdown_cli::output::{self, print_error, print_info, print_success};

/// Countdown Wallet CLI - shareable countdowns under word-slug wallets
#[derive(Parser)]
#[command(name = "countdown")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address
    #[arg(long, env = "COUNTDOWN_SERVER", default_value = "http://127.0.0.1:8080", global = true)]
    server: String,

    /// File holding the wallet ID and owner secret
    #[arg(long, env = "COUNTDOWN_IDENTITY", global = true)]
    identity_file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, import, and inspect wallets
    #[command(subcommand)]
    Wallet(wallet::WalletCommands),

    /// Create and view countdowns
    #[command(subcommand)]
    Countdown(countdown::CountdownCommands),

    /// Generate tokens, slugs, phrases, and secrets locally
    #[command(subcommand)]
    Generate(generate::GenerateCommands),

    /// Check server status and the held wallet
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = IdentityStore::new(
        cli.identity_file
            .clone()
            .unwrap_or_else(countdown_common::default_identity_path),
    );
    let mut ctx = IdentityContext::with_store(store)?;
    let client = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Wallet(cmd) => wallet::execute(cmd, &client, &mut ctx, cli.format).await?,
        Commands::Countdown(cmd) => countdown::execute(cmd, &client, &ctx, cli.format).await?,
        Commands::Generate(cmd) => generate::execute(cmd, cli.format).await?,
        Commands::Status => {
            match client.health().await {
                Ok(health) => print_success(&format!(
                    "Server is running at {} (v{})",
                    client.base_url(),
                    health.version
                )),
                Err(e) => {
                    print_error(&format!("Cannot reach server at {}: {}", client.base_url(), e));
                    std::process::exit(1);
                }
            }
            match ctx.state() {
                OnboardingState::Owned(identity) => {
                    print_info(&format!("Holding wallet {}", identity.wallet_id))
                }
                _ => print_info("No wallet held"),
            }
        }
    }

    Ok(())
}
