//! Giftpool CLI — Operator command-line interface for the Giftpool node.
//!
//! Subcommands: status, balance, contribute, settle.

mod commands;

use clap::{Parser, Subcommand};

/// Giftpool — group gifting, settled right.
#[derive(Parser, Debug)]
#[command(name = "giftpool", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Check the gift card float against a requested amount.
    Balance(commands::balance::BalanceArgs),
    /// Record a contribution toward a gift.
    Contribute(commands::contribute::ContributeArgs),
    /// Fetch the settlement offer for a gift, or settle it.
    Settle(commands::settle::SettleArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Balance(args) => commands::balance::run(args).await,
        Commands::Contribute(args) => commands::contribute::run(args).await,
        Commands::Settle(args) => commands::settle::run(args).await,
    }
}
