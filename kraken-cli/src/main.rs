//! Kraken REST CLI
//!
//! Provides commands for:
//! - `balance`: Fetch the account balance with credentials from the environment
//! - `call`: Send an arbitrary public or private request
//!
//! The raw response body is written to stdout; logs go to stderr.

mod cli;

use anyhow::Result;
use clap::Parser;

use kraken_rest::logging::{init_logging, LogConfig};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging(LogConfig::from_env().with_default_level("kraken_get=info,kraken_rest=info"))
        .map_err(|e| anyhow::anyhow!(e))?;

    let cli = Cli::parse();
    let config = cli.client_config()?;

    match cli.command {
        Commands::Balance(args) => cli::balance::execute(args, config).await?,
        Commands::Call(args) => cli::call::execute(args, config).await?,
    }

    Ok(())
}
