//! Command-line interface

pub mod balance;
pub mod call;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use tracing::info;

use kraken_rest::{ClientConfig, KrakenClient, PrivateRequest};

/// Kraken REST CLI
#[derive(Parser)]
#[command(name = "kraken-get")]
#[command(about = "Send signed requests to the Kraken REST API and print the raw response")]
#[command(version)]
pub struct Cli {
    /// TOML client configuration file
    #[arg(long, global = true, env = "KRAKEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the REST base URL
    #[arg(long, global = true, env = "KRAKEN_BASE_URL")]
    pub base_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all asset balances
    Balance(balance::BalanceArgs),
    /// Send an arbitrary request
    Call(call::CallArgs),
}

impl Cli {
    /// Resolve the client configuration from `--config` and `--base-url`.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        Ok(config)
    }
}

/// Send `request` and write the raw response body to `out`.
///
/// The body is written even for a non-success status, which is then
/// reported as an error. The response is consumed here, so its connection is
/// released on every path out of this function.
pub async fn send_and_write<W: Write>(
    client: &KrakenClient,
    request: PrivateRequest,
    out: &mut W,
) -> Result<()> {
    let response = client.send(request).await?;
    let status = response.status();
    let body = response.bytes().await?;

    info!(status = status.as_u16(), bytes = body.len(), "Response received");
    write_body(out, status, &body)
}

fn write_body<W: Write>(out: &mut W, status: StatusCode, body: &[u8]) -> Result<()> {
    out.write_all(body)?;
    out.write_all(b"\n")?;
    out.flush()?;

    if !status.is_success() {
        bail!("HTTP {}", status);
    }
    Ok(())
}
