//! Balance command - fetch all asset balances

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use tracing::debug;

use kraken_rest::{endpoints, ClientConfig, KrakenClient, PrivateRequest};

use super::send_and_write;

/// Arguments for the balance command
#[derive(Args)]
pub struct BalanceArgs {
    /// Use this nonce instead of the current time in milliseconds
    #[arg(long)]
    pub nonce: Option<u64>,
}

/// Execute the balance command
pub async fn execute(args: BalanceArgs, config: ClientConfig) -> Result<()> {
    let credentials = config.auth.require_credentials()?;
    let client = KrakenClient::new(config)?.with_credentials(credentials);

    debug!("Requesting balance from {}", client.config().base_url);

    run(&client, args, &mut io::stdout()).await
}

fn balance_request(client: &KrakenClient, args: &BalanceArgs) -> PrivateRequest {
    let request = client.request("POST", endpoints::BALANCE);
    match args.nonce {
        Some(nonce) => request.with_nonce(nonce),
        None => request,
    }
}

/// Run the balance request with an already configured client.
pub(crate) async fn run<W: Write>(
    client: &KrakenClient,
    args: BalanceArgs,
    out: &mut W,
) -> Result<()> {
    send_and_write(client, balance_request(client, &args), out).await
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    const BALANCE_REPLY: &[u8] = br#"{"error":[],"result":{"ZUSD":"171288.6158"}}"#;

    #[tokio::test]
    async fn test_balance_prints_raw_body() {
        let (base_url, captured) = spawn_server("200 OK", BALANCE_REPLY).await;
        let client = signed_client(&base_url);

        let mut out = Vec::new();
        run(&client, BalanceArgs { nonce: None }, &mut out).await.unwrap();

        assert_eq!(out, [BALANCE_REPLY, &b"\n"[..]].concat());

        let captured = captured.await.unwrap();
        assert_eq!(captured.request_line, "POST /0/private/Balance HTTP/1.1");
        assert_eq!(captured.body, format!(r#"{{"nonce":{}}}"#, TEST_NONCE));
    }

    #[tokio::test]
    async fn test_balance_with_explicit_nonce() {
        let (base_url, captured) = spawn_server("200 OK", BALANCE_REPLY).await;
        let client = signed_client(&base_url);

        let mut out = Vec::new();
        run(&client, BalanceArgs { nonce: Some(42) }, &mut out).await.unwrap();

        assert_eq!(captured.await.unwrap().body, r#"{"nonce":42}"#);
    }

    #[tokio::test]
    async fn test_balance_error_status_fails_after_printing() {
        const REPLY: &[u8] = br#"{"error":["EAPI:Invalid key"]}"#;
        let (base_url, captured) = spawn_server("403 Forbidden", REPLY).await;
        let client = signed_client(&base_url);

        let mut out = Vec::new();
        let err = run(&client, BalanceArgs { nonce: None }, &mut out)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("403"));
        assert_eq!(out, [REPLY, &b"\n"[..]].concat());
        captured.await.unwrap();
    }
}
