//! Call command - send an arbitrary request
//!
//! ```text
//! kraken-get call --path /0/private/TradeBalance --body asset=ZUSD
//! kraken-get call --path /0/private/AddOrder --body price=37500.10 --body-json userref=7
//! kraken-get call -X GET --path /0/public/Ticker --query pair=XBTUSD --query pair=ETHUSD --public
//! ```

use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::warn;

use kraken_rest::{endpoints, Body, ClientConfig, KrakenClient, ParamValue, QueryParams};

use super::send_and_write;

/// Arguments for the call command
#[derive(Args)]
pub struct CallArgs {
    /// HTTP method
    #[arg(long, short = 'X', default_value = "POST")]
    pub method: String,

    /// Endpoint path (e.g., /0/private/Balance)
    #[arg(long, short)]
    pub path: String,

    /// Query parameter; repeat a key to send it several times
    #[arg(long = "query", short, value_name = "KEY=VALUE")]
    pub query: Vec<String>,

    /// Body field, sent as the exact string given
    #[arg(long = "body", short, value_name = "KEY=VALUE")]
    pub body: Vec<String>,

    /// Body field holding a JSON value (number, bool, array, object)
    #[arg(long = "body-json", value_name = "KEY=JSON")]
    pub body_json: Vec<String>,

    /// Explicit nonce, sent unchanged
    #[arg(long)]
    pub nonce: Option<String>,

    /// Send without credentials
    #[arg(long)]
    pub public: bool,
}

/// Execute the call command
pub async fn execute(args: CallArgs, config: ClientConfig) -> Result<()> {
    let client = KrakenClient::from_env(config)?;
    run(&client, args, &mut io::stdout()).await
}

/// Run the call with an already configured client.
pub(crate) async fn run<W: Write>(
    client: &KrakenClient,
    args: CallArgs,
    out: &mut W,
) -> Result<()> {
    let mut request = client
        .request(args.method.as_str(), args.path.as_str())
        .with_query_params(parse_query(&args.query)?);

    let body = parse_body(&args.body, &args.body_json)?;
    if !body.is_empty() {
        request = request.with_body(body);
    }
    if let Some(nonce) = &args.nonce {
        request = request.with_nonce(parse_nonce(nonce));
    }
    if args.public {
        request = request.without_credentials();
    }

    if !request.is_authenticated() && endpoints::is_private(&args.path) {
        warn!("Sending {} unsigned; Kraken will reject it", args.path);
    }

    send_and_write(client, request, out).await
}

/// Split `KEY=VALUE` on the first `=`.
fn parse_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", raw))
}

/// Build query parameters; a key given more than once becomes a list.
fn parse_query(raw: &[String]) -> Result<QueryParams> {
    let mut grouped: Vec<(&str, Vec<String>)> = Vec::new();
    for entry in raw {
        let (key, value) = parse_pair(entry)?;
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.to_string()),
            None => grouped.push((key, vec![value.to_string()])),
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                ParamValue::Str(values.remove(0))
            } else {
                ParamValue::List(values)
            };
            (key, value)
        })
        .collect())
}

/// Build the JSON body from plain string fields and JSON-typed fields.
///
/// Plain values are never reinterpreted: `price=37500.10` is signed and sent
/// as the string `"37500.10"`.
fn parse_body(raw: &[String], raw_json: &[String]) -> Result<Body> {
    let mut body = Body::new();
    for entry in raw {
        let (key, value) = parse_pair(entry)?;
        body.insert(key.to_string(), Value::String(value.to_string()));
    }
    for entry in raw_json {
        let (key, value) = parse_pair(entry)?;
        let value: Value = serde_json::from_str(value)
            .with_context(|| format!("--body-json {}: invalid JSON {:?}", key, value))?;
        body.insert(key.to_string(), value);
    }
    Ok(body)
}

/// Numeric nonces are sent as numbers, anything else as a string.
fn parse_nonce(raw: &str) -> Value {
    raw.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}
