//! HTTP client for the Kraken REST API.
//!
//! Every call runs the same linear pipeline:
//! 1. Encode the query parameters and append them to `base_url + path`
//! 2. For signed calls, make sure the body has a `nonce`
//! 3. Serialize the body to JSON
//! 4. Validate method and URL
//! 5. For signed calls, sign `query + body` and set `API-Key` / `API-Sign`
//! 6. Execute and hand back the raw response
//!
//! The first failing step ends the call. Nothing is retried.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{KrakenError, KrakenResult};
use crate::nonce::{MonotonicNonce, NonceSource};
use crate::params::{nonce_text, Body};
use crate::request::{Credentials, PrivateRequest};
use crate::signer::{KrakenHmacSigner, API_SIGN_HEADER};

/// A fully assembled request that has not been sent yet.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Base URL, path and encoded query string
    pub url: Url,
    pub headers: HeaderMap,
    /// JSON body text, if the request has a body
    pub body: Option<String>,
    /// Nonce text that went into the signature, for signed requests
    pub nonce: Option<String>,
}

impl PreparedRequest {
    /// The encoded query string, without the leading `?`.
    pub fn query_string(&self) -> &str {
        self.url.query().unwrap_or("")
    }

    /// True when the request carries an `API-Sign` header.
    pub fn is_signed(&self) -> bool {
        self.headers.contains_key(API_SIGN_HEADER)
    }
}

/// Client for the Kraken REST API.
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections.
///
/// # Example
///
/// ```ignore
/// let client = KrakenClient::from_env(ClientConfig::default())?;
///
/// let response = client
///     .send(client.request("POST", endpoints::BALANCE))
///     .await?;
///
/// println!("{}", response.text().await?);
/// ```
#[derive(Debug)]
pub struct KrakenClient {
    /// The underlying HTTP client
    http_client: Client,
    /// Source of nonces for signed calls without one
    nonce_source: Arc<dyn NonceSource>,
    /// Configuration
    config: ClientConfig,
    /// Default credentials for [`KrakenClient::request`]
    credentials: Option<Credentials>,
}

impl KrakenClient {
    /// Create a new client without credentials.
    pub fn new(config: ClientConfig) -> KrakenResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            KrakenError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self::with_http_client(http_client, config))
    }

    /// Create a client and pick up credentials from the environment
    /// variables named in `config.auth`, if they are set.
    pub fn from_env(config: ClientConfig) -> KrakenResult<Self> {
        let credentials = config.auth.load_credentials();
        if credentials.is_none() {
            debug!(
                "{} / {} not set, requests will be unsigned",
                config.auth.api_key_env, config.auth.api_secret_env
            );
        }

        let mut client = Self::new(config)?;
        client.credentials = credentials;
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_http_client(http_client: Client, config: ClientConfig) -> Self {
        Self {
            http_client,
            nonce_source: Arc::new(MonotonicNonce::default()),
            config,
            credentials: None,
        }
    }

    /// Set the default credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replace the nonce source.
    pub fn with_nonce_source(mut self, nonce_source: impl NonceSource + 'static) -> Self {
        self.nonce_source = Arc::new(nonce_source);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the default credentials.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Start a request against the configured base URL, carrying the
    /// default credentials if there are any.
    pub fn request(&self, method: impl Into<String>, path: impl Into<String>) -> PrivateRequest {
        let request = PrivateRequest::new(method, path).with_base_url(self.config.base_url.as_str());
        match &self.credentials {
            Some(credentials) => request.with_credentials(credentials.clone()),
            None => request,
        }
    }

    /// Assemble and sign a request without sending it.
    pub fn prepare(&self, request: PrivateRequest) -> KrakenResult<PreparedRequest> {
        let PrivateRequest {
            method,
            path,
            query,
            mut body,
            credentials,
            base_url,
        } = request;

        let mut url = format!("{}{}", base_url, path);
        let query_string = if query.is_empty() {
            String::new()
        } else {
            query.encode()?
        };
        if !query_string.is_empty() {
            url.push('?');
            url.push_str(&query_string);
        }

        let credentials = credentials.filter(Credentials::is_usable);
        let nonce = match credentials {
            Some(_) => Some(self.ensure_nonce(body.get_or_insert_with(Body::new))),
            None => None,
        };

        let mut headers = HeaderMap::new();
        let body = match body.filter(|b| !b.is_empty()) {
            Some(body) => {
                let text = serde_json::to_string(&body)
                    .map_err(|e| KrakenError::BodyEncoding(e.to_string()))?;
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                Some(text)
            }
            None => None,
        };

        let method = Method::from_bytes(method.as_bytes()).map_err(|e| {
            KrakenError::RequestConstruction(format!("Invalid method {:?}: {}", method, e))
        })?;
        let url = Url::parse(&url)
            .map_err(|e| KrakenError::RequestConstruction(format!("Invalid URL {}: {}", url, e)))?;

        if let (Some(credentials), Some(nonce)) = (&credentials, &nonce) {
            let payload = format!("{}{}", query_string, body.as_deref().unwrap_or(""));
            let signer = KrakenHmacSigner::new(credentials.private_key())?;
            let signature = signer.sign(&path, &payload, nonce);

            insert_header(&mut headers, signer.api_key_header(), credentials.public_key())?;
            insert_header(&mut headers, signer.signature_header(), &signature)?;
        }

        debug!(
            method = %method,
            path = %path,
            signed = nonce.is_some(),
            "Prepared Kraken request"
        );

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
            nonce,
        })
    }

    /// Assemble and sign a request into a `reqwest::Request`.
    pub fn build(&self, request: PrivateRequest) -> KrakenResult<reqwest::Request> {
        let prepared = self.prepare(request)?;

        let mut builder = self
            .http_client
            .request(prepared.method, prepared.url)
            .headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        builder
            .build()
            .map_err(|e| KrakenError::RequestConstruction(e.to_string()))
    }

    /// Send a request and return the raw response, whatever its status.
    ///
    /// The caller owns the response; dropping it releases the connection.
    pub async fn send(&self, request: PrivateRequest) -> KrakenResult<Response> {
        let path = request.path.clone();
        let http_request = self.build(request)?;

        debug!("{} {}", http_request.method(), path);

        let response = self
            .http_client
            .execute(http_request)
            .await
            .map_err(|e| KrakenError::Network(e.to_string()))?;

        debug!(
            status = response.status().as_u16(),
            path = %path,
            "Kraken response received"
        );

        Ok(response)
    }

    /// Read the body's `nonce`, inserting a fresh one if it is missing.
    fn ensure_nonce(&self, body: &mut Body) -> String {
        if let Some(existing) = body.get("nonce") {
            return nonce_text(existing);
        }

        let nonce = self.nonce_source.next_nonce();
        body.insert("nonce".to_string(), Value::from(nonce));
        nonce.to_string()
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> KrakenResult<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| KrakenError::RequestConstruction(format!("Invalid header {}: {}", name, e)))?;
    let value = HeaderValue::from_str(value).map_err(|e| {
        KrakenError::RequestConstruction(format!("Invalid value for header {}: {}", name, e))
    })?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::FixedNonce;
    use crate::params::ParamValue;
    use crate::signer::{sign_request, API_KEY_HEADER};
    use serde_json::json;

    // base64("x" * 32)
    const X32_SECRET_B64: &str = "eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHg=";
    const BALANCE: &str = "/0/private/Balance";

    fn test_client() -> KrakenClient {
        KrakenClient::with_http_client(Client::new(), ClientConfig::default())
            .with_nonce_source(FixedNonce(1_700_000_000_000))
    }

    fn credentials() -> Credentials {
        Credentials::new("public-key", X32_SECRET_B64)
    }

    #[test]
    fn test_unauthenticated_request_has_no_auth_headers() {
        let client = test_client();
        let prepared = client
            .prepare(PrivateRequest::get("/0/public/Time"))
            .unwrap();

        assert_eq!(prepared.method, Method::GET);
        assert_eq!(prepared.url.as_str(), "https://api.kraken.com/0/public/Time");
        assert!(prepared.headers.is_empty());
        assert!(prepared.body.is_none());
        assert!(prepared.nonce.is_none());
        assert!(!prepared.is_signed());
    }

    #[test]
    fn test_unauthenticated_body_gets_no_nonce() {
        let client = test_client();
        let prepared = client
            .prepare(PrivateRequest::post("/0/public/Ticker").with_body_field("pair", "XBTUSD"))
            .unwrap();

        assert_eq!(prepared.body.as_deref(), Some(r#"{"pair":"XBTUSD"}"#));
        assert_eq!(
            prepared.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(prepared.headers.get(API_KEY_HEADER).is_none());
        assert!(prepared.headers.get(API_SIGN_HEADER).is_none());
    }

    #[test]
    fn test_repeated_query_parameters() {
        let client = test_client();
        let prepared = client
            .prepare(PrivateRequest::get("/0/public/Ticker").with_query("pair", ["BTCUSD", "ETHUSD"]))
            .unwrap();

        assert_eq!(prepared.query_string(), "pair=BTCUSD&pair=ETHUSD");
        assert_eq!(
            prepared.url.as_str(),
            "https://api.kraken.com/0/public/Ticker?pair=BTCUSD&pair=ETHUSD"
        );
    }

    #[test]
    fn test_empty_encoded_query_adds_no_question_mark() {
        let client = test_client();
        let prepared = client
            .prepare(PrivateRequest::get("/0/public/Ticker").with_query("pair", ParamValue::List(vec![])))
            .unwrap();

        assert_eq!(prepared.url.as_str(), "https://api.kraken.com/0/public/Ticker");
    }

    #[test]
    fn test_signed_request_injects_numeric_nonce() {
        let client = test_client();
        let prepared = client
            .prepare(PrivateRequest::post(BALANCE).with_credentials(credentials()))
            .unwrap();

        assert_eq!(prepared.body.as_deref(), Some(r#"{"nonce":1700000000000}"#));
        assert_eq!(prepared.nonce.as_deref(), Some("1700000000000"));
        assert_eq!(
            prepared.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(prepared.headers.get(API_KEY_HEADER).unwrap(), "public-key");
        assert_eq!(
            prepared.headers.get(API_SIGN_HEADER).unwrap(),
            "iX+9qRSin/dC3MtCx6B8ccK6jUnScUYXoI1fXznvnHvn/H5scRZCphkKoSMNSr7/EVMBI536JpGMw2jnvHg6rg=="
        );

        let body: Value = serde_json::from_str(prepared.body.as_deref().unwrap()).unwrap();
        assert!(body["nonce"].is_u64());
    }

    #[test]
    fn test_signature_covers_query_and_body() {
        let client = test_client();
        let prepared = client
            .prepare(
                PrivateRequest::post(BALANCE)
                    .with_query("pair", "XBTUSD")
                    .with_credentials(credentials()),
            )
            .unwrap();

        assert_eq!(prepared.query_string(), "pair=XBTUSD");
        assert_eq!(
            prepared.headers.get(API_SIGN_HEADER).unwrap(),
            "YP1BdjHKcj3+L7tWQch5iNi/AJGgc3HmWXybakr13mKb1FzEMPwROIl5DjB7N6TBKOUYf2I9To3dcQcfx/DZLA=="
        );
    }

    #[test]
    fn test_caller_nonce_is_forwarded_unchanged() {
        let client = test_client();
        let prepared = client
            .prepare(
                PrivateRequest::post(BALANCE)
                    .with_nonce("123")
                    .with_credentials(credentials()),
            )
            .unwrap();

        assert_eq!(prepared.body.as_deref(), Some(r#"{"nonce":"123"}"#));
        assert_eq!(prepared.nonce.as_deref(), Some("123"));

        let expected =
            sign_request(X32_SECRET_B64, r#"{"nonce":"123"}"#, "123", BALANCE).unwrap();
        assert_eq!(prepared.headers.get(API_SIGN_HEADER).unwrap(), expected.as_str());
    }

    #[test]
    fn test_stale_caller_nonce_is_not_validated() {
        let client = test_client();
        let prepared = client
            .prepare(
                PrivateRequest::post(BALANCE)
                    .with_nonce(1u64)
                    .with_credentials(credentials()),
            )
            .unwrap();

        assert_eq!(prepared.body.as_deref(), Some(r#"{"nonce":1}"#));
        assert_eq!(prepared.nonce.as_deref(), Some("1"));
    }

    #[test]
    fn test_empty_public_key_means_unsigned() {
        let client = test_client();
        let prepared = client
            .prepare(
                PrivateRequest::post(BALANCE).with_credentials(Credentials::new("", X32_SECRET_B64)),
            )
            .unwrap();

        assert!(prepared.body.is_none());
        assert!(!prepared.is_signed());
    }

    #[test]
    fn test_invalid_private_key_is_signing_error() {
        let client = test_client();
        let result = client.prepare(
            PrivateRequest::post(BALANCE).with_credentials(Credentials::new("key", "not base64!")),
        );

        assert!(matches!(result, Err(KrakenError::Signing(_))));
    }

    #[test]
    fn test_invalid_method_and_url() {
        let client = test_client();

        let result = client.prepare(PrivateRequest::new("BAD METHOD", BALANCE));
        assert!(matches!(result, Err(KrakenError::RequestConstruction(_))));

        let result = client.prepare(PrivateRequest::post(BALANCE).with_base_url("not a url"));
        assert!(matches!(result, Err(KrakenError::RequestConstruction(_))));
    }

    #[test]
    fn test_invalid_public_key_header_value() {
        let client = test_client();
        let result = client.prepare(
            PrivateRequest::post(BALANCE)
                .with_credentials(Credentials::new("bad\nkey", X32_SECRET_B64)),
        );

        assert!(matches!(result, Err(KrakenError::RequestConstruction(_))));
    }

    #[test]
    fn test_request_uses_client_defaults() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:9");
        let client = KrakenClient::with_http_client(Client::new(), config)
            .with_credentials(credentials());

        let request = client.request("POST", BALANCE);
        assert_eq!(request.base_url, "http://127.0.0.1:9");
        assert!(request.is_authenticated());
        assert_eq!(client.credentials().unwrap().public_key(), "public-key");
    }

    #[test]
    fn test_default_nonce_source_is_strictly_increasing() {
        let client = KrakenClient::new(ClientConfig::default())
            .unwrap()
            .with_credentials(credentials());

        let first = client.prepare(client.request("POST", BALANCE)).unwrap();
        let second = client.prepare(client.request("POST", BALANCE)).unwrap();

        let first: u64 = first.nonce.unwrap().parse().unwrap();
        let second: u64 = second.nonce.unwrap().parse().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_build_carries_body_and_headers() {
        let client = test_client();
        let request = client
            .build(PrivateRequest::post(BALANCE).with_credentials(credentials()))
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), BALANCE);
        assert!(request.headers().contains_key("api-key"));
        assert!(request.headers().contains_key("api-sign"));
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(br#"{"nonce":1700000000000}"#.as_slice())
        );
    }

    #[test]
    fn test_body_keys_are_sorted() {
        let client = test_client();
        let prepared = client
            .prepare(
                PrivateRequest::post("/0/private/AddOrder")
                    .with_body_field("type", "buy")
                    .with_body_field("pair", "XBTUSD")
                    .with_body_field("volume", json!("1.25"))
                    .with_credentials(credentials()),
            )
            .unwrap();

        assert_eq!(
            prepared.body.as_deref(),
            Some(r#"{"nonce":1700000000000,"pair":"XBTUSD","type":"buy","volume":"1.25"}"#)
        );
    }
}
