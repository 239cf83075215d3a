//! Per-call request description.

use std::fmt;

use serde_json::Value;

use crate::endpoints::PRODUCTION_REST_URL;
use crate::params::{Body, ParamValue, QueryParams};

/// API key pair for private endpoints.
///
/// The private key is the base64 secret exactly as Kraken issues it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    public_key: String,
    private_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// The public API key, sent as `API-Key`.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The base64 private key used for signing.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// A call is only signed when a public key is present.
    pub fn is_usable(&self) -> bool {
        !self.public_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Everything needed to assemble one request.
///
/// Built fresh for every call and consumed by
/// [`KrakenClient::send`](crate::client::KrakenClient::send).
///
/// # Example
///
/// ```
/// use kraken_rest::request::{Credentials, PrivateRequest};
///
/// let request = PrivateRequest::post("/0/private/TradeBalance")
///     .with_body_field("asset", "ZUSD")
///     .with_credentials(Credentials::new("public", "c2VjcmV0"));
///
/// assert!(request.is_authenticated());
/// ```
#[derive(Debug, Clone)]
pub struct PrivateRequest {
    /// HTTP method token, validated when the request is built
    pub method: String,
    /// Endpoint path, also the first part of the signed message
    pub path: String,
    pub query: QueryParams,
    /// `None` and an empty map both mean "no body" unless the call is signed
    pub body: Option<Body>,
    pub credentials: Option<Credentials>,
    /// Scheme and host the path is appended to
    pub base_url: String,
}

impl PrivateRequest {
    /// Create a request against the production REST API.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: QueryParams::new(),
            body: None,
            credentials: None,
            base_url: PRODUCTION_REST_URL.to_string(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Set the base URL (scheme and host, no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Add a query parameter, replacing an earlier value for the same key.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query.insert(key, value);
        self
    }

    /// Replace the whole query parameter set.
    pub fn with_query_params(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Add a body field, creating the body if needed.
    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body
            .get_or_insert_with(Body::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the whole body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Use an explicit nonce instead of one from the client's nonce source.
    ///
    /// The value is forwarded unchanged and is not checked for freshness.
    pub fn with_nonce(self, nonce: impl Into<Value>) -> Self {
        self.with_body_field("nonce", nonce)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Drop any credentials, making this a public call.
    pub fn without_credentials(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// True when the request will carry `API-Key` and `API-Sign`.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.as_ref().is_some_and(Credentials::is_usable)
    }
}
