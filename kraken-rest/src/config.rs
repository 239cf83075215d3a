//! Client configuration.
//!
//! These types are designed to be deserialized from TOML configuration files:
//!
//! ```toml
//! base_url = "https://api.kraken.com"
//! timeout_ms = 10000
//!
//! [auth]
//! api_key_env = "KRAKEN_API_KEY"
//! api_secret_env = "KRAKEN_API_SECRET"
//! ```
//!
//! Secrets never live in the file itself, only the names of the environment
//! variables holding them.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::endpoints::PRODUCTION_REST_URL;
use crate::error::{KrakenError, KrakenResult};
use crate::request::Credentials;

/// Configuration for [`KrakenClient`](crate::client::KrakenClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for all requests
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds; transport defaults apply when unset
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Where to find credentials
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_base_url() -> String {
    PRODUCTION_REST_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
            auth: AuthConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> KrakenResult<Self> {
        toml::from_str(content)
            .map_err(|e| KrakenError::Configuration(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> KrakenResult<Self> {
        let path = path.as_ref();
        debug!("Loading client config from {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            KrakenError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Returns the request timeout as a Duration, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name for API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Environment variable name for API secret
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
}

fn default_api_key_env() -> String {
    "KRAKEN_API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "KRAKEN_API_SECRET".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
        }
    }
}

impl AuthConfig {
    /// Create a new auth config with environment variable names.
    pub fn new(api_key_env: impl Into<String>, api_secret_env: impl Into<String>) -> Self {
        Self {
            api_key_env: api_key_env.into(),
            api_secret_env: api_secret_env.into(),
        }
    }

    /// Load API key from environment.
    pub fn load_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    /// Load API secret from environment.
    pub fn load_api_secret(&self) -> Option<String> {
        std::env::var(&self.api_secret_env).ok()
    }

    /// Returns credentials if both variables are set.
    pub fn load_credentials(&self) -> Option<Credentials> {
        Some(Credentials::new(self.load_api_key()?, self.load_api_secret()?))
    }

    /// Like [`AuthConfig::load_credentials`], but missing variables are an error.
    pub fn require_credentials(&self) -> KrakenResult<Credentials> {
        self.load_credentials().ok_or_else(|| {
            KrakenError::Configuration(format!(
                "{} and {} must be set for private endpoints",
                self.api_key_env, self.api_secret_env
            ))
        })
    }
}
