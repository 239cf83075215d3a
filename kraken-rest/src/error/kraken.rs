//! Kraken client error types.

use std::time::Duration;
use thiserror::Error;

use super::{ErrorCategory, ErrorClassification};

/// Result type for Kraken client operations.
pub type KrakenResult<T> = Result<T, KrakenError>;

/// Errors produced while computing a request signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The private key is not valid standard base64
    #[error("Invalid base64 private key: {0}")]
    InvalidKeyEncoding(String),

    /// The decoded key was rejected by the MAC
    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Errors that can occur while building or sending a request.
///
/// Every step of the pipeline fails fast with the variant naming the step.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum KrakenError {
    /// A query value could not be serialized
    #[error("Query encoding error: {0}")]
    QueryEncoding(String),

    /// The body mapping could not be serialized to JSON
    #[error("Body encoding error: {0}")]
    BodyEncoding(String),

    /// Malformed method, URL or header value
    #[error("Request construction error: {0}")]
    RequestConstruction(String),

    /// The signature could not be computed
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Transport-level failure executing the HTTP call
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ErrorClassification for KrakenError {
    fn category(&self) -> ErrorCategory {
        match self {
            KrakenError::QueryEncoding(_) => ErrorCategory::Permanent,
            KrakenError::BodyEncoding(_) => ErrorCategory::Permanent,
            KrakenError::RequestConstruction(_) => ErrorCategory::Permanent,
            KrakenError::Signing(SigningError::InvalidKeyEncoding(_)) => {
                ErrorCategory::Configuration
            }
            KrakenError::Signing(SigningError::InvalidKey(_)) => ErrorCategory::Internal,
            KrakenError::Network(_) => ErrorCategory::Transient,
            KrakenError::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            KrakenError::Network(_) => Some(Duration::from_millis(500)),
            _ => None,
        }
    }
}

impl KrakenError {
    /// Returns true if this error came from the signer.
    pub fn is_signing_error(&self) -> bool {
        matches!(self, KrakenError::Signing(_))
    }

    /// Returns true if this is a transport failure.
    pub fn is_network_error(&self) -> bool {
        matches!(self, KrakenError::Network(_))
    }
}
