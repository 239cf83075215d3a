// kraken-rest: signed requests against the Kraken private REST API
// Used by kraken-cli and by anything that needs raw authenticated calls

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod logging;
pub mod nonce;
pub mod params;
pub mod request;
pub mod signer;

pub use client::{KrakenClient, PreparedRequest};
pub use config::{AuthConfig, ClientConfig};
pub use error::{ErrorCategory, ErrorClassification, KrakenError, KrakenResult, SigningError};
pub use nonce::{FixedNonce, MonotonicNonce, NonceSource, SystemClockNonce};
pub use params::{Body, ParamValue, QueryParams};
pub use request::{Credentials, PrivateRequest};
pub use signer::{sign_request, KrakenHmacSigner};
