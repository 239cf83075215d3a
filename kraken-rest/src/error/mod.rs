//! Error types for building and sending signed Kraken requests.
//!
//! This module provides:
//! - [`KrakenError`], returned by every step of the request pipeline
//! - [`SigningError`], the failure modes of the HMAC signer
//! - [`ErrorClassification`], so callers can decide on their own retry policy
//!
//! # Usage
//!
//! ```rust,ignore
//! use kraken_rest::error::{ErrorClassification, KrakenError};
//!
//! match client.send(request).await {
//!     Ok(response) => { /* caller owns the body */ }
//!     Err(err) if err.is_transient() => { /* network hiccup, caller may retry */ }
//!     Err(err) => return Err(err),
//! }
//! ```

mod kraken;
mod traits;

pub use kraken::*;
pub use traits::*;
