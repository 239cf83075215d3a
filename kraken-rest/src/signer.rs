//! HMAC-SHA512 request signing for the Kraken private REST API.
//!
//! Kraken signs each private call as:
//! 1. SHA256(nonce + query string + body)
//! 2. HMAC-SHA512(uri_path + sha256_digest, base64_decoded_secret)
//! 3. Base64 encode the result
//!
//! The digest bytes are appended to the path as raw bytes, never as hex.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::error::SigningError;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the public API key.
pub const API_KEY_HEADER: &str = "API-Key";

/// Header carrying the request signature.
pub const API_SIGN_HEADER: &str = "API-Sign";

/// Compute the `API-Sign` value for one request.
///
/// `payload` is the encoded query string followed by the JSON body (either
/// may be empty). The function is pure: the same inputs always produce the
/// same signature.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKeyEncoding`] if `private_key_b64` is not
/// valid standard base64.
///
/// # Example
///
/// ```
/// use kraken_rest::signer::sign_request;
///
/// let key = "eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHg=";
/// let signature = sign_request(key, "", "123", "/0/private/Balance").unwrap();
/// assert_eq!(signature.len(), 88);
/// ```
pub fn sign_request(
    private_key_b64: &str,
    payload: &str,
    nonce: &str,
    path: &str,
) -> Result<String, SigningError> {
    let signer = KrakenHmacSigner::new(private_key_b64)?;
    Ok(signer.sign(path, payload, nonce))
}

/// HMAC-SHA512 request signer holding an already decoded secret.
///
/// Decoding happens once in [`KrakenHmacSigner::new`]; signing afterwards
/// cannot fail.
#[derive(Clone)]
pub struct KrakenHmacSigner {
    mac: HmacSha512,
}

impl KrakenHmacSigner {
    /// Create a signer from a base64-encoded private key.
    ///
    /// An empty key is accepted and yields an empty HMAC key.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret cannot be decoded from base64.
    pub fn new(private_key_b64: impl AsRef<str>) -> Result<Self, SigningError> {
        let secret = BASE64
            .decode(private_key_b64.as_ref())
            .map_err(|e| SigningError::InvalidKeyEncoding(e.to_string()))?;

        let mac = HmacSha512::new_from_slice(&secret)
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        Ok(Self { mac })
    }

    /// Sign a request.
    ///
    /// # Arguments
    ///
    /// * `uri_path` - The API endpoint path (e.g., "/0/private/Balance")
    /// * `payload` - Encoded query string followed by the JSON body
    /// * `nonce` - The nonce as it appears in the body
    ///
    /// # Returns
    ///
    /// The base64-encoded signature for the `API-Sign` header.
    pub fn sign(&self, uri_path: &str, payload: &str, nonce: &str) -> String {
        let mut sha256 = Sha256::new();
        sha256.update(nonce.as_bytes());
        sha256.update(payload.as_bytes());
        let digest = sha256.finalize();

        let mut mac = self.mac.clone();
        mac.update(uri_path.as_bytes());
        mac.update(&digest);

        BASE64.encode(mac.finalize().into_bytes())
    }

    /// Get the API key header name.
    pub fn api_key_header(&self) -> &'static str {
        API_KEY_HEADER
    }

    /// Get the signature header name.
    pub fn signature_header(&self) -> &'static str {
        API_SIGN_HEADER
    }
}

impl fmt::Debug for KrakenHmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KrakenHmacSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}
