//! Kraken REST base URL and spot endpoint paths.
//!
//! Private paths are always signed over the path alone, without base URL or
//! query string.

/// Production REST API base URL.
pub const PRODUCTION_REST_URL: &str = "https://api.kraken.com";

/// Account balance
pub const BALANCE: &str = "/0/private/Balance";

/// Returns true for paths under `/0/private/`, which require signing.
pub fn is_private(path: &str) -> bool {
    path.starts_with("/0/private/")
}
