//! Nonce generation for private requests.
//!
//! Kraken rejects a request whose nonce is not greater than the last one seen
//! for the same API key. The client draws nonces from a [`NonceSource`] so the
//! wall clock can be swapped out in tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies nonces for authenticated requests that do not carry their own.
pub trait NonceSource: Send + Sync + fmt::Debug {
    /// Return the nonce for the next request.
    fn next_nonce(&self) -> u64;
}

/// Milliseconds since the Unix epoch.
///
/// Two calls within the same millisecond return the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClockNonce;

impl NonceSource for SystemClockNonce {
    fn next_nonce(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Wraps another source and never hands out the same nonce twice.
///
/// Each call returns `max(inner.next_nonce(), last + 1)`.
#[derive(Debug)]
pub struct MonotonicNonce<S = SystemClockNonce> {
    inner: S,
    last: AtomicU64,
}

impl<S: NonceSource> MonotonicNonce<S> {
    /// Create a monotonic wrapper around `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: AtomicU64::new(0),
        }
    }
}

impl Default for MonotonicNonce<SystemClockNonce> {
    fn default() -> Self {
        Self::new(SystemClockNonce)
    }
}

impl<S: NonceSource> NonceSource for MonotonicNonce<S> {
    fn next_nonce(&self) -> u64 {
        let candidate = self.inner.next_nonce();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let next = candidate.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

/// Always returns the same nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedNonce(pub u64);

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> u64 {
        self.0
    }
}
