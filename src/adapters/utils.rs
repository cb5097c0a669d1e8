//! Shared helpers for the adapter layer.

#[cfg(any(target_os = "espidf", test))]
use std::time::{Duration, Instant};

#[cfg(any(target_os = "espidf", test))]
use crate::error::RemoteError;

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used to validate WiFi SSID strings.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Strip every trailing `/` so a base URL can be joined with a path that
/// starts with one.
pub(super) fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Wall-clock limit on one whole HTTP exchange.
#[cfg(any(target_os = "espidf", test))]
pub(super) struct Deadline {
    at: Instant,
}

#[cfg(any(target_os = "espidf", test))]
impl Deadline {
    pub(super) fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// `Timeout` once the budget is spent.
    pub(super) fn check(&self) -> Result<(), RemoteError> {
        if Instant::now() >= self.at {
            Err(RemoteError::Timeout)
        } else {
            Ok(())
        }
    }
}

/// Reply body that refuses to grow past `cap` bytes.
#[cfg(any(target_os = "espidf", test))]
pub(super) struct CappedBody {
    bytes: Vec<u8>,
    cap: usize,
}

#[cfg(any(target_os = "espidf", test))]
impl CappedBody {
    pub(super) fn new(cap: usize) -> Self {
        Self {
            bytes: Vec::new(),
            cap,
        }
    }

    /// Append a chunk.  Overflow is `Malformed`; nothing is truncated.
    pub(super) fn push(&mut self, chunk: &[u8]) -> Result<(), RemoteError> {
        if self.bytes.len() + chunk.len() > self.cap {
            return Err(RemoteError::Malformed);
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    pub(super) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(super) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}
