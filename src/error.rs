//! Unified error types for the station firmware.
//!
//! A single `Error` enum that boot-time subsystems convert into, plus the
//! per-cycle [`RemoteError`] returned by the remote document store.  All
//! variants are `Copy` so they can be carried in events and cycle outcomes
//! without allocation.

use core::fmt;

use crate::config::ConfigError;
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Boot-time failures.  Any of these stops the device before the first cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or incomplete.
    Config(ConfigError),
    /// GPIO / peripheral initialisation failed.
    Hardware(HwInitError),
    /// Persistent-storage (NVS) initialisation failed.
    Storage(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Remote document store errors
// ---------------------------------------------------------------------------

/// Transient failures from `fetch` / `store` / session refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteError {
    /// Host unreachable, connection reset, DNS or TLS failure.
    Network,
    /// Session missing, expired, or credentials rejected.
    Auth,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The store answered with an unexpected HTTP status.
    Rejected(u16),
    /// The reply body could not be decoded.
    Malformed,
}

impl RemoteError {
    /// Whether repeating the same request after a backoff can succeed.
    ///
    /// `Auth` is not retryable on its own: it needs a session refresh first.
    pub const fn is_retryable(self) -> bool {
        match self {
            Self::Network | Self::Timeout => true,
            Self::Rejected(status) => status >= 500,
            Self::Auth | Self::Malformed => false,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network unreachable"),
            Self::Auth => write!(f, "not authenticated"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Rejected(status) => write!(f, "rejected with HTTP {status}"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

impl core::error::Error for RemoteError {}
