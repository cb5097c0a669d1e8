//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ StationService (domain)
//! ```
//!
//! Driven adapters (GPIO, remote store, event sinks) implement these traits.
//! The [`StationService`](super::service::StationService) consumes them via
//! generics, so the domain core never touches hardware or the network
//! directly.  Blocking waits go through `embedded_hal::delay::DelayNs`.

use embedded_hal::digital::PinState;

use super::document::Document;
use crate::error::RemoteError;

// ───────────────────────────────────────────────────────────────
// Digital I/O ports (driven adapter: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Samples input pins.  Reads are side-effect-free and reflect the level at
/// call time; an undriven (pulled-up) line reads `High`.
pub trait DigitalInputPort {
    fn read(&mut self, pin: i32) -> PinState;
}

/// Drives output pins.  Infallible at this boundary.
pub trait DigitalOutputPort {
    fn set(&mut self, pin: i32, level: PinState);
}

// ───────────────────────────────────────────────────────────────
// Remote document store (driven adapter: domain ↔ network)
// ───────────────────────────────────────────────────────────────

/// Whole-document access to the remote store.  No field-level merge:
/// `store` replaces everything at `path`.
pub trait DocumentStore {
    /// Return whatever is currently stored at `path` (may be `null` or lack
    /// expected fields).
    fn fetch(&mut self, path: &str) -> Result<Document, RemoteError>;

    /// Replace the document at `path`.
    fn store(&mut self, path: &str, doc: &Document) -> Result<(), RemoteError>;

    /// Re-establish the authenticated session after an `Auth` failure.
    fn refresh_session(&mut self) -> Result<(), RemoteError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Cycle delegate (decouples scheduler from the service wiring)
// ───────────────────────────────────────────────────────────────

/// Callback the [`CycleScheduler`](crate::scheduler::CycleScheduler)
/// invokes once per period.  `main` implements it by running one service
/// cycle against the real adapters; tests implement it against mocks.
pub trait CycleDelegate {
    /// `cycle` counts from 1.
    fn on_cycle(&mut self, cycle: u64);
}
