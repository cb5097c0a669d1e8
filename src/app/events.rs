//! Outbound application events.
//!
//! The [`StationService`](super::service::StationService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (serial log today).

use crate::config::{DeviceId, DocumentPath, FailurePolicy};
use crate::error::RemoteError;

use super::document::ActuatorCommands;

/// Network phase of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetch,
    Store,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service drove its initial outputs and is ready to cycle.
    Started {
        device_id: DeviceId,
        path: DocumentPath,
    },

    /// A cycle reconciled and actuated; `stored` in the summary says
    /// whether the write-back landed.
    Synced(CycleSummary),

    /// A network phase gave up after `attempts` tries.
    PhaseFailed {
        phase: Phase,
        error: RemoteError,
        attempts: u8,
    },

    /// Fetch failed; actuators were handled according to `policy`.
    FetchFallback {
        policy: FailurePolicy,
        commands: Option<ActuatorCommands>,
    },

    /// The session was refreshed after an `Auth` rejection.
    SessionRefreshed { phase: Phase, ok: bool },

    /// Flame sensor asserted and the alarm cooldown had elapsed.
    FlameAlarm { device_id: DeviceId },
}

/// One line of per-cycle state, suitable for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub device_id: DeviceId,
    pub path: DocumentPath,
    pub commands: ActuatorCommands,
    /// Normalized shutdown flag as written back.
    pub shutdown: u8,
    pub occupied_bays: u8,
    pub flame_detected: bool,
    /// `false` when the store phase failed after actuation.
    pub stored: bool,
}
