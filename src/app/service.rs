//! Station service — the hexagonal core.
//!
//! [`StationService`] owns the configuration and the little state that
//! legitimately spans cycles (last applied commands, alarm cooldown,
//! counters).  One call to [`run_cycle`](StationService::run_cycle) is one
//! reconciliation cycle:
//!
//! ```text
//!  DocumentStore ──fetch──▶ ┌──────────────┐ ──store──▶ DocumentStore
//!                           │  reconcile() │
//!  DigitalInputPort ──────▶ └──────────────┘ ──set────▶ DigitalOutputPort
//!                                  │
//!                                  └────────emit──────▶ EventSink
//! ```
//!
//! Network phases are retried per [`RetryPolicy`]; a fetch that still fails
//! skips the cycle and applies the configured [`FailurePolicy`], but the
//! flame pin is still read so the local alarm keeps working offline.  A
//! store that still fails leaves the cycle's actuation in place.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::{DocumentPath, FailurePolicy, RetryPolicy, StationConfig};
use crate::error::RemoteError;
use crate::pins::{LED_POLARITY, RELAY_POLARITY, SENSOR_POLARITY};
use crate::sensors;

use super::alarm::FlameAlarm;
use super::document::{ActuatorCommands, RemoteControlDocument};
use super::events::{AppEvent, CycleSummary, Phase};
use super::ports::{DigitalInputPort, DigitalOutputPort, DocumentStore, EventSink};
use super::reconcile::{Reconciliation, reconcile};

// ───────────────────────────────────────────────────────────────
// Outcome types
// ───────────────────────────────────────────────────────────────

/// What a single cycle achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Synced(CycleSummary),
    /// Nothing was reconciled or stored this cycle.
    FetchFailed { error: RemoteError, attempts: u8 },
    /// Actuation happened; the write-back did not.
    StoreFailed {
        summary: CycleSummary,
        error: RemoteError,
        attempts: u8,
    },
}

impl CycleOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct PhaseFailure {
    error: RemoteError,
    attempts: u8,
}

// ───────────────────────────────────────────────────────────────
// StationService
// ───────────────────────────────────────────────────────────────

pub struct StationService {
    config: StationConfig,
    path: DocumentPath,
    alarm: FlameAlarm,
    /// Last commands driven onto the output pins.
    applied: Option<ActuatorCommands>,
    cycle_count: u64,
    consecutive_failures: u32,
}

impl StationService {
    pub fn new(config: StationConfig) -> Self {
        let path = config.document_path();
        let alarm = FlameAlarm::new(config.flame_alarm_cooldown_secs);
        Self {
            config,
            path,
            alarm,
            applied: None,
            cycle_count: 0,
            consecutive_failures: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the power-on outputs (relay energized, LED off).
    pub fn start(&mut self, outputs: &mut impl DigitalOutputPort, sink: &mut impl EventSink) {
        self.apply(outputs, ActuatorCommands::SAFE);
        sink.emit(&AppEvent::Started {
            device_id: self.config.device_id.clone(),
            path: self.path.clone(),
        });
        info!("StationService started for {}", self.path);
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle: fetch → reconcile → actuate → store → log.
    ///
    /// `hw` satisfies both I/O ports, mirroring the single GPIO adapter on
    /// the device.  `now_ms` is monotonic time used for the alarm cooldown.
    pub fn run_cycle(
        &mut self,
        hw: &mut (impl DigitalInputPort + DigitalOutputPort),
        store: &mut impl DocumentStore,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> CycleOutcome {
        self.cycle_count += 1;
        let path = self.path.clone();
        let policy = self.config.retry;

        // 1. Fetch
        let fetched = with_retry(Phase::Fetch, policy, store, delay, sink, |s| {
            s.fetch(&path)
        });
        let doc = match fetched {
            Ok(doc) => doc,
            Err(PhaseFailure { error, attempts }) => {
                self.consecutive_failures += 1;
                sink.emit(&AppEvent::PhaseFailed {
                    phase: Phase::Fetch,
                    error,
                    attempts,
                });
                self.fall_back(hw, sink);
                let flame = SENSOR_POLARITY.is_asserted(hw.read(self.config.pins.flame));
                self.check_flame(flame, now_ms, sink);
                return CycleOutcome::FetchFailed { error, attempts };
            }
        };

        // 2. Sample + reconcile
        let remote = RemoteControlDocument::from_document(&doc);
        let local = sensors::sample(hw, &self.config.pins);
        let Reconciliation { commands, output } = reconcile(&remote, &local);

        // 3. Actuate
        self.apply(hw, commands);

        // 4. Store
        let body = output.to_document();
        let stored = with_retry(Phase::Store, policy, store, delay, sink, |s| {
            s.store(&path, &body)
        });

        // 5. Log
        let summary = CycleSummary {
            cycle: self.cycle_count,
            device_id: self.config.device_id.clone(),
            path,
            commands,
            shutdown: output.shutdown,
            occupied_bays: output.occupied_bays(),
            flame_detected: output.flame_detected,
            stored: stored.is_ok(),
        };

        let outcome = match stored {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Sync restored after {} failed cycle(s)",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                sink.emit(&AppEvent::Synced(summary.clone()));
                CycleOutcome::Synced(summary)
            }
            Err(PhaseFailure { error, attempts }) => {
                self.consecutive_failures += 1;
                sink.emit(&AppEvent::PhaseFailed {
                    phase: Phase::Store,
                    error,
                    attempts,
                });
                sink.emit(&AppEvent::Synced(summary.clone()));
                CycleOutcome::StoreFailed {
                    summary,
                    error,
                    attempts,
                }
            }
        };

        self.check_flame(output.flame_detected, now_ms, sink);

        outcome
    }

    // ── Queries ───────────────────────────────────────────────

    /// Commands currently on the output pins, if any were driven yet.
    pub fn applied_commands(&self) -> Option<ActuatorCommands> {
        self.applied
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Cycles in a row that ended in a fetch or store failure.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate commands into pin levels through the wiring polarity.
    fn apply(&mut self, outputs: &mut impl DigitalOutputPort, commands: ActuatorCommands) {
        let pins = &self.config.pins;
        outputs.set(pins.relay, RELAY_POLARITY.level(commands.relay_energized));
        outputs.set(pins.led, LED_POLARITY.level(commands.led_on));
        self.applied = Some(commands);
    }

    fn check_flame(&mut self, detected: bool, now_ms: u64, sink: &mut impl EventSink) {
        if self.alarm.observe(detected, now_ms) {
            warn!("Flame detected at {}", self.config.device_id);
            sink.emit(&AppEvent::FlameAlarm {
                device_id: self.config.device_id.clone(),
            });
        }
    }

    fn fall_back(&mut self, outputs: &mut impl DigitalOutputPort, sink: &mut impl EventSink) {
        let policy = self.config.fetch_failure;
        let commands = match policy {
            FailurePolicy::HoldLast => self.applied,
            FailurePolicy::SafeDefault => {
                self.apply(outputs, ActuatorCommands::SAFE);
                Some(ActuatorCommands::SAFE)
            }
        };
        sink.emit(&AppEvent::FetchFallback { policy, commands });
    }
}

// ───────────────────────────────────────────────────────────────
// Retry
// ───────────────────────────────────────────────────────────────

/// Run `op` until it succeeds or the phase gives up.
///
/// Retryable errors sleep an exponential backoff between attempts.  The
/// first `Auth` error in a phase refreshes the session and, if attempts
/// remain, retries immediately; the refresh happens even on the last
/// attempt so the next cycle starts with a fresh session.
fn with_retry<S: DocumentStore, T>(
    phase: Phase,
    policy: RetryPolicy,
    store: &mut S,
    delay: &mut impl DelayNs,
    sink: &mut impl EventSink,
    mut op: impl FnMut(&mut S) -> Result<T, RemoteError>,
) -> Result<T, PhaseFailure> {
    let mut backoff_ms = policy.initial_backoff_ms;
    let mut refreshed = false;
    let mut attempts: u8 = 0;

    loop {
        attempts += 1;
        let error = match op(store) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if error == RemoteError::Auth && !refreshed {
            refreshed = true;
            let refresh = store.refresh_session();
            sink.emit(&AppEvent::SessionRefreshed {
                phase,
                ok: refresh.is_ok(),
            });
            match refresh {
                Err(e) => return Err(PhaseFailure { error: e, attempts }),
                Ok(()) if attempts >= policy.max_attempts => {
                    return Err(PhaseFailure { error, attempts });
                }
                Ok(()) => continue,
            }
        }

        if attempts >= policy.max_attempts || !error.is_retryable() {
            return Err(PhaseFailure { error, attempts });
        }

        warn!(
            "{:?}: attempt {}/{} failed ({}), retrying in {}ms",
            phase, attempts, policy.max_attempts, error, backoff_ms
        );
        delay.delay_ms(backoff_ms);
        backoff_ms = backoff_ms.saturating_mul(2).min(policy.max_backoff_ms);
    }
}
