//! The reconciliation engine.
//!
//! Turns this cycle's fetched control document and local sample into the
//! actuator commands to apply and the document to write back.  Pure and
//! total: no I/O, no hidden state, no failure path.
//!
//! Write-back rules:
//!
//! | Field            | Source                                        |
//! |------------------|-----------------------------------------------|
//! | `ir1`..`ir6`     | presence pin level == asserted                |
//! | `flame_detected` | flame pin level == asserted                   |
//! | `Sensor`         | fetched value, verbatim (absent stays absent) |
//! | `Shutdown`       | normalized `0` / `1`                          |
//!
//! `Sensor` is relayed rather than recomputed so that an operator edit made
//! between this cycle's fetch and its store is not clobbered by the device.

use super::document::{ActuatorCommands, LocalReading, OutputDocument, RemoteControlDocument};

/// Everything one cycle derives from its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub commands: ActuatorCommands,
    pub output: OutputDocument,
}

pub fn reconcile(remote: &RemoteControlDocument, local: &LocalReading) -> Reconciliation {
    let led_on = remote.sensor.is_one();
    let shutdown: u8 = u8::from(remote.shutdown.is_one());

    let [ir1, ir2, ir3, ir4, ir5, ir6] = local.presence_detected();

    Reconciliation {
        commands: ActuatorCommands {
            led_on,
            relay_energized: shutdown == 0,
        },
        output: OutputDocument {
            ir1,
            ir2,
            ir3,
            ir4,
            ir5,
            ir6,
            flame_detected: local.flame_detected(),
            sensor: remote.sensor.clone(),
            shutdown,
        },
    }
}
