//! Station input sampling — presence and flame sensors.
//!
//! The IR bay sensors and the flame module are plain pulled-up digital
//! inputs; each cycle reads all seven once, back to back, and hands the raw
//! levels to the reconciliation engine as a [`LocalReading`].

use crate::app::document::LocalReading;
use crate::app::ports::DigitalInputPort;
use crate::config::PinMap;

/// Read every configured input once.
pub fn sample(inputs: &mut impl DigitalInputPort, pins: &PinMap) -> LocalReading {
    LocalReading {
        presence: pins.presence.map(|pin| inputs.read(pin)),
        flame: inputs.read(pins.flame),
    }
}
