//! GPIO pin assignments and wiring polarity for the station controller board.
//!
//! Single source of truth for the default [`PinMap`](crate::config::PinMap)
//! and for every active-low / active-high inversion.  Nothing else in the
//! crate compares against a raw `PinState::Low` or `PinState::High`.

use embedded_hal::digital::PinState;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Relay coil driver.  Active-low: LOW energizes the relay (charger powered).
pub const RELAY_GPIO: i32 = 4;
/// On-board indicator LED.  Active-high.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Inputs (pulled up, active-low)
// ---------------------------------------------------------------------------

/// IR presence sensors for bays 1–6, in `ir1`..`ir6` order.
pub const PRESENCE_GPIOS: [i32; 6] = [27, 26, 25, 33, 32, 14];
/// Flame sensor module digital output.
pub const FLAME_GPIO: i32 = 13;

/// GPIOs 34–39 on the ESP32 are input-only (no output driver).
pub const INPUT_ONLY_GPIOS: core::ops::RangeInclusive<i32> = 34..=39;
/// Highest GPIO number on the ESP32.
pub const MAX_GPIO: i32 = 39;

// ---------------------------------------------------------------------------
// Polarity
// ---------------------------------------------------------------------------

/// Which electrical level means "asserted" on a given line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Level to drive for the requested logical state.
    pub const fn level(self, asserted: bool) -> PinState {
        match (self, asserted) {
            (Self::ActiveHigh, true) | (Self::ActiveLow, false) => PinState::High,
            (Self::ActiveHigh, false) | (Self::ActiveLow, true) => PinState::Low,
        }
    }

    /// Whether a sampled level means the line is asserted.
    pub const fn is_asserted(self, level: PinState) -> bool {
        matches!(
            (self, level),
            (Self::ActiveHigh, PinState::High) | (Self::ActiveLow, PinState::Low)
        )
    }
}

/// IR and flame modules pull their output LOW on detection.
pub const SENSOR_POLARITY: Polarity = Polarity::ActiveLow;
/// Relay module energizes its coil when the control pin is LOW.
pub const RELAY_POLARITY: Polarity = Polarity::ActiveLow;
pub const LED_POLARITY: Polarity = Polarity::ActiveHigh;
