//! GPIO adapter — bridges raw ESP32 pins to the digital I/O ports.
//!
//! This is the only module in the system that touches pin registers at
//! runtime.  Pins must have been configured by
//! [`hw_init::init_gpio`](crate::drivers::hw_init::init_gpio) first.  On
//! non-espidf targets the underlying calls are simulation stubs and every
//! input reads `High` (pulled up, nothing detected).

use embedded_hal::digital::PinState;

use crate::app::ports::{DigitalInputPort, DigitalOutputPort};
use crate::drivers::hw_init::{gpio_read, gpio_write};

/// Concrete adapter exposing all station pins behind the port traits.
#[derive(Debug, Default)]
pub struct GpioAdapter;

impl GpioAdapter {
    pub fn new() -> Self {
        Self
    }
}

// ── DigitalInputPort implementation ───────────────────────────

impl DigitalInputPort for GpioAdapter {
    fn read(&mut self, pin: i32) -> PinState {
        PinState::from(gpio_read(pin))
    }
}

// ── DigitalOutputPort implementation ──────────────────────────

impl DigitalOutputPort for GpioAdapter {
    fn set(&mut self, pin: i32, level: PinState) {
        gpio_write(pin, level == PinState::High);
    }
}
