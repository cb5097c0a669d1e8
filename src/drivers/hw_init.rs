//! One-shot GPIO initialization and raw pin access.
//!
//! Configures the seven sensor inputs (pulled up) and the two actuator
//! outputs using raw ESP-IDF sys calls.  Called once from `main()` before
//! the first cycle.  Outputs are preloaded with their power-on levels so
//! the relay never chatters while the pin switches to output mode.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::PinMap;
#[cfg(target_os = "espidf")]
use crate::pins::{LED_POLARITY, RELAY_POLARITY};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed { pin: i32, rc: i32 },
    GpioLevelFailed { pin: i32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed { pin, rc } => {
                write!(f, "GPIO{} config failed (rc={})", pin, rc)
            }
            Self::GpioLevelFailed { pin, rc } => {
                write!(f, "GPIO{} initial level failed (rc={})", pin, rc)
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_gpio(pins: &PinMap) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the scheduler starts;
    // single-threaded.
    unsafe {
        init_gpio_inputs(pins)?;
        init_gpio_outputs(pins)?;
    }
    info!("hw_init: GPIO configured (7 inputs, 2 outputs)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_gpio(pins: &PinMap) -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): GPIO init skipped (relay={}, led={})",
        pins.relay,
        pins.led
    );
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs(pins: &PinMap) -> Result<(), HwInitError> {
    for pin in pins.inputs() {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let rc = unsafe { gpio_config(&cfg) };
        if rc != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { pin, rc });
        }
    }
    Ok(())
}

/// `true` when the pin reads HIGH.
#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host simulation: every input floats HIGH (nothing detected).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(pins: &PinMap) -> Result<(), HwInitError> {
    let initial = [
        (pins.relay, RELAY_POLARITY.level(true)),
        (pins.led, LED_POLARITY.level(false)),
    ];

    for (pin, level) in initial {
        let high = u32::from(level == embedded_hal::digital::PinState::High);
        let rc = unsafe { gpio_set_level(pin, high) };
        if rc != ESP_OK as i32 {
            return Err(HwInitError::GpioLevelFailed { pin, rc });
        }
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let rc = unsafe { gpio_config(&cfg) };
        if rc != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { pin, rc });
        }
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated by PinMap::validate(). Main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}
