//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).  Every line
//! starts with a fixed tag so the serial console can be grepped:
//!
//! ```text
//! SYNC | device=ESP32_04 | LED=1 Shutdown=0 | bays=2/6 flame=no | path=/devices/ESP32_04
//! FAIL | fetch | request timed out | attempts=3
//! ALARM | flame detected at ESP32_04
//! ```

use core::fmt::Write;

use log::{error, info, warn};

use crate::app::events::{AppEvent, CycleSummary, Phase};
use crate::app::ports::EventSink;
use crate::config::FailurePolicy;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-cycle status line.
pub fn format_sync_line(s: &CycleSummary) -> String {
    let mut line = String::with_capacity(112);
    let _ = write!(
        line,
        "SYNC | device={} | LED={} Shutdown={} | bays={}/6 flame={} | path={}",
        s.device_id,
        u8::from(s.commands.led_on),
        s.shutdown,
        s.occupied_bays,
        if s.flame_detected { "YES" } else { "no" },
        s.path,
    );
    if !s.stored {
        line.push_str(" | store=failed");
    }
    line
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Fetch => "fetch",
        Phase::Store => "store",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Synced(summary) => {
                info!("{}", format_sync_line(summary));
            }
            AppEvent::PhaseFailed {
                phase,
                error,
                attempts,
            } => {
                warn!("FAIL | {} | {} | attempts={}", phase_name(*phase), error, attempts);
            }
            AppEvent::FetchFallback { policy, commands } => match (policy, commands) {
                (FailurePolicy::HoldLast, Some(c)) => {
                    info!("HOLD | LED={} relay={}", u8::from(c.led_on), u8::from(c.relay_energized));
                }
                (FailurePolicy::HoldLast, None) => info!("HOLD | no commands applied yet"),
                (FailurePolicy::SafeDefault, _) => warn!("SAFE | relay energized, LED off"),
            },
            AppEvent::SessionRefreshed { phase, ok } => {
                if *ok {
                    info!("AUTH | session refreshed during {}", phase_name(*phase));
                } else {
                    warn!("AUTH | session refresh failed during {}", phase_name(*phase));
                }
            }
            AppEvent::FlameAlarm { device_id } => {
                error!("ALARM | flame detected at {}", device_id);
            }
            AppEvent::Started { device_id, path } => {
                info!("START | device={} | path={}", device_id, path);
            }
        }
    }
}
