//! Fixed-period cycle scheduler.
//!
//! The scheduler owns only the cadence.  Each step notifies a
//! [`CycleDelegate`] and then sleeps the configured period; the main loop
//! implements the delegate to run one service cycle against the real
//! adapters.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  CycleScheduler::run()                       │
//! │                                              │
//! │   loop {                                     │
//! │     delegate.on_cycle(n)   ── fetch/actuate  │
//! │     delay.delay_ms(period)    store/log      │
//! │   }                                          │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The sleep follows the cycle's work, so the effective period is
//! `period + work time`.  Cycles never overlap.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::ports::CycleDelegate;

pub struct CycleScheduler {
    period_ms: u32,
    cycles: u64,
}

impl CycleScheduler {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            cycles: 0,
        }
    }

    /// Cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle, then sleep one period.
    pub fn step(&mut self, delegate: &mut dyn CycleDelegate, delay: &mut impl DelayNs) {
        self.cycles += 1;
        delegate.on_cycle(self.cycles);
        delay.delay_ms(self.period_ms);
    }

    /// Run a bounded number of cycles.  Used by tests and bring-up tools.
    pub fn run_for(
        &mut self,
        count: u64,
        delegate: &mut dyn CycleDelegate,
        delay: &mut impl DelayNs,
    ) {
        for _ in 0..count {
            self.step(delegate, delay);
        }
    }

    /// Run forever.
    pub fn run(&mut self, delegate: &mut dyn CycleDelegate, delay: &mut impl DelayNs) -> ! {
        info!("Scheduler: cycling every {}ms", self.period_ms);
        loop {
            self.step(delegate, delay);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
