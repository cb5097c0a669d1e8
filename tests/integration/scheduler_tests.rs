//! Scheduler + service wiring, the way `main` assembles it.

use embedded_hal::digital::PinState::High;
use serde_json::json;

use evstation::app::ports::CycleDelegate;
use evstation::app::service::{CycleOutcome, StationService};
use evstation::config::StationConfig;
use evstation::error::RemoteError;
use evstation::scheduler::CycleScheduler;

use super::mock_hw::{LogSink, MockDelay, MockHardware, MockStore};

/// Host stand-in for the device's cycle delegate.  Time advances by one
/// period per cycle.
struct HostCycle {
    service: StationService,
    hw: MockHardware,
    store: MockStore,
    backoff: MockDelay,
    sink: LogSink,
    period_ms: u64,
    outcomes: Vec<CycleOutcome>,
}

impl CycleDelegate for HostCycle {
    fn on_cycle(&mut self, cycle: u64) {
        let now_ms = (cycle - 1) * self.period_ms;
        let outcome = self.service.run_cycle(
            &mut self.hw,
            &mut self.store,
            &mut self.backoff,
            &mut self.sink,
            now_ms,
        );
        self.outcomes.push(outcome);
    }
}

fn host_cycle(remote: serde_json::Value) -> HostCycle {
    let config = StationConfig::default();
    let period_ms = u64::from(config.cycle_period_ms);
    let mut hc = HostCycle {
        service: StationService::new(config),
        hw: MockHardware::new(),
        store: MockStore::new(remote),
        backoff: MockDelay::default(),
        sink: LogSink::new(),
        period_ms,
        outcomes: Vec::new(),
    };
    hc.service.start(&mut hc.hw, &mut hc.sink);
    hc
}

#[test]
fn runs_one_service_cycle_per_period() {
    let mut hc = host_cycle(json!({"Sensor": 1}));
    let mut sched = CycleScheduler::new(3_000);
    let mut sleeps = MockDelay::default();

    sched.run_for(4, &mut hc, &mut sleeps);

    assert_eq!(sleeps.sleeps_ms, vec![3_000; 4]);
    assert_eq!(hc.store.stores.len(), 4);
    assert_eq!(hc.service.cycle_count(), 4);
    assert!(hc.outcomes.iter().all(CycleOutcome::is_synced));
    assert_eq!(hc.hw.led(), Some(High));
}

#[test]
fn failed_cycle_does_not_stop_the_loop() {
    let mut hc = host_cycle(json!({}));
    hc.store.fail_fetch(RemoteError::Network, 3);
    let mut sched = CycleScheduler::new(3_000);
    let mut sleeps = MockDelay::default();

    sched.run_for(2, &mut hc, &mut sleeps);

    assert!(!hc.outcomes[0].is_synced());
    assert!(hc.outcomes[1].is_synced());
    assert_eq!(sleeps.sleeps_ms.len(), 2, "period sleep after every cycle");
    assert_eq!(hc.backoff.sleeps_ms, vec![250, 500]);
}

#[test]
fn remote_edit_between_cycles_takes_effect_next_cycle() {
    let mut hc = host_cycle(json!({"Sensor": 0}));
    let mut sched = CycleScheduler::new(3_000);
    let mut sleeps = MockDelay::default();

    sched.step(&mut hc, &mut sleeps);
    assert_ne!(hc.hw.led(), Some(High));

    // Operator flips the LED from the dashboard.
    hc.store.remote["Sensor"] = json!("1");
    sched.step(&mut hc, &mut sleeps);
    assert_eq!(hc.hw.led(), Some(High));
    assert_eq!(hc.store.last_stored().unwrap()["Sensor"], json!("1"));
}
