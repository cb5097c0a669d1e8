//! Integration tests for the StationService → ports pipeline.
//!
//! These run on the host (x86_64) and drive whole cycles, from fetch
//! through actuation and write-back, against mock pins and an in-memory
//! remote store.

use embedded_hal::digital::PinState::{High, Low};
use serde_json::json;

use evstation::app::document::ActuatorCommands;
use evstation::app::events::{AppEvent, Phase};
use evstation::app::service::{CycleOutcome, StationService};
use evstation::config::{FailurePolicy, StationConfig};
use evstation::error::RemoteError;
use evstation::pins::FLAME_GPIO;

use super::mock_hw::{LogSink, MockDelay, MockHardware, MockStore};

struct Rig {
    service: StationService,
    hw: MockHardware,
    store: MockStore,
    delay: MockDelay,
    sink: LogSink,
}

impl Rig {
    fn new(remote: serde_json::Value) -> Self {
        Self::with_config(StationConfig::default(), remote)
    }

    fn with_config(config: StationConfig, remote: serde_json::Value) -> Self {
        let mut rig = Self {
            service: StationService::new(config),
            hw: MockHardware::new(),
            store: MockStore::new(remote),
            delay: MockDelay::default(),
            sink: LogSink::new(),
        };
        rig.service.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    fn cycle(&mut self, now_ms: u64) -> CycleOutcome {
        self.service.run_cycle(
            &mut self.hw,
            &mut self.store,
            &mut self.delay,
            &mut self.sink,
            now_ms,
        )
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_drives_safe_outputs() {
    let rig = Rig::new(json!(null));
    // Relay is active-low: energized = LOW.  LED off = LOW.
    assert_eq!(rig.hw.relay(), Some(Low));
    assert_eq!(rig.hw.led(), Some(Low));
    assert_eq!(rig.service.applied_commands(), Some(ActuatorCommands::SAFE));
    assert!(matches!(
        rig.sink.events.first(),
        Some(AppEvent::Started { path, .. }) if path.as_str() == "/devices/ESP32_04"
    ));
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn sensor_on_lights_led_and_writes_back() {
    let mut rig = Rig::new(json!({"Sensor": 1}));
    let outcome = rig.cycle(0);

    assert!(outcome.is_synced());
    assert_eq!(rig.hw.led(), Some(High));
    assert_eq!(rig.hw.relay(), Some(Low));

    let (path, doc) = &rig.store.stores[0];
    assert_eq!(path, "/devices/ESP32_04");
    assert_eq!(
        *doc,
        json!({
            "ir1": false, "ir2": false, "ir3": false,
            "ir4": false, "ir5": false, "ir6": false,
            "flame_detected": false,
            "Sensor": 1,
            "Shutdown": 0
        })
    );
}

#[test]
fn string_shutdown_cuts_charger_and_normalizes() {
    let mut rig = Rig::new(json!({"Sensor": "0", "Shutdown": "1"}));
    rig.hw.set_presence(2, true);

    let CycleOutcome::Synced(summary) = rig.cycle(0) else {
        panic!("cycle should sync");
    };

    assert_eq!(rig.hw.led(), Some(Low));
    assert_eq!(rig.hw.relay(), Some(High), "de-energized relay is HIGH");
    assert_eq!(summary.shutdown, 1);
    assert_eq!(summary.occupied_bays, 1);

    let doc = rig.store.last_stored().unwrap();
    assert_eq!(doc["Shutdown"], json!(1));
    assert_eq!(doc["Sensor"], json!("0"));
    assert_eq!(doc["ir2"], json!(true));
    assert_eq!(doc["ir1"], json!(false));
}

#[test]
fn never_written_path_gets_initialized() {
    let mut rig = Rig::new(json!(null));
    rig.hw.set_presence(3, true);
    assert!(rig.cycle(0).is_synced());

    assert_eq!(rig.hw.led(), Some(Low));
    assert_eq!(rig.hw.relay(), Some(Low));
    let doc = rig.store.last_stored().unwrap();
    assert!(doc.get("Sensor").is_none());
    assert_eq!(doc["Shutdown"], json!(0));
    assert_eq!(doc["ir3"], json!(true));
}

#[test]
fn flame_and_shutdown_reported() {
    let mut rig = Rig::new(json!({"Sensor": 0, "Shutdown": 1}));
    rig.hw.set_flame(true);

    let CycleOutcome::Synced(summary) = rig.cycle(0) else {
        panic!("cycle should sync");
    };
    assert!(summary.flame_detected);
    assert_eq!(rig.hw.relay(), Some(High));
    assert_eq!(rig.store.last_stored().unwrap()["flame_detected"], json!(true));
}

#[test]
fn full_replace_drops_foreign_fields() {
    let mut rig = Rig::new(json!({"Sensor": 1, "charging1": true, "note": "x"}));
    rig.cycle(0);
    let doc = rig.store.last_stored().unwrap();
    assert!(doc.get("charging1").is_none());
    assert!(doc.get("note").is_none());
}

#[test]
fn inputs_sampled_once_per_cycle() {
    let mut rig = Rig::new(json!({}));
    rig.cycle(0);
    assert_eq!(rig.hw.reads.len(), 7);
}

#[test]
fn repeated_cycles_are_stable() {
    let mut rig = Rig::new(json!({"Sensor": "1", "Shutdown": 0}));
    rig.hw.set_presence(5, true);

    rig.cycle(0);
    rig.cycle(3_000);
    rig.cycle(6_000);

    assert_eq!(rig.store.stores.len(), 3);
    assert_eq!(rig.store.stores[0].1, rig.store.stores[2].1);
    assert_eq!(rig.service.cycle_count(), 3);
    assert_eq!(rig.service.consecutive_failures(), 0);
}

#[test]
fn synced_event_carries_summary() {
    let mut rig = Rig::new(json!({"Sensor": 1}));
    rig.hw.set_presence(1, true);
    rig.hw.set_presence(6, true);
    rig.cycle(0);

    let summary = rig
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Synced(s) => Some(s.clone()),
            _ => None,
        })
        .expect("Synced event");
    assert_eq!(summary.cycle, 1);
    assert_eq!(summary.occupied_bays, 2);
    assert!(summary.commands.led_on);
    assert!(summary.stored);
}

// ── Fetch failures ────────────────────────────────────────────

#[test]
fn fetch_failure_holds_last_outputs() {
    let mut rig = Rig::new(json!({"Sensor": 1, "Shutdown": 1}));
    rig.cycle(0);
    let writes_before = rig.hw.writes.len();
    let stores_before = rig.store.stores.len();

    rig.store.fail_fetch(RemoteError::Network, 3);
    let outcome = rig.cycle(3_000);

    assert_eq!(
        outcome,
        CycleOutcome::FetchFailed {
            error: RemoteError::Network,
            attempts: 3
        }
    );
    assert_eq!(rig.hw.writes.len(), writes_before, "no actuation on hold");
    assert_eq!(rig.store.stores.len(), stores_before, "no store without fetch");
    assert_eq!(rig.hw.led(), Some(High));
    assert_eq!(rig.hw.relay(), Some(High));
    assert_eq!(rig.service.consecutive_failures(), 1);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::FetchFallback {
            policy: FailurePolicy::HoldLast,
            commands: Some(ActuatorCommands {
                led_on: true,
                relay_energized: false
            })
        }
    )));
}

#[test]
fn fetch_failure_safe_default_restores_power() {
    let config = StationConfig {
        fetch_failure: FailurePolicy::SafeDefault,
        ..StationConfig::default()
    };
    let mut rig = Rig::with_config(config, json!({"Sensor": 1, "Shutdown": 1}));
    rig.cycle(0);
    assert_eq!(rig.hw.relay(), Some(High));

    rig.store.fail_fetch(RemoteError::Timeout, 3);
    assert!(!rig.cycle(3_000).is_synced());

    assert_eq!(rig.hw.relay(), Some(Low), "relay re-energized");
    assert_eq!(rig.hw.led(), Some(Low));
    assert_eq!(rig.service.applied_commands(), Some(ActuatorCommands::SAFE));
}

#[test]
fn retries_with_exponential_backoff() {
    let mut rig = Rig::new(json!({"Sensor": 1}));
    rig.store.fail_fetch(RemoteError::Timeout, 2);

    assert!(rig.cycle(0).is_synced());
    assert_eq!(rig.store.fetches, 3);
    assert_eq!(rig.delay.sleeps_ms, vec![250, 500]);
}

#[test]
fn exhausted_retries_sleep_between_attempts_only() {
    let mut rig = Rig::new(json!({}));
    rig.store.fail_fetch(RemoteError::Rejected(503), 3);
    let outcome = rig.cycle(0);

    assert_eq!(
        outcome,
        CycleOutcome::FetchFailed {
            error: RemoteError::Rejected(503),
            attempts: 3
        }
    );
    assert_eq!(rig.delay.sleeps_ms, vec![250, 500]);
}

#[test]
fn client_error_is_not_retried() {
    let mut rig = Rig::new(json!({}));
    rig.store.fail_fetch(RemoteError::Rejected(404), 1);
    let outcome = rig.cycle(0);

    assert_eq!(
        outcome,
        CycleOutcome::FetchFailed {
            error: RemoteError::Rejected(404),
            attempts: 1
        }
    );
    assert!(rig.delay.sleeps_ms.is_empty());
}

#[test]
fn malformed_reply_skips_cycle() {
    let mut rig = Rig::new(json!({"Sensor": 1}));
    rig.store.fail_fetch(RemoteError::Malformed, 1);
    let outcome = rig.cycle(0);

    assert!(matches!(
        outcome,
        CycleOutcome::FetchFailed {
            error: RemoteError::Malformed,
            ..
        }
    ));
    assert!(rig.store.stores.is_empty());
    assert_eq!(rig.hw.led(), Some(Low), "still the boot state");
}

#[test]
fn auth_failure_refreshes_session_and_retries() {
    let mut rig = Rig::new(json!({"Sensor": 1}));
    rig.store.fail_fetch(RemoteError::Auth, 1);

    assert!(rig.cycle(0).is_synced());
    assert_eq!(rig.store.refreshes, 1);
    assert!(rig.delay.sleeps_ms.is_empty());
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::SessionRefreshed {
            phase: Phase::Fetch,
            ok: true
        }
    )));
}

#[test]
fn failed_refresh_fails_the_phase() {
    let mut rig = Rig::new(json!({"Sensor": 1}));
    rig.store.fail_fetch(RemoteError::Auth, 1);
    rig.store.refresh_result = Err(RemoteError::Auth);

    let outcome = rig.cycle(0);
    assert_eq!(
        outcome,
        CycleOutcome::FetchFailed {
            error: RemoteError::Auth,
            attempts: 1
        }
    );
    assert_eq!(rig.store.fetches, 1);
}

// ── Store failures ────────────────────────────────────────────

#[test]
fn store_failure_keeps_actuation() {
    let mut rig = Rig::new(json!({"Sensor": 1, "Shutdown": 1}));
    rig.store.fail_store(RemoteError::Network, 3);

    let outcome = rig.cycle(0);
    let CycleOutcome::StoreFailed {
        summary,
        error,
        attempts,
    } = outcome
    else {
        panic!("expected StoreFailed, got {:?}", outcome);
    };

    assert_eq!(error, RemoteError::Network);
    assert_eq!(attempts, 3);
    assert!(!summary.stored);
    assert_eq!(rig.hw.led(), Some(High));
    assert_eq!(rig.hw.relay(), Some(High));
    assert_eq!(rig.service.consecutive_failures(), 1);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::PhaseFailed {
            phase: Phase::Store,
            ..
        }
    )));
    let synced: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Synced(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(synced.len(), 1);
    assert!(!synced[0].stored, "Synced reports the failed write-back");
}

#[test]
fn recovery_resets_failure_count() {
    let mut rig = Rig::new(json!({}));
    rig.store.fail_fetch(RemoteError::Network, 3);
    rig.cycle(0);
    rig.store.fail_fetch(RemoteError::Network, 3);
    rig.cycle(3_000);
    assert_eq!(rig.service.consecutive_failures(), 2);

    assert!(rig.cycle(6_000).is_synced());
    assert_eq!(rig.service.consecutive_failures(), 0);
}

// ── Flame alarm ───────────────────────────────────────────────

fn alarms(sink: &LogSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::FlameAlarm { .. }))
}

#[test]
fn flame_alarm_respects_cooldown() {
    let mut rig = Rig::new(json!({}));
    rig.hw.set_flame(true);

    rig.cycle(0);
    assert_eq!(alarms(&rig.sink), 1);

    for t in [3_000, 30_000, 59_999] {
        rig.cycle(t);
    }
    assert_eq!(alarms(&rig.sink), 1, "suppressed during cooldown");

    rig.cycle(60_000);
    assert_eq!(alarms(&rig.sink), 2);
}

#[test]
fn no_flame_no_alarm() {
    let mut rig = Rig::new(json!({}));
    for t in 0..5 {
        rig.cycle(t * 3_000);
    }
    assert_eq!(alarms(&rig.sink), 0);
}

#[test]
fn flame_alarm_still_raised_while_offline() {
    let mut rig = Rig::new(json!({}));
    rig.hw.set_flame(true);
    rig.store.fail_fetch(RemoteError::Network, 3 * 21);

    for n in 0..20 {
        assert!(!rig.cycle(n * 3_000).is_synced());
    }
    assert_eq!(alarms(&rig.sink), 1, "cooldown applies offline too");
    assert_eq!(rig.hw.reads, vec![FLAME_GPIO; 20], "flame pin only");

    rig.cycle(60_000);
    assert_eq!(alarms(&rig.sink), 2);
}

#[test]
fn offline_without_flame_raises_nothing() {
    let mut rig = Rig::new(json!({}));
    rig.store.fail_fetch(RemoteError::Network, 3);
    rig.cycle(0);
    assert_eq!(alarms(&rig.sink), 0);
    assert_eq!(rig.hw.reads.len(), 1);
}
