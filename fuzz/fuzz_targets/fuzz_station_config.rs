//! Fuzz target: `StationConfig::from_json`
//!
//! Arbitrary bytes must either be rejected or yield a config whose derived
//! values are usable: a document path under `/devices/` and a watchdog
//! timeout longer than one cycle period.
//!
//! cargo fuzz run fuzz_station_config

#![no_main]

use evstation::config::StationConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = StationConfig::from_json(data) {
        assert!(cfg.validate().is_ok());
        assert!(cfg.document_path().starts_with("/devices/"));
        assert!(cfg.watchdog_timeout_ms() > cfg.cycle_period_ms);
    }
});
