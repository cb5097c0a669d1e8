//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching real GPIO registers or the network.

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use evstation::app::document::Document;
use evstation::app::events::AppEvent;
use evstation::app::ports::{DigitalInputPort, DigitalOutputPort, DocumentStore, EventSink};
use evstation::error::RemoteError;
use evstation::pins::{self, SENSOR_POLARITY};

// ── MockHardware ──────────────────────────────────────────────

/// Simulated board: inputs idle HIGH (pulled up) unless overridden,
/// outputs recorded in call order.
pub struct MockHardware {
    inputs: HashMap<i32, PinState>,
    pub reads: Vec<i32>,
    pub writes: Vec<(i32, PinState)>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            inputs: HashMap::new(),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    pub fn set_input(&mut self, pin: i32, level: PinState) {
        self.inputs.insert(pin, level);
    }

    /// `bay` is 1-based, matching `ir1`..`ir6`.
    pub fn set_presence(&mut self, bay: usize, detected: bool) {
        self.set_input(pins::PRESENCE_GPIOS[bay - 1], SENSOR_POLARITY.level(detected));
    }

    pub fn set_flame(&mut self, detected: bool) {
        self.set_input(pins::FLAME_GPIO, SENSOR_POLARITY.level(detected));
    }

    /// Level most recently written to `pin`.
    pub fn level(&self, pin: i32) -> Option<PinState> {
        self.writes
            .iter()
            .rev()
            .find_map(|&(p, level)| (p == pin).then_some(level))
    }

    pub fn relay(&self) -> Option<PinState> {
        self.level(pins::RELAY_GPIO)
    }

    pub fn led(&self) -> Option<PinState> {
        self.level(pins::LED_GPIO)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalInputPort for MockHardware {
    fn read(&mut self, pin: i32) -> PinState {
        self.reads.push(pin);
        self.inputs.get(&pin).copied().unwrap_or(PinState::High)
    }
}

impl DigitalOutputPort for MockHardware {
    fn set(&mut self, pin: i32, level: PinState) {
        self.writes.push((pin, level));
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// In-memory remote store.  Scripted results are consumed first; once a
/// script runs dry the call succeeds against `remote`.  A successful
/// `store` replaces `remote` wholesale, like the real backend.
pub struct MockStore {
    pub remote: Document,
    pub fetch_script: VecDeque<Result<Document, RemoteError>>,
    pub store_script: VecDeque<RemoteError>,
    pub refresh_result: Result<(), RemoteError>,
    pub fetches: u32,
    pub stores: Vec<(String, Document)>,
    pub refreshes: u32,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new(remote: Document) -> Self {
        Self {
            remote,
            fetch_script: VecDeque::new(),
            store_script: VecDeque::new(),
            refresh_result: Ok(()),
            fetches: 0,
            stores: Vec::new(),
            refreshes: 0,
        }
    }

    pub fn fail_fetch(&mut self, error: RemoteError, times: usize) {
        for _ in 0..times {
            self.fetch_script.push_back(Err(error));
        }
    }

    pub fn fail_store(&mut self, error: RemoteError, times: usize) {
        for _ in 0..times {
            self.store_script.push_back(error);
        }
    }

    pub fn last_stored(&self) -> Option<&Document> {
        self.stores.last().map(|(_, doc)| doc)
    }
}

impl DocumentStore for MockStore {
    fn fetch(&mut self, _path: &str) -> Result<Document, RemoteError> {
        self.fetches += 1;
        self.fetch_script
            .pop_front()
            .unwrap_or_else(|| Ok(self.remote.clone()))
    }

    fn store(&mut self, path: &str, doc: &Document) -> Result<(), RemoteError> {
        if let Some(e) = self.store_script.pop_front() {
            return Err(e);
        }
        self.stores.push((path.to_string(), doc.clone()));
        self.remote = doc.clone();
        Ok(())
    }

    fn refresh_session(&mut self) -> Result<(), RemoteError> {
        self.refreshes += 1;
        self.refresh_result
    }
}

// ── MockDelay ─────────────────────────────────────────────────

/// Records requested sleeps instead of sleeping.
#[derive(Default)]
pub struct MockDelay {
    pub sleeps_ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleeps_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps_ms.push(ms);
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
