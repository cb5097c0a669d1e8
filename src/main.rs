//! EV Station Controller — Main Entry Point
//!
//! Hexagonal architecture with a fixed-period reconciliation loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioAdapter        RtdbClient<EspHttpTransport>  LogEventSink │
//! │  (Input+Output)     (DocumentStore)               (EventSink)  │
//! │  WifiAdapter        Esp32TimeAdapter              Watchdog     │
//! │  (Connectivity)     (uptime)                      (TWDT)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          StationService (pure logic)                   │    │
//! │  │  fetch · reconcile · actuate · store · log · alarm     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  CycleScheduler (delegate-driven, fixed period)                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use evstation::adapters::gpio::GpioAdapter;
use evstation::adapters::http::EspHttpTransport;
use evstation::adapters::log_sink::LogEventSink;
use evstation::adapters::rtdb::RtdbClient;
use evstation::adapters::time::Esp32TimeAdapter;
use evstation::adapters::wifi::{ConnectivityPort, WifiAdapter};
use evstation::app::ports::CycleDelegate;
use evstation::app::service::StationService;
use evstation::config::StationConfig;
use evstation::drivers::hw_init;
use evstation::drivers::watchdog::Watchdog;
use evstation::error::Error;
use evstation::scheduler::CycleScheduler;

// ── Cycle delegate ────────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the adapters) to one
// service cycle against the real peripherals.

struct StationCycle {
    service: StationService,
    gpio: GpioAdapter,
    store: RtdbClient<EspHttpTransport>,
    wifi: WifiAdapter,
    sink: LogEventSink,
    clock: Esp32TimeAdapter,
    watchdog: Watchdog,
}

impl CycleDelegate for StationCycle {
    fn on_cycle(&mut self, _cycle: u64) {
        let now_ms = self.clock.uptime_ms();
        // A reconnect can block for WIFI_CONNECT_BOUND_MS.
        self.wifi.poll(now_ms);
        self.watchdog.feed();
        let _ = self.service.run_cycle(
            &mut self.gpio,
            &mut self.store,
            &mut FreeRtos,
            &mut self.sink,
            now_ms,
        );
        self.watchdog.feed();
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("EV Station Controller v{}", env!("CARGO_PKG_VERSION"));

    let config = StationConfig::from_build_env().map_err(Error::from)?;
    info!(
        "Config: device={} period={}ms timeout={}ms retry={}x fetch_failure={:?}",
        config.device_id,
        config.cycle_period_ms,
        config.request_timeout_ms,
        config.retry.max_attempts,
        config.fetch_failure,
    );

    // ── 2. Storage + GPIO ─────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()
        .map_err(|_| Error::Storage("default NVS partition unavailable"))?;

    hw_init::init_gpio(&config.pins).map_err(Error::from)?;
    let mut gpio = GpioAdapter::new();

    // ── 3. WiFi ───────────────────────────────────────────────
    let driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(driver);
    wifi.set_credentials(&config.wifi.ssid, &config.wifi.password)
        .map_err(|e| anyhow!("WiFi credentials: {e}"))?;
    if let Err(e) = wifi.connect() {
        warn!("WiFi: initial connect failed ({}), will retry each cycle", e);
    }

    // ── 4. Remote store session ───────────────────────────────
    let mut store = RtdbClient::new(
        EspHttpTransport::new(config.request_timeout_ms),
        &config.remote,
    );
    if let Err(e) = store.sign_in() {
        warn!("RTDB: sign-in failed ({}), will retry on first cycle", e);
    }

    // ── 5. Service ────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut service = StationService::new(config.clone());
    service.start(&mut gpio, &mut sink);

    let watchdog = Watchdog::new(config.watchdog_timeout_ms());
    let mut scheduler = CycleScheduler::new(config.cycle_period_ms);
    let mut cycle = StationCycle {
        service,
        gpio,
        store,
        wifi,
        sink,
        clock: Esp32TimeAdapter::new(),
        watchdog,
    };

    // ── 6. Cycle loop ─────────────────────────────────────────
    info!("System ready. Entering cycle loop.");
    scheduler.run(&mut cycle, &mut FreeRtos)
}
