//! Station configuration.
//!
//! Everything the controller needs to know about its deployment: identity,
//! cycle timing, network-failure policy, pin map, and credentials.  Built
//! once at boot (from compile-time `STATION_*` variables on the device, or
//! from JSON on the host) and passed by value into the service.

use core::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::pins;

/// `/devices/` prefix plus a maximal device id.
pub type DocumentPath = heapless::String<48>;
pub type DeviceId = heapless::String<32>;

const DOCUMENT_ROOT: &str = "/devices/";

/// Longest a WiFi reconnect may block: the driver's connect wait plus the
/// netif-up wait, 15 s each.
pub const WIFI_CONNECT_BOUND_MS: u32 = 30_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting was not supplied.  Carries the variable name.
    Missing(&'static str),
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Input could not be parsed at all.
    Corrupted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing setting {}", name),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Corrupted => write!(f, "config could not be parsed"),
        }
    }
}

impl core::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sub-structures
// ---------------------------------------------------------------------------

/// Bounded retry with exponential backoff, applied per network phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per phase, including the first.
    pub max_attempts: u8,
    pub initial_backoff_ms: u32,
    pub max_backoff_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

/// What to do with the actuators when a cycle's fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the last applied commands in place.
    #[default]
    HoldLast,
    /// Drive relay energized and LED off.
    SafeDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub relay: i32,
    pub led: i32,
    /// `ir1`..`ir6`.
    pub presence: [i32; 6],
    pub flame: i32,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            relay: pins::RELAY_GPIO,
            led: pins::LED_GPIO,
            presence: pins::PRESENCE_GPIOS,
            flame: pins::FLAME_GPIO,
        }
    }
}

impl PinMap {
    /// All seven input pins, presence sensors first.
    pub fn inputs(&self) -> [i32; 7] {
        let p = self.presence;
        [p[0], p[1], p[2], p[3], p[4], p[5], self.flame]
    }

    pub fn outputs(&self) -> [i32; 2] {
        [self.relay, self.led]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: heapless::Vec<i32, 9> = heapless::Vec::new();
        for pin in self.inputs().into_iter().chain(self.outputs()) {
            if !(0..=pins::MAX_GPIO).contains(&pin) {
                return Err(ConfigError::ValidationFailed("pin numbers must be 0-39"));
            }
            if seen.contains(&pin) {
                return Err(ConfigError::ValidationFailed("pins must be distinct"));
            }
            let _ = seen.push(pin);
        }
        if self
            .outputs()
            .iter()
            .any(|pin| pins::INPUT_ONLY_GPIOS.contains(pin))
        {
            return Err(ConfigError::ValidationFailed(
                "relay and LED cannot use input-only GPIO 34-39",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

/// Remote store endpoint and account used to open a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Database root, e.g. `https://station-net.firebasedatabase.app`.
    pub database_url: heapless::String<128>,
    pub api_key: heapless::String<64>,
    pub email: heapless::String<64>,
    pub password: heapless::String<64>,
}

// ---------------------------------------------------------------------------
// StationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub device_id: DeviceId,
    pub cycle_period_ms: u32,
    /// Upper bound for a single HTTP exchange.
    pub request_timeout_ms: u32,
    pub retry: RetryPolicy,
    pub fetch_failure: FailurePolicy,
    /// Minimum spacing between two flame alarms.
    pub flame_alarm_cooldown_secs: u32,
    pub pins: PinMap,
    pub wifi: WifiCredentials,
    pub remote: RemoteConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            device_id: bounded_or_empty("ESP32_04"),
            cycle_period_ms: 3_000,
            request_timeout_ms: 5_000,
            retry: RetryPolicy::default(),
            fetch_failure: FailurePolicy::HoldLast,
            flame_alarm_cooldown_secs: 60,
            pins: PinMap::default(),
            wifi: WifiCredentials::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl StationConfig {
    /// Build from the `STATION_*` variables captured at compile time.
    ///
    /// Identity and timing fall back to defaults; WiFi and remote-store
    /// credentials are required.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(id) = option_env!("STATION_DEVICE_ID") {
            cfg.device_id = bounded(id, "device_id must be 1-32 bytes")?;
        }
        if let Some(period) = option_env!("STATION_CYCLE_PERIOD_MS") {
            cfg.cycle_period_ms = period.trim().parse().map_err(|_| {
                ConfigError::ValidationFailed("STATION_CYCLE_PERIOD_MS must be an integer")
            })?;
        }

        cfg.wifi.ssid = bounded(
            required(option_env!("STATION_WIFI_SSID"), "STATION_WIFI_SSID")?,
            "wifi ssid must be at most 32 bytes",
        )?;
        cfg.wifi.password = bounded(
            option_env!("STATION_WIFI_PASSWORD").unwrap_or(""),
            "wifi password must be at most 64 bytes",
        )?;
        cfg.remote.database_url = bounded(
            required(option_env!("STATION_DATABASE_URL"), "STATION_DATABASE_URL")?,
            "database_url must be at most 128 bytes",
        )?;
        cfg.remote.api_key = bounded(
            required(option_env!("STATION_API_KEY"), "STATION_API_KEY")?,
            "api_key must be at most 64 bytes",
        )?;
        cfg.remote.email = bounded(
            required(option_env!("STATION_USER_EMAIL"), "STATION_USER_EMAIL")?,
            "email must be at most 64 bytes",
        )?;
        cfg.remote.password = bounded(
            required(option_env!("STATION_USER_PASSWORD"), "STATION_USER_PASSWORD")?,
            "account password must be at most 64 bytes",
        )?;

        cfg.validate()?;
        cfg.validate_credentials()?;
        Ok(cfg)
    }

    /// Parse and validate a JSON config.  Missing fields take defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Structural validation of every field that has a legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_device_id(&self.device_id)?;
        if !(500..=600_000).contains(&self.cycle_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "cycle_period_ms must be 500-600000",
            ));
        }
        if !(500..=30_000).contains(&self.request_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "request_timeout_ms must be 500-30000",
            ));
        }
        if !(1..=10).contains(&self.retry.max_attempts) {
            return Err(ConfigError::ValidationFailed(
                "retry.max_attempts must be 1-10",
            ));
        }
        if self.retry.max_backoff_ms > 30_000 {
            return Err(ConfigError::ValidationFailed(
                "retry.max_backoff_ms must be at most 30000",
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::ValidationFailed(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms",
            ));
        }
        self.pins.validate()?;
        if !self.remote.database_url.is_empty()
            && !self.remote.database_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationFailed(
                "database_url must start with https://",
            ));
        }
        Ok(())
    }

    /// Credentials the device cannot run without.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.wifi.ssid.is_empty() {
            return Err(ConfigError::Missing("wifi.ssid"));
        }
        if self.remote.database_url.is_empty() {
            return Err(ConfigError::Missing("remote.database_url"));
        }
        if self.remote.api_key.is_empty() {
            return Err(ConfigError::Missing("remote.api_key"));
        }
        if !self.remote.email.contains('@') {
            return Err(ConfigError::ValidationFailed("remote.email must be an address"));
        }
        if self.remote.password.is_empty() {
            return Err(ConfigError::Missing("remote.password"));
        }
        Ok(())
    }

    /// `/devices/{device_id}`.
    pub fn document_path(&self) -> DocumentPath {
        let mut path = DocumentPath::new();
        let _ = write!(path, "{}{}", DOCUMENT_ROOT, self.device_id);
        path
    }

    /// Worst case for one HTTP exchange.  The transport checks its deadline
    /// between socket operations, and each operation may itself block for
    /// the full request timeout, so an exchange can overrun by one timeout.
    pub fn exchange_bound_ms(&self) -> u32 {
        self.request_timeout_ms.saturating_mul(2)
    }

    /// Task watchdog timeout that a worst-case healthy cycle never reaches.
    ///
    /// Covers a blocking WiFi reconnect in `poll`, then two network phases
    /// with every attempt running to its exchange bound and sleeping the
    /// maximum backoff, one session refresh per phase, the cycle's own
    /// sleep, and a fixed margin.
    pub fn watchdog_timeout_ms(&self) -> u32 {
        let exchange = self.exchange_bound_ms();
        let per_attempt = exchange.saturating_add(self.retry.max_backoff_ms);
        let per_phase = per_attempt
            .saturating_mul(u32::from(self.retry.max_attempts))
            .saturating_add(exchange);
        per_phase
            .saturating_mul(2)
            .saturating_add(WIFI_CONNECT_BOUND_MS)
            .saturating_add(self.cycle_period_ms)
            .saturating_add(5_000)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// RTDB keys may not contain these.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

fn validate_device_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::ValidationFailed("device_id must be 1-32 bytes"));
    }
    if !id.bytes().all(|b| (0x21..=0x7E).contains(&b)) {
        return Err(ConfigError::ValidationFailed(
            "device_id must be printable ASCII without spaces",
        ));
    }
    if id.contains(FORBIDDEN_KEY_CHARS) {
        return Err(ConfigError::ValidationFailed(
            "device_id must not contain / . # $ [ ]",
        ));
    }
    Ok(())
}

fn required(value: Option<&'static str>, name: &'static str) -> Result<&'static str, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn bounded<const N: usize>(
    value: &str,
    msg: &'static str,
) -> Result<heapless::String<N>, ConfigError> {
    let mut out = heapless::String::new();
    out.push_str(value)
        .map_err(|_| ConfigError::ValidationFailed(msg))?;
    Ok(out)
}

fn bounded_or_empty<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = out.push_str(value);
    out
}
