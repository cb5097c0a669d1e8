//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                     |
//! |------------|--------------------|---------------------------------|
//! | `gpio`     | DigitalInputPort   | ESP32 GPIO (IR, flame inputs)   |
//! |            | DigitalOutputPort  | ESP32 GPIO (relay, LED)         |
//! | `rtdb`     | DocumentStore      | Firebase RTDB REST + sign-in    |
//! | `http`     | HttpTransport      | ESP-IDF HTTPS client            |
//! | `log_sink` | EventSink          | Serial log output               |
//! | `time`     | (monotonic clock)  | ESP32 system timer              |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA                |

pub mod gpio;
#[cfg(target_os = "espidf")]
pub mod http;
pub mod log_sink;
pub mod rtdb;
pub mod time;
pub(super) mod utils;
pub mod wifi;
