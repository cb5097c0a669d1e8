/// Compile-time station settings read by `StationConfig::from_build_env()`.
const STATION_ENV: &[&str] = &[
    "STATION_DEVICE_ID",
    "STATION_CYCLE_PERIOD_MS",
    "STATION_WIFI_SSID",
    "STATION_WIFI_PASSWORD",
    "STATION_DATABASE_URL",
    "STATION_API_KEY",
    "STATION_USER_EMAIL",
    "STATION_USER_PASSWORD",
];

fn main() {
    for var in STATION_ENV {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
