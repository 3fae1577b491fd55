//! Bakes the WiFi credentials into the firmware image.
//!
//! Values come from the process environment or a `.env` file found by
//! walking up from the crate directory. Missing values build as empty
//! strings; the station then logs the failed join and keeps retrying.

const CREDENTIALS: [&str; 2] = ["WIFI_SSID", "WIFI_PASSWORD"];

fn main() {
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    for key in CREDENTIALS {
        println!("cargo:rerun-if-env-changed={key}");
        let value = std::env::var(key).unwrap_or_else(|_| {
            println!("cargo:warning={key} is not set; the station will not join a network");
            String::new()
        });
        println!("cargo:rustc-env={key}={value}");
    }
}
