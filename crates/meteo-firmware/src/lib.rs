//! ESP32 firmware-specific modules for meteo-rs
//!
//! This crate contains the hardware-specific glue that cannot compile on
//! desktop targets: I2C peripheral setup, the WiFi station link and the
//! TCP side of the HTTP server. Everything else lives in `meteo_core`.

#![no_std]

extern crate alloc;

pub mod hardware;
pub mod http_server;
pub mod wifi;

/// Credentials baked in by `build.rs`.
pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
