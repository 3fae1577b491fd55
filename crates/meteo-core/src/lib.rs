//! Hardware-independent core library for meteo-rs
//!
//! This crate contains all platform-agnostic logic for the weather station:
//! the BME280 driver and its compensation engine, the shared-bus transport,
//! the publisher holding the latest reading, the sampling loop and the HTTP
//! query surface.
//!
//! It is `#![no_std]` so it compiles on both the ESP32 target and desktop
//! hosts (for tests).

#![no_std]

pub mod async_i2c_bus;
pub mod config;
pub mod http;
pub mod reading;
pub mod sampling;
pub mod sensors;
