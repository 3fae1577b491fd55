//! Periodic sampling loop
//!
//! One task owns the sensor and ticks at a fixed interval. A failed cycle is
//! logged and forgotten; the publisher keeps serving the previous reading and
//! the next tick tries again.

use core::fmt::Display;

use embassy_time::{Duration, Ticker};
use log::{info, warn};

use crate::sensors::Sensor;

/// Run a single cycle and log its outcome.
pub async fn sample_once<S>(sensor: &mut S) -> Result<S::Readings, S::Error>
where
    S: Sensor,
    S::Readings: Display,
    S::Error: Display,
{
    let result = sensor.read().await;
    match &result {
        Ok(readings) => info!("{}", readings),
        Err(e) => warn!("Sensor read failed, keeping previous reading: {}", e),
    }
    result
}

/// Sample forever, once per `interval`.
///
/// Uses a [`Ticker`] so a slow cycle does not push every later cycle back.
pub async fn run<S>(sensor: &mut S, interval: Duration) -> !
where
    S: Sensor,
    S::Readings: Display,
    S::Error: Display,
{
    let mut ticker = Ticker::every(interval);
    loop {
        let _ = sample_once(sensor).await;
        ticker.next().await;
    }
}
