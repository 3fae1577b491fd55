//! Bootstrap configuration
//!
//! Handed to the core once at startup and never mutated afterwards. Pin
//! assignment is not part of this: the firmware selects the SDA/SCL pins as
//! typed peripherals when it builds the bus.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::sensors::bme280::registers::PRIMARY_ADDRESS;

pub const DEFAULT_BUS_FREQUENCY_HZ: u32 = 100_000;
pub const DEFAULT_BUS_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 2_000;

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub bus: BusConfig,
    pub sampling: SamplingConfig,
    pub internet: InternetConfig<'a>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// 7-bit sensor address (0x76 with SDO low, 0x77 with SDO high).
    pub address: u8,
    pub frequency_hz: u32,
    /// Upper bound for a single bus transaction.
    pub timeout_ms: u64,
}

impl BusConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: PRIMARY_ADDRESS,
            frequency_hz: DEFAULT_BUS_FREQUENCY_HZ,
            timeout_ms: DEFAULT_BUS_TIMEOUT_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    pub interval_ms: u64,
}

impl SamplingConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_station_wiring() {
        let config = Config::default();

        assert_eq!(config.bus.address, 0x76);
        assert_eq!(config.bus.frequency_hz, 100_000);
        assert_eq!(config.bus.timeout(), Duration::from_millis(1000));
        assert_eq!(config.sampling.interval(), Duration::from_secs(2));
        assert!(config.internet.ssid.is_empty());
    }
}
