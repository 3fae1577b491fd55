//! Peripheral setup for the sensor bus
//!
//! SDA is GPIO21 and SCL is GPIO22, the ESP32 DevKit defaults. The bus is
//! leaked into a `'static` mutex so every task can build an
//! [`AsyncI2cDevice`] on it.

use esp_hal::Async;
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::i2c::master::{Config as I2cConfig, ConfigError, I2c, Instance};
use esp_hal::time::Rate;
use log::info;
use meteo_core::async_i2c_bus::{AsyncI2cDevice, SharedI2cBus};
use meteo_core::config::BusConfig;
use static_cell::StaticCell;
use thiserror_no_std::Error;

pub type SensorBus = I2c<'static, Async>;

static I2C_BUS: StaticCell<SharedI2cBus<SensorBus>> = StaticCell::new();

#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("I2C configuration rejected: {0:?}")]
    I2cConfig(ConfigError),
}

/// Configure the I2C controller at the configured clock and share it.
///
/// May only be called once; a second call panics in [`StaticCell::init`].
pub fn init_sensor_bus(
    i2c: impl Instance + 'static,
    sda: impl PeripheralOutput<'static>,
    scl: impl PeripheralOutput<'static>,
    config: &BusConfig,
) -> Result<&'static SharedI2cBus<SensorBus>, HardwareError> {
    let i2c_config =
        I2cConfig::default().with_frequency(Rate::from_hz(config.frequency_hz));
    let i2c = I2c::new(i2c, i2c_config)
        .map_err(HardwareError::I2cConfig)?
        .with_sda(sda)
        .with_scl(scl)
        .into_async();

    info!("I2C bus up at {} Hz", config.frequency_hz);
    Ok(I2C_BUS.init(SharedI2cBus::new(i2c)))
}

pub fn sensor_device(
    bus: &'static SharedI2cBus<SensorBus>,
    config: &BusConfig,
) -> AsyncI2cDevice<'static, SensorBus> {
    AsyncI2cDevice::from_config(bus, config)
}
