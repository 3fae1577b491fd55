//! BME280 driver
//!
//! Brings the sensor from power-on to continuous sampling and runs the
//! per-cycle read/compensate/publish sequence.
//!
//! ```text
//! Uninitialized ─▶ Identified ─▶ Calibrated ─▶ Configured ─▶ Ready ⇄ Reading
//!       ▲               │             │             │
//!       └───────────────┴─────────────┴─────────────┘  (any bring-up failure)
//! ```
//!
//! Bring-up failures are fatal for this attempt: the driver falls back to
//! [`DeviceState::Uninitialized`] and the caller decides whether to retry.
//! Read-cycle failures are recoverable: the previously published reading is
//! left alone and the next cycle starts from [`DeviceState::Ready`] again.

pub mod calibration;
pub mod compensation;
pub mod registers;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, error, info};
use thiserror_no_std::Error;

use crate::async_i2c_bus::{AsyncI2cDevice, BusError, RegisterAccess};
use crate::reading::{CalibratedReading, ReadingPublisher};

use super::Sensor;
use calibration::CalibrationCoefficients;
use compensation::RawSample;
use registers::{
    CHIP_ID, DATA_LEN, REG_CHIP_ID, REG_CONFIG, REG_CTRL_HUM, REG_CTRL_MEAS, REG_DATA_START,
    REG_RESET, RESET_COMMAND, RESET_SETTLE_MS, Settings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Uninitialized,
    /// Chip ID matched.
    Identified,
    /// Soft reset done and coefficients loaded.
    Calibrated,
    /// Control registers written.
    Configured,
    /// Sampling continuously; read cycles allowed.
    Ready,
    /// A read cycle is in flight.
    Reading,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("Failed to read chip ID: {0}")]
    IdentificationReadFailed(BusError),
    #[error("Unexpected chip ID: 0x{0:02X}")]
    UnexpectedDevice(u8),
    #[error("Soft reset failed: {0}")]
    ResetFailed(BusError),
    #[error("Calibration read failed: {0}")]
    CalibrationReadFailed(BusError),
    #[error("Configuration write failed: {0}")]
    ConfigurationWriteFailed(BusError),
    #[error("Measurement read failed: {0}")]
    MeasurementReadFailed(BusError),
    #[error("Driver is not ready (state: {0:?})")]
    NotReady(DeviceState),
}

impl DriverError {
    /// Only per-cycle read failures leave the driver usable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MeasurementReadFailed(_))
    }
}

/// BME280 on a shared I2C bus.
///
/// The driver owns its calibration and lifecycle state; the publisher is
/// borrowed so the query side can read it without touching the driver.
pub struct Bme280<'a, I, D> {
    device: AsyncI2cDevice<'a, I>,
    delay: D,
    publisher: &'a ReadingPublisher,
    state: DeviceState,
    calibration: Option<CalibrationCoefficients>,
}

impl<'a, I, D> Bme280<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(device: AsyncI2cDevice<'a, I>, delay: D, publisher: &'a ReadingPublisher) -> Self {
        Self {
            device,
            delay,
            publisher,
            state: DeviceState::Uninitialized,
            calibration: None,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Coefficients from the last successful bring-up.
    pub fn calibration(&self) -> Option<&CalibrationCoefficients> {
        self.calibration.as_ref()
    }

    /// Identify, reset, calibrate and configure the sensor.
    ///
    /// May be called again to re-initialise; the old calibration is
    /// discarded first. The bus stays locked for the whole sequence.
    pub async fn init(&mut self) -> Result<(), DriverError> {
        self.state = DeviceState::Uninitialized;
        self.calibration = None;

        match self.bring_up().await {
            Ok(calibration) => {
                self.calibration = Some(calibration);
                self.transition(DeviceState::Ready);
                info!(
                    "BME280 ready at 0x{:02X} (ctrl_hum=0x{:02X} config=0x{:02X} ctrl_meas=0x{:02X})",
                    self.device.address(),
                    Settings::STATION.ctrl_hum(),
                    Settings::STATION.config(),
                    Settings::STATION.ctrl_meas()
                );
                Ok(())
            }
            Err(e) => {
                self.state = DeviceState::Uninitialized;
                error!("BME280 bring-up failed: {}", e);
                Err(e)
            }
        }
    }

    async fn bring_up(&mut self) -> Result<CalibrationCoefficients, DriverError> {
        let mut bus = self.device.session().await;

        let mut id = [0u8; 1];
        bus.read_registers(REG_CHIP_ID, &mut id)
            .await
            .map_err(DriverError::IdentificationReadFailed)?;
        if id[0] != CHIP_ID {
            return Err(DriverError::UnexpectedDevice(id[0]));
        }
        self.transition(DeviceState::Identified);

        bus.write_register(REG_RESET, RESET_COMMAND)
            .await
            .map_err(DriverError::ResetFailed)?;
        self.delay.delay_ms(RESET_SETTLE_MS).await;

        let calibration = CalibrationCoefficients::load(&mut bus).await?;
        debug!("BME280 calibration: {:?}", calibration);
        self.transition(DeviceState::Calibrated);

        // ctrl_hum is latched by the following ctrl_meas write, so it must go first.
        let settings = Settings::STATION;
        for (register, value) in [
            (REG_CTRL_HUM, settings.ctrl_hum()),
            (REG_CONFIG, settings.config()),
            (REG_CTRL_MEAS, settings.ctrl_meas()),
        ] {
            bus.write_register(register, value)
                .await
                .map_err(DriverError::ConfigurationWriteFailed)?;
        }
        self.transition(DeviceState::Configured);

        Ok(calibration)
    }

    /// Read one raw burst, compensate it and publish the result.
    ///
    /// On failure the published reading is left untouched and the driver
    /// stays [`DeviceState::Ready`].
    pub async fn read_cycle(&mut self) -> Result<CalibratedReading, DriverError> {
        // `Reading` is only seen here if a previous cycle's future was dropped mid-transfer.
        let calibration = match (self.state, self.calibration) {
            (DeviceState::Ready | DeviceState::Reading, Some(calibration)) => calibration,
            _ => return Err(DriverError::NotReady(self.state)),
        };

        let mut bus = self.device.session().await;
        self.state = DeviceState::Reading;

        let mut data = [0u8; DATA_LEN];
        let result = bus.read_registers(REG_DATA_START, &mut data).await;
        self.state = DeviceState::Ready;
        result.map_err(DriverError::MeasurementReadFailed)?;

        let raw = RawSample::from_bytes(&data);
        debug!("BME280 raw sample: {:?}", raw);

        let reading = compensation::compensate(&raw, &calibration);
        self.publisher.publish(reading);
        drop(bus);

        Ok(reading)
    }

    fn transition(&mut self, next: DeviceState) {
        debug!("BME280 state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<I, D> Sensor for Bme280<'_, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Readings = CalibratedReading;
    type Error = DriverError;

    async fn read(&mut self) -> Result<CalibratedReading, DriverError> {
        self.read_cycle().await
    }
}
