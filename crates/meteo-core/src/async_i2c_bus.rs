//! Async I2C bus sharing and register access
//!
//! The weather station owns a single I2C bus shared between the sampling
//! task and anything else that may be wired to it later. The bus lives inside
//! an Embassy [`Mutex`]; a device handle ([`AsyncI2cDevice`]) locks it for an
//! entire [`BusSession`] so that multi-transaction sequences (device bring-up,
//! one read cycle) never interleave with another bus user.
//!
//! Every transaction is bounded by the configured timeout and HAL errors are
//! folded into the small [`BusError`] taxonomy. Nothing in here retries.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, with_timeout};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::i2c::I2c;
use thiserror_no_std::Error;

use crate::config::BusConfig;

/// The shared bus type. Create one per physical bus (usually in a `StaticCell`).
pub type SharedI2cBus<T> = Mutex<CriticalSectionRawMutex, T>;

/// Transport-level failures. Always propagated, never retried here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("I2C transaction timed out")]
    Timeout,
    #[error("I2C device did not acknowledge")]
    Nack,
    #[error("I2C bus fault")]
    BusFault,
}

impl BusError {
    /// Classify a HAL error.
    pub fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            _ => Self::BusFault,
        }
    }
}

/// Register-level access to a single device.
pub trait RegisterAccess {
    /// Write one byte to `register`.
    fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> impl Future<Output = Result<(), BusError>>;

    /// Burst-read `buf.len()` bytes starting at `register`.
    fn read_registers(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(), BusError>>;
}

/// A device at a fixed 7-bit address on a shared async I2C bus.
///
/// Cloning the handle is cheap; every clone contends for the same mutex.
///
/// # Example
///
/// ```ignore
/// use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
/// use embassy_sync::mutex::Mutex;
/// use static_cell::StaticCell;
///
/// static I2C_BUS: StaticCell<Mutex<CriticalSectionRawMutex, esp_hal::i2c::master::I2c<'static, esp_hal::Async>>> = StaticCell::new();
///
/// let i2c = /* ... create async I2C ... */;
/// let i2c_bus = I2C_BUS.init(Mutex::new(i2c));
///
/// let bme280 = AsyncI2cDevice::new(i2c_bus, 0x76, Duration::from_millis(1000));
/// ```
pub struct AsyncI2cDevice<'a, T> {
    bus: &'a SharedI2cBus<T>,
    address: u8,
    timeout: Duration,
}

impl<T> Clone for AsyncI2cDevice<'_, T> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus,
            address: self.address,
            timeout: self.timeout,
        }
    }
}

impl<'a, T> AsyncI2cDevice<'a, T> {
    /// Create a new `AsyncI2cDevice`.
    #[inline]
    pub const fn new(bus: &'a SharedI2cBus<T>, address: u8, timeout: Duration) -> Self {
        Self {
            bus,
            address,
            timeout,
        }
    }

    /// Create a device handle from the bootstrap bus configuration.
    pub const fn from_config(bus: &'a SharedI2cBus<T>, config: &BusConfig) -> Self {
        Self::new(bus, config.address, config.timeout())
    }

    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Lock the bus and hold it until the returned session is dropped.
    ///
    /// The lock is taken asynchronously, so waiting for another bus user
    /// yields to the executor instead of spinning.
    pub async fn session(&self) -> BusSession<'a, T> {
        let bus: &'a SharedI2cBus<T> = self.bus;
        BusSession {
            bus: bus.lock().await,
            address: self.address,
            timeout: self.timeout,
        }
    }
}

/// Exclusive ownership of the bus for a sequence of transactions.
pub struct BusSession<'a, T> {
    bus: MutexGuard<'a, CriticalSectionRawMutex, T>,
    address: u8,
    timeout: Duration,
}

impl<T: I2c> BusSession<'_, T> {
    async fn bounded<F, E>(timeout: Duration, transfer: F) -> Result<(), BusError>
    where
        F: Future<Output = Result<(), E>>,
        E: embedded_hal::i2c::Error,
    {
        match with_timeout(timeout, transfer).await {
            Ok(result) => result.map_err(|e| BusError::from_kind(e.kind())),
            Err(_) => Err(BusError::Timeout),
        }
    }
}

impl<T: I2c> RegisterAccess for BusSession<'_, T> {
    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        let address = self.address;
        let frame = [register, value];
        Self::bounded(self.timeout, self.bus.write(address, &frame)).await
    }

    async fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        let address = self.address;
        let pointer = [register];
        Self::bounded(self.timeout, self.bus.write_read(address, &pointer, buf)).await
    }
}
