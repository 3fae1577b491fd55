pub mod bme280;

pub use bme280::{Bme280, DeviceState, DriverError};

/// Trait for sensors that produce typed readings.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings;
    type Error;

    /// Run one measurement cycle.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, Self::Error>>;
}
