//! Register-map mock of a BME280 and helpers shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use embassy_sync::mutex::Mutex;
use embassy_time::Duration;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use meteo_core::async_i2c_bus::{AsyncI2cDevice, SharedI2cBus};

pub const ADDRESS: u8 = 0x76;

pub const CALIB_BLOCK_1: [u8; 26] = [
    0x6E, 0x6E, 0x6D, 0xA6, 0x32, 0x0C, // T1..T3
    0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, // P1..P3
    0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, // P4..P6
    0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, // P7..P9
    0x00, 0x4B, // reserved, H1
];

pub const CALIB_BLOCK_2: [u8; 7] = [0x6A, 0x01, 0x00, 0x14, 0x25, 0x03, 0x1E];

/// adc_P = 415148, adc_T = 361926, adc_H = 30000.
pub const DATA_25C: [u8; 8] = [0x65, 0x5A, 0xC0, 0x58, 0x5C, 0x60, 0x75, 0x30];

/// adc_P = 415148, adc_T = 380000, adc_H = 26000.
pub const DATA_OTHER: [u8; 8] = [0x65, 0x5A, 0xC0, 0x5C, 0xC6, 0x00, 0x65, 0x90];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    Error(ErrorKind),
    /// Never completes; only the transport timeout gets the caller out.
    Hang,
}

#[derive(Debug)]
pub struct MockError(pub ErrorKind);

impl embedded_hal::i2c::Error for MockError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// 256-byte register file with an auto-incrementing pointer.
pub struct MockI2c {
    pub address: u8,
    pub registers: [u8; 256],
    /// Every register write in bus order.
    pub writes: Vec<(u8, u8)>,
    faults: Vec<(u8, Fault)>,
}

impl MockI2c {
    pub fn bme280() -> Self {
        let mut registers = [0u8; 256];
        registers[0xD0] = 0x60;
        registers[0x88..0x88 + 26].copy_from_slice(&CALIB_BLOCK_1);
        registers[0xE1..0xE1 + 7].copy_from_slice(&CALIB_BLOCK_2);
        registers[0xF7..0xF7 + 8].copy_from_slice(&DATA_25C);

        Self {
            address: ADDRESS,
            registers,
            writes: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn set_data(&mut self, data: [u8; 8]) {
        self.registers[0xF7..0xF7 + 8].copy_from_slice(&data);
    }

    /// Fail every transaction that addresses `register` until cleared.
    pub fn fail_on(&mut self, register: u8, fault: Fault) {
        self.faults.push((register, fault));
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    fn fault_for(&self, register: u8) -> Option<Fault> {
        self.faults
            .iter()
            .find(|(r, _)| *r == register)
            .map(|(_, f)| *f)
    }
}

impl ErrorType for MockI2c {
    type Error = MockError;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(MockError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }

        let mut pointer = 0u8;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&register, payload)) = bytes.split_first() else {
                        continue;
                    };
                    match self.fault_for(register) {
                        Some(Fault::Error(kind)) => return Err(MockError(kind)),
                        Some(Fault::Hang) => core::future::pending::<()>().await,
                        None => {}
                    }
                    pointer = register;
                    for &value in payload.iter() {
                        self.registers[pointer as usize] = value;
                        self.writes.push((pointer, value));
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.registers[pointer as usize];
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    total_ns: Rc<Cell<u64>>,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

pub fn shared_bus(mock: MockI2c) -> SharedI2cBus<MockI2c> {
    Mutex::new(mock)
}

pub fn device(bus: &SharedI2cBus<MockI2c>, timeout_ms: u64) -> AsyncI2cDevice<'_, MockI2c> {
    AsyncI2cDevice::new(bus, ADDRESS, Duration::from_millis(timeout_ms))
}

/// Run `f` against the mock while no session holds the bus.
pub fn with_mock<R>(bus: &SharedI2cBus<MockI2c>, f: impl FnOnce(&mut MockI2c) -> R) -> R {
    let mut guard = bus.try_lock().ok().expect("bus is held by a session");
    f(&mut guard)
}
