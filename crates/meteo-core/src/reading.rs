//! Latest calibrated reading and its publisher
//!
//! The sampling task is the only writer; HTTP handlers read concurrently.
//! A reading is three `f64`s, far too wide for a single atomic, so the
//! publisher keeps it in a [`Cell`] behind a critical-section mutex and copies
//! the whole value in or out inside one short critical section. A reader can
//! therefore never see temperature from one cycle next to humidity from
//! another.

use core::cell::Cell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

/// Compensated measurement in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CalibratedReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Hectopascal.
    pub pressure: f64,
    /// Relative humidity in percent, `0.0..=100.0`.
    pub humidity: f64,
}

impl CalibratedReading {
    /// Published before the first successful cycle.
    pub const ZERO: Self = Self {
        temperature: 0.0,
        pressure: 0.0,
        humidity: 0.0,
    };
}

impl fmt::Display for CalibratedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature: {:.2} °C | Pressure: {:.2} hPa | Humidity: {:.2} %",
            self.temperature, self.pressure, self.humidity
        )
    }
}

/// A reading together with the number of publishes that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub reading: CalibratedReading,
    /// 0 until the first publish, then incremented on every publish. Sticks
    /// at `u32::MAX` instead of wrapping back to the sentinel.
    pub sequence: u32,
}

impl Snapshot {
    const INITIAL: Self = Self {
        reading: CalibratedReading::ZERO,
        sequence: 0,
    };
}

/// Single-writer, multi-reader holder for the latest [`CalibratedReading`].
///
/// `const`-constructible so it can live in a `static`:
///
/// ```
/// use meteo_core::reading::{CalibratedReading, ReadingPublisher};
///
/// static LATEST: ReadingPublisher = ReadingPublisher::new();
///
/// assert_eq!(LATEST.get_latest_reading(), CalibratedReading::ZERO);
/// ```
pub struct ReadingPublisher {
    latest: Mutex<CriticalSectionRawMutex, Cell<Snapshot>>,
}

impl Default for ReadingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingPublisher {
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(Cell::new(Snapshot::INITIAL)),
        }
    }

    /// Replace the stored reading as a whole.
    pub fn publish(&self, reading: CalibratedReading) {
        self.latest.lock(|cell| {
            let previous = cell.get();
            cell.set(Snapshot {
                reading,
                sequence: previous.sequence.saturating_add(1),
            });
        });
    }

    /// The last published reading, or [`CalibratedReading::ZERO`].
    ///
    /// Never waits on the bus and never fails.
    pub fn get_latest_reading(&self) -> CalibratedReading {
        self.snapshot().reading
    }

    pub fn snapshot(&self) -> Snapshot {
        self.latest.lock(Cell::get)
    }

    /// Tells a stale-but-real zero reading apart from the start-up sentinel.
    pub fn has_published(&self) -> bool {
        self.snapshot().sequence != 0
    }
}
