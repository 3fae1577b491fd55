//! Raw ADC counts to physical units
//!
//! Double-precision compensation as published in the BME280 datasheet
//! (section 8.1). The formulas are reproduced operation for operation:
//! reassociating any of the products or sums changes the last digits of the
//! result, so resist the urge to tidy them up.
//!
//! Temperature must be compensated first in every cycle. It yields [`TFine`],
//! which pressure and humidity compensation borrow. `TFine` can neither be
//! built nor copied outside this module, so a stale or invented value cannot
//! reach the later stages:
//!
//! ```compile_fail
//! use meteo_core::sensors::bme280::compensation::TFine;
//!
//! let t_fine = TFine(128_000);
//! ```

use crate::reading::CalibratedReading;

use super::calibration::CalibrationCoefficients;
use super::registers::DATA_LEN;

/// Uncompensated ADC output of one measurement burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// 20-bit.
    pub pressure: i32,
    /// 20-bit.
    pub temperature: i32,
    /// 16-bit.
    pub humidity: i32,
}

impl RawSample {
    /// Unpack the `0xF7..=0xFE` burst (P_MSB, P_LSB, P_XLSB, T_MSB, T_LSB,
    /// T_XLSB, H_MSB, H_LSB). Only the top nibble of each XLSB byte is data.
    pub fn from_bytes(data: &[u8; DATA_LEN]) -> Self {
        let twenty_bit = |msb: u8, lsb: u8, xlsb: u8| {
            ((msb as i32) << 12) | ((lsb as i32) << 4) | ((xlsb as i32) >> 4)
        };

        Self {
            pressure: twenty_bit(data[0], data[1], data[2]),
            temperature: twenty_bit(data[3], data[4], data[5]),
            humidity: ((data[6] as i32) << 8) | data[7] as i32,
        }
    }
}

/// Fine-resolution temperature carried from temperature compensation into
/// the pressure and humidity stages of the same cycle.
#[derive(Debug, PartialEq, Eq)]
pub struct TFine(i32);

impl TFine {
    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Returns degrees Celsius and the cycle's [`TFine`].
///
/// `t_fine` is the unrounded sum of both terms truncated to `i32`; the
/// later stages consume that truncated integer, not the float.
pub fn compensate_temperature(raw: i32, calib: &CalibrationCoefficients) -> (f64, TFine) {
    let adc_t = f64::from(raw);
    let dig_t1 = f64::from(calib.dig_t1);
    let dig_t2 = f64::from(calib.dig_t2);
    let dig_t3 = f64::from(calib.dig_t3);

    let var1 = (adc_t / 16384.0 - dig_t1 / 1024.0) * dig_t2;
    let var2 = ((adc_t / 131072.0 - dig_t1 / 8192.0) * (adc_t / 131072.0 - dig_t1 / 8192.0))
        * dig_t3;

    let fine = var1 + var2;
    (fine / 5120.0, TFine(fine as i32))
}

/// Returns hPa, or exactly `0.0` when the first-stage divisor vanishes
/// (which in practice means `dig_P1 == 0`).
pub fn compensate_pressure(raw: i32, calib: &CalibrationCoefficients, t_fine: &TFine) -> f64 {
    let dig_p1 = f64::from(calib.dig_p1);
    let dig_p2 = f64::from(calib.dig_p2);
    let dig_p3 = f64::from(calib.dig_p3);
    let dig_p4 = f64::from(calib.dig_p4);
    let dig_p5 = f64::from(calib.dig_p5);
    let dig_p6 = f64::from(calib.dig_p6);
    let dig_p7 = f64::from(calib.dig_p7);
    let dig_p8 = f64::from(calib.dig_p8);
    let dig_p9 = f64::from(calib.dig_p9);

    let mut var1 = f64::from(t_fine.0) / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * dig_p6 / 32768.0;
    var2 += var1 * dig_p5 * 2.0;
    var2 = var2 / 4.0 + dig_p4 * 65536.0;
    var1 = (dig_p3 * var1 * var1 / 524288.0 + dig_p2 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * dig_p1;

    if var1 == 0.0 {
        return 0.0;
    }

    let mut pressure = 1048576.0 - f64::from(raw);
    pressure = (pressure - var2 / 4096.0) * 6250.0 / var1;
    var1 = dig_p9 * pressure * pressure / 2147483648.0;
    var2 = pressure * dig_p8 / 32768.0;
    pressure += (var1 + var2 + dig_p7) / 16.0;

    pressure / 100.0
}

/// Returns %RH clipped to `[0, 100]`. Out-of-range values are clipped, not
/// reported.
pub fn compensate_humidity(raw: i32, calib: &CalibrationCoefficients, t_fine: &TFine) -> f64 {
    let adc_h = f64::from(raw);
    let dig_h1 = f64::from(calib.dig_h1);
    let dig_h2 = f64::from(calib.dig_h2);
    let dig_h3 = f64::from(calib.dig_h3);
    let dig_h4 = f64::from(calib.dig_h4);
    let dig_h5 = f64::from(calib.dig_h5);
    let dig_h6 = f64::from(calib.dig_h6);

    let mut var_h = f64::from(t_fine.0) - 76800.0;
    var_h = (adc_h - (dig_h4 * 64.0 + dig_h5 / 16384.0 * var_h))
        * (dig_h2 / 65536.0
            * (1.0 + dig_h6 / 67108864.0 * var_h * (1.0 + dig_h3 / 67108864.0 * var_h)));
    var_h *= 1.0 - dig_h1 * var_h / 524288.0;

    var_h.clamp(0.0, 100.0)
}

/// Run all three stages in their required order.
///
/// A degenerate pressure stage does not stop humidity: both only depend on
/// `t_fine`.
pub fn compensate(raw: &RawSample, calib: &CalibrationCoefficients) -> CalibratedReading {
    let (temperature, t_fine) = compensate_temperature(raw.temperature, calib);
    let pressure = compensate_pressure(raw.pressure, calib, &t_fine);
    let humidity = compensate_humidity(raw.humidity, calib, &t_fine);

    CalibratedReading {
        temperature,
        pressure,
        humidity,
    }
}
