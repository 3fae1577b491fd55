//! Factory calibration coefficients
//!
//! The BME280 stores 18 trimming parameters in two non-contiguous NVM
//! windows. Most are little-endian 16-bit pairs; `dig_H4` and `dig_H5` are
//! 12-bit values that share the nibbles of `0xE5`:
//!
//! ```text
//! 0xE4          0xE5             0xE6
//! H4[11:4]      H5[3:0]|H4[3:0]  H5[11:4]
//! ```
//!
//! A wrong shift here does not fail loudly, it just skews every humidity
//! reading, so the packing is tested in both directions.

use crate::async_i2c_bus::RegisterAccess;

use super::DriverError;
use super::registers::{
    CALIB_BLOCK_1_LEN, CALIB_BLOCK_2_LEN, REG_CALIB_BLOCK_1, REG_CALIB_BLOCK_2,
};

/// Index of the reserved register `0xA0` inside block 1.
const RESERVED_INDEX: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationCoefficients {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,

    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,

    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    /// Unsigned 12-bit quantity.
    pub dig_h4: i16,
    /// Unsigned 12-bit quantity.
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibrationCoefficients {
    /// Read both calibration windows from the device.
    ///
    /// Must run after the post-reset settle delay, otherwise the NVM copy may
    /// still be in progress and the values are garbage.
    pub async fn load<B: RegisterAccess>(bus: &mut B) -> Result<Self, DriverError> {
        let mut block1 = [0u8; CALIB_BLOCK_1_LEN];
        bus.read_registers(REG_CALIB_BLOCK_1, &mut block1)
            .await
            .map_err(DriverError::CalibrationReadFailed)?;

        let mut block2 = [0u8; CALIB_BLOCK_2_LEN];
        bus.read_registers(REG_CALIB_BLOCK_2, &mut block2)
            .await
            .map_err(DriverError::CalibrationReadFailed)?;

        Ok(Self::from_blocks(&block1, &block2))
    }

    /// Decode the raw `0x88..=0xA1` and `0xE1..=0xE7` windows.
    pub fn from_blocks(
        block1: &[u8; CALIB_BLOCK_1_LEN],
        block2: &[u8; CALIB_BLOCK_2_LEN],
    ) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([block1[i], block1[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([block1[i], block1[i + 1]]);

        Self {
            dig_t1: u16_at(0),
            dig_t2: i16_at(2),
            dig_t3: i16_at(4),

            dig_p1: u16_at(6),
            dig_p2: i16_at(8),
            dig_p3: i16_at(10),
            dig_p4: i16_at(12),
            dig_p5: i16_at(14),
            dig_p6: i16_at(16),
            dig_p7: i16_at(18),
            dig_p8: i16_at(20),
            dig_p9: i16_at(22),

            dig_h1: block1[25],
            dig_h2: i16::from_le_bytes([block2[0], block2[1]]),
            dig_h3: block2[2],
            dig_h4: ((block2[3] as i16) << 4) | (block2[4] & 0x0F) as i16,
            dig_h5: ((block2[5] as i16) << 4) | (block2[4] >> 4) as i16,
            dig_h6: block2[6] as i8,
        }
    }

    /// Encode back into the two register windows.
    ///
    /// The reserved register at `0xA0` carries no coefficient and comes back
    /// as zero.
    pub fn to_blocks(&self) -> ([u8; CALIB_BLOCK_1_LEN], [u8; CALIB_BLOCK_2_LEN]) {
        let mut block1 = [0u8; CALIB_BLOCK_1_LEN];
        let words = [
            self.dig_t1.to_le_bytes(),
            self.dig_t2.to_le_bytes(),
            self.dig_t3.to_le_bytes(),
            self.dig_p1.to_le_bytes(),
            self.dig_p2.to_le_bytes(),
            self.dig_p3.to_le_bytes(),
            self.dig_p4.to_le_bytes(),
            self.dig_p5.to_le_bytes(),
            self.dig_p6.to_le_bytes(),
            self.dig_p7.to_le_bytes(),
            self.dig_p8.to_le_bytes(),
            self.dig_p9.to_le_bytes(),
        ];
        for (chunk, word) in block1.chunks_exact_mut(2).zip(words.iter()) {
            chunk.copy_from_slice(word);
        }
        block1[RESERVED_INDEX] = 0;
        block1[25] = self.dig_h1;

        let h2 = self.dig_h2.to_le_bytes();
        let block2 = [
            h2[0],
            h2[1],
            self.dig_h3,
            (self.dig_h4 >> 4) as u8,
            ((self.dig_h5 as u8 & 0x0F) << 4) | (self.dig_h4 as u8 & 0x0F),
            (self.dig_h5 >> 4) as u8,
            self.dig_h6 as u8,
        ];

        (block1, block2)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Block 1 of the reference part used across the test suite.
    pub(crate) const REFERENCE_BLOCK_1: [u8; CALIB_BLOCK_1_LEN] = [
        0x6E, 0x6E, 0x6D, 0xA6, 0x32, 0x0C, // T1..T3
        0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, // P1..P3
        0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, // P4..P6
        0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, // P7..P9
        0x00, 0x4B, // reserved, H1
    ];

    pub(crate) const REFERENCE_BLOCK_2: [u8; CALIB_BLOCK_2_LEN] =
        [0x6A, 0x01, 0x00, 0x14, 0x25, 0x03, 0x1E];

    pub(crate) fn reference() -> CalibrationCoefficients {
        CalibrationCoefficients::from_blocks(&REFERENCE_BLOCK_1, &REFERENCE_BLOCK_2)
    }

    #[test]
    fn test_decodes_reference_part() {
        let calib = reference();

        assert_eq!(calib.dig_t1, 28270);
        assert_eq!(calib.dig_t2, -22931);
        assert_eq!(calib.dig_t3, 3122);

        assert_eq!(calib.dig_p1, 36477);
        assert_eq!(calib.dig_p2, -10685);
        assert_eq!(calib.dig_p3, 3024);
        assert_eq!(calib.dig_p4, 2855);
        assert_eq!(calib.dig_p5, 140);
        assert_eq!(calib.dig_p6, -7);
        assert_eq!(calib.dig_p7, 15500);
        assert_eq!(calib.dig_p8, -14600);
        assert_eq!(calib.dig_p9, 6000);

        assert_eq!(calib.dig_h1, 75);
        assert_eq!(calib.dig_h2, 362);
        assert_eq!(calib.dig_h3, 0);
        assert_eq!(calib.dig_h4, 325);
        assert_eq!(calib.dig_h5, 50);
        assert_eq!(calib.dig_h6, 30);
    }

    #[test]
    fn test_humidity_nibbles_are_not_swapped() {
        // H4 takes the low nibble of 0xE5, H5 the high one.
        let block2 = [0x00, 0x00, 0x00, 0xAB, 0xCD, 0xEF, 0x00];
        let calib = CalibrationCoefficients::from_blocks(&[0; CALIB_BLOCK_1_LEN], &block2);

        assert_eq!(calib.dig_h4, 0xABD);
        assert_eq!(calib.dig_h5, 0xEFC);
    }

    #[test]
    fn test_packed_humidity_fields_do_not_sign_extend() {
        let block2 = [0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let calib = CalibrationCoefficients::from_blocks(&[0; CALIB_BLOCK_1_LEN], &block2);

        assert_eq!(calib.dig_h4, 4095);
        assert_eq!(calib.dig_h5, 4095);
        assert_eq!(calib.dig_h6, -1);
    }

    #[test]
    fn test_reference_part_reencodes_exactly() {
        let (block1, block2) = reference().to_blocks();

        assert_eq!(block1, REFERENCE_BLOCK_1);
        assert_eq!(block2, REFERENCE_BLOCK_2);
    }
}
