use meteo_core::sensors::bme280::calibration::CalibrationCoefficients;
use meteo_core::sensors::bme280::compensation::{
    compensate_humidity, compensate_pressure, compensate_temperature,
};
use proptest::prelude::*;

/// Any 20-bit temperature count.
fn raw_twenty_bit() -> impl Strategy<Value = i32> {
    0i32..(1 << 20)
}

fn calibration() -> impl Strategy<Value = CalibrationCoefficients> {
    (any::<[u8; 26]>(), any::<[u8; 7]>())
        .prop_map(|(block1, block2)| CalibrationCoefficients::from_blocks(&block1, &block2))
}

proptest! {
    #[test]
    fn calibration_blocks_reencode_exactly(mut block1 in any::<[u8; 26]>(), block2 in any::<[u8; 7]>()) {
        // 0xA0 is reserved and holds no coefficient.
        block1[24] = 0;

        let calib = CalibrationCoefficients::from_blocks(&block1, &block2);
        let (encoded1, encoded2) = calib.to_blocks();

        prop_assert_eq!(encoded1, block1);
        prop_assert_eq!(encoded2, block2);
    }

    #[test]
    fn humidity_stays_within_percent_range(
        calib in calibration(),
        raw_t in raw_twenty_bit(),
        raw_h in 0i32..=65535,
    ) {
        let (_, t_fine) = compensate_temperature(raw_t, &calib);
        let rh = compensate_humidity(raw_h, &calib, &t_fine);

        prop_assert!((0.0..=100.0).contains(&rh), "humidity {} out of range", rh);
    }

    #[test]
    fn zero_dig_p1_never_divides(
        calib in calibration(),
        raw_t in raw_twenty_bit(),
        raw_p in raw_twenty_bit(),
    ) {
        let calib = CalibrationCoefficients { dig_p1: 0, ..calib };
        let (_, t_fine) = compensate_temperature(raw_t, &calib);

        prop_assert_eq!(compensate_pressure(raw_p, &calib, &t_fine), 0.0);
    }
}
