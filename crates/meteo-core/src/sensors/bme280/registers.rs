//! BME280 register map and the fixed sampling settings used by the station.

/// Address with SDO tied low.
pub const PRIMARY_ADDRESS: u8 = 0x76;
/// Address with SDO tied high.
pub const SECONDARY_ADDRESS: u8 = 0x77;

pub const REG_CHIP_ID: u8 = 0xD0;
pub const REG_RESET: u8 = 0xE0;
pub const REG_CTRL_HUM: u8 = 0xF2;
pub const REG_STATUS: u8 = 0xF3;
pub const REG_CTRL_MEAS: u8 = 0xF4;
pub const REG_CONFIG: u8 = 0xF5;
/// First byte of the P_MSB..H_LSB burst.
pub const REG_DATA_START: u8 = 0xF7;
/// `dig_T1` .. `dig_H1`.
pub const REG_CALIB_BLOCK_1: u8 = 0x88;
/// `dig_H2` .. `dig_H6`.
pub const REG_CALIB_BLOCK_2: u8 = 0xE1;

pub const CALIB_BLOCK_1_LEN: usize = 26;
pub const CALIB_BLOCK_2_LEN: usize = 7;
pub const DATA_LEN: usize = 8;

/// Value reported by [`REG_CHIP_ID`] on a BME280.
pub const CHIP_ID: u8 = 0x60;
/// Writing this to [`REG_RESET`] triggers a power-on-reset sequence.
pub const RESET_COMMAND: u8 = 0xB6;
/// The NVM copy after a soft reset must finish before calibration is read.
pub const RESET_SETTLE_MS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Sleep = 0b00,
    Forced = 0b01,
    Normal = 0b11,
}

/// Inactive duration between conversions in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    /// 0b100 through 0b111 all select 16; the station has always written 0b101.
    X16 = 0b101,
}

/// Control-register contents written during bring-up.
///
/// These are fixed for the station, not user-tunable. `ctrl_hum` only takes
/// effect once `ctrl_meas` is written afterwards, which the driver relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub humidity: Oversampling,
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub mode: Mode,
    pub standby: Standby,
    pub filter: Filter,
}

impl Settings {
    /// Continuous sampling, 1x oversampling everywhere, 0.5 ms standby, filter 16.
    pub const STATION: Self = Self {
        humidity: Oversampling::X1,
        temperature: Oversampling::X1,
        pressure: Oversampling::X1,
        mode: Mode::Normal,
        standby: Standby::Ms0_5,
        filter: Filter::X16,
    };

    pub const fn ctrl_hum(&self) -> u8 {
        self.humidity as u8
    }

    pub const fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }

    pub const fn ctrl_meas(&self) -> u8 {
        ((self.temperature as u8) << 5) | ((self.pressure as u8) << 2) | self.mode as u8
    }
}
