//! BME280 humidity/temperature sensor over the register bus.
//!
//! ```text
//!   Sensor ──init()──► ReadySensor ──read_temperature()──► Temperature ─┐
//!   (chip id, calibration, oversampling)                                │ fine
//!                      ReadySensor ──read_humidity(fine)──► Humidity ◄──┘
//! ```
//!
//! A [`ReadySensor`] can only be obtained once the calibration coefficients are loaded,
//! and the humidity formula takes the fine temperature of the same cycle as an argument.

mod calibration;
mod compensation;
mod sensor;

pub use calibration::{pack_h4, pack_h5, Calibration};
pub use compensation::{
    compensate_humidity, compensate_temperature, FineTemperature, Humidity, Measurement,
    Temperature,
};
pub use sensor::{ReadySensor, Sensor};

/// Default address, SDO tied to GND
pub const BME280_ADDRESS: u8 = 0x76;
/// Address with SDO tied to VDDIO
pub const BME280_ADDRESS_SECONDARY: u8 = 0x77;
pub const BME280_CHIPID: u8 = 0x60;

pub const BME280_REGISTER_CHIPID: u8 = 0xD0;
pub const BME280_DIG_T1_REG: u8 = 0x88;
pub const BME280_DIG_T2_REG: u8 = 0x8A;
pub const BME280_DIG_T3_REG: u8 = 0x8C;
pub const BME280_DIG_H1_REG: u8 = 0xA1;
pub const BME280_DIG_H2_REG: u8 = 0xE1;
pub const BME280_DIG_H3_REG: u8 = 0xE3;
pub const BME280_DIG_H4_REG: u8 = 0xE4;
pub const BME280_DIG_H5_REG: u8 = 0xE5;
pub const BME280_DIG_H6_REG: u8 = 0xE7;
pub const BME280_REGISTER_CTRL_HUM: u8 = 0xF2;
pub const BME280_REGISTER_CTRL_MEAS: u8 = 0xF4;
pub const BME280_REGISTER_TEMPDATA: u8 = 0xFA;
pub const BME280_REGISTER_HUMIDDATA: u8 = 0xFD;

// humidity oversampling x1
const CTRL_HUM_DEFAULT: u8 = 0x01;
// temperature x1, pressure x1, normal mode
const CTRL_MEAS_DEFAULT: u8 = 0x27;

/// Which H3 divisor the humidity polynomial uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HumidityFormula {
    /// Bosch datasheet: both H6 and H3 terms are scaled by 67108864.0 (2^26)
    #[default]
    Datasheet,
    /// H3 term scaled by 67018864.0 instead of 2^26, for parity with readings logged
    /// before the datasheet constant was restored
    Legacy,
}

impl HumidityFormula {
    pub const fn h3_divisor(self) -> f64 {
        match self {
            HumidityFormula::Datasheet => 67108864.0,
            HumidityFormula::Legacy => 67018864.0,
        }
    }
}

/// Sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct Config {
    pub address: u8,
    /// Value written to `ctrl_hum` (0xF2)
    pub ctrl_hum: u8,
    /// Value written to `ctrl_meas` (0xF4)
    pub ctrl_meas: u8,
    /// Defaults to [`HumidityFormula::Datasheet`], which replaces the 67018864.0 H3
    /// divisor older firmware used; pick `Legacy` to keep its readings.
    pub humidity_formula: HumidityFormula,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: BME280_ADDRESS,
            ctrl_hum: CTRL_HUM_DEFAULT,
            ctrl_meas: CTRL_MEAS_DEFAULT,
            humidity_formula: HumidityFormula::default(),
        }
    }
}

/// Sensor errors, generic over the bus error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    Bus(E),
    /// The chip id register did not read back as a BME280
    UnsupportedChip(u8),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}
