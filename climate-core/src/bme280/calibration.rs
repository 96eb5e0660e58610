use super::{
    BME280_DIG_H1_REG, BME280_DIG_H2_REG, BME280_DIG_H3_REG, BME280_DIG_H4_REG,
    BME280_DIG_H5_REG, BME280_DIG_H6_REG, BME280_DIG_T1_REG, BME280_DIG_T2_REG,
    BME280_DIG_T3_REG,
};
use crate::twi::RegisterBus;

/// Factory trimming coefficients, read once from the sensor's NVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Calibration {
    /// Read the nine coefficients from the device at `address`.
    ///
    /// The temperature words and H2 are stored LSB first. H4 and H5 are 12-bit values
    /// sharing the nibbles of register 0xE5.
    pub fn load<B: RegisterBus>(bus: &mut B, address: u8) -> Result<Self, B::Error> {
        let t1 = bus.read16_reversed(address, BME280_DIG_T1_REG)?;
        let t2 = bus.read_signed16_reversed(address, BME280_DIG_T2_REG)?;
        let t3 = bus.read_signed16_reversed(address, BME280_DIG_T3_REG)?;
        let h1 = bus.read8(address, BME280_DIG_H1_REG)?;
        let h2 = bus.read_signed16_reversed(address, BME280_DIG_H2_REG)?;
        let h3 = bus.read8(address, BME280_DIG_H3_REG)?;
        let h4 = pack_h4(
            bus.read8(address, BME280_DIG_H4_REG)?,
            bus.read8(address, BME280_DIG_H4_REG + 1)?,
        );
        let h5 = pack_h5(
            bus.read8(address, BME280_DIG_H5_REG)?,
            bus.read8(address, BME280_DIG_H5_REG + 1)?,
        );
        let h6 = bus.read8(address, BME280_DIG_H6_REG)? as i8;

        Ok(Self {
            t1,
            t2,
            t3,
            h1,
            h2,
            h3,
            h4,
            h5,
            h6,
        })
    }
}

/// H4: bits 11..4 from 0xE4, bits 3..0 from the low nibble of 0xE5.
pub const fn pack_h4(e4: u8, e5: u8) -> i16 {
    ((e4 as i16) << 4) | (e5 & 0x0F) as i16
}

/// H5: bits 3..0 from the high nibble of 0xE5, bits 11..4 from 0xE6.
pub const fn pack_h5(e5: u8, e6: u8) -> i16 {
    ((e6 as i16) << 4) | (e5 >> 4) as i16
}
