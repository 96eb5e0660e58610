//! Bosch compensation formulas: 64-bit fixed point for temperature, double precision
//! floating point for humidity. The shift amounts and constants are part of the
//! sensor's calibration scheme; keep the evaluation order as written.

use super::{Calibration, HumidityFormula};

/// Fine resolution temperature carried from the temperature formula into the humidity one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FineTemperature(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    pub fine: FineTemperature,
    /// Degrees Celsius in hundredths, e.g. 2508 is 25.08 C
    pub centi_celsius: i32,
}

impl Temperature {
    pub fn celsius(&self) -> f32 {
        self.centi_celsius as f32 / 100.0
    }

    /// Fahrenheit from the whole-degree part of the Celsius reading.
    ///
    /// The hundredths are dropped before scaling, so the result moves in 1.8 F steps.
    pub fn fahrenheit(&self) -> f32 {
        ((self.centi_celsius / 100) as f64 * 1.8 + 32.0) as f32
    }
}

/// Relative humidity in percent, within [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub f64);

impl Humidity {
    pub fn percent(&self) -> f64 {
        self.0
    }
}

/// One temperature + humidity reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub temperature: Temperature,
    pub humidity: Humidity,
}

/// Convert a 20-bit raw temperature code.
pub fn compensate_temperature(adc_t: u32, calibration: &Calibration) -> Temperature {
    let adc_t = i64::from(adc_t);
    let t1 = i64::from(calibration.t1);
    let t2 = i64::from(calibration.t2);
    let t3 = i64::from(calibration.t3);

    let var1 = (((adc_t >> 3) - (t1 << 1)) * t2) >> 11;
    let var2 = (((((adc_t >> 4) - t1) * ((adc_t >> 4) - t1)) >> 12) * t3) >> 14;
    let t_fine = var1 + var2;
    let centi_celsius = (t_fine * 5 + 128) >> 8;

    Temperature {
        fine: FineTemperature(t_fine as i32),
        centi_celsius: centi_celsius as i32,
    }
}

/// Convert a 16-bit raw humidity code, using the fine temperature of the same cycle.
pub fn compensate_humidity(
    adc_h: u16,
    fine: FineTemperature,
    calibration: &Calibration,
    formula: HumidityFormula,
) -> Humidity {
    let h1 = f64::from(calibration.h1);
    let h2 = f64::from(calibration.h2);
    let h3 = f64::from(calibration.h3);
    let h4 = f64::from(calibration.h4);
    let h5 = f64::from(calibration.h5);
    let h6 = f64::from(calibration.h6);

    let mut var_h = f64::from(fine.0) - 76800.0;
    var_h = (f64::from(adc_h) - (h4 * 64.0 + h5 / 16384.0 * var_h))
        * (h2 / 65536.0
            * (1.0 + h6 / 67108864.0 * var_h * (1.0 + h3 / formula.h3_divisor() * var_h)));
    var_h = var_h * (1.0 - h1 * var_h / 524288.0);

    Humidity(var_h.clamp(0.0, 100.0))
}
