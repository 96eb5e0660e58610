//! Text shown on the display and mirrored to the serial consoles.

use core::fmt::{self, Write};

use crate::bme280::Measurement;
use crate::readout::Readout;

/// Width of every value field
pub const FIELD_WIDTH: usize = 5;

/// Column where the values start on the display
pub const VALUE_COLUMN: u8 = 35;

/// Static labels drawn once: `(column, page, text)`
pub const DISPLAY_LABELS: [(u8, u8, &str); 5] = [
    (0, 0, "Temperature"),
    (0, 1, "(C): "),
    (0, 2, "(F): "),
    (0, 3, "Humidity"),
    (0, 4, "%rH: "),
];

const CELSIUS_PAGE: u8 = 1;
const FAHRENHEIT_PAGE: u8 = 2;
const HUMIDITY_PAGE: u8 = 4;

/// One reading, ready for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub celsius: Readout,
    pub fahrenheit: Readout,
    pub humidity: Readout,
}

impl Report {
    pub fn new(measurement: &Measurement) -> Self {
        Self {
            celsius: Readout::from_hundredths(measurement.temperature.centi_celsius),
            fahrenheit: Readout::from_f32(measurement.temperature.fahrenheit(), 2),
            humidity: Readout::from_f32(measurement.humidity.percent() as f32, 2),
        }
    }

    /// `(page, value)` for each value field on the display.
    pub fn display_fields(&self) -> [(u8, Readout); 3] {
        [
            (CELSIUS_PAGE, self.celsius),
            (FAHRENHEIT_PAGE, self.fahrenheit),
            (HUMIDITY_PAGE, self.humidity),
        ]
    }

    /// Line for the wired console.
    pub fn write_pc_line<W: Write>(&self, w: &mut W) -> fmt::Result {
        writeln!(
            w,
            "Temperature(C): {:>width$}     Temperature(F): {:>width$}",
            self.celsius,
            self.fahrenheit,
            width = FIELD_WIDTH
        )
    }

    /// Line for the wireless console.
    pub fn write_radio_line<W: Write>(&self, w: &mut W) -> fmt::Result {
        writeln!(
            w,
            "Temp: {:>width$}(C) -> {:>width$}(F)         Humidity: {:>width$} %rH",
            self.celsius,
            self.fahrenheit,
            self.humidity,
            width = FIELD_WIDTH
        )
    }
}

impl From<&Measurement> for Report {
    fn from(measurement: &Measurement) -> Self {
        Report::new(measurement)
    }
}
