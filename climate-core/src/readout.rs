//! Fixed-point decimal rendering of readings for the display and consoles.

use core::fmt::{self, Write};

use heapless::String;
#[allow(unused_imports)]
use micromath::F32Ext;

const POW10: [u32; 7] = [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000];

/// A decimal value stored as `raw / 10^precision`.
///
/// `Display` prints the sign, the integer part and exactly `precision` fractional
/// digits. It honours width, fill and alignment (`{:>5}`) and ignores `{:.N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readout {
    raw: i32,
    precision: u8,
}

impl Readout {
    pub const MAX_PRECISION: u8 = 6;

    pub const fn new(raw: i32, precision: u8) -> Self {
        let precision = if precision > Self::MAX_PRECISION {
            Self::MAX_PRECISION
        } else {
            precision
        };
        Self { raw, precision }
    }

    pub const fn from_hundredths(hundredths: i32) -> Self {
        Self::new(hundredths, 2)
    }

    /// Round `value` to `precision` decimals.
    pub fn from_f32(value: f32, precision: u8) -> Self {
        let precision = precision.min(Self::MAX_PRECISION);
        let scaled = value * POW10[precision as usize] as f32;
        Self::new(scaled.round() as i32, precision)
    }

    pub const fn raw(&self) -> i32 {
        self.raw
    }

    pub const fn precision(&self) -> u8 {
        self.precision
    }

    fn write_digits<W: Write>(&self, w: &mut W) -> fmt::Result {
        let scale = POW10[self.precision as usize];
        let magnitude = self.raw.unsigned_abs();
        if self.raw < 0 {
            w.write_char('-')?;
        }
        write!(w, "{}", magnitude / scale)?;
        if self.precision > 0 {
            write!(
                w,
                ".{:0width$}",
                magnitude % scale,
                width = self.precision as usize
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // sign, 10 digits, point, 6 decimals
        let mut digits: String<18> = String::new();
        self.write_digits(&mut digits)?;

        // Width, fill and alignment apply; the formatter's precision does not, the value
        // carries its own. Numbers align right unless asked otherwise.
        let padding = f.width().unwrap_or(0).saturating_sub(digits.len());
        let (before, after) = match f.align() {
            Some(fmt::Alignment::Left) => (0, padding),
            Some(fmt::Alignment::Center) => (padding / 2, padding - padding / 2),
            Some(fmt::Alignment::Right) | None => (padding, 0),
        };
        let fill = f.fill();
        for _ in 0..before {
            f.write_char(fill)?;
        }
        f.write_str(&digits)?;
        for _ in 0..after {
            f.write_char(fill)?;
        }
        Ok(())
    }
}

/// Render `readout` right-aligned in a field of `width` characters.
///
/// The field grows when the value needs more room; it is never cut.
pub fn format<const N: usize>(readout: Readout, width: usize) -> Result<String<N>, fmt::Error> {
    let mut text = String::new();
    write!(text, "{:>width$}", readout, width = width)?;
    Ok(text)
}
