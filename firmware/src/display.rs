//! SSD1306 128x64 OLED sharing the I2C bus with the sensor.
//!
//! Text goes into the driver's frame buffer with `embedded-graphics`; nothing reaches the
//! panel until [`Oled::flush`].

use climate_core::readout::{self, Readout};
use display_interface::DisplayError;
use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::i2c::I2c;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

pub const WIDTH: u32 = 128;
/// Rows of pixels in a page
const PAGE_HEIGHT: u32 = 8;
/// Horizontal advance per character
const GLYPH_PITCH: i32 = 7;

type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

#[derive(Debug)]
pub enum Error {
    Interface(DisplayError),
    /// Value did not fit its field
    Format,
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Error::Interface(e)
    }
}

impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Interface(e) => defmt::write!(f, "Interface({})", defmt::Debug2Format(e)),
            Error::Format => defmt::write!(f, "Format"),
        }
    }
}

pub struct Oled<I2C> {
    display: Display<I2C>,
}

impl<I2C: I2c> Oled<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        Self { display }
    }

    /// Configure the panel and blank it.
    pub fn init(&mut self) -> Result<(), Error> {
        self.display.init()?;
        self.display.clear_buffer();
        self.display.flush()?;
        Ok(())
    }

    /// Draw `text` on `page` from `column`, blanking the rest of that line.
    pub fn print_text(&mut self, column: u8, page: u8, text: &str) -> Result<(), Error> {
        let top = i32::from(page) * PAGE_HEIGHT as i32;
        let left = i32::from(column);

        Rectangle::new(
            Point::new(left, top),
            Size::new(WIDTH.saturating_sub(u32::from(column)), PAGE_HEIGHT),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
        .draw(&mut self.display)?;

        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        let mut glyph = [0u8; 4];
        for (i, c) in text.chars().enumerate() {
            let position = Point::new(left + i as i32 * GLYPH_PITCH, top);
            Text::with_baseline(c.encode_utf8(&mut glyph), position, style, Baseline::Top)
                .draw(&mut self.display)?;
        }
        Ok(())
    }

    /// Draw `value` right-aligned in a field of `width` characters.
    pub fn print_readout(
        &mut self,
        column: u8,
        page: u8,
        value: Readout,
        width: usize,
    ) -> Result<(), Error> {
        let text = readout::format::<16>(value, width).map_err(|_| Error::Format)?;
        self.print_text(column, page, &text)
    }

    /// Push the frame buffer to the panel.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.display.flush()?;
        Ok(())
    }
}
