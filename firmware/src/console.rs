//! Line-oriented report output on the blocking UARTs.

use climate_core::report::Report;
use defmt::Format;
use embedded_io::Write;
use heapless::String;

const LINE_CAPACITY: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Error<E> {
    /// Line did not fit the buffer
    Format,
    Port(E),
}

pub struct Console<W> {
    port: W,
    line: String<LINE_CAPACITY>,
}

impl<W: Write> Console<W> {
    pub fn new(port: W) -> Self {
        Self {
            port,
            line: String::new(),
        }
    }

    /// Temperatures only, for the wired terminal.
    pub fn send_pc(&mut self, report: &Report) -> Result<(), Error<W::Error>> {
        self.line.clear();
        report
            .write_pc_line(&mut self.line)
            .map_err(|_| Error::Format)?;
        self.flush_line()
    }

    /// Full reading for the radio link.
    pub fn send_radio(&mut self, report: &Report) -> Result<(), Error<W::Error>> {
        self.line.clear();
        report
            .write_radio_line(&mut self.line)
            .map_err(|_| Error::Format)?;
        self.flush_line()
    }

    fn flush_line(&mut self) -> Result<(), Error<W::Error>> {
        self.port
            .write_all(self.line.as_bytes())
            .map_err(Error::Port)?;
        self.port.flush().map_err(Error::Port)
    }
}

impl<W: Write> core::fmt::Write for Console<W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.port.write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}
