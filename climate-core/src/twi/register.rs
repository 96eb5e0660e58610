/// Register-oriented access to devices on the bus.
///
/// The sensor driver talks to the bus only through this trait. Multi-byte reads are
/// packed big-endian (first byte on the wire is the most significant).
pub trait RegisterBus {
    type Error;

    /// Read one byte from `register` of the device at `address`.
    fn read8(&mut self, address: u8, register: u8) -> Result<u8, Self::Error>;

    /// Read two consecutive registers, MSB first.
    fn read16(&mut self, address: u8, register: u8) -> Result<u16, Self::Error>;

    /// Burst-read three consecutive registers, MSB first.
    fn read24(&mut self, address: u8, register: u8) -> Result<u32, Self::Error>;

    /// Write `bytes` as one contiguous transaction.
    fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// [`read16`](Self::read16) for registers that keep the low byte at the lower address.
    fn read16_reversed(&mut self, address: u8, register: u8) -> Result<u16, Self::Error> {
        self.read16(address, register).map(u16::swap_bytes)
    }

    fn read_signed16(&mut self, address: u8, register: u8) -> Result<i16, Self::Error> {
        self.read16(address, register).map(|v| v as i16)
    }

    fn read_signed16_reversed(&mut self, address: u8, register: u8) -> Result<i16, Self::Error> {
        self.read16_reversed(address, register).map(|v| v as i16)
    }

    /// 24-bit two's complement read, sign-extended from bit 23.
    fn read_signed24(&mut self, address: u8, register: u8) -> Result<i32, Self::Error> {
        self.read24(address, register).map(|v| ((v << 8) as i32) >> 8)
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn read8(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        (**self).read8(address, register)
    }

    fn read16(&mut self, address: u8, register: u8) -> Result<u16, Self::Error> {
        (**self).read16(address, register)
    }

    fn read24(&mut self, address: u8, register: u8) -> Result<u32, Self::Error> {
        (**self).read24(address, register)
    }

    fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write_bytes(address, bytes)
    }
}
