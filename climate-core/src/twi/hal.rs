//! `embedded-hal` I2C implementation on top of the byte engine, so ecosystem drivers can
//! share the same bus.

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

use super::{Bus, Conditions, Controller, Direction, Error};

impl<C: Controller> ErrorType for Bus<C> {
    type Error = Error;
}

impl<C: Controller> I2c<SevenBitAddress> for Bus<C> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut previous = None;
        for index in 0..operations.len() {
            let next = operations[index + 1..].iter().find_map(direction);
            match &mut operations[index] {
                Operation::Write(bytes) if !bytes.is_empty() => {
                    let start = previous != Some(Direction::Write);
                    self.write_segment(address, bytes, start, next)?;
                    previous = Some(Direction::Write);
                }
                Operation::Read(buffer) if !buffer.is_empty() => {
                    let start = previous != Some(Direction::Read);
                    self.read_segment(address, buffer, start, next)?;
                    previous = Some(Direction::Read);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn direction(operation: &Operation<'_>) -> Option<Direction> {
    match operation {
        Operation::Write(bytes) if !bytes.is_empty() => Some(Direction::Write),
        Operation::Read(buffer) if !buffer.is_empty() => Some(Direction::Read),
        _ => None,
    }
}

impl<C: Controller> Bus<C> {
    /// Transmit one operation's bytes. `next` is the direction of the operation that
    /// follows; `None` ends the transaction with a STOP.
    fn write_segment(
        &mut self,
        address: u8,
        bytes: &[u8],
        start: bool,
        next: Option<Direction>,
    ) -> Result<(), Error> {
        if start {
            self.set_target(address, Direction::Write);
        }
        let last = bytes.len() - 1;
        for (i, byte) in bytes.iter().enumerate() {
            let mut conditions = Conditions::RUN;
            if i == 0 && start {
                conditions |= Conditions::START;
            }
            if i == last && next.is_none() {
                conditions |= Conditions::STOP;
            }
            self.write_byte(*byte, conditions)?;
        }
        Ok(())
    }

    fn read_segment(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        start: bool,
        next: Option<Direction>,
    ) -> Result<(), Error> {
        if start {
            self.set_target(address, Direction::Read);
        }
        let last = buffer.len() - 1;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let mut conditions = Conditions::RUN;
            if i == 0 && start {
                conditions |= Conditions::START;
            }
            if i != last {
                conditions |= Conditions::ACK;
            } else {
                match next {
                    None => conditions |= Conditions::STOP,
                    Some(Direction::Read) => conditions |= Conditions::ACK,
                    // NACK the last byte, the write that follows issues a repeated START
                    Some(Direction::Write) => {}
                }
            }
            *slot = self.read_byte(conditions)?;
        }
        Ok(())
    }
}
