//! Two-wire (I2C) bus transaction engine.
//!
//! The engine drives a master controller that works one byte at a time: the caller
//! selects a target address and direction, loads a byte, and kicks the controller with
//! a mask of wire conditions (run/start/stop/ack). The controller then reports busy
//! until the byte has been shifted, and the engine polls it until it is done.
//!
//! ```text
//!   Idle ──set_target──► Selected ──byte{START}──► Active ──byte{STOP}──► Selected
//!                           ▲                       │  ▲
//!                           └──────set_target───────┘  └── byte{RUN[,ACK]}
//! ```

mod bus;
mod hal;
mod register;

use core::ops::{BitOr, BitOrAssign};

pub use bus::{Bus, State};
pub use register::RegisterBus;

/// Wire conditions issued together with a byte transfer.
///
/// The bit positions follow the master control register of the controller: a mask is
/// written as-is into the command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Conditions(u8);

impl Conditions {
    pub const NONE: Self = Self(0);
    /// Enable the controller for this transfer
    pub const RUN: Self = Self(1 << 0);
    /// Generate a START (or repeated START) before the transfer
    pub const START: Self = Self(1 << 1);
    /// Generate a STOP after the transfer
    pub const STOP: Self = Self(1 << 2);
    /// Acknowledge the received byte (receive only)
    pub const ACK: Self = Self(1 << 3);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for Conditions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Conditions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Transfer direction, carried in the R/W bit of the address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Write = 0,
    Read = 1,
}

impl Direction {
    /// The 8-bit address byte put on the wire for a 7-bit `address`.
    pub const fn address_byte(self, address: u8) -> u8 {
        (address << 1) | self as u8
    }
}

/// Snapshot of the controller status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    pub const BUSY: u8 = 1 << 0;
    pub const ERROR: u8 = 1 << 1;
    pub const ADRACK: u8 = 1 << 2;
    pub const DATACK: u8 = 1 << 3;
    pub const ARBLST: u8 = 1 << 4;
    pub const IDLE: u8 = 1 << 5;
    pub const BUSBSY: u8 = 1 << 6;
    pub const CLKTO: u8 = 1 << 7;

    pub const fn is_busy(self) -> bool {
        self.0 & Self::BUSY != 0
    }

    pub const fn is_error(self) -> bool {
        self.0 & Self::ERROR != 0
    }

    pub const fn address_nacked(self) -> bool {
        self.0 & Self::ADRACK != 0
    }

    pub const fn data_nacked(self) -> bool {
        self.0 & Self::DATACK != 0
    }

    pub const fn arbitration_lost(self) -> bool {
        self.0 & Self::ARBLST != 0
    }

    pub const fn clock_timeout(self) -> bool {
        self.0 & Self::CLKTO != 0
    }
}

/// Register-level access to a byte-oriented I2C master.
///
/// Implementations only touch hardware; sequencing and polling live in [`Bus`].
pub trait Controller {
    /// Load the target address and direction used by the next START.
    fn set_target(&mut self, address: u8, direction: Direction);

    /// Load the byte to transmit.
    fn write_data(&mut self, byte: u8);

    /// Last byte received.
    fn read_data(&mut self) -> u8;

    /// Kick off a transfer under `conditions`.
    fn execute(&mut self, conditions: Conditions);

    fn status(&mut self) -> Status;
}

impl<C: Controller + ?Sized> Controller for &mut C {
    fn set_target(&mut self, address: u8, direction: Direction) {
        (**self).set_target(address, direction)
    }

    fn write_data(&mut self, byte: u8) {
        (**self).write_data(byte)
    }

    fn read_data(&mut self) -> u8 {
        (**self).read_data()
    }

    fn execute(&mut self, conditions: Conditions) {
        (**self).execute(conditions)
    }

    fn status(&mut self) -> Status {
        (**self).status()
    }
}

/// How long a byte transfer may keep the controller busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollPolicy {
    /// Give up with [`Error::Timeout`] after this many busy status reads
    Bounded { polls: u32 },
    /// Spin until the controller is done; a stuck bus hangs the caller
    Forever,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::Bounded { polls: 10_000 }
    }
}

/// Bus engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct Config {
    pub poll: PollPolicy,
}

/// Which part of the transfer was not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NackSource {
    Address,
    Data,
}

/// Bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Controller stayed busy past the poll budget, or the clock was held low
    Timeout,
    Nack(NackSource),
    ArbitrationLost,
    /// Byte transfer without a target selected for that direction
    NoTarget,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            Error::Timeout => ErrorKind::Other,
            Error::Nack(NackSource::Address) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Error::Nack(NackSource::Data) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::NoTarget => ErrorKind::Other,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Timeout => f.write_str("bus timeout"),
            Error::Nack(NackSource::Address) => f.write_str("address not acknowledged"),
            Error::Nack(NackSource::Data) => f.write_str("data not acknowledged"),
            Error::ArbitrationLost => f.write_str("arbitration lost"),
            Error::NoTarget => f.write_str("no target selected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_use_controller_bit_positions() {
        assert_eq!((Conditions::RUN | Conditions::START | Conditions::STOP).bits(), 0b0111);
        assert_eq!((Conditions::RUN | Conditions::START | Conditions::ACK).bits(), 0b1011);
        assert!((Conditions::RUN | Conditions::STOP).contains(Conditions::STOP));
        assert!(!(Conditions::RUN | Conditions::ACK).contains(Conditions::STOP));
    }

    #[test]
    fn address_byte_carries_direction() {
        assert_eq!(Direction::Write.address_byte(0x76), 0xEC);
        assert_eq!(Direction::Read.address_byte(0x76), 0xED);
    }

    #[test]
    fn nack_maps_to_embedded_hal_kind() {
        use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};
        assert_eq!(
            Error::Nack(NackSource::Address).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(Error::ArbitrationLost.kind(), ErrorKind::ArbitrationLoss);
    }
}
