//! Core of the climate station firmware: the two-wire bus transaction engine and the
//! BME280 calibration/compensation engine layered on top of it, plus the small pieces
//! of text handling shared by the display and the serial consoles.
//!
//! Everything here is hardware independent. A chip specific [`twi::Controller`] plugs
//! the engine into a real I2C peripheral; the unit tests plug in a simulated one.

#![cfg_attr(not(test), no_std)]

pub(crate) mod fmt;

pub mod bme280;
pub mod readout;
pub mod report;
pub mod tick;
pub mod twi;

#[cfg(test)]
pub(crate) mod sim;

// Re-export the public API things
// This avoids having to do climate_core::bme280::sensor::ReadySensor, etc
pub use bme280::{Measurement, ReadySensor, Sensor};
pub use readout::Readout;
pub use twi::{Bus, RegisterBus};
