//! Board glue for the climate station: the STM32 I2C controller driven by the
//! `climate-core` bus engine, the SSD1306 display and the serial consoles.

#![no_std]

pub mod board;
pub mod console;
pub mod controller;
pub mod display;
