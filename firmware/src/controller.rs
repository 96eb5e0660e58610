//! Byte-wise master controller on the STM32F4 I2C (v1) block.
//!
//! Pins, clocks and bus timing are set up by `embassy_stm32::i2c::I2c::new_blocking`;
//! after that the register block is driven directly so that every byte goes out under
//! the start/stop/ack conditions chosen by the bus engine. Each `status()` call advances
//! the transfer by at most one hardware event and reports busy until it is done.

use climate_core::twi::{Conditions, Controller, Direction, Status};
use defmt::*;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::pac::i2c::I2c as Regs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
enum Phase {
    Idle,
    /// START requested, waiting for SB
    Start,
    /// Address byte sent, waiting for ADDR
    Address,
    /// Data byte loaded, waiting for BTF
    Transmit,
    /// Waiting for RXNE
    Receive,
    /// STOP requested, waiting for the hardware to clear it
    Stopping,
}

pub struct Stm32Controller<'d> {
    _i2c: I2c<'d, Blocking>,
    regs: Regs,
    address: u8,
    direction: Direction,
    data_out: u8,
    data_in: u8,
    pending: Conditions,
    phase: Phase,
    error: u8,
}

impl<'d> Stm32Controller<'d> {
    /// `regs` must be the register block of the peripheral `i2c` was created on.
    pub fn new(i2c: I2c<'d, Blocking>, regs: Regs) -> Self {
        Self {
            _i2c: i2c,
            regs,
            address: 0,
            direction: Direction::Write,
            data_out: 0,
            data_in: 0,
            pending: Conditions::NONE,
            phase: Phase::Idle,
            error: 0,
        }
    }

    /// Start moving the data byte once the address phase (if any) is over.
    fn begin_data(&mut self) {
        match self.direction {
            Direction::Write => {
                let byte = self.data_out;
                self.regs.dr().write(|w| w.set_dr(byte));
                self.phase = Phase::Transmit;
            }
            Direction::Read => {
                self.prepare_receive();
                self.phase = Phase::Receive;
            }
        }
    }

    /// ACK/STOP have to be set up before the byte arrives.
    fn prepare_receive(&mut self) {
        let ack = self.pending.contains(Conditions::ACK);
        let stop = self.pending.contains(Conditions::STOP);
        self.regs.cr1().modify(|w| {
            w.set_ack(ack);
            if stop {
                w.set_stop(true);
            }
        });
    }

    fn abort(&mut self, status_bits: u8) {
        trace!("i2c: abort in {} sr1={:#x}", self.phase, self.regs.sr1().read().0);
        self.error = status_bits;
        self.phase = Phase::Idle;
    }

    fn step(&mut self) {
        let sr1 = self.regs.sr1().read();
        if sr1.af() {
            self.regs.sr1().write(|w| {
                w.0 = !0;
                w.set_af(false);
            });
            let nack = if self.phase == Phase::Address {
                Status::ADRACK
            } else {
                Status::DATACK
            };
            self.abort(Status::ERROR | nack);
            return;
        }
        if sr1.arlo() {
            self.regs.sr1().write(|w| {
                w.0 = !0;
                w.set_arlo(false);
            });
            self.abort(Status::ERROR | Status::ARBLST);
            return;
        }
        if sr1.berr() {
            self.regs.sr1().write(|w| {
                w.0 = !0;
                w.set_berr(false);
            });
            self.abort(Status::ERROR | Status::DATACK);
            return;
        }

        match self.phase {
            Phase::Idle => {}
            Phase::Start => {
                if sr1.start() {
                    let byte = self.direction.address_byte(self.address);
                    self.regs.dr().write(|w| w.set_dr(byte));
                    self.phase = Phase::Address;
                }
            }
            Phase::Address => {
                if sr1.addr() {
                    match self.direction {
                        Direction::Write => {
                            // reading SR2 after SR1 clears ADDR
                            let _ = self.regs.sr2().read();
                            self.begin_data();
                        }
                        Direction::Read => {
                            // EV6_1: ACK before ADDR is cleared, STOP after
                            let ack = self.pending.contains(Conditions::ACK);
                            self.regs.cr1().modify(|w| w.set_ack(ack));
                            let _ = self.regs.sr2().read();
                            if self.pending.contains(Conditions::STOP) {
                                self.regs.cr1().modify(|w| w.set_stop(true));
                            }
                            self.phase = Phase::Receive;
                        }
                    }
                }
            }
            Phase::Transmit => {
                if sr1.btf() {
                    if self.pending.contains(Conditions::STOP) {
                        self.regs.cr1().modify(|w| w.set_stop(true));
                        self.phase = Phase::Stopping;
                    } else {
                        self.phase = Phase::Idle;
                    }
                }
            }
            Phase::Receive => {
                if sr1.rxne() {
                    self.data_in = self.regs.dr().read().dr();
                    self.phase = if self.pending.contains(Conditions::STOP) {
                        Phase::Stopping
                    } else {
                        Phase::Idle
                    };
                }
            }
            Phase::Stopping => {
                if !self.regs.cr1().read().stop() {
                    self.phase = Phase::Idle;
                }
            }
        }
    }
}

impl Controller for Stm32Controller<'_> {
    fn set_target(&mut self, address: u8, direction: Direction) {
        self.address = address;
        self.direction = direction;
    }

    fn write_data(&mut self, byte: u8) {
        self.data_out = byte;
    }

    fn read_data(&mut self) -> u8 {
        self.data_in
    }

    fn execute(&mut self, conditions: Conditions) {
        self.error = 0;
        self.pending = conditions;

        if !conditions.contains(Conditions::RUN) {
            if conditions.contains(Conditions::STOP) {
                self.regs.cr1().modify(|w| w.set_stop(true));
                self.phase = Phase::Stopping;
            } else {
                self.phase = Phase::Idle;
            }
            return;
        }

        if conditions.contains(Conditions::START) {
            self.regs.cr1().modify(|w| {
                w.set_start(true);
                w.set_ack(true);
            });
            self.phase = Phase::Start;
        } else {
            self.begin_data();
        }
    }

    fn status(&mut self) -> Status {
        self.step();

        let mut bits = self.error;
        if self.phase != Phase::Idle {
            bits |= Status::BUSY;
        }
        bits |= if self.regs.sr2().read().busy() {
            Status::BUSBSY
        } else {
            Status::IDLE
        };
        Status(bits)
    }
}
