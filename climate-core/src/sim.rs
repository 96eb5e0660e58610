//! Simulated byte-wise I2C master with register-file targets, for unit tests.
//!
//! Each target behaves like a typical register device: the first byte of a write
//! transaction sets the register pointer, further bytes are stored with auto-increment,
//! and reads return bytes from the pointer onwards.

use crate::twi::{Conditions, Controller, Direction, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub address: u8,
    pub direction: Direction,
    pub conditions: Conditions,
    pub byte: u8,
}

struct Target {
    address: u8,
    registers: [u8; 256],
    pointer: u8,
    writes: Vec<Vec<u8>>,
}

pub struct SimController {
    targets: Vec<Target>,
    address: u8,
    direction: Direction,
    data_out: u8,
    data_in: u8,
    /// Target addressed by the transaction in progress
    session: Option<usize>,
    pointer_pending: bool,
    error: u8,
    latency: u32,
    busy_left: u32,
    stuck: bool,
    /// `(transfer index, status bits)` reported instead of moving a byte
    fault: Option<(usize, u8)>,
    transfers: usize,
    stall_stop: bool,
    stalled: bool,
    status_reads: usize,
    pub events: Vec<Event>,
}

impl SimController {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            address: 0,
            direction: Direction::Write,
            data_out: 0,
            data_in: 0,
            session: None,
            pointer_pending: false,
            error: 0,
            latency: 0,
            busy_left: 0,
            stuck: false,
            fault: None,
            transfers: 0,
            stall_stop: false,
            stalled: false,
            status_reads: 0,
            events: Vec::new(),
        }
    }

    pub fn add_target(&mut self, address: u8) -> &mut Self {
        self.targets.push(Target {
            address,
            registers: [0; 256],
            pointer: 0,
            writes: Vec::new(),
        });
        self
    }

    /// Preload `bytes` into the registers of `address` starting at `register`.
    pub fn load(&mut self, address: u8, register: u8, bytes: &[u8]) -> &mut Self {
        let target = self.target_mut(address);
        for (i, byte) in bytes.iter().enumerate() {
            target.registers[register as usize + i] = *byte;
        }
        self
    }

    /// Number of status polls each transfer reports busy for.
    pub fn set_latency(&mut self, polls: u32) {
        self.latency = polls;
    }

    /// Keep the busy flag set forever.
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// Fail the transfer `after` more transfers from now with `status` bits, without
    /// moving its byte. Lost arbitration also ends the session, another master owns it.
    pub fn fail_after(&mut self, after: usize, status: u8) {
        self.fault = Some((self.transfers + after, status));
    }

    /// Leave the controller busy after a lone STOP.
    pub fn set_stall_stop(&mut self, stall: bool) {
        self.stall_stop = stall;
    }

    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    /// Every write transaction `address` received, pointer byte included.
    pub fn writes(&self, address: u8) -> &[Vec<u8>] {
        &self.target(address).writes
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.target(address).registers[register as usize]
    }

    fn target(&self, address: u8) -> &Target {
        self.targets
            .iter()
            .find(|t| t.address == address)
            .expect("no such target")
    }

    fn target_mut(&mut self, address: u8) -> &mut Target {
        self.targets
            .iter_mut()
            .find(|t| t.address == address)
            .expect("no such target")
    }

    fn shift(&mut self, conditions: Conditions) {
        if conditions.contains(Conditions::START) {
            self.session = self.targets.iter().position(|t| t.address == self.address);
            match self.session {
                None => {
                    self.error = Status::ERROR | Status::ADRACK;
                    return;
                }
                Some(index) if self.direction == Direction::Write => {
                    self.pointer_pending = true;
                    self.targets[index].writes.push(Vec::new());
                }
                Some(_) => {}
            }
        }

        let Some(index) = self.session else {
            self.error = Status::ERROR | Status::DATACK;
            return;
        };
        let target = &mut self.targets[index];
        match self.direction {
            Direction::Write => {
                if let Some(log) = target.writes.last_mut() {
                    log.push(self.data_out);
                }
                if self.pointer_pending {
                    target.pointer = self.data_out;
                    self.pointer_pending = false;
                } else {
                    target.registers[target.pointer as usize] = self.data_out;
                    target.pointer = target.pointer.wrapping_add(1);
                }
            }
            Direction::Read => {
                self.data_in = target.registers[target.pointer as usize];
                target.pointer = target.pointer.wrapping_add(1);
            }
        }
    }
}

impl Controller for SimController {
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
        self.busy_left = self.latency;
        self.stalled = false;

        if conditions.contains(Conditions::RUN) {
            match self.fault {
                Some((at, status)) if at == self.transfers => {
                    self.fault = None;
                    self.error = status;
                }
                _ => self.shift(conditions),
            }
            self.transfers += 1;
        } else if self.stall_stop && conditions.contains(Conditions::STOP) {
            self.stalled = true;
        }
        if conditions.contains(Conditions::STOP) || self.error != 0 {
            self.session = None;
        }

        let byte = match self.direction {
            Direction::Write => self.data_out,
            Direction::Read => self.data_in,
        };
        self.events.push(Event {
            address: self.address,
            direction: self.direction,
            conditions,
            byte,
        });
    }

    fn status(&mut self) -> Status {
        self.status_reads += 1;
        if self.stuck || self.stalled {
            return Status(Status::BUSY | Status::BUSBSY);
        }
        if self.busy_left > 0 {
            self.busy_left -= 1;
            return Status(Status::BUSY | Status::BUSBSY);
        }
        let idle = if self.session.is_none() { Status::IDLE } else { Status::BUSBSY };
        Status(self.error | idle)
    }
}
