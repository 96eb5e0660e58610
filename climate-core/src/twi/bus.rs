use super::{
    Conditions, Config, Controller, Direction, Error, NackSource, PollPolicy, RegisterBus, Status,
};

const READ_SINGLE: Conditions = Conditions::RUN.union(Conditions::START).union(Conditions::STOP);
const READ_FIRST: Conditions = Conditions::RUN.union(Conditions::START).union(Conditions::ACK);
const READ_MIDDLE: Conditions = Conditions::RUN.union(Conditions::ACK);
const READ_LAST: Conditions = Conditions::RUN.union(Conditions::STOP);
const SELECT_REGISTER: Conditions = READ_SINGLE;

/// Where the engine is within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No target selected yet
    Idle,
    /// Target latched, bus released
    Selected { address: u8, direction: Direction },
    /// START issued and no STOP yet; the bus is held
    Active { address: u8, direction: Direction },
}

/// Byte-level transaction engine over a [`Controller`].
///
/// The engine is the only writer of the controller. It is not re-entrant: share it by
/// `&mut` from a single execution context, never from an interrupt handler.
pub struct Bus<C> {
    controller: C,
    config: Config,
    state: State,
}

impl<C: Controller> Bus<C> {
    pub fn new(controller: C, config: Config) -> Self {
        Self {
            controller,
            config,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Give the controller back.
    pub fn release(self) -> C {
        self.controller
    }

    /// Select the device and direction addressed by the next byte transfer.
    pub fn set_target(&mut self, address: u8, direction: Direction) {
        self.controller.set_target(address, direction);
        self.state = match self.state {
            State::Active { .. } => State::Active { address, direction },
            _ => State::Selected { address, direction },
        };
    }

    /// Shift one byte out under `conditions` and wait for the controller.
    pub fn write_byte(&mut self, byte: u8, conditions: Conditions) -> Result<(), Error> {
        self.expect(Direction::Write)?;
        self.controller.write_data(byte);
        self.transfer(conditions)?;
        trace!("twi: tx {:#x} {:?}", byte, conditions);
        Ok(())
    }

    /// Clock one byte in under `conditions` and return it.
    pub fn read_byte(&mut self, conditions: Conditions) -> Result<u8, Error> {
        self.expect(Direction::Read)?;
        self.transfer(conditions)?;
        let byte = self.controller.read_data();
        trace!("twi: rx {:#x} {:?}", byte, conditions);
        Ok(byte)
    }

    fn expect(&self, wanted: Direction) -> Result<(), Error> {
        match self.state {
            State::Selected { direction, .. } | State::Active { direction, .. }
                if direction == wanted =>
            {
                Ok(())
            }
            _ => Err(Error::NoTarget),
        }
    }

    fn transfer(&mut self, conditions: Conditions) -> Result<(), Error> {
        let (address, direction) = match self.state {
            State::Selected { address, direction } | State::Active { address, direction } => {
                (address, direction)
            }
            State::Idle => return Err(Error::NoTarget),
        };

        self.controller.execute(conditions);
        let status = match self.wait() {
            Ok(status) => status,
            Err(e) => {
                warn!("twi: controller busy past poll budget, target {:#x}", address);
                // No STOP went out, so the bus is still ours
                self.state = State::Active { address, direction };
                return Err(e);
            }
        };

        if status.is_error() || status.clock_timeout() {
            return Err(self.fail(address, direction, status));
        }

        self.state = if conditions.contains(Conditions::STOP) {
            State::Selected { address, direction }
        } else {
            State::Active { address, direction }
        };
        Ok(())
    }

    /// Decode a failed transfer and, unless another master owns the bus, release it.
    fn fail(&mut self, address: u8, direction: Direction, status: Status) -> Error {
        let error = if status.arbitration_lost() {
            Error::ArbitrationLost
        } else if status.clock_timeout() {
            Error::Timeout
        } else if status.address_nacked() {
            Error::Nack(NackSource::Address)
        } else {
            Error::Nack(NackSource::Data)
        };
        warn!("twi: {:?} from {:#x}", error, address);

        self.state = State::Selected { address, direction };
        if error != Error::ArbitrationLost {
            self.controller.execute(Conditions::STOP);
            if let Err(e) = self.wait() {
                warn!("twi: STOP after {:?} did not complete: {:?}", error, e);
                self.state = State::Active { address, direction };
            }
        }
        error
    }

    fn wait(&mut self) -> Result<Status, Error> {
        let mut polls: u32 = 0;
        loop {
            let status = self.controller.status();
            if !status.is_busy() {
                return Ok(status);
            }
            if let PollPolicy::Bounded { polls: limit } = self.config.poll {
                polls += 1;
                if polls >= limit {
                    return Err(Error::Timeout);
                }
            }
            core::hint::spin_loop();
        }
    }

    /// Select `register`, then read `N` bytes from it in one receive sequence.
    fn read_register<const N: usize>(
        &mut self,
        address: u8,
        register: u8,
    ) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        self.set_target(address, Direction::Write);
        self.write_byte(register, SELECT_REGISTER)?;

        self.set_target(address, Direction::Read);
        let last = N.saturating_sub(1);
        for (i, slot) in buf.iter_mut().enumerate() {
            let conditions = match (i == 0, i == last) {
                (true, true) => READ_SINGLE,
                (true, false) => READ_FIRST,
                (false, false) => READ_MIDDLE,
                (false, true) => READ_LAST,
            };
            *slot = self.read_byte(conditions)?;
        }
        Ok(buf)
    }
}

impl<C: Controller> RegisterBus for Bus<C> {
    type Error = Error;

    fn read8(&mut self, address: u8, register: u8) -> Result<u8, Error> {
        let [byte] = self.read_register::<1>(address, register)?;
        Ok(byte)
    }

    fn read16(&mut self, address: u8, register: u8) -> Result<u16, Error> {
        self.read_register::<2>(address, register).map(u16::from_be_bytes)
    }

    fn read24(&mut self, address: u8, register: u8) -> Result<u32, Error> {
        let [msb, mid, lsb] = self.read_register::<3>(address, register)?;
        Ok(u32::from_be_bytes([0, msb, mid, lsb]))
    }

    fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        let Some(last) = bytes.len().checked_sub(1) else {
            return Ok(());
        };
        self.set_target(address, Direction::Write);
        for (i, byte) in bytes.iter().enumerate() {
            let mut conditions = Conditions::RUN;
            if i == 0 {
                conditions |= Conditions::START;
            }
            if i == last {
                conditions |= Conditions::STOP;
            }
            self.write_byte(*byte, conditions)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Event, SimController};

    const DEV: u8 = 0x76;

    fn bus(sim: SimController) -> Bus<SimController> {
        Bus::new(sim, Config::default())
    }

    fn conditions(events: &[Event]) -> Vec<u8> {
        events.iter().map(|e| e.conditions.bits()).collect()
    }

    #[test]
    fn read24_packs_msb_first() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0xFA, &[0x01, 0x02, 0x03]);
        let mut bus = bus(sim);

        assert_eq!(bus.read24(DEV, 0xFA), Ok(0x010203));
        // register select, then first/middle/last receive conditions
        assert_eq!(conditions(&bus.controller().events), [0b0111, 0b1011, 0b1001, 0b0101]);
        assert_eq!(bus.state(), State::Selected { address: DEV, direction: Direction::Read });
    }

    #[test]
    fn read16_and_read8_conditions() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0xFD, &[0xAB, 0xCD, 0x9C]);
        let mut bus = bus(sim);

        assert_eq!(bus.read16(DEV, 0xFD), Ok(0xABCD));
        assert_eq!(conditions(&bus.controller().events), [0b0111, 0b1011, 0b0101]);

        bus.controller_mut().events.clear();
        assert_eq!(bus.read8(DEV, 0xFF), Ok(0x9C));
        assert_eq!(conditions(&bus.controller().events), [0b0111, 0b0111]);
    }

    #[test]
    fn register_select_is_written_to_the_device() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        let mut bus = bus(sim);

        bus.read8(DEV, 0xD0).unwrap();
        let events = &bus.controller().events;
        assert_eq!(events[0].direction, Direction::Write);
        assert_eq!(events[0].byte, 0xD0);
        assert_eq!(events[1].direction, Direction::Read);
    }

    #[test]
    fn reversed_read_is_byte_swap() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x88, &[0x70, 0x6B]);
        let mut bus = bus(sim);

        let plain = bus.read16(DEV, 0x88).unwrap();
        let reversed = bus.read16_reversed(DEV, 0x88).unwrap();
        assert_eq!(reversed, plain.swap_bytes());
        assert_eq!(reversed, 27504);
    }

    #[test]
    fn signed_reads_reinterpret_bits() {
        let mut sim = SimController::new();
        sim.add_target(DEV)
            .load(DEV, 0x8C, &[0x18, 0xFC])
            .load(DEV, 0x10, &[0xFF, 0xFF, 0xFE]);
        let mut bus = bus(sim);

        assert_eq!(bus.read_signed16_reversed(DEV, 0x8C), Ok(-1000));
        assert_eq!(bus.read_signed16(DEV, 0x8C), Ok(0x18FC));
        assert_eq!(bus.read_signed24(DEV, 0x10), Ok(-2));
    }

    #[test]
    fn single_byte_write_starts_and_stops_on_the_same_byte() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        let mut bus = bus(sim);

        bus.write_bytes(DEV, &[0xE0]).unwrap();
        assert_eq!(conditions(&bus.controller().events), [0b0111]);
    }

    #[test]
    fn multi_byte_write_holds_the_bus() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        let mut bus = bus(sim);

        bus.write_bytes(DEV, &[0xF2, 0x01, 0xF4, 0x27]).unwrap();
        assert_eq!(conditions(&bus.controller().events), [0b0011, 0b0001, 0b0001, 0b0101]);
        assert_eq!(bus.controller().writes(DEV), [vec![0xF2, 0x01, 0xF4, 0x27]]);
    }

    #[test]
    fn empty_write_touches_nothing() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        let mut bus = bus(sim);

        bus.write_bytes(DEV, &[]).unwrap();
        assert!(bus.controller().events.is_empty());
        assert_eq!(bus.state(), State::Idle);
    }

    #[test]
    fn waits_out_a_slow_controller() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x00, &[0x5A]);
        sim.set_latency(25);
        let mut bus = bus(sim);

        assert_eq!(bus.read8(DEV, 0x00), Ok(0x5A));
    }

    #[test]
    fn missing_device_is_an_address_nack_and_releases_the_bus() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x00, &[0x42]);
        let mut bus = bus(sim);

        assert_eq!(bus.read8(0x3C, 0x00), Err(Error::Nack(NackSource::Address)));
        let last = *bus.controller().events.last().unwrap();
        assert_eq!(last.conditions, Conditions::STOP);

        // The bus is usable again afterwards
        assert_eq!(bus.read8(DEV, 0x00), Ok(0x42));
    }

    #[test]
    fn stuck_controller_times_out() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        sim.set_stuck(true);
        let mut bus = Bus::new(
            sim,
            Config {
                poll: PollPolicy::Bounded { polls: 50 },
            },
        );

        assert_eq!(bus.read16(DEV, 0xFD), Err(Error::Timeout));
        // Gave up during the register select, nothing was read
        assert_eq!(bus.controller().events.len(), 1);
        assert_eq!(bus.controller().status_reads(), 50);
        // No STOP could be issued, the bus is still held
        assert_eq!(bus.state(), State::Active { address: DEV, direction: Direction::Write });
    }

    #[test]
    fn forever_waits_past_the_default_budget() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x00, &[0x5A]);
        sim.set_latency(20_000);
        let mut bus = Bus::new(
            sim,
            Config {
                poll: PollPolicy::Forever,
            },
        );
        assert_eq!(bus.read8(DEV, 0x00), Ok(0x5A));

        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x00, &[0x5A]);
        sim.set_latency(20_000);
        let mut bus = Bus::new(sim, Config::default());
        assert_eq!(bus.read8(DEV, 0x00), Err(Error::Timeout));
    }

    #[test]
    fn lost_arbitration_sends_no_stop() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        sim.fail_after(1, Status::ERROR | Status::ARBLST);
        let mut bus = bus(sim);

        assert_eq!(bus.write_bytes(DEV, &[0xF2, 0x01, 0xF4, 0x27]), Err(Error::ArbitrationLost));
        assert_eq!(conditions(&bus.controller().events), [0b0011, 0b0001]);
        assert_eq!(bus.controller().writes(DEV), [vec![0xF2]]);
        assert_eq!(bus.state(), State::Selected { address: DEV, direction: Direction::Write });
    }

    #[test]
    fn clock_timeout_is_reported_as_timeout() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x00, &[0x42]);
        sim.fail_after(0, Status::CLKTO);
        let mut bus = bus(sim);

        assert_eq!(bus.read8(DEV, 0x00), Err(Error::Timeout));
        assert_eq!(conditions(&bus.controller().events), [0b0111, 0b0100]);

        assert_eq!(bus.read8(DEV, 0x00), Ok(0x42));
    }

    #[test]
    fn data_nack_mid_write_stops_the_transfer() {
        let mut sim = SimController::new();
        sim.add_target(DEV);
        sim.fail_after(2, Status::ERROR | Status::DATACK);
        let mut bus = bus(sim);

        assert_eq!(
            bus.write_bytes(DEV, &[0xF2, 0x01, 0xF4, 0x27]),
            Err(Error::Nack(NackSource::Data))
        );
        // third byte refused, then a lone STOP
        assert_eq!(conditions(&bus.controller().events), [0b0011, 0b0001, 0b0001, 0b0100]);
        assert_eq!(bus.controller().writes(DEV), [vec![0xF2, 0x01]]);
        assert_eq!(bus.state(), State::Selected { address: DEV, direction: Direction::Write });
    }

    #[test]
    fn stop_that_never_completes_keeps_the_bus_held() {
        let mut sim = SimController::new();
        sim.set_stall_stop(true);
        let mut bus = Bus::new(
            sim,
            Config {
                poll: PollPolicy::Bounded { polls: 50 },
            },
        );

        assert_eq!(bus.read8(0x3C, 0x00), Err(Error::Nack(NackSource::Address)));
        assert_eq!(bus.state(), State::Active { address: 0x3C, direction: Direction::Write });
    }

    #[test]
    fn byte_primitives_need_a_target() {
        let mut bus = bus(SimController::new());
        assert_eq!(bus.write_byte(0x00, Conditions::RUN), Err(Error::NoTarget));

        bus.set_target(DEV, Direction::Write);
        assert_eq!(bus.read_byte(Conditions::RUN | Conditions::START), Err(Error::NoTarget));
    }

    #[test]
    fn raw_byte_transaction() {
        let mut sim = SimController::new();
        sim.add_target(DEV).load(DEV, 0x20, &[0x11, 0x22]);
        let mut bus = bus(sim);

        bus.set_target(DEV, Direction::Write);
        bus.write_byte(0x20, Conditions::RUN | Conditions::START).unwrap();
        assert_eq!(bus.state(), State::Active { address: DEV, direction: Direction::Write });

        bus.set_target(DEV, Direction::Read);
        let a = bus.read_byte(Conditions::RUN | Conditions::START | Conditions::ACK).unwrap();
        let b = bus.read_byte(Conditions::RUN | Conditions::STOP).unwrap();
        assert_eq!([a, b], [0x11, 0x22]);
        assert_eq!(bus.state(), State::Selected { address: DEV, direction: Direction::Read });
    }
}
