//! Pin-out and timing of the NUCLEO-F429ZI build.
//!
//! I2C1: PB8 (SCL), PB9 (SDA), BME280 at 0x76 and SSD1306 at 0x3C.
//! USART3 TX on PD8 goes to the ST-LINK virtual COM port, USART2 TX on PD5 to the HM-10.

use climate_core::twi::{self, PollPolicy};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart;
use embassy_time::Duration;

pub const I2C_FREQUENCY: Hertz = Hertz(100_000);
pub const OLED_ADDRESS: u8 = 0x3C;

pub const PC_BAUDRATE: u32 = 115_200;
pub const RADIO_BAUDRATE: u32 = 9_600;

/// One tick every 500 ms, ten ticks per cycle: a refresh every 5 s
pub const TICK_PERIOD: Duration = Duration::from_millis(500);
pub const TICK_MODULUS: u8 = 10;
pub const REFRESH_SLOT: u8 = 5;
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Temperature reads discarded after init; the first conversion returns the reset value
pub const WARM_UP_READS: usize = 2;
pub const FIRST_CONVERSION: Duration = Duration::from_millis(10);

// A byte at 100 kHz takes ~90 us, a status poll a few dozen cycles at 180 MHz
const BUS_POLL_BUDGET: u32 = 200_000;

pub fn bus_config() -> twi::Config {
    let mut config = twi::Config::default();
    config.poll = PollPolicy::Bounded {
        polls: BUS_POLL_BUDGET,
    };
    config
}

pub fn pc_uart_config() -> usart::Config {
    let mut config = usart::Config::default();
    config.baudrate = PC_BAUDRATE;
    config
}

pub fn radio_uart_config() -> usart::Config {
    let mut config = usart::Config::default();
    config.baudrate = RADIO_BAUDRATE;
    config
}
