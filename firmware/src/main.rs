//! Climate station: BME280 readings on an SSD1306, the ST-LINK console and an HM-10 link.

#![no_std]
#![no_main]

use climate_core::bme280::{self, Sensor};
use climate_core::report::{Report, DISPLAY_LABELS, FIELD_WIDTH, VALUE_COLUMN};
use climate_core::tick::{RefreshGate, TickCounter};
use climate_core::twi::Bus;
use climate_firmware::board::{self, *};
use climate_firmware::console::Console;
use climate_firmware::controller::Stm32Controller;
use climate_firmware::display::Oled;
use core::cell::RefCell;
use core::fmt::Write as _;
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::UartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Ticker, Timer};
use embedded_hal_bus::i2c::RefCellDevice;
use {defmt_rtt as _, panic_probe as _};

static TICKS: TickCounter = TickCounter::new(TICK_MODULUS);
static REPORTS: Channel<CriticalSectionRawMutex, Report, 2> = Channel::new();

#[embassy_executor::task]
async fn tick_task() {
    let mut ticker = Ticker::every(TICK_PERIOD);
    loop {
        ticker.next().await;
        TICKS.advance();
    }
}

#[embassy_executor::task]
async fn console_task(
    mut pc: Console<UartTx<'static, Blocking>>,
    mut radio: Console<UartTx<'static, Blocking>>,
) {
    loop {
        let report = REPORTS.receive().await;
        if let Err(e) = pc.send_pc(&report) {
            warn!("pc console: {:?}", e);
        }
        if let Err(e) = radio.send_radio(&report) {
            warn!("radio console: {:?}", e);
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Climate station starting");
    let p = embassy_stm32::init(Default::default());

    let i2c = I2c::new_blocking(p.I2C1, p.PB8, p.PB9, I2C_FREQUENCY, Default::default());
    let controller = Stm32Controller::new(i2c, embassy_stm32::pac::I2C1);
    // The sensor borrows the bus per call, the display through a RefCellDevice
    let bus = RefCell::new(Bus::new(controller, board::bus_config()));

    let pc_port = unwrap!(UartTx::new_blocking(p.USART3, p.PD8, board::pc_uart_config()));
    let radio_port = unwrap!(UartTx::new_blocking(p.USART2, p.PD5, board::radio_uart_config()));
    let mut pc = Console::new(pc_port);
    let radio = Console::new(radio_port);
    if writeln!(pc, "Climate station").is_err() {
        warn!("pc console not writable");
    }

    let sensor = Sensor::new(bme280::Config::default());
    let sensor = unwrap!(sensor.init(&mut *bus.borrow_mut()));
    debug!("calibration: {:?}", sensor.calibration());

    // The first conversions after a mode change return the reset value
    for _ in 0..WARM_UP_READS {
        Timer::after(FIRST_CONVERSION).await;
        if let Err(e) = sensor.read_temperature(&mut *bus.borrow_mut()) {
            warn!("warm-up read: {:?}", e);
        }
    }

    let mut oled = Oled::new(RefCellDevice::new(&bus), OLED_ADDRESS);
    unwrap!(oled.init());
    for (column, page, text) in DISPLAY_LABELS {
        unwrap!(oled.print_text(column, page, text));
    }
    unwrap!(oled.flush());

    unwrap!(spawner.spawn(tick_task()));
    unwrap!(spawner.spawn(console_task(pc, radio)));

    let mut gate = RefreshGate::new(REFRESH_SLOT);
    loop {
        if gate.poll(TICKS.current()) {
            let measurement = sensor.measure(&mut *bus.borrow_mut());
            match measurement {
                Ok(measurement) => {
                    let report = Report::new(&measurement);
                    trace!("report: {:?}", report);
                    for (page, value) in report.display_fields() {
                        if let Err(e) = oled.print_readout(VALUE_COLUMN, page, value, FIELD_WIDTH) {
                            warn!("display: {:?}", e);
                        }
                    }
                    if let Err(e) = oled.flush() {
                        warn!("display: {:?}", e);
                    }
                    if REPORTS.try_send(report).is_err() {
                        warn!("console behind, report dropped");
                    }
                }
                Err(e) => error!("measurement failed: {:?}", e),
            }
        }
        Timer::after(POLL_INTERVAL).await;
    }
}
