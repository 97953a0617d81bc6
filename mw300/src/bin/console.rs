#![no_std]
#![no_main]


use core::cell::RefCell;
use core::fmt::Write;
use core::panic::PanicInfo;
use core::time::Duration;

use cortex_m::interrupt::Mutex;
use cortex_m_rt::entry;
use log::{LevelFilter, Log, Metadata, Record};

use mw300::Peripherals;
use mw300::clock::{Clock, ClockSource, Module, SfllConfig, SystemClockSource};
use mw300::flash::{Flash, ReadMode};
use mw300::flashc::{FlashInterface, Flashc};
use mw300::qspi::{Qspi, QspiConfig};
use mw300::tick;
use mw300::uart::{FifoConfig, Uart, UartConfig, UartId};


static CONSOLE: Mutex<RefCell<Option<Uart>>> = Mutex::new(RefCell::new(None));


struct ConsoleLogger;
impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        cortex_m::interrupt::free(|cs| {
            if let Some(uart) = CONSOLE.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(uart, "[{:>8}] {:<5} {}\r\n", tick::ticks(), record.level(), record.args());
            }
        });
    }

    fn flush(&self) {
    }
}

static LOGGER: ConsoleLogger = ConsoleLogger;


#[panic_handler]
fn panicked(reason: &PanicInfo) -> ! {
    cortex_m::interrupt::free(|cs| {
        if let Some(uart) = CONSOLE.borrow(cs).borrow_mut().as_mut() {
            let _ = write!(uart, "\r\nPANIC: {}\r\n", reason);
        }
    });

    loop {
        cortex_m::asm::wfi();
    }
}


fn bring_up_clocks(clock: &mut Clock) {
    if clock.enable_sfll(&SfllConfig::default()).is_ok()
            && clock.wait_clock_ready(ClockSource::Sfll).is_ok() {
        clock.set_system_clock_source(SystemClockSource::Sfll);
    } else {
        clock.disable_sfll();
        clock.set_system_clock_source(SystemClockSource::Rc32m);
    }
}


fn log_flash(flashc: &mut Flashc, qspi: Qspi) {
    flashc.select_interface(FlashInterface::Qspi);

    let mut flash = Flash::new(qspi);
    match flash.detect() {
        Ok(device) => {
            log::info!("{} sectors of {} bytes", device.sector_count(), device.sector_size);
            match flash.unique_id() {
                Ok(id) => log::info!("unique ID {:016X}", id),
                Err(e) => log::warn!("reading unique ID failed: {}", e),
            }
            match flash.read_word(ReadMode::Fast, 0) {
                Ok(word) => log::debug!("first word {:08X}", word),
                Err(e) => log::warn!("reading flash failed: {}", e),
            }
        },
        Err(e) => log::error!("flash detection failed: {}", e),
    }

    flashc.select_interface(FlashInterface::Flashc);
}


#[entry]
fn main() -> ! {
    let peripherals = Peripherals::take()
        .expect("peripherals already taken?!");
    let mut core_peripherals = cortex_m::Peripherals::take()
        .expect("core peripherals already taken?!");

    let mut clock = Clock::new(peripherals.pmu, peripherals.rc32m);
    bring_up_clocks(&mut clock);
    let system_hz = clock.system_clock_hz();

    let mut uart = Uart::new(UartId::Uart0, peripherals.uart0);
    let console_ready = clock.enable_module(Module::Uart0).is_ok()
        && uart.init(&mut clock, &UartConfig::default()).is_ok();
    if console_ready {
        uart.fifo_config(&FifoConfig::default());
        uart.enable();
        cortex_m::interrupt::free(|cs| {
            CONSOLE.borrow(cs).replace(Some(uart));
        });
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    }

    tick::enable_tick_clock(&mut core_peripherals.SYST, system_hz)
        .expect("SysTick setup failed");

    log::info!("mw300 console up, system clock {} Hz", system_hz);
    log::info!("last reset cause: {:?}", clock.last_reset_cause());

    let qspi_ready = clock.enable_module(Module::Qspi0).is_ok();
    let mut qspi = Qspi::new(peripherals.qspi);
    if qspi_ready && qspi.init(&QspiConfig::default()).is_ok() {
        let mut flashc = Flashc::new(peripherals.flashc);
        log_flash(&mut flashc, qspi);
    }

    let mut seconds: u32 = 0;
    loop {
        tick::delay(Duration::from_secs(1));
        seconds = seconds.wrapping_add(1);
        log::trace!("alive for {} s", seconds);
    }
}
