//! Millisecond time base driven by SysTick.


use core::time::Duration;

use cortex_m::peripheral::SYST;
use vcell::VolatileCell;

use crate::error::Error;


/// Milliseconds since the tick clock was started, wrapping around.
struct TickCounter {
    millis: VolatileCell<u32>,
}
impl TickCounter {
    const fn new() -> Self {
        Self { millis: VolatileCell::new(0) }
    }

    #[inline(always)]
    fn get(&self) -> u32 {
        self.millis.get()
    }

    #[inline(always)]
    fn advance(&self) {
        self.millis.set(self.millis.get().wrapping_add(1))
    }
}
// only the SysTick handler writes to the counter
unsafe impl Sync for TickCounter {
}


static TICKS: TickCounter = TickCounter::new();


#[cfg(feature = "rt")]
#[cortex_m_rt::exception]
fn SysTick() {
    TICKS.advance();
}


/// The SysTick reload value giving one interrupt per millisecond.
pub fn reload_value(core_hz: u32) -> Result<u32, Error> {
    let per_milli = core_hz / 1000;
    if per_milli == 0 || per_milli > 0x0100_0000 {
        return Err(Error::InvalidParameter("core clock for SysTick"));
    }
    Ok(per_milli - 1)
}


pub fn enable_tick_clock(syst: &mut SYST, core_hz: u32) -> Result<(), Error> {
    const SYST_CSR_ENABLE_ENABLED: u32 = 1 << 0;
    const SYST_CSR_TICKINT_ENABLED: u32 = 1 << 1;
    const SYST_CSR_CLKSOURCE_CORE: u32 = 1 << 2;

    let reload = reload_value(core_hz)?;
    unsafe {
        syst.rvr.write(reload);
        syst.cvr.write(0);
        syst.csr.write(
            SYST_CSR_ENABLE_ENABLED
            | SYST_CSR_TICKINT_ENABLED
            | SYST_CSR_CLKSOURCE_CORE
        );
    }
    Ok(())
}


/// Milliseconds since [`enable_tick_clock`], wrapping around after about 49 days.
#[inline]
pub fn ticks() -> u32 {
    TICKS.get()
}


fn elapsed(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}


#[inline]
pub fn delay(duration: Duration) {
    let ms_u128 = duration.as_millis();
    let ms = if ms_u128 > u32::MAX.into() {
        u32::MAX
    } else {
        ms_u128 as u32
    };

    let start = ticks();
    while elapsed(start, ticks()) < ms {
        // nop
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_for_common_clocks() {
        assert_eq!(reload_value(200_000_000), Ok(199_999));
        assert_eq!(reload_value(32_000_000), Ok(31_999));
        assert!(reload_value(999).is_err());
        assert!(reload_value(u32::MAX).is_ok());
    }

    #[test]
    fn elapsed_survives_wraparound() {
        assert_eq!(elapsed(10, 25), 15);
        assert_eq!(elapsed(u32::MAX - 4, 5), 10);
    }

    #[test]
    fn counter_advances() {
        let counter = TickCounter::new();
        counter.advance();
        counter.advance();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn zero_delay_returns() {
        delay(Duration::ZERO);
    }
}
