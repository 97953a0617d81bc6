//! Memory-mapped register blocks of the MW300 peripherals.
//!
//! Each submodule declares the layout of one hardware block with `tock-registers` and the
//! address it lives at. [`Peripherals`] hands out one handle per block, once.


pub mod acomp;
pub mod adc;
pub mod bg;
pub mod dac;
pub mod flashc;
pub mod pmu;
pub mod qspi;
pub mod rc32m;
pub mod uart;


use core::ops::Deref;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};


/// A pointer to a register block that lives for the whole program.
pub struct StaticRef<T> {
    ptr: NonNull<T>,
}
impl<T> core::fmt::Debug for StaticRef<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticRef").field("ptr", &self.ptr).finish()
    }
}
impl<T> StaticRef<T> {
    /// Wraps a raw pointer to a register block.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to memory that is valid for the rest of the program.
    pub const unsafe fn new(ptr: *const T) -> Self {
        Self { ptr: NonNull::new_unchecked(ptr as *mut T) }
    }
}
impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for StaticRef<T> {
}
// register blocks are fixed hardware, not owned memory
unsafe impl<T> Send for StaticRef<T> {
}
impl<T> Deref for StaticRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }
}


static TAKEN: AtomicBool = AtomicBool::new(false);


/// All register blocks driven by this crate.
#[derive(Debug)]
pub struct Peripherals {
    pub pmu: StaticRef<pmu::PmuRegisters>,
    pub rc32m: StaticRef<rc32m::Rc32mRegisters>,
    pub bg: StaticRef<bg::BgRegisters>,
    pub flashc: StaticRef<flashc::FlashcRegisters>,
    pub qspi: StaticRef<qspi::QspiRegisters>,
    pub uart0: StaticRef<uart::UartRegisters>,
    pub uart1: StaticRef<uart::UartRegisters>,
    pub uart2: StaticRef<uart::UartRegisters>,
    pub adc: StaticRef<adc::AdcRegisters>,
    pub dac: StaticRef<dac::DacRegisters>,
    pub acomp: StaticRef<acomp::AcompRegisters>,
}
impl Peripherals {
    /// Returns the peripherals the first time it is called, `None` afterwards.
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(unsafe { Self::steal() })
        }
    }

    /// Returns the peripherals without checking whether they have been handed out before.
    ///
    /// # Safety
    ///
    /// Two owners of the same register block must not drive it concurrently.
    pub unsafe fn steal() -> Self {
        TAKEN.store(true, Ordering::Release);
        Self {
            pmu: pmu::PMU_BASE,
            rc32m: rc32m::RC32M_BASE,
            bg: bg::BG_BASE,
            flashc: flashc::FLASHC_BASE,
            qspi: qspi::QSPI_BASE,
            uart0: uart::UART0_BASE,
            uart1: uart::UART1_BASE,
            uart2: uart::UART2_BASE,
            adc: adc::ADC_BASE,
            dac: dac::DAC_BASE,
            acomp: acomp::ACOMP_BASE,
        }
    }
}
