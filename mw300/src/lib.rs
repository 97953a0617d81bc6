//! Register-level drivers for the Marvell MW300 (88MW30x/mw320) microcontroller.
//!
//! Every driver wraps one register block handed out by [`Peripherals`] and busy-waits with a
//! bounded number of polls, reporting [`Error::Timeout`] when the hardware does not respond.


#![cfg_attr(not(test), no_std)]


pub mod acomp;
pub mod adc;
pub mod bandgap;
pub mod clock;
pub mod dac;
pub mod error;
pub mod flash;
pub mod flashc;
pub mod qspi;
pub mod regs;
#[cfg(test)]
mod testing;
pub mod tick;
pub mod uart;


pub use crate::error::{Error, WaitFor};
pub use crate::regs::Peripherals;
