//! Flash controller pad routing.


use tock_registers::interfaces::{ReadWriteable, Readable};

use crate::regs::StaticRef;
use crate::regs::flashc::{FCCR, FlashcRegisters};


/// Which block drives the serial flash pads.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FlashInterface {
    /// Software-driven transactions through the QSPI controller.
    Qspi,

    /// Memory-mapped execute-in-place through the flash controller.
    Flashc,
}


pub struct Flashc {
    registers: StaticRef<FlashcRegisters>,
}
impl Flashc {
    pub fn new(registers: StaticRef<FlashcRegisters>) -> Self {
        Self { registers }
    }

    pub fn select_interface(&mut self, interface: FlashInterface) {
        let value = match interface {
            FlashInterface::Qspi => FCCR::FLASHC_PAD_EN::Qspi,
            FlashInterface::Flashc => FCCR::FLASHC_PAD_EN::Flashc,
        };
        self.registers.fccr.modify(value);
    }

    pub fn interface(&self) -> FlashInterface {
        if self.registers.fccr.is_set(FCCR::FLASHC_PAD_EN) {
            FlashInterface::Flashc
        } else {
            FlashInterface::Qspi
        }
    }
}
