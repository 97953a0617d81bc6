//! Bandgap voltage reference.
//!
//! The reference itself has a power-down bit and a ready flag of its own; its trim and output
//! routing sit in the PMU analog group.


use tock_registers::interfaces::{ReadWriteable, Readable};

use crate::error::{poll_until, Error, WaitFor};
use crate::regs::StaticRef;
use crate::regs::bg::{BgRegisters, CTRL, STATUS};
use crate::regs::pmu::{ANA_GRP_CTRL1, PmuRegisters};


/// Polls spent waiting for the reference to settle after power-up.
pub const READY_POLLS: u32 = 100_000;


/// Where the bandgap output is routed.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum BandgapOutput {
    Disconnected,
    Adc,
    Dac,
    Acomp,
}


pub struct Bandgap {
    bg: StaticRef<BgRegisters>,
    pmu: StaticRef<PmuRegisters>,
}
impl Bandgap {
    pub fn new(bg: StaticRef<BgRegisters>, pmu: StaticRef<PmuRegisters>) -> Self {
        Self { bg, pmu }
    }

    pub fn power_up(&mut self) {
        self.bg.ctrl.modify(CTRL::PD::CLEAR);
    }

    pub fn power_down(&mut self) {
        self.bg.ctrl.modify(CTRL::PD::SET);
    }

    pub fn is_ready(&self) -> bool {
        self.bg.status.is_set(STATUS::RDY)
    }

    pub fn wait_ready(&self) -> Result<(), Error> {
        poll_until(READY_POLLS, WaitFor::BandgapReady, || self.is_ready())
    }

    pub fn set_output(&mut self, output: BandgapOutput) {
        let value = match output {
            BandgapOutput::Disconnected => 0,
            BandgapOutput::Adc => 1,
            BandgapOutput::Dac => 2,
            BandgapOutput::Acomp => 3,
        };
        self.pmu.ana_grp_ctrl1.modify(ANA_GRP_CTRL1::BG_SEL.val(value));
    }

    /// Doubles the reference output voltage.
    pub fn set_gain_x2(&mut self, enable: bool) {
        self.pmu.ana_grp_ctrl1.modify(ANA_GRP_CTRL1::GAINX2.val(u32::from(enable)));
    }

    /// Sets the 3-bit trim code.
    pub fn set_trim(&mut self, trim: u8) -> Result<(), Error> {
        if trim > 0x07 {
            return Err(Error::InvalidParameter("bandgap trim"));
        }
        self.pmu.ana_grp_ctrl1.modify(ANA_GRP_CTRL1::BG_CTRL.val(trim.into()));
        Ok(())
    }
}
