//! Analog comparators.


use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::error::Error;
use crate::regs::StaticRef;
use crate::regs::acomp::{CTRL, INT, ROUTE, RST, STATUS, AcompRegisters};


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Comparator {
    Acomp0,
    Acomp1,
}
impl Comparator {
    fn index(self) -> usize {
        match self {
            Self::Acomp0 => 0,
            Self::Acomp1 => 1,
        }
    }
}


#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AcompConfig {
    /// Positive input selection, 0..=15.
    pub positive_input: u8,

    /// Negative input selection, 0..=15.
    pub negative_input: u8,

    /// Hysteresis on the positive input, 0..=7.
    pub positive_hysteresis: u8,

    /// Hysteresis on the negative input, 0..=7.
    pub negative_hysteresis: u8,

    /// Bias current selection, 0..=3.
    pub bias: u8,

    /// Warm-up time selection, 0..=3.
    pub warm_up: u8,

    /// Output level while the comparator is disabled.
    pub inactive_high: bool,

    pub invert_output: bool,

    /// Internal reference level, 0..=63.
    pub level: u8,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum InterruptTrigger {
    Edge { rising: bool, falling: bool },
    Level { active_high: bool },
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AcompInterrupt {
    /// The synchronized output.
    Output,

    /// The asynchronous output.
    AsyncOutput,
}
impl AcompInterrupt {
    fn field(self) -> Field<u32, INT::Register> {
        match self {
            Self::Output => INT::OUT,
            Self::AsyncOutput => INT::OUTA,
        }
    }
}


pub struct Acomp {
    registers: StaticRef<AcompRegisters>,
}
impl Acomp {
    pub fn new(registers: StaticRef<AcompRegisters>) -> Self {
        Self { registers }
    }

    pub fn init(&mut self, comparator: Comparator, config: &AcompConfig) -> Result<(), Error> {
        if config.positive_input > 0x0F || config.negative_input > 0x0F {
            return Err(Error::InvalidParameter("comparator input"));
        }
        if config.positive_hysteresis > 7 || config.negative_hysteresis > 7 {
            return Err(Error::InvalidParameter("comparator hysteresis"));
        }
        if config.bias > 3 || config.warm_up > 3 {
            return Err(Error::InvalidParameter("comparator bias or warm-up"));
        }
        if config.level > 0x3F {
            return Err(Error::InvalidParameter("comparator level"));
        }

        self.registers.ctrl[comparator.index()].modify(
            CTRL::POS_SEL.val(config.positive_input.into())
            + CTRL::NEG_SEL.val(config.negative_input.into())
            + CTRL::HYST_SELP.val(config.positive_hysteresis.into())
            + CTRL::HYST_SELN.val(config.negative_hysteresis.into())
            + CTRL::BIAS_PROG.val(config.bias.into())
            + CTRL::WARMTIME.val(config.warm_up.into())
            + CTRL::INACT_VAL.val(u32::from(config.inactive_high))
            + CTRL::GPIOINV.val(u32::from(config.invert_output))
            + CTRL::LEVEL_SEL.val(config.level.into())
            + CTRL::MUXEN::SET
        );
        Ok(())
    }

    pub fn enable(&mut self, comparator: Comparator) {
        self.registers.ctrl[comparator.index()].modify(CTRL::EN::SET);
    }

    pub fn disable(&mut self, comparator: Comparator) {
        self.registers.ctrl[comparator.index()].modify(CTRL::EN::CLEAR);
    }

    /// Pulses the soft reset of one comparator.
    pub fn reset(&mut self, comparator: Comparator) {
        let rst = &self.registers.rst[comparator.index()];
        rst.modify(RST::SOFT_RST::SET);
        rst.modify(RST::SOFT_RST::CLEAR);
    }

    /// The current comparator output.
    pub fn result(&self, comparator: Comparator) -> bool {
        self.registers.status[comparator.index()].is_set(STATUS::OUT)
    }

    /// Whether the comparator has warmed up and its output is meaningful.
    pub fn is_active(&self, comparator: Comparator) -> bool {
        self.registers.status[comparator.index()].is_set(STATUS::ACT)
    }

    /// Drives the comparator output onto its pin.
    pub fn route_output(&mut self, comparator: Comparator, enable: bool, synchronized: bool) {
        let select = if synchronized {
            ROUTE::OUTSEL::Synchronized
        } else {
            ROUTE::OUTSEL::Asynchronous
        };
        self.registers.route[comparator.index()].modify(select + ROUTE::PE.val(u32::from(enable)));
    }

    pub fn set_interrupt_mode(&mut self, comparator: Comparator, trigger: InterruptTrigger) {
        let value = match trigger {
            InterruptTrigger::Edge { rising, falling }
                => CTRL::EDGE_LEVL_SEL::Edge
                    + CTRL::RIE.val(u32::from(rising))
                    + CTRL::FIE.val(u32::from(falling)),
            InterruptTrigger::Level { active_high }
                => CTRL::EDGE_LEVL_SEL::Level
                    + CTRL::INT_ACT_HI.val(u32::from(active_high)),
        };
        self.registers.ctrl[comparator.index()].modify(value);
    }

    pub fn set_interrupt_mask(&mut self, comparator: Comparator, interrupt: AcompInterrupt, masked: bool) {
        self.registers.imr[comparator.index()].modify(interrupt.field().val(u32::from(masked)));
    }

    pub fn interrupt_status(&self, comparator: Comparator, interrupt: AcompInterrupt) -> bool {
        self.registers.isr[comparator.index()].is_set(interrupt.field())
    }

    pub fn clear_interrupt(&mut self, comparator: Comparator, interrupt: AcompInterrupt) {
        self.registers.icr[comparator.index()].write(interrupt.field().val(1));
    }
}
