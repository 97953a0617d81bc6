//! General purpose DAC with two 10-bit channels.
//!
//! Channel A can generate triangle and sine waves on its own; channel B can generate noise.


use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::ReadWrite;

use crate::error::{poll_until, Error, WaitFor};
use crate::regs::StaticRef;
use crate::regs::dac::{CHAN_CTRL, CLK, CTRL, DATA, INT, RST, STATUS, DacRegisters};


/// Polls spent waiting for a channel to take up its data word.
pub const DATA_VALID_POLLS: u32 = 100_000;

/// Largest value a channel accepts.
pub const MAX_DATA: u16 = 0x3FF;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DacChannel {
    A,
    B,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WaveMode {
    /// Output follows the data register.
    Normal,
    Triangle,
    Sine,
    Noise,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OutputRange {
    Low,
    Medium,
    High,
    Full,
}


/// When a new data word reaches the output.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TimingMode {
    /// On the next conversion clock.
    Correlated,

    /// As soon as it is written.
    Immediate,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DacReference {
    Internal,
    External,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OutputMode {
    SingleEnded,
    Differential,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DacConfig {
    pub reference: DacReference,
    pub output_mode: OutputMode,
}
impl Default for DacConfig {
    fn default() -> Self {
        Self {
            reference: DacReference::Internal,
            output_mode: OutputMode::SingleEnded,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DacChannelConfig {
    pub wave: WaveMode,
    pub range: OutputRange,
    pub output_enable: bool,
    pub timing: TimingMode,
}
impl Default for DacChannelConfig {
    fn default() -> Self {
        Self {
            wave: WaveMode::Normal,
            range: OutputRange::Full,
            output_enable: true,
            timing: TimingMode::Correlated,
        }
    }
}


/// Triangle wave shape on channel A. The data register holds the base level.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TriangleConfig {
    /// Only the rising half of each period.
    pub half_wave: bool,

    /// Maximum amplitude selection, 0..=15.
    pub max_amplitude: u8,

    /// Step size selection, 0..=3.
    pub step: u8,

    pub base: u16,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DacInterrupt {
    ReadyA,
    ReadyB,
    TimeoutA,
    TimeoutB,
    TriangleOverflow,
}
impl DacInterrupt {
    fn field(self) -> Field<u32, INT::Register> {
        match self {
            Self::ReadyA => INT::A_RDY,
            Self::ReadyB => INT::B_RDY,
            Self::TimeoutA => INT::A_TO,
            Self::TimeoutB => INT::B_TO,
            Self::TriangleOverflow => INT::TRIA_OVFL,
        }
    }
}


pub struct Dac {
    registers: StaticRef<DacRegisters>,
}
impl Dac {
    pub fn new(registers: StaticRef<DacRegisters>) -> Self {
        Self { registers }
    }

    fn control(&self, channel: DacChannel) -> &ReadWrite<u32, CHAN_CTRL::Register> {
        match channel {
            DacChannel::A => &self.registers.actrl,
            DacChannel::B => &self.registers.bctrl,
        }
    }

    fn data(&self, channel: DacChannel) -> &ReadWrite<u32, DATA::Register> {
        match channel {
            DacChannel::A => &self.registers.adata,
            DacChannel::B => &self.registers.bdata,
        }
    }

    pub fn init(&mut self, config: &DacConfig) {
        let reference = match config.reference {
            DacReference::Internal => CTRL::REF_SEL::Internal,
            DacReference::External => CTRL::REF_SEL::External,
        };
        let mode = match config.output_mode {
            OutputMode::SingleEnded => CTRL::OUTPUT_MODE::SingleEnded,
            OutputMode::Differential => CTRL::OUTPUT_MODE::Differential,
        };
        self.registers.ctrl.modify(reference + mode);
    }

    pub fn channel_config(&mut self, channel: DacChannel, config: &DacChannelConfig) -> Result<(), Error> {
        let wave = match (channel, config.wave) {
            (_, WaveMode::Normal) => CHAN_CTRL::WAVE::Normal,
            (DacChannel::A, WaveMode::Triangle) => CHAN_CTRL::WAVE::Triangle,
            (DacChannel::A, WaveMode::Sine) => CHAN_CTRL::WAVE::Sine,
            (DacChannel::B, WaveMode::Noise) => CHAN_CTRL::WAVE::Noise,
            _ => return Err(Error::InvalidParameter("DAC wave mode for channel")),
        };
        let range = match config.range {
            OutputRange::Low => 0,
            OutputRange::Medium => 1,
            OutputRange::High => 2,
            OutputRange::Full => 3,
        };
        let timing = match config.timing {
            TimingMode::Correlated => CHAN_CTRL::TIME_MODE::Correlated,
            TimingMode::Immediate => CHAN_CTRL::TIME_MODE::Immediate,
        };
        self.control(channel).modify(
            wave
            + timing
            + CHAN_CTRL::RANGE.val(range)
            + CHAN_CTRL::IO_EN.val(u32::from(config.output_enable))
        );
        Ok(())
    }

    pub fn enable_channel(&mut self, channel: DacChannel) {
        self.control(channel).modify(CHAN_CTRL::EN::SET);
    }

    pub fn disable_channel(&mut self, channel: DacChannel) {
        self.control(channel).modify(CHAN_CTRL::EN::CLEAR);
    }

    /// Pulses the channel soft reset.
    pub fn reset_channel(&mut self, channel: DacChannel) {
        let bit = match channel {
            DacChannel::A => RST::A_SOFT_RST,
            DacChannel::B => RST::B_SOFT_RST,
        };
        self.registers.rst.modify(bit.val(1));
        self.registers.rst.modify(bit.val(0));
    }

    pub fn set_data(&mut self, channel: DacChannel, value: u16) -> Result<(), Error> {
        if value > MAX_DATA {
            return Err(Error::InvalidParameter("DAC data"));
        }
        self.data(channel).write(DATA::DATA.val(value.into()));
        Ok(())
    }

    /// Waits until the channel reports its data word as valid.
    pub fn wait_data_valid(&self, channel: DacChannel) -> Result<(), Error> {
        let bit = match channel {
            DacChannel::A => STATUS::A_DV,
            DacChannel::B => STATUS::B_DV,
        };
        let status = &self.registers.status;
        poll_until(DATA_VALID_POLLS, WaitFor::DacDataValid, || status.is_set(bit))
    }

    /// Sets the conversion clock divider selection, 0..=3.
    pub fn set_clock_divider(&mut self, divider: u8) -> Result<(), Error> {
        if divider > 3 {
            return Err(Error::InvalidParameter("DAC clock divider"));
        }
        self.registers.clk.modify(CLK::CLK_CTRL.val(divider.into()));
        Ok(())
    }

    pub fn triangle_config(&mut self, config: &TriangleConfig) -> Result<(), Error> {
        if config.max_amplitude > 0x0F {
            return Err(Error::InvalidParameter("triangle amplitude"));
        }
        if config.step > 3 {
            return Err(Error::InvalidParameter("triangle step"));
        }
        self.set_data(DacChannel::A, config.base)?;
        self.registers.actrl.modify(
            CHAN_CTRL::TRIA_HALF.val(u32::from(config.half_wave))
            + CHAN_CTRL::TRIA_MAMP_SEL.val(config.max_amplitude.into())
            + CHAN_CTRL::TRIA_STEP_SEL.val(config.step.into())
        );
        Ok(())
    }

    pub fn set_interrupt_mask(&mut self, interrupt: DacInterrupt, masked: bool) {
        self.registers.imr.modify(interrupt.field().val(u32::from(masked)));
    }

    pub fn interrupt_status(&self, interrupt: DacInterrupt) -> bool {
        self.registers.isr.is_set(interrupt.field())
    }

    pub fn clear_interrupt(&mut self, interrupt: DacInterrupt) {
        self.registers.icr.write(interrupt.field().val(1));
    }
}
