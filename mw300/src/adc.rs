//! General purpose ADC.


use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::error::{poll_until, Error, WaitFor};
use crate::regs::StaticRef;
use crate::regs::adc::{ANA, CAL, CHAN, CLKRST, CMD, CONFIG, INT, PWR, RESULT, STATUS, AdcRegisters};


/// Polls spent waiting for a conversion result.
pub const DATA_POLLS: u32 = 100_000;

/// Polls spent waiting for self-calibration to finish.
pub const CALIBRATION_POLLS: u32 = 1_000_000;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Resolution {
    Bits10,
    Bits12,
    Bits14,
    Bits16,
}
impl Resolution {
    pub fn bits(self) -> u32 {
        match self {
            Self::Bits10 => 10,
            Self::Bits12 => 12,
            Self::Bits14 => 14,
            Self::Bits16 => 16,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Reference {
    Internal1V8,
    Internal1V2,
    External,
}
impl Reference {
    /// The reference voltage in millivolts; `None` for an external reference.
    pub fn millivolts(self) -> Option<u32> {
        match self {
            Self::Internal1V8 => Some(1800),
            Self::Internal1V2 => Some(1200),
            Self::External => None,
        }
    }
}


/// Input buffer gain.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Gain {
    Half,
    Unity,
    Double,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum InputMode {
    SingleEnded,
    Differential,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AdcConfig {
    pub resolution: Resolution,
    pub reference: Reference,
    pub gain: Gain,
    pub input_mode: InputMode,
    pub input_buffer: bool,

    /// Internal clock divider, 1..=63.
    pub clock_divider: u32,

    pub continuous: bool,
}
impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Bits16,
            reference: Reference::Internal1V2,
            gain: Gain::Unity,
            input_mode: InputMode::SingleEnded,
            input_buffer: false,
            clock_divider: 32,
            continuous: false,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CalibrationReference {
    Internal,
    External,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AdcInterrupt {
    Ready,
    GainSaturation,
    OffsetSaturation,
    DataSaturation,
    FifoOverrun,
    FifoUnderrun,
}
impl AdcInterrupt {
    fn field(self) -> Field<u32, INT::Register> {
        match self {
            Self::Ready => INT::RDY,
            Self::GainSaturation => INT::GAINSAT,
            Self::OffsetSaturation => INT::OFFSAT,
            Self::DataSaturation => INT::DATASAT,
            Self::FifoOverrun => INT::FIFO_OVERRUN,
            Self::FifoUnderrun => INT::FIFO_UNDERRUN,
        }
    }
}


/// Converts a raw conversion result to millivolts at the ADC input pin.
pub fn raw_to_millivolts(raw: i16, resolution: Resolution, reference_mv: u32, gain: Gain) -> i32 {
    let full_scale = 1i64 << (resolution.bits() - 1);
    let at_converter = i64::from(raw) * i64::from(reference_mv) / full_scale;
    let at_pin = match gain {
        Gain::Half => at_converter * 2,
        Gain::Unity => at_converter,
        Gain::Double => at_converter / 2,
    };
    at_pin as i32
}


pub struct Adc {
    registers: StaticRef<AdcRegisters>,
}
impl Adc {
    pub fn new(registers: StaticRef<AdcRegisters>) -> Self {
        Self { registers }
    }

    pub fn init(&mut self, config: &AdcConfig) -> Result<(), Error> {
        if !(1..=0x3F).contains(&config.clock_divider) {
            return Err(Error::InvalidParameter("ADC clock divider"));
        }
        let regs = &*self.registers;

        let resolution = match config.resolution {
            Resolution::Bits10 => ANA::RES_SEL::Bits10,
            Resolution::Bits12 => ANA::RES_SEL::Bits12,
            Resolution::Bits14 => ANA::RES_SEL::Bits14,
            Resolution::Bits16 => ANA::RES_SEL::Bits16,
        };
        let reference = match config.reference {
            Reference::Internal1V8 => ANA::VREF_SEL::Internal18,
            Reference::Internal1V2 => ANA::VREF_SEL::Internal12,
            Reference::External => ANA::VREF_SEL::External,
        };
        let gain = match config.gain {
            Gain::Half => ANA::INBUF_GAIN::Half,
            Gain::Unity => ANA::INBUF_GAIN::Unity,
            Gain::Double => ANA::INBUF_GAIN::Double,
        };
        let mode = match config.input_mode {
            InputMode::SingleEnded => ANA::SINGLEDIFF::SingleEnded,
            InputMode::Differential => ANA::SINGLEDIFF::Differential,
        };
        regs.ana.modify(
            resolution
            + reference
            + gain
            + mode
            + ANA::INBUF_EN.val(u32::from(config.input_buffer))
        );
        regs.clkrst.modify(CLKRST::INT_CLK_DIV.val(config.clock_divider));
        regs.config.modify(CONFIG::CONT_CONV.val(u32::from(config.continuous)));
        Ok(())
    }

    pub fn enable(&mut self) {
        self.registers.pwr.modify(PWR::GLOBAL_EN::SET);
    }

    pub fn disable(&mut self) {
        self.registers.pwr.modify(PWR::GLOBAL_EN::CLEAR);
    }

    /// Pulses the soft reset.
    pub fn reset(&mut self) {
        self.registers.clkrst.modify(CLKRST::SOFT_RST::SET);
        self.registers.clkrst.modify(CLKRST::SOFT_RST::CLEAR);
    }

    /// Selects the positive and negative inputs, 0..=15 each.
    pub fn set_channel(&mut self, positive: u8, negative: u8) -> Result<(), Error> {
        if positive > 0x0F || negative > 0x0F {
            return Err(Error::InvalidParameter("ADC channel"));
        }
        self.registers.chan.write(
            CHAN::POS_SEL.val(positive.into())
            + CHAN::NEG_SEL.val(negative.into())
        );
        Ok(())
    }

    pub fn start_conversion(&mut self) {
        self.registers.cmd.modify(CMD::CONV_START::SET);
    }

    pub fn stop_conversion(&mut self) {
        self.registers.cmd.modify(CMD::CONV_START::CLEAR);
    }

    /// Waits for a conversion result, returns it and acknowledges it.
    pub fn read_raw(&mut self) -> Result<i16, Error> {
        let regs = &*self.registers;
        poll_until(DATA_POLLS, WaitFor::AdcData, || regs.irsr.is_set(INT::RDY))?;
        let raw = regs.result.read(RESULT::DATA) as u16 as i16;
        regs.icr.write(INT::RDY::SET);
        Ok(raw)
    }

    pub fn set_interrupt_mask(&mut self, interrupt: AdcInterrupt, masked: bool) {
        self.registers.imr.modify(interrupt.field().val(u32::from(masked)));
    }

    pub fn interrupt_status(&self, interrupt: AdcInterrupt) -> bool {
        self.registers.isr.is_set(interrupt.field())
    }

    pub fn clear_interrupt(&mut self, interrupt: AdcInterrupt) {
        self.registers.icr.write(interrupt.field().val(1));
    }

    /// Runs the offset self-calibration and switches conversions over to its result.
    pub fn self_calibration(&mut self, reference: CalibrationReference) -> Result<(), Error> {
        let regs = &*self.registers;
        let vref = match reference {
            CalibrationReference::Internal => CONFIG::CAL_VREF_SEL::Internal,
            CalibrationReference::External => CONFIG::CAL_VREF_SEL::External,
        };
        regs.config.modify(vref);
        regs.config.modify(CONFIG::CAL_DATA_RST::SET);
        regs.config.modify(CONFIG::CAL_DATA_RST::CLEAR);

        regs.cmd.modify(CMD::CAL_START::SET);
        poll_until(CALIBRATION_POLLS, WaitFor::Calibration, || !regs.status.is_set(STATUS::ACT))?;
        regs.cmd.modify(CMD::CAL_START::CLEAR);

        regs.config.modify(CONFIG::CAL_DATA_SEL::SelfCalibrated);
        log::debug!(
            "ADC self-calibration: offset {:#06X}, gain {:#06X}",
            regs.offset_cal.read(CAL::SELF_CAL), regs.gain_cal.read(CAL::SELF_CAL),
        );
        Ok(())
    }

    /// Loads user calibration values and switches conversions over to them.
    pub fn set_calibration(&mut self, offset: i16, gain: i16) {
        let regs = &*self.registers;
        regs.offset_cal.modify(CAL::USER_CAL.val(u32::from(offset as u16)));
        regs.gain_cal.modify(CAL::USER_CAL.val(u32::from(gain as u16)));
        regs.config.modify(CONFIG::CAL_DATA_SEL::User);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{peek, poke, ram_block};

    #[test]
    fn init_programs_analog_settings() {
        let mut adc = Adc::new(ram_block());
        let config = AdcConfig {
            resolution: Resolution::Bits12,
            reference: Reference::Internal1V8,
            gain: Gain::Double,
            input_mode: InputMode::Differential,
            input_buffer: true,
            clock_divider: 8,
            continuous: true,
        };
        adc.init(&config).unwrap();
        let ana = &adc.registers.ana;
        assert_eq!(ana.read(ANA::RES_SEL), 1);
        assert_eq!(ana.read(ANA::VREF_SEL), 0);
        assert_eq!(ana.read(ANA::INBUF_GAIN), 2);
        assert!(ana.is_set(ANA::INBUF_EN));
        assert!(ana.is_set(ANA::SINGLEDIFF));
        assert_eq!(adc.registers.clkrst.read(CLKRST::INT_CLK_DIV), 8);
        assert!(adc.registers.config.is_set(CONFIG::CONT_CONV));

        let bad = AdcConfig { clock_divider: 64, ..AdcConfig::default() };
        assert_eq!(adc.init(&bad), Err(Error::InvalidParameter("ADC clock divider")));
    }

    #[test]
    fn channel_selection() {
        let mut adc = Adc::new(ram_block());
        adc.set_channel(3, 9).unwrap();
        assert_eq!(peek(&adc.registers.chan), 0x93);
        assert!(adc.set_channel(16, 0).is_err());
    }

    #[test]
    fn read_raw_waits_and_acknowledges() {
        let mut adc = Adc::new(ram_block());
        assert_eq!(adc.read_raw(), Err(Error::Timeout(WaitFor::AdcData)));

        poke(&adc.registers.irsr, 1);
        poke(&adc.registers.result, 0xFC00);
        assert_eq!(adc.read_raw(), Ok(-1024));
        assert_eq!(peek(&adc.registers.icr), 1);
    }

    #[test]
    fn self_calibration_selects_calibrated_data() {
        let mut adc = Adc::new(ram_block());
        adc.set_calibration(-2, 0x4000);
        assert!(!adc.registers.config.is_set(CONFIG::CAL_DATA_SEL));
        assert_eq!(adc.registers.offset_cal.read(CAL::USER_CAL), 0xFFFE);
        assert_eq!(adc.registers.gain_cal.read(CAL::USER_CAL), 0x4000);

        adc.self_calibration(CalibrationReference::External).unwrap();
        assert!(adc.registers.config.is_set(CONFIG::CAL_DATA_SEL));
        assert!(adc.registers.config.is_set(CONFIG::CAL_VREF_SEL));
        assert!(!adc.registers.config.is_set(CONFIG::CAL_DATA_RST));
    }

    #[test]
    fn self_calibration_times_out() {
        let mut adc = Adc::new(ram_block());
        poke(&adc.registers.status, 1);
        assert_eq!(
            adc.self_calibration(CalibrationReference::Internal),
            Err(Error::Timeout(WaitFor::Calibration)),
        );
        assert!(!adc.registers.config.is_set(CONFIG::CAL_DATA_SEL));
    }

    #[test]
    fn interrupts() {
        let mut adc = Adc::new(ram_block());
        adc.set_interrupt_mask(AdcInterrupt::DataSaturation, true);
        adc.set_interrupt_mask(AdcInterrupt::FifoOverrun, true);
        assert_eq!(peek(&adc.registers.imr), 0x18);
        adc.set_interrupt_mask(AdcInterrupt::FifoOverrun, false);
        assert_eq!(peek(&adc.registers.imr), 0x08);

        poke(&adc.registers.isr, 0x02);
        assert!(adc.interrupt_status(AdcInterrupt::GainSaturation));
        assert!(!adc.interrupt_status(AdcInterrupt::Ready));
        adc.clear_interrupt(AdcInterrupt::OffsetSaturation);
        assert_eq!(peek(&adc.registers.icr), 0x04);
    }

    #[test]
    fn power_and_conversion_control() {
        let mut adc = Adc::new(ram_block());
        adc.enable();
        adc.start_conversion();
        assert!(adc.registers.pwr.is_set(PWR::GLOBAL_EN));
        assert!(adc.registers.cmd.is_set(CMD::CONV_START));
        adc.stop_conversion();
        adc.disable();
        adc.reset();
        assert_eq!(peek(&adc.registers.pwr), 0);
        assert_eq!(peek(&adc.registers.cmd), 0);
        assert!(!adc.registers.clkrst.is_set(CLKRST::SOFT_RST));
    }

    #[test]
    fn millivolt_conversion() {
        assert_eq!(raw_to_millivolts(2048, Resolution::Bits12, 1800, Gain::Unity), 1800);
        assert_eq!(raw_to_millivolts(1024, Resolution::Bits12, 1800, Gain::Half), 1800);
        assert_eq!(raw_to_millivolts(-1024, Resolution::Bits12, 1800, Gain::Unity), -900);
        assert_eq!(raw_to_millivolts(16384, Resolution::Bits16, 1200, Gain::Double), 300);
        assert_eq!(Reference::External.millivolts(), None);
    }
}
