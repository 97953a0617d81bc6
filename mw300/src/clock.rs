//! Clock tree management through the PMU.
//!
//! Covers the system clock multiplexer, the SFLL, the 32 kHz and 32 MHz oscillators with their
//! calibration engines, the audio PLL, per-module clock gates, dividers and source selects, and
//! the fractional dividers that feed the UARTs.


use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::error::{poll_until, Error, WaitFor};
use crate::regs::StaticRef;
use crate::regs::pmu::{
    AON_CLK_CTRL, AUPLL_CTRL0, AUPLL_CTRL1, CAU_CLK_SEL, CAU_CTRL, CLK_RDY, CLK_SRC, GPT_CTRL,
    MCU_CORE_CLK_DIV, PERI0_CLK_DIV, PERI1_CLK_DIV, PERI2_CLK_DIV, PERI3_CTRL, PERI_CLK_EN,
    PERI_CLK_SRC, PmuRegisters,
    RC32K_CTRL0, RC32K_CTRL1, RC32M_CTRL, SFLL_CTRL0, SFLL_CTRL1, UART_CLK_DIV, UART_CLK_SEL,
    WLAN_CTRL, XTAL32K_CTRL,
};
use crate::regs::rc32m::{self, Rc32mRegisters};
use crate::uart::UartId;


/// Frequency of the internal RC oscillator, assuming it has been calibrated.
pub const RC32M_FREQUENCY_HZ: u32 = 32_000_000;

/// Frequency of the main crystal.
pub const MAIN_XTAL_FREQUENCY_HZ: u32 = 38_400_000;

/// Polls spent waiting for an oscillator or the SFLL to become ready.
pub const CLOCK_READY_POLLS: u32 = 5_000_000;

/// Polls spent waiting for an RC calibration to finish.
pub const CALIBRATION_POLLS: u32 = 5_000_000;

/// Polls spent waiting for the RC32K calibration engine to drop its previous result.
const RC32K_RESTART_POLLS: u32 = 50_000;


/// The clock the Cortex-M4 core and buses run from.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SystemClockSource {
    Sfll,
    Rc32m,
    XtalRef,
}


/// An oscillator or PLL whose readiness can be queried.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ClockSource {
    Rc32k,
    Rc32m,
    Xtal32k,
    XtalRef,
    Sfll,
    Aupll,
    RefClockAudio,
    RefClockUsb,
}


/// A consumer of the main crystal reference that can request it from the WLAN subsystem.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ReferenceClock {
    System,
    Audio,
    Usb,
}


/// How the 32.768 kHz crystal pins are driven.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CrystalMode {
    /// A crystal is attached and the on-chip oscillator drives it.
    Internal,

    /// An external oscillator feeds the pin.
    External,
}


/// How an RC oscillator obtains its trim code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CalibrationMode {
    /// Let the hardware calibrate against its reference.
    Auto,

    /// Use the given code.
    Manual(u32),
}


/// Output frequency of the RC32M block.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rc32mOutput {
    Mhz16,
    Mhz32,
}


/// Reference clock of the SFLL.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SfllReference {
    Rc32m,
    MainXtal,
}


/// SFLL settings.
///
/// The output frequency is `reference * fb_div * 2 / ref_div`, then divided by `2^post_div`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SfllConfig {
    pub reference: SfllReference,
    pub ref_div: u32,
    pub fb_div: u32,
    pub kvco: u32,
    pub post_div: u32,
}
impl Default for SfllConfig {
    /// 200 MHz from the main crystal.
    fn default() -> Self {
        Self {
            reference: SfllReference::MainXtal,
            ref_div: 0x18,
            fb_div: 0x7D,
            kvco: 3,
            post_div: 1,
        }
    }
}


/// A peripheral whose clock can be gated or divided.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Module {
    Qspi0,
    Pdm,
    Gpio,
    Uart0,
    Uart1,
    Uart2,
    I2c0,
    I2c1,
    I2c2,
    Ssp0,
    Ssp1,
    Ssp2,
    Gpt0,
    Gpt1,
    Gpt2,
    Gpt3,
    Wdt,
    Sdio,
    Adc,
    Usbc,
    UsbcAhb,
    Rtc,
    Gau,
    AcompMclk,
    DacMclk,
    AdcMclk,
    BgMclk,
    Rc32mRef,
    Dma,
    Core,
    Apb0,
    Apb1,
    PmuClock,
    GptSample,
    Flashc,
}


/// The two fractional dividers UARTs can be clocked from.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UartClockSource {
    Slow,
    Fast,
}


/// A fractional divider: output = input / divisor * dividend.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClockFraction {
    pub dividend: u32,
    pub divisor: u32,
}
impl ClockFraction {
    pub const MAX_DIVIDEND: u32 = (1 << 11) - 1;
    pub const MAX_DIVISOR: u32 = (1 << 13) - 1;

    /// Applies the fraction to an input frequency.
    pub fn apply(&self, input_hz: u32) -> u32 {
        match input_hz.checked_div(self.divisor) {
            Some(q) => q.wrapping_mul(self.dividend),
            None => 0,
        }
    }
}


/// Clock feeding the RTC.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RtcClockSource {
    Rc32k,
    Xtal32k,
}


/// Clock feeding the GAU (analog units).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum GauClockSource {
    Sfll,
    Rc32m,
    XtalRef,
    Aupll,
}


/// Reference clock of the audio PLL.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AupllReference {
    Rc32m,
    RefClockAudio,
}


/// Audio PLL settings.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AupllConfig {
    /// Reference divider, 3..=10.
    pub ref_div: u32,

    /// Integer part of the feedback divider.
    pub fb_div: u32,

    /// Fractional part of the feedback divider, 20 bits.
    pub fract: u32,

    /// Charge pump current, 0..=3.
    pub icp: u32,

    /// Output divider pattern, 0..=2.
    pub post_div_pattern: u32,

    /// Output divider modulo.
    pub post_div_modulo: u32,

    pub vco_x2: bool,
    pub dither: bool,
}


/// Clock of a peripheral that can run from the audio PLL.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AudioClockSource {
    System,
    Aupll,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SspId {
    Ssp0,
    Ssp1,
    Ssp2,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum GptId {
    Gpt0,
    Gpt1,
    Gpt2,
    Gpt3,
}


/// Internal clock of a general-purpose timer.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum GptClockSource {
    System,
    Rc32k,
    Xtal32k,
    Rc32m,
    XtalRef,
}


/// Interrupts raised by the RC32M calibration engine.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rc32mInterrupt {
    CalibrationDone,
    ClockReady,
}
impl Rc32mInterrupt {
    fn field(self) -> Field<u32, rc32m::INT::Register> {
        match self {
            Self::CalibrationDone => rc32m::INT::CALDON,
            Self::ClockReady => rc32m::INT::CKRDY,
        }
    }
}


/// Why the chip last came out of reset. Several causes can be flagged at once.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ResetCause {
    pub brownout_vbat: bool,
    pub brownout_v12: bool,
    pub brownout_av18: bool,
    pub system_reset_request: bool,
    pub lockup: bool,
    pub watchdog: bool,
}
impl ResetCause {
    pub const ALL: Self = Self {
        brownout_vbat: true,
        brownout_v12: true,
        brownout_av18: true,
        system_reset_request: true,
        lockup: true,
        watchdog: true,
    };

    fn from_bits(bits: u32) -> Self {
        Self {
            brownout_vbat: bits & (1 << 0) != 0,
            brownout_v12: bits & (1 << 1) != 0,
            brownout_av18: bits & (1 << 2) != 0,
            system_reset_request: bits & (1 << 3) != 0,
            lockup: bits & (1 << 4) != 0,
            watchdog: bits & (1 << 5) != 0,
        }
    }

    fn bits(&self) -> u32 {
        u32::from(self.brownout_vbat)
            | u32::from(self.brownout_v12) << 1
            | u32::from(self.brownout_av18) << 2
            | u32::from(self.system_reset_request) << 3
            | u32::from(self.lockup) << 4
            | u32::from(self.watchdog) << 5
    }
}


/// Active-low gate bit in PERI_CLK_EN for a module, if it has one.
fn peripheral_gate(module: Module) -> Option<Field<u32, PERI_CLK_EN::Register>> {
    let field = match module {
        Module::Qspi0 => PERI_CLK_EN::QSPI0_CLK_EN,
        Module::Pdm => PERI_CLK_EN::PDM_CLK_EN,
        Module::Gpio => PERI_CLK_EN::GPIO_CLK_EN,
        Module::Uart0 => PERI_CLK_EN::UART0_CLK_EN,
        Module::Uart1 => PERI_CLK_EN::UART1_CLK_EN,
        Module::Uart2 => PERI_CLK_EN::UART2_CLK_EN,
        Module::I2c0 => PERI_CLK_EN::I2C0_CLK_EN,
        Module::I2c1 => PERI_CLK_EN::I2C1_CLK_EN,
        Module::I2c2 => PERI_CLK_EN::I2C2_CLK_EN,
        Module::Ssp0 => PERI_CLK_EN::SSP0_CLK_EN,
        Module::Ssp1 => PERI_CLK_EN::SSP1_CLK_EN,
        Module::Ssp2 => PERI_CLK_EN::SSP2_CLK_EN,
        Module::Gpt0 => PERI_CLK_EN::GPT0_CLK_EN,
        Module::Gpt1 => PERI_CLK_EN::GPT1_CLK_EN,
        Module::Gpt2 => PERI_CLK_EN::GPT2_CLK_EN,
        Module::Gpt3 => PERI_CLK_EN::GPT3_CLK_EN,
        Module::Wdt => PERI_CLK_EN::WDT_CLK_EN,
        Module::Sdio => PERI_CLK_EN::SDIO_CLK_EN,
        Module::Adc => PERI_CLK_EN::ADC_CLK_EN,
        Module::Usbc => PERI_CLK_EN::USBC_CLK_EN,
        Module::UsbcAhb => PERI_CLK_EN::USBC_AHB_CLK_EN,
        _ => return None,
    };
    Some(field)
}


/// Checks that a divider fits a field of `bits` bits and is not zero.
fn check_divider(divider: u32, bits: u32) -> Result<u32, Error> {
    if divider == 0 || divider >= (1 << bits) {
        Err(Error::InvalidParameter("clock divider"))
    } else {
        Ok(divider)
    }
}


/// The PMU clock controls together with the RC32M block they depend on.
pub struct Clock {
    pmu: StaticRef<PmuRegisters>,
    rc32m: StaticRef<Rc32mRegisters>,
}
impl Clock {
    pub fn new(pmu: StaticRef<PmuRegisters>, rc32m: StaticRef<Rc32mRegisters>) -> Self {
        Self { pmu, rc32m }
    }

    /// Switches the system clock, passing through the intermediate multiplexer states the
    /// hardware requires.
    pub fn set_system_clock_source(&mut self, source: SystemClockSource) {
        let pmu = &*self.pmu;
        let sel = || pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL);
        let set = |value: u32| pmu.clk_src.modify(CLK_SRC::SYS_CLK_SEL.val(value));
        let rc32m_ready = pmu.clk_rdy.is_set(CLK_RDY::RC32M_RDY);

        match source {
            SystemClockSource::Sfll => {
                if sel() == 2 && rc32m_ready {
                    set(3);
                }
                if sel() == 3 {
                    set(1);
                }
                set(0);
            },
            SystemClockSource::Rc32m => {
                let current = sel();
                if current == 0 || current == 2 {
                    set(current + 1);
                }
            },
            SystemClockSource::XtalRef => {
                if sel() == 0 && rc32m_ready {
                    set(1);
                }
                if sel() == 1 {
                    set(3);
                }
                set(2);
            },
        }
        log::debug!("system clock source now {:?} (SYS_CLK_SEL={})", source, sel());
    }

    /// Returns the current system clock multiplexer setting.
    pub fn system_clock_source(&self) -> SystemClockSource {
        match self.pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL) {
            0 => SystemClockSource::Sfll,
            2 => SystemClockSource::XtalRef,
            _ => SystemClockSource::Rc32m,
        }
    }

    /// Computes the system clock frequency from the multiplexer and SFLL settings.
    pub fn system_clock_hz(&self) -> u32 {
        let pmu = &*self.pmu;
        match pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL) {
            0 => {
                let reference = if pmu.sfll_ctrl0.read(SFLL_CTRL0::SFLL_REFCLK_SEL) == 0 {
                    RC32M_FREQUENCY_HZ
                } else {
                    MAIN_XTAL_FREQUENCY_HZ
                };
                let fb_div = u64::from(pmu.sfll_ctrl0.read(SFLL_CTRL0::SFLL_FBDIV));
                let post_div = pmu.sfll_ctrl1.read(SFLL_CTRL1::SFLL_DIV_SEL);
                let ref_div = u64::from(pmu.sfll_ctrl1.read(SFLL_CTRL1::SFLL_REFDIV));

                let vco = (u64::from(reference) * fb_div * 2) >> post_div;
                vco.checked_div(ref_div)
                    .map(|hz| hz as u32)
                    .unwrap_or(0)
            },
            2 => MAIN_XTAL_FREQUENCY_HZ,
            _ => RC32M_FREQUENCY_HZ,
        }
    }

    /// Programs and powers up the SFLL.
    pub fn enable_sfll(&mut self, config: &SfllConfig) -> Result<(), Error> {
        if !(2..=255).contains(&config.ref_div) {
            return Err(Error::InvalidParameter("SFLL reference divider"));
        }
        if !(1..=511).contains(&config.fb_div) {
            return Err(Error::InvalidParameter("SFLL feedback divider"));
        }
        if config.kvco > 3 {
            return Err(Error::InvalidParameter("SFLL KVCO"));
        }
        if config.post_div > 3 {
            return Err(Error::InvalidParameter("SFLL post divider"));
        }

        let pmu = &*self.pmu;
        let reference = match config.reference {
            SfllReference::Rc32m => SFLL_CTRL0::SFLL_REFCLK_SEL::Rc32m,
            SfllReference::MainXtal => SFLL_CTRL0::SFLL_REFCLK_SEL::MainXtal,
        };
        pmu.sfll_ctrl0.modify(reference);
        pmu.sfll_ctrl1.modify(
            SFLL_CTRL1::SFLL_REFDIV.val(config.ref_div)
            + SFLL_CTRL1::SFLL_DIV_SEL.val(config.post_div)
        );
        pmu.sfll_ctrl0.modify(
            SFLL_CTRL0::SFLL_FBDIV.val(config.fb_div)
            + SFLL_CTRL0::SFLL_KVCO.val(config.kvco)
        );

        // power up
        pmu.sfll_ctrl0.modify(SFLL_CTRL0::SFLL_PU::SET);
        Ok(())
    }

    pub fn disable_sfll(&mut self) {
        self.pmu.sfll_ctrl0.modify(SFLL_CTRL0::SFLL_PU::CLEAR);
    }

    pub fn enable_xtal32k(&mut self, mode: CrystalMode) {
        let external = match mode {
            CrystalMode::Internal => XTAL32K_CTRL::X32K_EXT_OSC_EN::CLEAR,
            CrystalMode::External => XTAL32K_CTRL::X32K_EXT_OSC_EN::SET,
        };
        self.pmu.xtal32k_ctrl.modify(external);
        self.pmu.xtal32k_ctrl.modify(XTAL32K_CTRL::X32K_EN::SET);
    }

    pub fn disable_xtal32k(&mut self) {
        self.pmu.xtal32k_ctrl.modify(XTAL32K_CTRL::X32K_EN::CLEAR);
    }

    pub fn enable_rc32m(&mut self) {
        self.rc32m.ctrl.modify(rc32m::CTRL::PD::CLEAR);
        self.rc32m.ctrl.modify(rc32m::CTRL::EN::SET);
    }

    pub fn disable_rc32m(&mut self) {
        self.rc32m.ctrl.modify(rc32m::CTRL::EN::CLEAR);
        self.rc32m.ctrl.modify(rc32m::CTRL::PD::SET);
    }

    pub fn enable_rc32k(&mut self) {
        self.pmu.rc32k_ctrl0.modify(RC32K_CTRL0::RC32K_PD::CLEAR);
    }

    pub fn disable_rc32k(&mut self) {
        self.pmu.rc32k_ctrl0.modify(RC32K_CTRL0::RC32K_PD::SET);
    }

    /// Selects whether the RC32M block outputs 16 or 32 MHz.
    pub fn set_rc32m_output(&mut self, output: Rc32mOutput) {
        let value = match output {
            Rc32mOutput::Mhz16 => rc32m::CLK::REF_SEL::Output16MHz,
            Rc32mOutput::Mhz32 => rc32m::CLK::REF_SEL::Output32MHz,
        };
        self.rc32m.clk.modify(value);
    }

    /// Requests the main crystal reference on behalf of a consumer.
    pub fn enable_reference_clock(&mut self, clock: ReferenceClock) {
        self.pmu.wlan_ctrl.modify(Self::reference_request(clock).val(1));
    }

    pub fn disable_reference_clock(&mut self, clock: ReferenceClock) {
        self.pmu.wlan_ctrl.modify(Self::reference_request(clock).val(0));
    }

    fn reference_request(clock: ReferenceClock) -> Field<u32, WLAN_CTRL::Register> {
        match clock {
            ReferenceClock::System => WLAN_CTRL::REFCLK_SYS_REQ,
            ReferenceClock::Audio => WLAN_CTRL::REFCLK_AUD_REQ,
            ReferenceClock::Usb => WLAN_CTRL::REFCLK_USB_REQ,
        }
    }

    /// Returns whether an oscillator or PLL reports ready.
    pub fn clock_ready(&self, source: ClockSource) -> bool {
        let pmu = &*self.pmu;
        match source {
            ClockSource::Rc32k => pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_RDY),
            ClockSource::Rc32m => pmu.clk_rdy.is_set(CLK_RDY::RC32M_RDY),
            ClockSource::Xtal32k => pmu.clk_rdy.is_set(CLK_RDY::X32K_RDY),
            ClockSource::XtalRef => pmu.wlan_ctrl.is_set(WLAN_CTRL::REFCLK_SYS_RDY),
            ClockSource::Sfll => pmu.clk_rdy.is_set(CLK_RDY::PLL_CLK_RDY),
            ClockSource::Aupll => pmu.clk_rdy.is_set(CLK_RDY::PLL_AUDIO_RDY),
            ClockSource::RefClockAudio => pmu.wlan_ctrl.is_set(WLAN_CTRL::REFCLK_AUD_RDY),
            ClockSource::RefClockUsb => pmu.wlan_ctrl.is_set(WLAN_CTRL::REFCLK_USB_RDY),
        }
    }

    /// Waits until [`clock_ready`](Self::clock_ready) holds for `source`.
    pub fn wait_clock_ready(&self, source: ClockSource) -> Result<(), Error> {
        poll_until(CLOCK_READY_POLLS, WaitFor::ClockReady, || self.clock_ready(source))
    }

    /// Calibrates the 32 MHz RC oscillator and returns the resulting trim code.
    pub fn calibrate_rc32m(&mut self, mode: CalibrationMode) -> Result<u32, Error> {
        if let CalibrationMode::Manual(code) = mode {
            if code > 0xFF {
                return Err(Error::InvalidParameter("RC32M calibration code"));
            }
        }

        let pmu = &*self.pmu;
        let rc = &*self.rc32m;

        // soft reset
        rc.rst.modify(rc32m::RST::SOFT_RST::SET);
        for _ in 0..10 {
            core::hint::spin_loop();
        }
        rc.rst.modify(rc32m::RST::SOFT_RST::CLEAR);

        // power up
        rc.ctrl.modify(rc32m::CTRL::PD::CLEAR);
        rc.ctrl.modify(rc32m::CTRL::EN::SET);
        poll_until(CLOCK_READY_POLLS, WaitFor::ClockReady, || pmu.clk_rdy.is_set(CLK_RDY::RC32M_RDY))?;

        match mode {
            CalibrationMode::Auto => {
                rc.ctrl.modify(rc32m::CTRL::EXT_CODE_EN::CLEAR);
                pmu.rc32m_ctrl.modify(RC32M_CTRL::CAL_ALLOW::SET);
                rc.ctrl.modify(rc32m::CTRL::CAL_EN::SET);
            },
            CalibrationMode::Manual(code) => {
                rc.ctrl.modify(rc32m::CTRL::CODE_FR_EXT.val(code));
                rc.ctrl.modify(rc32m::CTRL::EXT_CODE_EN::SET);
            },
        }

        poll_until(CALIBRATION_POLLS, WaitFor::Calibration, || {
            rc.status.is_set(rc32m::STATUS::CAL_DONE) || rc.ctrl.is_set(rc32m::CTRL::EXT_CODE_EN)
        })?;

        rc.ctrl.modify(rc32m::CTRL::CAL_EN::CLEAR);
        pmu.rc32m_ctrl.modify(RC32M_CTRL::CAL_ALLOW::CLEAR);
        let code = rc.status.read(rc32m::STATUS::CODE_FR_CAL);
        log::debug!("RC32M calibrated ({:?}), code 0x{:02X}", mode, code);
        Ok(code)
    }

    /// Calibrates the 32 kHz RC oscillator against the 32.768 kHz crystal and returns the
    /// resulting trim code.
    pub fn calibrate_rc32k(&mut self, mode: CalibrationMode) -> Result<u32, Error> {
        if let CalibrationMode::Manual(code) = mode {
            if code > 0x3FFF {
                return Err(Error::InvalidParameter("RC32K calibration code"));
            }
        }

        let pmu = &*self.pmu;

        // power up
        pmu.rc32k_ctrl0.modify(RC32K_CTRL0::RC32K_PD::CLEAR);
        poll_until(CLOCK_READY_POLLS, WaitFor::ClockReady, || {
            pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_RDY) && pmu.clk_rdy.is_set(CLK_RDY::X32K_RDY)
        })?;

        match mode {
            CalibrationMode::Auto => {
                pmu.rc32k_ctrl1.modify(RC32K_CTRL1::RC32K_EXT_CODE_EN::CLEAR);
                pmu.rc32k_ctrl1.modify(RC32K_CTRL1::RC32K_ALLOW_CAL::SET);
            },
            CalibrationMode::Manual(code) => {
                pmu.rc32k_ctrl0.modify(RC32K_CTRL0::RC32K_CODE_FR_EXT.val(code));
                pmu.rc32k_ctrl1.modify(RC32K_CTRL1::RC32K_EXT_CODE_EN::SET);
            },
        }

        // start calibration
        pmu.rc32k_ctrl0.modify(RC32K_CTRL0::RC32K_CAL_EN::SET);

        // the done flag of a previous run may linger for a while
        let external = || pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_EXT_CODE_EN);
        for _ in 0..RC32K_RESTART_POLLS {
            if !pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_CAL_DONE) || external() {
                break;
            }
            core::hint::spin_loop();
        }

        poll_until(CALIBRATION_POLLS, WaitFor::Calibration, || {
            pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_CAL_DONE) || external()
        })?;

        for _ in 0..=0x1000 {
            core::hint::spin_loop();
        }

        pmu.rc32k_ctrl0.modify(RC32K_CTRL0::RC32K_CAL_EN::CLEAR);
        pmu.rc32k_ctrl1.modify(RC32K_CTRL1::RC32K_ALLOW_CAL::CLEAR);
        let code = pmu.rc32k_ctrl1.read(RC32K_CTRL1::RC32K_CODE_FR_CAL);
        log::debug!("RC32K calibrated ({:?}), code 0x{:04X}", mode, code);
        Ok(code)
    }

    /// Ungates the clock of a module.
    pub fn enable_module(&mut self, module: Module) -> Result<(), Error> {
        self.gate_module(module, true)
    }

    /// Gates the clock of a module.
    pub fn disable_module(&mut self, module: Module) -> Result<(), Error> {
        self.gate_module(module, false)
    }

    fn gate_module(&mut self, module: Module, enable: bool) -> Result<(), Error> {
        let pmu = &*self.pmu;
        let gated = u32::from(!enable);
        let enabled = u32::from(enable);

        if let Some(field) = peripheral_gate(module) {
            pmu.peri_clk_en.modify(field.val(gated));
            if module == Module::Sdio {
                pmu.peri_clk_en.modify(PERI_CLK_EN::SDIO_AHB_CLK_EN.val(gated));
            }
            return Ok(());
        }

        match module {
            Module::Rtc => pmu.aon_clk_ctrl.modify(AON_CLK_CTRL::RTC_CLK_EN.val(gated)),
            Module::Dma => pmu.aon_clk_ctrl.modify(AON_CLK_CTRL::DMA_CLK_GATE_EN.val(gated)),
            Module::Gau => pmu.cau_clk_sel.modify(CAU_CLK_SEL::CAU_SW_GATE.val(gated)),
            Module::Rc32mRef => pmu.peri3_ctrl.modify(PERI3_CTRL::RC32M_GATE.val(gated)),
            Module::AcompMclk => pmu.cau_ctrl.modify(CAU_CTRL::CAU_ACOMP_MCLK_EN.val(enabled)),
            Module::DacMclk => pmu.cau_ctrl.modify(CAU_CTRL::CAU_GPDAC_MCLK_EN.val(enabled)),
            Module::AdcMclk => pmu.cau_ctrl.modify(CAU_CTRL::CAU_GPADC0_MCLK_EN.val(enabled)),
            Module::BgMclk => pmu.cau_ctrl.modify(CAU_CTRL::CAU_BG_MCLK_EN.val(enabled)),
            _ => return Err(Error::InvalidParameter("module has no clock gate")),
        }
        Ok(())
    }

    /// Sets the clock divider of a module.
    pub fn set_module_divider(&mut self, module: Module, divider: u32) -> Result<(), Error> {
        let pmu = &*self.pmu;
        match module {
            Module::Qspi0 => {
                pmu.peri1_clk_div.modify(PERI1_CLK_DIV::QSPI0_CLK_DIV.val(check_divider(divider, 3)?))
            },
            Module::Flashc => {
                pmu.peri1_clk_div.modify(PERI1_CLK_DIV::FLASH_CLK_DIV.val(check_divider(divider, 3)?))
            },
            Module::GptSample => {
                pmu.peri2_clk_div.modify(PERI2_CLK_DIV::GPT_SAMPLE_CLK_DIV.val(check_divider(divider, 3)?))
            },
            Module::I2c0 | Module::I2c1 => {
                pmu.peri2_clk_div.modify(PERI2_CLK_DIV::I2C_CLK_DIV.val(check_divider(divider, 2)?))
            },
            Module::Ssp0 => {
                pmu.peri0_clk_div.modify(PERI0_CLK_DIV::SSP0_CLK_DIV.val(check_divider(divider, 5)?))
            },
            Module::Ssp1 => {
                pmu.peri0_clk_div.modify(PERI0_CLK_DIV::SSP1_CLK_DIV.val(check_divider(divider, 5)?))
            },
            Module::Ssp2 => {
                pmu.peri0_clk_div.modify(PERI0_CLK_DIV::SSP2_CLK_DIV.val(check_divider(divider, 5)?))
            },
            Module::Pdm => {
                pmu.peri0_clk_div.modify(PERI0_CLK_DIV::PDM_CLK_DIV.val(check_divider(divider, 5)?))
            },
            Module::Sdio => {
                pmu.peri0_clk_div.modify(PERI0_CLK_DIV::SDIO_CLK_DIV.val(check_divider(divider, 4)?))
            },
            Module::Gpt0 | Module::Gpt1 | Module::Gpt2 => {
                let index = match module {
                    Module::Gpt0 => 0,
                    Module::Gpt1 => 1,
                    _ => 2,
                };
                pmu.gpt_ctrl[index].modify(GPT_CTRL::GPT_CLK_DIV.val(check_divider(divider, 6)?))
            },
            Module::Gpt3 => {
                // GPT3 keeps its divider split across two fields of PERI2_CLK_DIV
                let divider = check_divider(divider, 6)?;
                pmu.peri2_clk_div.modify(
                    PERI2_CLK_DIV::GPT3_CLK_DIV_5_3.val(divider >> 3)
                    + PERI2_CLK_DIV::GPT3_CLK_DIV_2_0.val(divider & 0x07)
                )
            },
            Module::Wdt => {
                let divider = check_divider(divider, 6)?;
                pmu.peri2_clk_div.modify(
                    PERI2_CLK_DIV::WDT_CLK_DIV_5_3.val(divider >> 3)
                    + PERI2_CLK_DIV::WDT_CLK_DIV_2_2.val((divider >> 2) & 0x01)
                    + PERI2_CLK_DIV::WDT_CLK_DIV_1_0.val(divider & 0x03)
                )
            },
            Module::Core => {
                pmu.mcu_core_clk_div.modify(MCU_CORE_CLK_DIV::FCLK_DIV.val(check_divider(divider, 6)?))
            },
            Module::Apb0 => {
                pmu.aon_clk_ctrl.modify(AON_CLK_CTRL::APB0_CLK_DIV.val(check_divider(divider, 2)?))
            },
            Module::Apb1 => {
                pmu.aon_clk_ctrl.modify(AON_CLK_CTRL::APB1_CLK_DIV.val(check_divider(divider, 2)?))
            },
            Module::PmuClock => {
                pmu.aon_clk_ctrl.modify(AON_CLK_CTRL::PMU_CLK_DIV.val(check_divider(divider, 4)?))
            },
            Module::Gau => {
                pmu.peri3_ctrl.modify(PERI3_CTRL::GAU_DIV.val(check_divider(divider, 5)?))
            },
            Module::Rc32mRef => {
                pmu.peri3_ctrl.modify(PERI3_CTRL::RC32M_DIV.val(check_divider(divider, 5)?))
            },
            _ => return Err(Error::InvalidParameter("module has no clock divider")),
        }
        Ok(())
    }

    /// Returns the clock divider of a module.
    pub fn module_divider(&self, module: Module) -> Result<u32, Error> {
        let pmu = &*self.pmu;
        let divider = match module {
            Module::Qspi0 => pmu.peri1_clk_div.read(PERI1_CLK_DIV::QSPI0_CLK_DIV),
            Module::Flashc => pmu.peri1_clk_div.read(PERI1_CLK_DIV::FLASH_CLK_DIV),
            Module::GptSample => pmu.peri2_clk_div.read(PERI2_CLK_DIV::GPT_SAMPLE_CLK_DIV),
            Module::I2c0 | Module::I2c1 => pmu.peri2_clk_div.read(PERI2_CLK_DIV::I2C_CLK_DIV),
            Module::Ssp0 => pmu.peri0_clk_div.read(PERI0_CLK_DIV::SSP0_CLK_DIV),
            Module::Ssp1 => pmu.peri0_clk_div.read(PERI0_CLK_DIV::SSP1_CLK_DIV),
            Module::Ssp2 => pmu.peri0_clk_div.read(PERI0_CLK_DIV::SSP2_CLK_DIV),
            Module::Pdm => pmu.peri0_clk_div.read(PERI0_CLK_DIV::PDM_CLK_DIV),
            Module::Sdio => pmu.peri0_clk_div.read(PERI0_CLK_DIV::SDIO_CLK_DIV),
            Module::Gpt0 => pmu.gpt_ctrl[0].read(GPT_CTRL::GPT_CLK_DIV),
            Module::Gpt1 => pmu.gpt_ctrl[1].read(GPT_CTRL::GPT_CLK_DIV),
            Module::Gpt2 => pmu.gpt_ctrl[2].read(GPT_CTRL::GPT_CLK_DIV),
            Module::Gpt3 => {
                pmu.peri2_clk_div.read(PERI2_CLK_DIV::GPT3_CLK_DIV_5_3) << 3
                    | pmu.peri2_clk_div.read(PERI2_CLK_DIV::GPT3_CLK_DIV_2_0)
            },
            Module::Wdt => {
                pmu.peri2_clk_div.read(PERI2_CLK_DIV::WDT_CLK_DIV_5_3) << 3
                    | pmu.peri2_clk_div.read(PERI2_CLK_DIV::WDT_CLK_DIV_2_2) << 2
                    | pmu.peri2_clk_div.read(PERI2_CLK_DIV::WDT_CLK_DIV_1_0)
            },
            Module::Core => pmu.mcu_core_clk_div.read(MCU_CORE_CLK_DIV::FCLK_DIV),
            Module::Apb0 => pmu.aon_clk_ctrl.read(AON_CLK_CTRL::APB0_CLK_DIV),
            Module::Apb1 => pmu.aon_clk_ctrl.read(AON_CLK_CTRL::APB1_CLK_DIV),
            Module::PmuClock => pmu.aon_clk_ctrl.read(AON_CLK_CTRL::PMU_CLK_DIV),
            Module::Gau => pmu.peri3_ctrl.read(PERI3_CTRL::GAU_DIV),
            Module::Rc32mRef => pmu.peri3_ctrl.read(PERI3_CTRL::RC32M_DIV),
            _ => return Err(Error::InvalidParameter("module has no clock divider")),
        };
        Ok(divider)
    }

    fn uart_select(uart: UartId) -> Field<u32, UART_CLK_SEL::Register> {
        match uart {
            UartId::Uart0 => UART_CLK_SEL::UART0_CLK_SEL,
            UartId::Uart1 => UART_CLK_SEL::UART1_CLK_SEL,
            UartId::Uart2 => UART_CLK_SEL::UART2_CLK_SEL,
        }
    }

    /// Selects which fractional divider clocks a UART.
    pub fn set_uart_clock_source(&mut self, uart: UartId, source: UartClockSource) {
        let fast = match source {
            UartClockSource::Slow => 0,
            UartClockSource::Fast => 1,
        };
        self.pmu.uart_clk_sel.modify(Self::uart_select(uart).val(fast));
    }

    pub fn uart_clock_source(&self, uart: UartId) -> UartClockSource {
        if self.pmu.uart_clk_sel.read(Self::uart_select(uart)) == 0 {
            UartClockSource::Slow
        } else {
            UartClockSource::Fast
        }
    }

    /// Programs one of the UART fractional dividers.
    pub fn set_uart_fraction(&mut self, source: UartClockSource, fraction: ClockFraction) -> Result<(), Error> {
        if fraction.dividend == 0 || fraction.dividend > ClockFraction::MAX_DIVIDEND {
            return Err(Error::InvalidParameter("UART clock dividend"));
        }
        if fraction.divisor == 0 || fraction.divisor > ClockFraction::MAX_DIVISOR {
            return Err(Error::InvalidParameter("UART clock divisor"));
        }

        let value = UART_CLK_DIV::DENOMINATOR.val(fraction.dividend)
            + UART_CLK_DIV::NOMINATOR.val(fraction.divisor);
        match source {
            UartClockSource::Fast => self.pmu.uart_fast_clk_div.write(value),
            UartClockSource::Slow => self.pmu.uart_slow_clk_div.write(value),
        }
        Ok(())
    }

    pub fn uart_fraction(&self, source: UartClockSource) -> ClockFraction {
        let register = match source {
            UartClockSource::Fast => &self.pmu.uart_fast_clk_div,
            UartClockSource::Slow => &self.pmu.uart_slow_clk_div,
        };
        ClockFraction {
            dividend: register.read(UART_CLK_DIV::DENOMINATOR),
            divisor: register.read(UART_CLK_DIV::NOMINATOR),
        }
    }

    pub fn set_rtc_clock_source(&mut self, source: RtcClockSource) {
        let value = match source {
            RtcClockSource::Rc32k => AON_CLK_CTRL::RTC_INT_SEL::Rc32k,
            RtcClockSource::Xtal32k => AON_CLK_CTRL::RTC_INT_SEL::Xtal32k,
        };
        self.pmu.aon_clk_ctrl.modify(value);
    }

    pub fn set_gau_clock_source(&mut self, source: GauClockSource) {
        let value = match source {
            GauClockSource::Sfll => CAU_CLK_SEL::CAU_CLK_SEL::Sfll,
            GauClockSource::Rc32m => CAU_CLK_SEL::CAU_CLK_SEL::Rc32m,
            GauClockSource::XtalRef => CAU_CLK_SEL::CAU_CLK_SEL::XtalRef,
            GauClockSource::Aupll => CAU_CLK_SEL::CAU_CLK_SEL::Aupll,
        };
        self.pmu.cau_clk_sel.modify(value);
    }

    /// Selects the reference clock of the audio PLL.
    pub fn set_aupll_reference(&mut self, reference: AupllReference) {
        let value = match reference {
            AupllReference::Rc32m => AUPLL_CTRL1::REFCLK_SEL::Rc32m,
            AupllReference::RefClockAudio => AUPLL_CTRL1::REFCLK_SEL::RefClockAudio,
        };
        self.pmu.aupll_ctrl1.modify(value);
    }

    /// Programs the audio PLL and powers it up. Readiness is reported through
    /// [`ClockSource::Aupll`].
    pub fn enable_aupll(&mut self, config: &AupllConfig) -> Result<(), Error> {
        if !(3..=10).contains(&config.ref_div) {
            return Err(Error::InvalidParameter("AUPLL reference divider"));
        }
        if config.fb_div > 0x3F {
            return Err(Error::InvalidParameter("AUPLL feedback divider"));
        }
        if config.fract > 0xF_FFFF {
            return Err(Error::InvalidParameter("AUPLL fraction"));
        }
        if config.icp > 3 {
            return Err(Error::InvalidParameter("AUPLL charge pump current"));
        }
        Self::check_aupll_post_divider(config.post_div_pattern, config.post_div_modulo)?;

        let pmu = &*self.pmu;
        pmu.aupll_ctrl1.modify(
            AUPLL_CTRL1::DIV_MCLK.val(config.ref_div)
            + AUPLL_CTRL1::DIV_FBCCLK.val(config.fb_div)
            + AUPLL_CTRL1::ICP.val(config.icp)
            + AUPLL_CTRL1::DIV_OCLK_PATTERN.val(config.post_div_pattern)
            + AUPLL_CTRL1::DIV_OCLK_MODULO.val(config.post_div_modulo)
            + AUPLL_CTRL1::EN_VCOX2.val(u32::from(config.vco_x2))
            + AUPLL_CTRL1::ENA_DITHER.val(u32::from(config.dither))
        );
        pmu.aupll_ctrl0.modify(AUPLL_CTRL0::FRACT.val(config.fract));
        pmu.aupll_ctrl0.modify(AUPLL_CTRL0::PU::SET);
        Ok(())
    }

    pub fn disable_aupll(&mut self) {
        self.pmu.aupll_ctrl0.modify(AUPLL_CTRL0::PU::CLEAR);
    }

    fn check_aupll_post_divider(pattern: u32, modulo: u32) -> Result<(), Error> {
        if pattern > 2 || modulo > 7 {
            Err(Error::InvalidParameter("AUPLL post divider"))
        } else {
            Ok(())
        }
    }

    /// Changes the audio PLL output divider without touching the rest of its setup.
    pub fn set_aupll_post_divider(&mut self, pattern: u32, modulo: u32) -> Result<(), Error> {
        Self::check_aupll_post_divider(pattern, modulo)?;
        self.pmu.aupll_ctrl1.modify(
            AUPLL_CTRL1::DIV_OCLK_PATTERN.val(pattern)
            + AUPLL_CTRL1::DIV_OCLK_MODULO.val(modulo)
        );
        Ok(())
    }

    pub fn set_pdm_clock_source(&mut self, source: AudioClockSource) {
        let audio = u32::from(source == AudioClockSource::Aupll);
        self.pmu.peri_clk_src.modify(PERI_CLK_SRC::PDM_AUDIO_SEL.val(audio));
    }

    pub fn set_ssp_clock_source(&mut self, ssp: SspId, source: AudioClockSource) {
        let field = match ssp {
            SspId::Ssp0 => PERI_CLK_SRC::SSP0_AUDIO_SEL,
            SspId::Ssp1 => PERI_CLK_SRC::SSP1_AUDIO_SEL,
            SspId::Ssp2 => PERI_CLK_SRC::SSP2_AUDIO_SEL,
        };
        let audio = u32::from(source == AudioClockSource::Aupll);
        self.pmu.peri_clk_src.modify(field.val(audio));
    }

    /// Selects the internal clock of a timer.
    ///
    /// The 32 kHz sources only drive the second select stage, so the first stage keeps its
    /// previous setting.
    pub fn set_gpt_clock_source(&mut self, gpt: GptId, source: GptClockSource) {
        let index = match gpt {
            GptId::Gpt0 => 0,
            GptId::Gpt1 => 1,
            GptId::Gpt2 => 2,
            GptId::Gpt3 => 3,
        };
        let value = match source {
            GptClockSource::System => GPT_CTRL::GPT_CLK_SEL0.val(0) + GPT_CTRL::GPT_CLK_SEL1.val(0),
            GptClockSource::Rc32k => GPT_CTRL::GPT_CLK_SEL1.val(2),
            GptClockSource::Xtal32k => GPT_CTRL::GPT_CLK_SEL1.val(3),
            GptClockSource::Rc32m => GPT_CTRL::GPT_CLK_SEL0.val(2) + GPT_CTRL::GPT_CLK_SEL1.val(0),
            GptClockSource::XtalRef => GPT_CTRL::GPT_CLK_SEL0.val(3) + GPT_CTRL::GPT_CLK_SEL1.val(0),
        };
        self.pmu.gpt_ctrl[index].modify(value);
    }

    /// Masks or unmasks an RC32M interrupt.
    pub fn set_rc32m_interrupt_mask(&mut self, interrupt: Rc32mInterrupt, masked: bool) {
        self.rc32m.imr.modify(interrupt.field().val(u32::from(masked)));
    }

    pub fn rc32m_interrupt_status(&self, interrupt: Rc32mInterrupt) -> bool {
        self.rc32m.isr.is_set(interrupt.field())
    }

    pub fn clear_rc32m_interrupt(&mut self, interrupt: Rc32mInterrupt) {
        self.rc32m.icr.write(interrupt.field().val(1));
    }

    pub fn last_reset_cause(&self) -> ResetCause {
        ResetCause::from_bits(self.pmu.last_rst_cause.get())
    }

    /// Clears the given reset cause flags.
    pub fn clear_reset_cause(&mut self, cause: ResetCause) {
        let bits = cause.bits();
        self.pmu.last_rst_clr.set(self.pmu.last_rst_clr.get() | bits);
        self.pmu.last_rst_clr.set(self.pmu.last_rst_clr.get() & !bits);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{peek, poke, ram_block};

    fn clock() -> Clock {
        Clock::new(ram_block(), ram_block())
    }

    #[test]
    fn sfll_frequency() {
        let mut clock = clock();
        let config = SfllConfig {
            reference: SfllReference::Rc32m,
            ref_div: 16,
            fb_div: 100,
            kvco: 3,
            post_div: 1,
        };
        clock.enable_sfll(&config).unwrap();
        assert!(clock.pmu.sfll_ctrl0.is_set(SFLL_CTRL0::SFLL_PU));

        clock.set_system_clock_source(SystemClockSource::Sfll);
        assert_eq!(clock.system_clock_hz(), 200_000_000);

        clock.pmu.sfll_ctrl0.modify(SFLL_CTRL0::SFLL_REFCLK_SEL::MainXtal);
        assert_eq!(clock.system_clock_hz(), 240_000_000);
    }

    #[test]
    fn default_sfll_config_gives_200_mhz() {
        let mut clock = clock();
        clock.enable_sfll(&SfllConfig::default()).unwrap();
        assert_eq!(clock.system_clock_hz(), 200_000_000);
    }

    #[test]
    fn sfll_config_is_validated() {
        let mut clock = clock();
        let bad_ref = SfllConfig { ref_div: 1, ..SfllConfig::default() };
        assert_eq!(clock.enable_sfll(&bad_ref), Err(Error::InvalidParameter("SFLL reference divider")));
        let bad_fb = SfllConfig { fb_div: 512, ..SfllConfig::default() };
        assert_eq!(clock.enable_sfll(&bad_fb), Err(Error::InvalidParameter("SFLL feedback divider")));
        assert!(!clock.pmu.sfll_ctrl0.is_set(SFLL_CTRL0::SFLL_PU));
    }

    #[test]
    fn zero_reference_divider_reads_as_zero_hz() {
        let clock = clock();
        assert_eq!(clock.system_clock_hz(), 0);
    }

    #[test]
    fn switch_from_xtal_to_sfll_passes_through_rc32m() {
        let mut clock = clock();
        clock.pmu.clk_src.modify(CLK_SRC::SYS_CLK_SEL.val(2));
        poke(&clock.pmu.clk_rdy, 1 << 2);
        clock.set_system_clock_source(SystemClockSource::Sfll);
        assert_eq!(clock.pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL), 0);
        assert_eq!(clock.system_clock_source(), SystemClockSource::Sfll);
    }

    #[test]
    fn switch_to_rc32m_only_from_primary_sources() {
        let mut clock = clock();
        clock.set_system_clock_source(SystemClockSource::Rc32m);
        assert_eq!(clock.pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL), 1);
        assert_eq!(clock.system_clock_hz(), RC32M_FREQUENCY_HZ);

        clock.pmu.clk_src.modify(CLK_SRC::SYS_CLK_SEL.val(2));
        clock.set_system_clock_source(SystemClockSource::Rc32m);
        assert_eq!(clock.pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL), 3);
        assert_eq!(clock.system_clock_hz(), RC32M_FREQUENCY_HZ);
    }

    #[test]
    fn switch_to_xtal() {
        let mut clock = clock();
        clock.set_system_clock_source(SystemClockSource::XtalRef);
        assert_eq!(clock.pmu.clk_src.read(CLK_SRC::SYS_CLK_SEL), 2);
        assert_eq!(clock.system_clock_hz(), MAIN_XTAL_FREQUENCY_HZ);
    }

    #[test]
    fn peripheral_gates_are_active_low() {
        let mut clock = clock();
        clock.pmu.peri_clk_en.set(0xFFFF_FFFF);
        clock.enable_module(Module::Uart0).unwrap();
        assert!(!clock.pmu.peri_clk_en.is_set(PERI_CLK_EN::UART0_CLK_EN));
        assert!(clock.pmu.peri_clk_en.is_set(PERI_CLK_EN::UART1_CLK_EN));

        clock.enable_module(Module::Sdio).unwrap();
        assert!(!clock.pmu.peri_clk_en.is_set(PERI_CLK_EN::SDIO_CLK_EN));
        assert!(!clock.pmu.peri_clk_en.is_set(PERI_CLK_EN::SDIO_AHB_CLK_EN));

        clock.disable_module(Module::Uart0).unwrap();
        assert!(clock.pmu.peri_clk_en.is_set(PERI_CLK_EN::UART0_CLK_EN));
    }

    #[test]
    fn analog_clocks_are_active_high() {
        let mut clock = clock();
        clock.enable_module(Module::AcompMclk).unwrap();
        clock.enable_module(Module::BgMclk).unwrap();
        assert!(clock.pmu.cau_ctrl.is_set(CAU_CTRL::CAU_ACOMP_MCLK_EN));
        assert!(clock.pmu.cau_ctrl.is_set(CAU_CTRL::CAU_BG_MCLK_EN));
        assert!(!clock.pmu.cau_ctrl.is_set(CAU_CTRL::CAU_GPDAC_MCLK_EN));

        clock.disable_module(Module::Rtc).unwrap();
        assert!(clock.pmu.aon_clk_ctrl.is_set(AON_CLK_CTRL::RTC_CLK_EN));
    }

    #[test]
    fn ungateable_module_is_rejected() {
        let mut clock = clock();
        assert!(matches!(clock.enable_module(Module::Core), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn dividers_round_trip_through_split_fields() {
        let mut clock = clock();
        clock.set_module_divider(Module::Gpt3, 0x2D).unwrap();
        assert_eq!(clock.module_divider(Module::Gpt3), Ok(0x2D));
        clock.set_module_divider(Module::Wdt, 0x3F).unwrap();
        assert_eq!(clock.module_divider(Module::Wdt), Ok(0x3F));
        assert_eq!(clock.module_divider(Module::Gpt3), Ok(0x2D));

        clock.set_module_divider(Module::Qspi0, 4).unwrap();
        assert_eq!(peek(&clock.pmu.peri1_clk_div), 4 << 8);
    }

    #[test]
    fn divider_range_is_checked() {
        let mut clock = clock();
        assert!(clock.set_module_divider(Module::Qspi0, 8).is_err());
        assert!(clock.set_module_divider(Module::I2c0, 0).is_err());
        assert!(clock.set_module_divider(Module::Uart0, 2).is_err());
    }

    #[test]
    fn uart_fraction_fields() {
        let mut clock = clock();
        clock.set_uart_fraction(UartClockSource::Fast, ClockFraction { dividend: 576, divisor: 7812 }).unwrap();
        assert_eq!(peek(&clock.pmu.uart_fast_clk_div), 576 | (7812 << 11));
        assert_eq!(clock.uart_fraction(UartClockSource::Fast), ClockFraction { dividend: 576, divisor: 7812 });
        assert!(clock.set_uart_fraction(UartClockSource::Slow, ClockFraction { dividend: 2048, divisor: 1 }).is_err());

        clock.set_uart_clock_source(UartId::Uart2, UartClockSource::Fast);
        assert_eq!(clock.uart_clock_source(UartId::Uart2), UartClockSource::Fast);
        assert_eq!(clock.uart_clock_source(UartId::Uart0), UartClockSource::Slow);
    }

    #[test]
    fn rc32m_auto_calibration() {
        let mut clock = clock();
        poke(&clock.pmu.clk_rdy, 1 << 2);
        poke(&clock.rc32m.status, (1 << 1) | (0x5A << 2));
        assert_eq!(clock.calibrate_rc32m(CalibrationMode::Auto), Ok(0x5A));
        assert!(!clock.pmu.rc32m_ctrl.is_set(RC32M_CTRL::CAL_ALLOW));
        assert!(!clock.rc32m.ctrl.is_set(rc32m::CTRL::CAL_EN));
        assert!(clock.rc32m.ctrl.is_set(rc32m::CTRL::EN));
    }

    #[test]
    fn rc32m_calibration_times_out_without_oscillator() {
        let mut clock = clock();
        assert_eq!(
            clock.calibrate_rc32m(CalibrationMode::Auto),
            Err(Error::Timeout(WaitFor::ClockReady)),
        );
    }

    #[test]
    fn rc32k_manual_calibration() {
        let mut clock = clock();
        poke(&clock.pmu.clk_rdy, 1 << 3);
        poke(&clock.pmu.rc32k_ctrl1, (1 << 1) | (0x123 << 4));
        assert_eq!(clock.calibrate_rc32k(CalibrationMode::Manual(0x200)), Ok(0x123));
        assert_eq!(clock.pmu.rc32k_ctrl0.read(RC32K_CTRL0::RC32K_CODE_FR_EXT), 0x200);
        assert!(!clock.pmu.rc32k_ctrl0.is_set(RC32K_CTRL0::RC32K_CAL_EN));
        assert!(clock.calibrate_rc32k(CalibrationMode::Manual(0x4000)).is_err());
    }

    #[test]
    fn oscillator_controls() {
        let mut clock = clock();
        clock.enable_xtal32k(CrystalMode::External);
        assert!(clock.pmu.xtal32k_ctrl.is_set(XTAL32K_CTRL::X32K_EXT_OSC_EN));
        assert!(clock.pmu.xtal32k_ctrl.is_set(XTAL32K_CTRL::X32K_EN));
        clock.disable_xtal32k();
        assert!(!clock.pmu.xtal32k_ctrl.is_set(XTAL32K_CTRL::X32K_EN));

        clock.disable_rc32m();
        assert!(clock.rc32m.ctrl.is_set(rc32m::CTRL::PD));
        clock.disable_rc32k();
        assert!(clock.pmu.rc32k_ctrl0.is_set(RC32K_CTRL0::RC32K_PD));

        clock.enable_reference_clock(ReferenceClock::Usb);
        assert!(clock.pmu.wlan_ctrl.is_set(WLAN_CTRL::REFCLK_USB_REQ));
        assert!(!clock.clock_ready(ClockSource::RefClockUsb));
        assert_eq!(clock.wait_clock_ready(ClockSource::Sfll), Err(Error::Timeout(WaitFor::ClockReady)));
    }

    #[test]
    fn rc32k_auto_calibration_outlasts_stale_done_flag() {
        let mut clock = clock();
        poke(&clock.pmu.clk_rdy, 1 << 3);
        poke(&clock.pmu.rc32k_ctrl1, 1 | (1 << 1) | (0x0ABC << 4));
        assert_eq!(clock.calibrate_rc32k(CalibrationMode::Auto), Ok(0x0ABC));
        assert!(!clock.pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_ALLOW_CAL));
        assert!(!clock.pmu.rc32k_ctrl1.is_set(RC32K_CTRL1::RC32K_EXT_CODE_EN));
    }

    fn audio_pll() -> AupllConfig {
        AupllConfig {
            ref_div: 0xA,
            fb_div: 0x23,
            fract: 0x0_8208,
            icp: 0,
            post_div_pattern: 0,
            post_div_modulo: 3,
            vco_x2: true,
            dither: true,
        }
    }

    #[test]
    fn aupll_fields() {
        let mut clock = clock();
        clock.set_aupll_reference(AupllReference::RefClockAudio);
        clock.enable_aupll(&audio_pll()).unwrap();
        let ctrl1 = &clock.pmu.aupll_ctrl1;
        assert!(ctrl1.is_set(AUPLL_CTRL1::REFCLK_SEL));
        assert_eq!(ctrl1.read(AUPLL_CTRL1::DIV_MCLK), 0xA);
        assert_eq!(ctrl1.read(AUPLL_CTRL1::DIV_FBCCLK), 0x23);
        assert_eq!(ctrl1.read(AUPLL_CTRL1::DIV_OCLK_MODULO), 3);
        assert!(ctrl1.is_set(AUPLL_CTRL1::EN_VCOX2));
        assert!(ctrl1.is_set(AUPLL_CTRL1::ENA_DITHER));
        assert_eq!(peek(&clock.pmu.aupll_ctrl0), 0x0_8208 | (1 << 20));

        clock.set_aupll_post_divider(2, 6).unwrap();
        assert_eq!(clock.pmu.aupll_ctrl1.read(AUPLL_CTRL1::DIV_OCLK_PATTERN), 2);
        assert_eq!(clock.pmu.aupll_ctrl1.read(AUPLL_CTRL1::DIV_OCLK_MODULO), 6);
        assert_eq!(clock.pmu.aupll_ctrl1.read(AUPLL_CTRL1::DIV_MCLK), 0xA);

        clock.disable_aupll();
        assert!(!clock.pmu.aupll_ctrl0.is_set(AUPLL_CTRL0::PU));
        assert_eq!(clock.pmu.aupll_ctrl0.read(AUPLL_CTRL0::FRACT), 0x0_8208);
    }

    #[test]
    fn aupll_config_is_validated() {
        let mut clock = clock();
        let bad_ref = AupllConfig { ref_div: 2, ..audio_pll() };
        assert_eq!(clock.enable_aupll(&bad_ref), Err(Error::InvalidParameter("AUPLL reference divider")));
        let bad_pattern = AupllConfig { post_div_pattern: 3, ..audio_pll() };
        assert_eq!(clock.enable_aupll(&bad_pattern), Err(Error::InvalidParameter("AUPLL post divider")));
        assert!(clock.set_aupll_post_divider(0, 8).is_err());
        assert_eq!(peek(&clock.pmu.aupll_ctrl0), 0);
    }

    #[test]
    fn audio_clock_selects() {
        let mut clock = clock();
        clock.set_pdm_clock_source(AudioClockSource::Aupll);
        clock.set_ssp_clock_source(SspId::Ssp2, AudioClockSource::Aupll);
        assert_eq!(peek(&clock.pmu.peri_clk_src), (1 << 12) | (1 << 2));
        clock.set_ssp_clock_source(SspId::Ssp2, AudioClockSource::System);
        clock.set_pdm_clock_source(AudioClockSource::System);
        assert_eq!(peek(&clock.pmu.peri_clk_src), 0);
    }

    #[test]
    fn gpt_clock_select_stages() {
        let mut clock = clock();
        clock.set_module_divider(Module::Gpt1, 5).unwrap();
        clock.set_gpt_clock_source(GptId::Gpt1, GptClockSource::XtalRef);
        let pmu = clock.pmu;
        let ctrl = &pmu.gpt_ctrl[1];
        assert_eq!(ctrl.read(GPT_CTRL::GPT_CLK_SEL0), 3);
        assert_eq!(ctrl.read(GPT_CTRL::GPT_CLK_SEL1), 0);
        assert_eq!(ctrl.read(GPT_CTRL::GPT_CLK_DIV), 5);

        clock.set_gpt_clock_source(GptId::Gpt1, GptClockSource::Xtal32k);
        assert_eq!(ctrl.read(GPT_CTRL::GPT_CLK_SEL0), 3);
        assert_eq!(ctrl.read(GPT_CTRL::GPT_CLK_SEL1), 3);

        clock.set_gpt_clock_source(GptId::Gpt1, GptClockSource::System);
        assert_eq!(peek(ctrl), 5);
        assert_eq!(peek(&clock.pmu.gpt_ctrl[0]), 0);
    }

    #[test]
    fn rc32m_interrupts() {
        let mut clock = clock();
        clock.set_rc32m_interrupt_mask(Rc32mInterrupt::ClockReady, true);
        assert_eq!(peek(&clock.rc32m.imr), 0x02);
        clock.set_rc32m_interrupt_mask(Rc32mInterrupt::ClockReady, false);
        assert_eq!(peek(&clock.rc32m.imr), 0);

        poke(&clock.rc32m.isr, 0x01);
        assert!(clock.rc32m_interrupt_status(Rc32mInterrupt::CalibrationDone));
        assert!(!clock.rc32m_interrupt_status(Rc32mInterrupt::ClockReady));

        clock.clear_rc32m_interrupt(Rc32mInterrupt::ClockReady);
        assert_eq!(peek(&clock.rc32m.icr), 0x02);
    }

    #[test]
    fn reset_cause_flags() {
        let mut clock = clock();
        poke(&clock.pmu.last_rst_cause, (1 << 5) | (1 << 3));
        let cause = clock.last_reset_cause();
        assert!(cause.watchdog);
        assert!(cause.system_reset_request);
        assert!(!cause.lockup);

        clock.clear_reset_cause(ResetCause::ALL);
        assert_eq!(peek(&clock.pmu.last_rst_clr), 0);
    }
}
