//! UART driver.
//!
//! The MW300 UARTs are clocked from one of two fractional dividers in the PMU. Initializing a
//! UART picks a reference frequency that suits the requested baud rate, programs the fractional
//! divider to approximate it from the system clock and then derives the 16x oversampling divisor.


use core::fmt;

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::clock::{Clock, ClockFraction, Module};
use crate::error::{poll_until, Error, WaitFor};
use crate::regs::StaticRef;
use crate::regs::uart::{ABR, ACR, FCR, IER, ISR, LCR, LSR, MCR, MSR, RFOR, UartRegisters};


/// Polls spent waiting for the transmitter to drain before each byte.
pub const TRANSMIT_POLLS: u32 = 1_000_000;

/// Polls spent waiting for a received character.
pub const RECEIVE_POLLS: u32 = 1_000_000;


/// One of the three UART instances.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UartId {
    Uart0,
    Uart1,
    Uart2,
}
impl UartId {
    /// The clock gate feeding this UART.
    pub fn module(self) -> Module {
        match self {
            Self::Uart0 => Module::Uart0,
            Self::Uart1 => Module::Uart1,
            Self::Uart2 => Module::Uart2,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DataBits {
    Seven,
    Eight,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Parity {
    None,
    Odd,
    Even,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum StopBits {
    One,

    /// 1.5 stop bits with 5 data bits, 2 otherwise.
    Two,
}


/// Line settings applied by [`Uart::init`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UartConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub sticky_parity: bool,
    pub high_speed: bool,
    pub nrz_coding: bool,
}
impl Default for UartConfig {
    /// 115200 baud, 8N1.
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            sticky_parity: false,
            high_speed: false,
            nrz_coding: false,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PeripheralBus {
    Bits8,
    Bits32,
}


/// When the transmit FIFO requests more data.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TxFifoLevel {
    HalfEmpty,
    Empty,
}


/// How many received bytes trigger a receive request.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RxFifoLevel {
    Bytes1,
    Bytes8,
    Bytes16,
    Bytes32,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FifoConfig {
    pub enable: bool,
    pub bus: PeripheralBus,
    pub reset_rx: bool,
    pub reset_tx: bool,
    pub tx_level: TxFifoLevel,
    pub rx_level: RxFifoLevel,
    pub auto_flow_control: bool,
    pub dma: bool,
}
impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            enable: true,
            bus: PeripheralBus::Bits8,
            reset_rx: true,
            reset_tx: true,
            tx_level: TxFifoLevel::HalfEmpty,
            rx_level: RxFifoLevel::Bytes1,
            auto_flow_control: false,
            dma: false,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IrPolarity {
    Positive,
    Negative,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IrPulseWidth {
    /// 3/16 of a bit time.
    BitTime3_16,

    /// Fixed 1.6 µs.
    Fixed1_6us,
}


/// Infrared (SIR) modulation settings.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IrConfig {
    pub tx_enable: bool,
    pub rx_enable: bool,
    pub tx_polarity: IrPolarity,
    pub rx_polarity: IrPolarity,
    pub pulse_width: IrPulseWidth,
}
impl Default for IrConfig {
    fn default() -> Self {
        Self {
            tx_enable: false,
            rx_enable: false,
            tx_polarity: IrPolarity::Positive,
            rx_polarity: IrPolarity::Positive,
            pulse_width: IrPulseWidth::BitTime3_16,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AutoBaudCalculation {
    Table,
    Formula,
}


/// Who writes the divisor latch once the baud rate has been detected.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AutoBaudProgram {
    Processor,
    Uart,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AutoBaudConfig {
    pub enable: bool,
    pub calculation: AutoBaudCalculation,
    pub program: AutoBaudProgram,
}
impl Default for AutoBaudConfig {
    fn default() -> Self {
        Self {
            enable: false,
            calculation: AutoBaudCalculation::Table,
            program: AutoBaudProgram::Uart,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum LineStatus {
    DataReady,
    OverrunError,
    ParityError,
    FramingError,
    BreakInterrupt,
    TransmitDataRequest,
    TransmitterEmpty,
    FifoError,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ModemStatus {
    DeltaClearToSend,
    DeltaDataSetReady,
    TrailingEdgeRingIndicator,
    DeltaDataCarrierDetect,
    ClearToSend,
    DataSetReady,
    RingIndicator,
    DataCarrierDetect,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UartInterrupt {
    AutoBaudLock,
    ReceiveTimeout,
    Modem,
    TransmitDataRequest,
    ReceiveDataAvailable,
    ReceiveLineStatus,
    All,
}


/// Returns the UART reference frequency that divides evenly into `baud_rate`, or `None` if the
/// baud rate is not one of the well-known ones.
pub fn reference_clock_for(baud_rate: u32) -> Option<u32> {
    match baud_rate {
        300 | 600 | 1200 | 2400 | 4800 | 9600 | 14400 | 19200 | 28800 | 38400 | 57600 | 76800
            | 115200 | 230400
            => Some(14_745_600),
        128000 | 256000
            => Some(32_768_000),
        250000 | 500000 | 1000000 | 2000000
            => Some(32_000_000),
        1500000
            => Some(48_000_000),
        _ => None,
    }
}


/// Fraction used for baud rates without a dedicated reference frequency.
pub const FALLBACK_FRACTION: ClockFraction = ClockFraction { dividend: 0xE2, divisor: 0x3E8 };


/// Finds a fractional divider that turns `system_hz` into approximately `reference_hz`.
///
/// The reference is halved until the system clock is at least 1.8 times faster, then both sides
/// of the ratio are reduced until they fit the 11-bit dividend and 13-bit divisor fields.
pub fn calculate_fraction(system_hz: u32, reference_hz: u32) -> Option<ClockFraction> {
    if system_hz == 0 || reference_hz == 0 {
        return None;
    }

    let system = u64::from(system_hz);
    let mut reference = u64::from(reference_hz);
    while reference > 0 && system * 10 / reference < 18 {
        reference /= 2;
    }

    let mut nx = system;
    let mut ny = reference;
    while nx > ClockFraction::MAX_DIVISOR as u64 || ny > ClockFraction::MAX_DIVIDEND as u64 {
        if nx % 10 == 0 && ny % 10 == 0 {
            nx /= 10;
            ny /= 10;
        } else {
            nx >>= 2;
            ny >>= 2;
        }
    }

    if nx == 0 || ny == 0 {
        None
    } else {
        Some(ClockFraction { dividend: ny as u32, divisor: nx as u32 })
    }
}


/// Computes the 16x oversampling divisor, rounding on the first decimal.
pub fn baud_divisor(uart_clock_hz: u32, baud_rate: u32) -> u32 {
    let clock = u64::from(uart_clock_hz);
    let sixteen_baud = 16 * u64::from(baud_rate);
    if sixteen_baud == 0 {
        return 0;
    }
    let tenths = clock * 10 / sixteen_baud % 10;
    let mut divisor = clock / sixteen_baud;
    if tenths >= 5 {
        divisor += 1;
    }
    divisor as u32
}


fn even_parity(data: u16) -> u16 {
    (data & 0xFF).count_ones() as u16 & 1
}


/// A UART instance.
pub struct Uart {
    id: UartId,
    registers: StaticRef<UartRegisters>,
}
impl Uart {
    pub fn new(id: UartId, registers: StaticRef<UartRegisters>) -> Self {
        Self { id, registers }
    }

    pub fn id(&self) -> UartId {
        self.id
    }

    /// Configures the clock divider chain and the line settings.
    pub fn init(&mut self, clock: &mut Clock, config: &UartConfig) -> Result<(), Error> {
        if config.baud_rate == 0 {
            return Err(Error::InvalidParameter("baud rate"));
        }
        let system_hz = clock.system_clock_hz();
        if system_hz == 0 {
            return Err(Error::InvalidParameter("system clock"));
        }

        let fraction = match reference_clock_for(config.baud_rate) {
            Some(reference_hz) => calculate_fraction(system_hz, reference_hz)
                .ok_or(Error::InvalidParameter("UART reference clock"))?,
            None => FALLBACK_FRACTION,
        };
        let source = clock.uart_clock_source(self.id);
        clock.set_uart_fraction(source, fraction)?;

        let uart_hz = clock.uart_fraction(source).apply(system_hz);
        let divisor = baud_divisor(uart_hz, config.baud_rate);
        if divisor == 0 || divisor > 0xFFFF {
            return Err(Error::InvalidParameter("baud rate"));
        }
        log::debug!(
            "{:?}: {} baud from {} Hz via {}/{} -> {} Hz, divisor {}",
            self.id, config.baud_rate, system_hz, fraction.dividend, fraction.divisor, uart_hz, divisor,
        );

        self.write_divisor_latch(divisor);

        let regs = &*self.registers;
        let word_length = match config.data_bits {
            DataBits::Eight => LCR::WLS::Bits8,
            DataBits::Seven => LCR::WLS::Bits7,
        };
        let parity = match config.parity {
            Parity::None => LCR::PEN::CLEAR,
            Parity::Odd => LCR::PEN::SET + LCR::EPS::CLEAR,
            Parity::Even => LCR::PEN::SET + LCR::EPS::SET,
        };
        let stop_bits = match config.stop_bits {
            StopBits::One => LCR::STB::CLEAR,
            StopBits::Two => LCR::STB::SET,
        };
        regs.lcr.modify(
            word_length
            + parity
            + stop_bits
            + LCR::STKYP.val(u32::from(config.sticky_parity))
        );
        regs.dlh_ier.modify(
            IER::HSE.val(u32::from(config.high_speed))
            + IER::NRZE.val(u32::from(config.nrz_coding))
        );
        Ok(())
    }

    fn write_divisor_latch(&mut self, divisor: u32) {
        let regs = &*self.registers;
        regs.lcr.modify(LCR::DLAB::SET);
        regs.dlh_ier.set((divisor >> 8) & 0xFF);
        regs.rbr_thr_dll.set(divisor & 0xFF);
        regs.lcr.modify(LCR::DLAB::CLEAR);
    }

    pub fn fifo_config(&mut self, config: &FifoConfig) {
        let regs = &*self.registers;
        if config.enable {
            let mut fcr = FCR::TRFIFOE::SET;
            if config.bus == PeripheralBus::Bits32 {
                fcr += FCR::BUS::Bits32;
            }
            if config.reset_rx {
                fcr += FCR::RESETRF::SET;
            }
            if config.reset_tx {
                fcr += FCR::RESETTF::SET;
            }
            if config.tx_level == TxFifoLevel::Empty {
                fcr += FCR::TIL::Empty;
            }
            fcr += match config.rx_level {
                RxFifoLevel::Bytes1 => FCR::ITL::Bytes1,
                RxFifoLevel::Bytes8 => FCR::ITL::Bytes8,
                RxFifoLevel::Bytes16 => FCR::ITL::Bytes16,
                RxFifoLevel::Bytes32 => FCR::ITL::Bytes32,
            };
            regs.iir_fcr.write(fcr);
        } else {
            regs.iir_fcr.set(0);
        }

        regs.mcr.modify(MCR::AFE.val(u32::from(config.auto_flow_control)));
        regs.dlh_ier.modify(IER::DMAE.val(u32::from(config.dma)));
    }

    pub fn ir_config(&mut self, config: &IrConfig) {
        let pulse_width = match config.pulse_width {
            IrPulseWidth::BitTime3_16 => ISR::XMODE::CLEAR,
            IrPulseWidth::Fixed1_6us => ISR::XMODE::SET,
        };
        let tx_polarity = match config.tx_polarity {
            IrPolarity::Positive => ISR::TXPL::CLEAR,
            IrPolarity::Negative => ISR::TXPL::SET,
        };
        let rx_polarity = match config.rx_polarity {
            IrPolarity::Positive => ISR::RXPL::CLEAR,
            IrPolarity::Negative => ISR::RXPL::SET,
        };
        self.registers.isr.modify(pulse_width + tx_polarity + rx_polarity);
        self.registers.isr.modify(
            ISR::XMITIR.val(u32::from(config.tx_enable))
            + ISR::RCVEIR.val(u32::from(config.rx_enable))
        );
    }

    pub fn auto_baud_config(&mut self, config: &AutoBaudConfig) {
        let calculation = match config.calculation {
            AutoBaudCalculation::Table => ABR::ABT::CLEAR,
            AutoBaudCalculation::Formula => ABR::ABT::SET,
        };
        let program = match config.program {
            AutoBaudProgram::Processor => ABR::ABUP::CLEAR,
            AutoBaudProgram::Uart => ABR::ABUP::SET,
        };
        self.registers.abr.modify(calculation + program);
        self.registers.abr.modify(ABR::ABE.val(u32::from(config.enable)));
    }

    pub fn enable(&mut self) {
        self.registers.dlh_ier.modify(IER::UUE::SET);
    }

    pub fn disable(&mut self) {
        self.registers.dlh_ier.modify(IER::UUE::CLEAR);
    }

    /// Lets the DMA controller service the FIFOs.
    pub fn set_dma(&mut self, enable: bool) {
        self.registers.dlh_ier.modify(IER::DMAE.val(u32::from(enable)));
    }

    pub fn set_break(&mut self, enable: bool) {
        self.registers.lcr.modify(LCR::SB.val(u32::from(enable)));
    }

    pub fn set_loopback(&mut self, enable: bool) {
        self.registers.mcr.modify(MCR::LOOP.val(u32::from(enable)));
    }

    pub fn set_out1(&mut self, high: bool) {
        self.registers.mcr.modify(MCR::OUT1.val(u32::from(high)));
    }

    pub fn set_out2(&mut self, high: bool) {
        self.registers.mcr.modify(MCR::OUT2.val(u32::from(high)));
    }

    pub fn set_dtr(&mut self, high: bool) {
        self.registers.mcr.modify(MCR::DTR.val(u32::from(high)));
    }

    pub fn assert_rts(&mut self) {
        self.registers.mcr.modify(MCR::RTS::SET);
    }

    pub fn deassert_rts(&mut self) {
        self.registers.mcr.modify(MCR::RTS::CLEAR);
    }

    /// Programs the divisor latch from an auto-baud count.
    pub fn set_auto_baud_divisor(&mut self, count: u16) {
        let regs = &*self.registers;
        regs.lcr.modify(LCR::DLAB::SET);
        regs.dlh_ier.set(u32::from(count >> 12) & 0xFF);
        regs.rbr_thr_dll.set(u32::from(count >> 4) & 0xFF);
        regs.lcr.modify(LCR::DLAB::CLEAR);
    }

    /// Reads the receive buffer without checking whether it holds data.
    pub fn receive(&mut self) -> u8 {
        (self.registers.rbr_thr_dll.get() & 0xFF) as u8
    }

    /// Writes the transmit holding register without checking whether it has room.
    pub fn send(&mut self, byte: u8) {
        self.registers.rbr_thr_dll.set(u32::from(byte));
    }

    /// Sends a 9-bit character by abusing the parity bit as the ninth bit.
    ///
    /// The line must have parity enabled and sticky parity disabled.
    pub fn send_9bits(&mut self, data: u16) -> Result<(), Error> {
        if data > 0x1FF {
            return Err(Error::InvalidParameter("9-bit data"));
        }
        let parity = even_parity(data);
        let ninth = (data >> 8) & 0x01;

        // EPS selects the parity that makes the parity bit come out as the ninth bit
        let even = u32::from(ninth ^ parity == 0);
        self.registers.lcr.modify(LCR::EPS.val(even));
        self.registers.rbr_thr_dll.set(u32::from(data & 0xFF));
        self.registers.lcr.modify(LCR::EPS::SET);
        Ok(())
    }

    /// Waits for a 9-bit character sent with even parity and recovers its ninth bit from the
    /// parity error flag.
    pub fn receive_9bits(&mut self) -> Result<u16, Error> {
        let regs = &*self.registers;
        // PE clears on read; take it from the same snapshot as DR
        let mut lsr = regs.lsr.extract();
        poll_until(RECEIVE_POLLS, WaitFor::UartReceive, || {
            lsr = regs.lsr.extract();
            lsr.is_set(LSR::DR)
        })?;
        let parity_error = lsr.read(LSR::PE) as u16;

        let data = (regs.rbr_thr_dll.get() & 0xFF) as u16;
        let ninth = even_parity(data) ^ parity_error;
        Ok((data | (ninth << 8)) & 0x1FF)
    }

    pub fn set_stop_bits(&mut self, stop_bits: StopBits) {
        let value = match stop_bits {
            StopBits::One => LCR::STB::CLEAR,
            StopBits::Two => LCR::STB::SET,
        };
        self.registers.lcr.modify(value);
    }

    pub fn auto_baud_count(&self) -> u16 {
        self.registers.acr.read(ACR::COUNT_VALUE) as u16
    }

    pub fn line_status(&self, status: LineStatus) -> bool {
        let field = match status {
            LineStatus::DataReady => LSR::DR,
            LineStatus::OverrunError => LSR::OE,
            LineStatus::ParityError => LSR::PE,
            LineStatus::FramingError => LSR::FE,
            LineStatus::BreakInterrupt => LSR::BI,
            LineStatus::TransmitDataRequest => LSR::TDRQ,
            LineStatus::TransmitterEmpty => LSR::TEMT,
            LineStatus::FifoError => LSR::FIFOE,
        };
        self.registers.lsr.is_set(field)
    }

    pub fn modem_status(&self, status: ModemStatus) -> bool {
        let field = match status {
            ModemStatus::DeltaClearToSend => MSR::DCTS,
            ModemStatus::DeltaDataSetReady => MSR::DDSR,
            ModemStatus::TrailingEdgeRingIndicator => MSR::TERI,
            ModemStatus::DeltaDataCarrierDetect => MSR::DDCD,
            ModemStatus::ClearToSend => MSR::CTS,
            ModemStatus::DataSetReady => MSR::DSR,
            ModemStatus::RingIndicator => MSR::RI,
            ModemStatus::DataCarrierDetect => MSR::DCD,
        };
        self.registers.msr.is_set(field)
    }

    pub fn rx_fifo_level(&self) -> u32 {
        self.registers.rfor.read(RFOR::BYTE_COUNT)
    }

    /// Masks or unmasks an interrupt. Unmasking also raises OUT2, which gates the interrupt line.
    pub fn set_interrupt_mask(&mut self, interrupt: UartInterrupt, masked: bool) {
        let regs = &*self.registers;
        let enable = u32::from(!masked);
        if !masked {
            regs.mcr.modify(MCR::OUT2::SET);
        }

        match interrupt {
            UartInterrupt::AutoBaudLock => regs.abr.modify(ABR::ABLIE.val(enable)),
            UartInterrupt::ReceiveTimeout => regs.dlh_ier.modify(IER::RTOIE.val(enable)),
            UartInterrupt::Modem => regs.dlh_ier.modify(IER::MIE.val(enable)),
            UartInterrupt::TransmitDataRequest => regs.dlh_ier.modify(IER::TIE.val(enable)),
            UartInterrupt::ReceiveDataAvailable => regs.dlh_ier.modify(IER::RAVIE.val(enable)),
            UartInterrupt::ReceiveLineStatus => regs.dlh_ier.modify(IER::RLSE.val(enable)),
            UartInterrupt::All => {
                regs.abr.modify(ABR::ABLIE.val(enable));
                regs.dlh_ier.modify(
                    IER::RTOIE.val(enable)
                    + IER::MIE.val(enable)
                    + IER::TIE.val(enable)
                    + IER::RAVIE.val(enable)
                    + IER::RLSE.val(enable)
                );
            },
        }
    }

    /// Sends bytes one at a time, waiting for the transmitter to empty before each.
    pub fn write_line(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            let regs = &*self.registers;
            poll_until(TRANSMIT_POLLS, WaitFor::UartTransmit, || regs.lsr.is_set(LSR::TEMT))?;
            self.send(byte);
        }
        Ok(())
    }
}
impl fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_line(s.as_bytes())
            .map_err(|_| fmt::Error)
    }
}
