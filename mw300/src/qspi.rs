//! QSPI controller.
//!
//! Every serial flash command is a single transaction: a header made of instruction, address,
//! read-mode and dummy bytes, followed by data going out through the write FIFO or coming back
//! through the read FIFO. [`Header`] captures the header; the [`QspiTransport`] trait runs a
//! whole transaction so the flash driver does not care whether it talks to the real controller.


use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::error::{poll_until, Error, WaitFor};
use crate::regs::StaticRef;
use crate::regs::qspi::{CNTL, CONF, DINCNT, HDRCNT, INSTR, QspiRegisters, RDMODE, TIMING};


/// Polls spent on each controller status bit.
pub const STATUS_POLLS: u32 = 100_000;


/// How many lines carry data (and, with [`AddressPins::AsData`], the address).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DataPins {
    Single,
    Dual,
    Quad,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AddressPins {
    /// Address bytes go out on a single line.
    Single,

    /// Address and read-mode bytes use the data lines.
    AsData,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Direction {
    Read,
    Write,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ClockPhase {
    /// Data is sampled on the first clock edge.
    Leading,
    Trailing,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ClockPolarity {
    IdleLow,
    IdleHigh,
}


/// Which serial clock edge latches incoming data.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CaptureEdge {
    Falling,
    Rising,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QspiConfig {
    /// Serial clock prescaler field, 0..=31.
    pub prescaler: u32,
    pub clock_phase: ClockPhase,
    pub clock_polarity: ClockPolarity,
    pub capture_edge: CaptureEdge,
}
impl Default for QspiConfig {
    fn default() -> Self {
        Self {
            prescaler: 1,
            clock_phase: ClockPhase::Leading,
            clock_polarity: ClockPolarity::IdleLow,
            capture_edge: CaptureEdge::Falling,
        }
    }
}


/// The header phase of a QSPI transaction.
///
/// The data-in count of a read is taken from the length of the receive buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Header {
    pub instruction: u16,

    /// Instruction bytes, 0..=2.
    pub instruction_count: u8,

    pub address: u32,

    /// Address bytes, 0..=4.
    pub address_count: u8,

    pub read_mode: u16,

    /// Read-mode bytes, 0..=2.
    pub read_mode_count: u8,

    /// Dummy bytes, 0..=3.
    pub dummy_count: u8,

    pub data_pins: DataPins,
    pub address_pins: AddressPins,
}
impl Header {
    /// A one-byte instruction on a single line without address, read-mode or dummy bytes.
    pub const fn command(instruction: u8) -> Self {
        Self {
            instruction: instruction as u16,
            instruction_count: 1,
            address: 0,
            address_count: 0,
            read_mode: 0,
            read_mode_count: 0,
            dummy_count: 0,
            data_pins: DataPins::Single,
            address_pins: AddressPins::Single,
        }
    }

    pub const fn with_instruction(mut self, instruction: u16, count: u8) -> Self {
        self.instruction = instruction;
        self.instruction_count = count;
        self
    }

    pub const fn with_address(mut self, address: u32, count: u8) -> Self {
        self.address = address;
        self.address_count = count;
        self
    }

    pub const fn with_read_mode(mut self, read_mode: u16, count: u8) -> Self {
        self.read_mode = read_mode;
        self.read_mode_count = count;
        self
    }

    pub const fn with_dummy(mut self, count: u8) -> Self {
        self.dummy_count = count;
        self
    }

    pub const fn with_pins(mut self, data_pins: DataPins, address_pins: AddressPins) -> Self {
        self.data_pins = data_pins;
        self.address_pins = address_pins;
        self
    }

    /// Checks the byte counts against what the header count register can hold.
    pub fn validate(&self) -> Result<(), Error> {
        if self.instruction_count > 2 {
            return Err(Error::InvalidParameter("instruction count"));
        }
        if self.address_count > 4 {
            return Err(Error::InvalidParameter("address count"));
        }
        if self.read_mode_count > 2 {
            return Err(Error::InvalidParameter("read mode count"));
        }
        if self.dummy_count > 3 {
            return Err(Error::InvalidParameter("dummy count"));
        }
        Ok(())
    }
}


/// Something that can run complete QSPI transactions.
pub trait QspiTransport {
    /// Sends the header followed by `data`.
    fn write(&mut self, header: &Header, data: &[u8]) -> Result<(), Error>;

    /// Sends the header and then clocks in `buffer.len()` bytes.
    fn read(&mut self, header: &Header, buffer: &mut [u8]) -> Result<(), Error>;
}


/// Drops the transfer and deselects the flash without waiting on the controller.
fn abort_transfer(regs: &QspiRegisters) {
    regs.conf.modify(CONF::XFER_START::CLEAR);
    regs.cntl.modify(CNTL::SS_EN::CLEAR);
}


/// The QSPI controller.
pub struct Qspi {
    registers: StaticRef<QspiRegisters>,
}
impl Qspi {
    pub fn new(registers: StaticRef<QspiRegisters>) -> Self {
        Self { registers }
    }

    /// Sets up the serial clock.
    pub fn init(&mut self, config: &QspiConfig) -> Result<(), Error> {
        if config.prescaler > 0x1F {
            return Err(Error::InvalidParameter("QSPI clock prescaler"));
        }
        let phase = match config.clock_phase {
            ClockPhase::Leading => CONF::CLK_PHA::CLEAR,
            ClockPhase::Trailing => CONF::CLK_PHA::SET,
        };
        let polarity = match config.clock_polarity {
            ClockPolarity::IdleLow => CONF::CLK_POL::CLEAR,
            ClockPolarity::IdleHigh => CONF::CLK_POL::SET,
        };
        let edge = match config.capture_edge {
            CaptureEdge::Falling => TIMING::CLK_CAPT_EDGE::Falling,
            CaptureEdge::Rising => TIMING::CLK_CAPT_EDGE::Rising,
        };

        self.registers.conf.modify(CONF::CLK_PRESCALE.val(config.prescaler) + phase + polarity);
        self.registers.timing.modify(edge);
        Ok(())
    }

    /// Empties both FIFOs.
    pub fn flush_fifo(&mut self) -> Result<(), Error> {
        let regs = &*self.registers;
        regs.conf.modify(CONF::FIFO_FLUSH::SET);
        poll_until(STATUS_POLLS, WaitFor::QspiStatus, || !regs.conf.is_set(CONF::FIFO_FLUSH))
    }

    pub fn set_header_count(&mut self, instruction: u8, address: u8, read_mode: u8, dummy: u8) -> Result<(), Error> {
        if instruction > 2 || address > 4 || read_mode > 2 || dummy > 3 {
            return Err(Error::InvalidParameter("QSPI header count"));
        }
        self.registers.hdrcnt.write(
            HDRCNT::INSTR_CNT.val(instruction.into())
            + HDRCNT::ADDR_CNT.val(address.into())
            + HDRCNT::RM_CNT.val(read_mode.into())
            + HDRCNT::DUMMY_CNT.val(dummy.into())
        );
        Ok(())
    }

    /// Sets how many bytes a read transfer clocks in.
    pub fn set_data_in_count(&mut self, count: u32) -> Result<(), Error> {
        if count > 0xF_FFFF {
            return Err(Error::InvalidParameter("QSPI data-in count"));
        }
        self.registers.dincnt.write(DINCNT::DATA_IN_CNT.val(count));
        Ok(())
    }

    pub fn set_instruction(&mut self, instruction: u16) {
        self.registers.instr.write(INSTR::INSTR.val(instruction.into()));
    }

    pub fn set_address(&mut self, address: u32) {
        self.registers.addr.set(address);
    }

    pub fn set_read_mode(&mut self, read_mode: u16) {
        self.registers.rdmode.write(RDMODE::RMODE.val(read_mode.into()));
    }

    pub fn set_pins(&mut self, data_pins: DataPins, address_pins: AddressPins) {
        let data = match data_pins {
            DataPins::Single => CONF::DATA_PIN::Single,
            DataPins::Dual => CONF::DATA_PIN::Dual,
            DataPins::Quad => CONF::DATA_PIN::Quad,
        };
        let address = match address_pins {
            AddressPins::Single => CONF::ADDR_PIN::Single,
            AddressPins::AsData => CONF::ADDR_PIN::AsData,
        };
        self.registers.conf.modify(data + address);
    }

    pub fn set_slave_select(&mut self, selected: bool) {
        self.registers.cntl.modify(CNTL::SS_EN.val(u32::from(selected)));
    }

    /// Selects the flash and kicks off the header phase. The flash is deselected again if the
    /// controller never becomes ready.
    pub fn start_transfer(&mut self, direction: Direction) -> Result<(), Error> {
        let regs = &*self.registers;
        regs.cntl.modify(CNTL::SS_EN::SET);
        if let Err(e) = poll_until(STATUS_POLLS, WaitFor::QspiStatus, || regs.cntl.is_set(CNTL::XFER_RDY)) {
            abort_transfer(regs);
            return Err(e);
        }

        let rw = match direction {
            Direction::Read => CONF::RW_EN::Read,
            Direction::Write => CONF::RW_EN::Write,
        };
        regs.conf.modify(rw);
        regs.conf.modify(CONF::XFER_START::SET);
        Ok(())
    }

    /// Drains the write FIFO, ends the transfer and deselects the flash. The flash is
    /// deselected even if draining times out.
    pub fn stop_transfer(&mut self) -> Result<(), Error> {
        let result = self.drain_and_stop();
        if result.is_err() {
            abort_transfer(&self.registers);
        } else {
            self.registers.cntl.modify(CNTL::SS_EN::CLEAR);
        }
        result
    }

    fn drain_and_stop(&mut self) -> Result<(), Error> {
        let regs = &*self.registers;
        poll_until(STATUS_POLLS, WaitFor::QspiStatus, || regs.cntl.is_set(CNTL::WFIFO_EMPTY))?;
        poll_until(STATUS_POLLS, WaitFor::QspiStatus, || regs.cntl.is_set(CNTL::XFER_RDY))?;

        regs.conf.modify(CONF::XFER_STOP::SET);
        poll_until(STATUS_POLLS, WaitFor::QspiStatus, || !regs.conf.is_set(CONF::XFER_START))
    }


    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        let regs = &*self.registers;
        poll_until(STATUS_POLLS, WaitFor::QspiStatus, || !regs.cntl.is_set(CNTL::WFIFO_FULL))?;
        regs.dout.set(u32::from(byte));
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8, Error> {
        let regs = &*self.registers;
        poll_until(STATUS_POLLS, WaitFor::QspiStatus, || !regs.cntl.is_set(CNTL::RFIFO_EMPTY))?;
        Ok((regs.din.get() & 0xFF) as u8)
    }

    fn prepare(&mut self, header: &Header, data_in: usize) -> Result<(), Error> {
        header.validate()?;
        let data_in = u32::try_from(data_in)
            .map_err(|_| Error::InvalidParameter("QSPI data-in count"))?;

        self.flush_fifo()?;
        self.set_header_count(
            header.instruction_count,
            header.address_count,
            header.read_mode_count,
            header.dummy_count,
        )?;
        self.set_data_in_count(data_in)?;
        self.set_instruction(header.instruction);
        self.set_address(header.address);
        self.set_read_mode(header.read_mode);
        self.set_pins(header.data_pins, header.address_pins);
        self.registers.conf.modify(CONF::BYTE_LEN::CLEAR);
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        self.start_transfer(Direction::Write)?;
        if let Err(e) = data.iter().try_for_each(|&byte| self.write_byte(byte)) {
            abort_transfer(&self.registers);
            return Err(e);
        }
        self.stop_transfer()
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        self.start_transfer(Direction::Read)?;
        let mut result = Ok(());
        for slot in buffer.iter_mut() {
            match self.read_byte() {
                Ok(byte) => *slot = byte,
                Err(e) => {
                    result = Err(e);
                    break;
                },
            }
        }
        if result.is_err() {
            abort_transfer(&self.registers);
        } else {
            self.set_slave_select(false);
        }
        result
    }
}
impl QspiTransport for Qspi {
    fn write(&mut self, header: &Header, data: &[u8]) -> Result<(), Error> {
        self.prepare(header, 0)?;
        self.send(data)
    }

    fn read(&mut self, header: &Header, buffer: &mut [u8]) -> Result<(), Error> {
        self.prepare(header, buffer.len())?;
        self.receive(buffer)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{peek, poke, ram_block};

    #[test]
    fn header_builder() {
        let header = Header::command(0xEB)
            .with_address(0x12_3456, 3)
            .with_read_mode(0, 1)
            .with_dummy(2)
            .with_pins(DataPins::Quad, AddressPins::AsData);
        assert_eq!(header.instruction, 0xEB);
        assert_eq!(header.instruction_count, 1);
        assert_eq!(header.address_count, 3);
        assert_eq!(header.read_mode_count, 1);
        assert_eq!(header.dummy_count, 2);
        assert_eq!(header.validate(), Ok(()));

        assert!(Header::command(0x9F).with_address(0, 5).validate().is_err());
        assert!(Header::command(0x9F).with_dummy(4).validate().is_err());
        assert!(Header::command(0xFF).with_instruction(0xFFFF, 3).validate().is_err());
    }

    #[test]
    fn header_count_fields() {
        let mut qspi = Qspi::new(ram_block());
        qspi.set_header_count(1, 3, 1, 2).unwrap();
        assert_eq!(peek(&qspi.registers.hdrcnt), 0x1 | (0x3 << 4) | (0x1 << 8) | (0x2 << 12));
        assert!(qspi.set_header_count(1, 5, 0, 0).is_err());
        assert!(qspi.set_data_in_count(0x10_0000).is_err());
        qspi.set_data_in_count(256).unwrap();
        assert_eq!(qspi.registers.dincnt.read(DINCNT::DATA_IN_CNT), 256);
    }

    #[test]
    fn pins_and_config() {
        let mut qspi = Qspi::new(ram_block());
        qspi.set_pins(DataPins::Quad, AddressPins::AsData);
        assert_eq!(qspi.registers.conf.read(CONF::DATA_PIN), 2);
        assert!(qspi.registers.conf.is_set(CONF::ADDR_PIN));
        qspi.set_pins(DataPins::Dual, AddressPins::Single);
        assert_eq!(qspi.registers.conf.read(CONF::DATA_PIN), 1);
        assert!(!qspi.registers.conf.is_set(CONF::ADDR_PIN));

        let config = QspiConfig {
            prescaler: 4,
            clock_polarity: ClockPolarity::IdleHigh,
            capture_edge: CaptureEdge::Rising,
            ..QspiConfig::default()
        };
        qspi.init(&config).unwrap();
        assert_eq!(qspi.registers.conf.read(CONF::CLK_PRESCALE), 4);
        assert!(qspi.registers.conf.is_set(CONF::CLK_POL));
        assert!(!qspi.registers.conf.is_set(CONF::CLK_PHA));
        assert!(qspi.registers.timing.is_set(TIMING::CLK_CAPT_EDGE));

        let bad = QspiConfig { prescaler: 32, ..QspiConfig::default() };
        assert!(qspi.init(&bad).is_err());
    }

    #[test]
    fn start_selects_and_sets_direction() {
        let mut qspi = Qspi::new(ram_block());
        poke(&qspi.registers.cntl, 1 << 1);
        qspi.start_transfer(Direction::Write).unwrap();
        assert!(qspi.registers.cntl.is_set(CNTL::SS_EN));
        assert!(qspi.registers.conf.is_set(CONF::RW_EN));
        assert!(qspi.registers.conf.is_set(CONF::XFER_START));
    }

    #[test]
    fn start_times_out_when_controller_busy() {
        let mut qspi = Qspi::new(ram_block());
        assert_eq!(qspi.start_transfer(Direction::Read), Err(Error::Timeout(WaitFor::QspiStatus)));
        assert!(!qspi.registers.cntl.is_set(CNTL::SS_EN));
    }

    #[test]
    fn write_timeout_deselects_flash() {
        let mut qspi = Qspi::new(ram_block());
        poke(&qspi.registers.cntl, (1 << 1) | (1 << 5));
        assert_eq!(qspi.send(&[0x02, 0x00]), Err(Error::Timeout(WaitFor::QspiStatus)));
        assert!(!qspi.registers.cntl.is_set(CNTL::SS_EN));
        assert!(!qspi.registers.conf.is_set(CONF::XFER_START));

        // next command starts from a deselected flash
        poke(&qspi.registers.cntl, 1 << 1);
        qspi.start_transfer(Direction::Write).unwrap();
        assert!(qspi.registers.cntl.is_set(CNTL::SS_EN));
    }

    #[test]
    fn read_timeout_deselects_flash() {
        let mut qspi = Qspi::new(ram_block());
        poke(&qspi.registers.cntl, (1 << 1) | (1 << 2));
        let mut buffer = [0u8; 4];
        assert_eq!(qspi.receive(&mut buffer), Err(Error::Timeout(WaitFor::QspiStatus)));
        assert!(!qspi.registers.cntl.is_set(CNTL::SS_EN));
        assert!(!qspi.registers.conf.is_set(CONF::XFER_START));
    }

    #[test]
    fn stop_timeout_deselects_flash() {
        let mut qspi = Qspi::new(ram_block());
        poke(&qspi.registers.cntl, (1 << 0) | (1 << 1));
        assert_eq!(qspi.stop_transfer(), Err(Error::Timeout(WaitFor::QspiStatus)));
        assert!(!qspi.registers.cntl.is_set(CNTL::SS_EN));
    }

    #[test]
    fn stop_deselects() {
        let mut qspi = Qspi::new(ram_block());
        poke(&qspi.registers.cntl, (1 << 0) | (1 << 1) | (1 << 4));
        qspi.stop_transfer().unwrap();
        assert!(qspi.registers.conf.is_set(CONF::XFER_STOP));
        assert!(!qspi.registers.cntl.is_set(CNTL::SS_EN));
    }

    #[test]
    fn flush_waits_for_hardware() {
        let mut qspi = Qspi::new(ram_block());
        assert_eq!(qspi.flush_fifo(), Err(Error::Timeout(WaitFor::QspiStatus)));
        assert!(qspi.registers.conf.is_set(CONF::FIFO_FLUSH));
    }

    #[test]
    fn fifo_bytes() {
        let mut qspi = Qspi::new(ram_block());
        qspi.write_byte(0x5A).unwrap();
        assert_eq!(qspi.registers.dout.get(), 0x5A);

        poke(&qspi.registers.din, 0x1234_56C3);
        assert_eq!(qspi.read_byte(), Ok(0xC3));

        poke(&qspi.registers.cntl, 1 << 2);
        assert_eq!(qspi.read_byte(), Err(Error::Timeout(WaitFor::QspiStatus)));
    }
}
