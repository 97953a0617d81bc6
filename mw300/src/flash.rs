//! Serial NOR flash attached to the QSPI controller.
//!
//! Commands follow the common 25-series instruction set. Geometry comes from a table of known
//! parts keyed by JEDEC ID; a few parts need special handling when writing the status register
//! or enabling quad mode, keyed off the same ID.


use crate::error::{Error, WaitFor};
use crate::qspi::{AddressPins, DataPins, Header, QspiTransport};


pub const KILO_BYTE: u32 = 1024;
pub const MEGA_BYTE: u32 = 1024 * KILO_BYTE;

pub const BLOCK_32K_SIZE: u32 = 32 * KILO_BYTE;
pub const BLOCK_64K_SIZE: u32 = 64 * KILO_BYTE;

/// Busy polls after writing the status register.
pub const STATUS_WRITE_POLLS: u32 = 100_000;

/// Busy polls after a page program or a sector erase.
pub const PROGRAM_POLLS: u32 = 1_000_000;

/// Busy polls after a 32K or 64K block erase.
pub const BLOCK_ERASE_POLLS: u32 = 2_000_000;

/// Busy polls after a chip erase.
pub const CHIP_ERASE_POLLS: u32 = 0x0FFF_FFFF;


const MANUFACTURER_MACRONIX: u32 = 0xC2;

// GigaDevice parts that only take one status byte per write
const GD25Q32C: u32 = 0xC8_4016;
const GD25Q127C: u32 = 0xC8_4018;


pub mod opcode {
    pub const WRITE_ENABLE: u8 = 0x06;
    pub const WRITE_DISABLE: u8 = 0x04;
    pub const WRITE_ENABLE_VOLATILE: u8 = 0x50;
    pub const READ_STATUS_1: u8 = 0x05;
    pub const READ_STATUS_2: u8 = 0x35;
    pub const WRITE_STATUS_1: u8 = 0x01;
    pub const WRITE_STATUS_2: u8 = 0x31;
    pub const PAGE_PROGRAM: u8 = 0x02;
    pub const QUAD_PAGE_PROGRAM: u8 = 0x32;
    pub const QUAD_PAGE_PROGRAM_MACRONIX: u8 = 0x38;
    pub const SECTOR_ERASE: u8 = 0x20;
    pub const BLOCK_ERASE_32K: u8 = 0x52;
    pub const BLOCK_ERASE_64K: u8 = 0xD8;
    pub const CHIP_ERASE: u8 = 0xC7;
    pub const POWER_DOWN: u8 = 0xB9;
    pub const RELEASE_POWER_DOWN: u8 = 0xAB;
    pub const READ: u8 = 0x03;
    pub const FAST_READ: u8 = 0x0B;
    pub const FAST_READ_DUAL_OUT: u8 = 0x3B;
    pub const FAST_READ_DUAL_IO: u8 = 0xBB;
    pub const FAST_READ_QUAD_OUT: u8 = 0x6B;
    pub const FAST_READ_QUAD_IO: u8 = 0xEB;
    pub const WORD_FAST_READ_QUAD_IO: u8 = 0xE7;
    pub const OCTAL_WORD_FAST_READ_QUAD_IO: u8 = 0xE3;
    pub const READ_UNIQUE_ID: u8 = 0x4B;
    pub const JEDEC_ID: u8 = 0x9F;
    pub const FAST_READ_DUAL_RESET: u16 = 0xFFFF;
    pub const FAST_READ_QUAD_RESET: u8 = 0xFF;
}


/// Geometry of a supported flash part.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FlashDevice {
    pub name: &'static str,
    pub jedec_id: u32,
    pub chip_size: u32,
    pub sector_size: u32,
    pub block_size: u32,
    pub page_size: u32,
}
impl FlashDevice {
    const fn new(name: &'static str, jedec_id: u32, chip_size: u32) -> Self {
        Self {
            name,
            jedec_id,
            chip_size,
            sector_size: 4 * KILO_BYTE,
            block_size: 64 * KILO_BYTE,
            page_size: 256,
        }
    }

    /// Looks up a part by JEDEC ID. Where two parts share an ID, the first one listed wins.
    pub fn from_jedec_id(jedec_id: u32) -> Option<&'static FlashDevice> {
        DEVICES.iter()
            .find(|device| device.jedec_id == jedec_id)
    }

    pub fn manufacturer(&self) -> u32 {
        (self.jedec_id >> 16) & 0xFF
    }

    fn is_macronix(&self) -> bool {
        self.manufacturer() == MANUFACTURER_MACRONIX
    }

    fn has_split_status_write(&self) -> bool {
        self.jedec_id == GD25Q32C || self.jedec_id == GD25Q127C
    }

    pub fn sector_count(&self) -> u32 {
        self.chip_size / self.sector_size
    }
}


pub const DEVICES: &[FlashDevice] = &[
    FlashDevice::new("W25Q80BL", 0xEF_4014, MEGA_BYTE),
    FlashDevice::new("W25Q16CL", 0xEF_4015, 2 * MEGA_BYTE),
    FlashDevice::new("W25Q32BV", 0xEF_4016, 4 * MEGA_BYTE),
    FlashDevice::new("W25Q64CV", 0xEF_4017, 8 * MEGA_BYTE),
    FlashDevice::new("W25Q128BV", 0xEF_4018, 16 * MEGA_BYTE),
    FlashDevice::new("GD25Q16B", 0xC8_4015, 2 * MEGA_BYTE),
    FlashDevice::new("GD25Q16C", 0xC8_4015, 2 * MEGA_BYTE),
    FlashDevice::new("GD25Q32C", 0xC8_4016, 4 * MEGA_BYTE),
    FlashDevice::new("GD25LQ32C", 0xC8_6016, 4 * MEGA_BYTE),
    FlashDevice::new("GD25Q127C", 0xC8_4018, 16 * MEGA_BYTE),
    FlashDevice::new("MX25L8035E", 0xC2_2014, MEGA_BYTE),
    FlashDevice::new("MX25L3233F", 0xC2_2016, 4 * MEGA_BYTE),
    FlashDevice::new("MX25L6433F", 0xC2_2017, 8 * MEGA_BYTE),
    FlashDevice::new("MX25L12835F", 0xC2_2018, 16 * MEGA_BYTE),
    FlashDevice::new("MX25R512F", 0xC2_2810, 64 * KILO_BYTE),
    FlashDevice::new("MX25R1035F", 0xC2_2811, 128 * KILO_BYTE),
    FlashDevice::new("MX25R2035F", 0xC2_2812, 256 * KILO_BYTE),
    FlashDevice::new("MX25R4035F", 0xC2_2813, 512 * KILO_BYTE),
    FlashDevice::new("MX25R8035F", 0xC2_2814, MEGA_BYTE),
    FlashDevice::new("MX25R1635F", 0xC2_2815, 2 * MEGA_BYTE),
    FlashDevice::new("MX25R3235F", 0xC2_2816, 4 * MEGA_BYTE),
    FlashDevice::new("MX25R6435F", 0xC2_2817, 8 * MEGA_BYTE),
    FlashDevice::new("MX25V512F", 0xC2_2310, 64 * KILO_BYTE),
    FlashDevice::new("MX25V1035F", 0xC2_2311, 128 * KILO_BYTE),
    FlashDevice::new("MX25V2035F", 0xC2_2312, 256 * KILO_BYTE),
    FlashDevice::new("MX25V4035F", 0xC2_2313, 512 * KILO_BYTE),
    FlashDevice::new("MX25V8035F", 0xC2_2314, MEGA_BYTE),
    FlashDevice::new("MX25V1635F", 0xC2_2315, 2 * MEGA_BYTE),
];

/// The part assumed until [`Flash::detect`] says otherwise (W25Q32BV).
pub const DEFAULT_DEVICE: &FlashDevice = &DEVICES[2];


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum StatusRegister {
    /// Status bits 7:0.
    Low,

    /// Status bits 15:8.
    High,
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ReadMode {
    Normal,
    Fast,
    FastDualOut,
    FastDualIo,
    FastQuadOut,
    FastQuadIo,
    WordFastQuadIo,
    OctalWordFastQuadIo,
}
impl ReadMode {
    fn is_quad(self) -> bool {
        matches!(self, Self::FastQuadOut | Self::FastQuadIo | Self::WordFastQuadIo | Self::OctalWordFastQuadIo)
    }

    fn header(self, address: u32) -> Header {
        let base = |instruction| Header::command(instruction).with_address(address, 3);
        match self {
            Self::Normal
                => base(opcode::READ),
            Self::Fast
                => base(opcode::FAST_READ).with_dummy(1),
            Self::FastDualOut
                => base(opcode::FAST_READ_DUAL_OUT).with_dummy(1)
                    .with_pins(DataPins::Dual, AddressPins::Single),
            Self::FastDualIo
                => base(opcode::FAST_READ_DUAL_IO).with_read_mode(0, 1)
                    .with_pins(DataPins::Dual, AddressPins::AsData),
            Self::FastQuadOut
                => base(opcode::FAST_READ_QUAD_OUT).with_dummy(1)
                    .with_pins(DataPins::Quad, AddressPins::Single),
            Self::FastQuadIo
                => base(opcode::FAST_READ_QUAD_IO).with_read_mode(0, 1).with_dummy(2)
                    .with_pins(DataPins::Quad, AddressPins::AsData),
            Self::WordFastQuadIo
                => base(opcode::WORD_FAST_READ_QUAD_IO).with_read_mode(0, 1).with_dummy(1)
                    .with_pins(DataPins::Quad, AddressPins::AsData),
            Self::OctalWordFastQuadIo
                => base(opcode::OCTAL_WORD_FAST_READ_QUAD_IO).with_read_mode(0, 1)
                    .with_pins(DataPins::Quad, AddressPins::AsData),
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ProgramMode {
    Normal,
    Quad,
}


/// A serial flash part behind a QSPI transport.
pub struct Flash<T> {
    transport: T,
    device: &'static FlashDevice,
}
impl<T: QspiTransport> Flash<T> {
    /// Assumes the default part until [`detect`](Self::detect) is called.
    pub fn new(transport: T) -> Self {
        Self::with_device(transport, DEFAULT_DEVICE)
    }

    pub fn with_device(transport: T, device: &'static FlashDevice) -> Self {
        Self { transport, device }
    }

    pub fn device(&self) -> &'static FlashDevice {
        self.device
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    /// Switches to the table entry for `jedec_id`.
    pub fn set_device_by_id(&mut self, jedec_id: u32) -> Result<(), Error> {
        let device = FlashDevice::from_jedec_id(jedec_id)
            .ok_or(Error::UnknownFlash { jedec_id })?;
        self.device = device;
        Ok(())
    }

    /// Reads the JEDEC ID from the part and adopts the matching table entry.
    pub fn detect(&mut self) -> Result<&'static FlashDevice, Error> {
        let jedec_id = self.jedec_id()?;
        self.set_device_by_id(jedec_id)?;
        log::info!(
            "flash: {} (JEDEC ID {:06X}, {} KiB)",
            self.device.name, jedec_id, self.device.chip_size / KILO_BYTE,
        );
        Ok(self.device)
    }

    fn command(&mut self, instruction: u8) -> Result<(), Error> {
        self.transport.write(&Header::command(instruction), &[])
    }

    pub fn power_down(&mut self, enable: bool) -> Result<(), Error> {
        if enable {
            self.command(opcode::POWER_DOWN)
        } else {
            self.command(opcode::RELEASE_POWER_DOWN)
        }
    }

    pub fn set_write_enable(&mut self, enable: bool) -> Result<(), Error> {
        if enable {
            self.command(opcode::WRITE_ENABLE)
        } else {
            self.command(opcode::WRITE_DISABLE)
        }
    }

    /// Allows the next status register write to go to the volatile copy.
    pub fn write_enable_volatile(&mut self) -> Result<(), Error> {
        self.command(opcode::WRITE_ENABLE_VOLATILE)
    }

    /// Leaves dual I/O continuous read mode.
    pub fn reset_fast_read_dual(&mut self) -> Result<(), Error> {
        let header = Header::command(0)
            .with_instruction(opcode::FAST_READ_DUAL_RESET, 2)
            .with_read_mode(0, 1)
            .with_pins(DataPins::Dual, AddressPins::Single);
        self.transport.write(&header, &[])
    }

    /// Leaves quad I/O continuous read mode.
    pub fn reset_fast_read_quad(&mut self) -> Result<(), Error> {
        let header = Header::command(opcode::FAST_READ_QUAD_RESET)
            .with_read_mode(0, 1)
            .with_pins(DataPins::Quad, AddressPins::Single);
        self.transport.write(&header, &[])
    }

    pub fn status(&mut self, register: StatusRegister) -> Result<u8, Error> {
        let instruction = match register {
            StatusRegister::Low => opcode::READ_STATUS_1,
            StatusRegister::High => opcode::READ_STATUS_2,
        };
        let mut status = [0u8];
        self.transport.read(&Header::command(instruction), &mut status)?;
        Ok(status[0])
    }

    /// Whether a program, erase or status write is still in progress.
    pub fn is_busy(&mut self) -> Result<bool, Error> {
        Ok(self.status(StatusRegister::Low)? & 0x01 != 0)
    }

    fn wait_idle(&mut self, polls: u32) -> Result<(), Error> {
        for _ in 0..polls {
            if !self.is_busy()? {
                return Ok(());
            }
        }
        log::warn!("flash still busy after {} polls", polls);
        Err(Error::Timeout(WaitFor::FlashIdle))
    }

    /// Writes the 16-bit status register.
    ///
    /// Macronix parts take only the low byte after a regular write enable. GD25Q32C and
    /// GD25Q127C take the high byte through a second instruction.
    pub fn write_status(&mut self, status: u16) -> Result<(), Error> {
        let device = self.device;
        if device.is_macronix() {
            self.set_write_enable(true)?;
        } else {
            self.write_enable_volatile()?;
        }

        let bytes = status.to_le_bytes();
        let length = if device.is_macronix() || device.has_split_status_write() { 1 } else { 2 };
        self.transport.write(&Header::command(opcode::WRITE_STATUS_1), &bytes[..length])?;
        self.wait_idle(STATUS_WRITE_POLLS)?;

        if device.has_split_status_write() {
            self.write_enable_volatile()?;
            self.transport.write(&Header::command(opcode::WRITE_STATUS_2), &bytes[1..])?;
            self.wait_idle(STATUS_WRITE_POLLS)?;
        }
        Ok(())
    }

    /// Writes the block protection bits. Bits 6:0 hold SEC, TB and BP2:0; bit 7 is CMP.
    pub fn set_protection_mode(&mut self, mode: u8) -> Result<(), Error> {
        self.set_write_enable(true)?;
        let bytes = [mode & 0x7F, (mode & 0x80) >> 1];
        self.transport.write(&Header::command(opcode::WRITE_STATUS_1), &bytes)?;
        self.wait_idle(STATUS_WRITE_POLLS)
    }

    /// Sets the quad-enable bit: bit 9 of the status register, or bit 6 on Macronix parts.
    fn enable_quad(&mut self) -> Result<(), Error> {
        let low = self.status(StatusRegister::Low)?;
        if !self.device.is_macronix() {
            let high = self.status(StatusRegister::High)?;
            let status = (u16::from(high) << 8) | u16::from(low);
            self.write_status(status | 0x0200)
        } else if low & 0x40 == 0 {
            self.write_status(u16::from(low | 0x40))
        } else {
            Ok(())
        }
    }

    fn check_range(&self, address: u32, length: usize) -> Result<(), Error> {
        let end = u64::from(address) + length as u64;
        if end > u64::from(self.device.chip_size) {
            Err(Error::OutOfRange { address, length })
        } else {
            Ok(())
        }
    }

    pub fn erase_all(&mut self) -> Result<(), Error> {
        self.set_write_enable(true)?;
        self.command(opcode::CHIP_ERASE)?;
        self.wait_idle(CHIP_ERASE_POLLS)
    }

    fn erase_region(&mut self, instruction: u8, address: u32, size: u32, polls: u32) -> Result<(), Error> {
        self.check_range(address, size as usize)?;
        log::debug!("flash: erasing {} KiB at {:#08X}", size / KILO_BYTE, address);
        self.set_write_enable(true)?;
        let header = Header::command(instruction).with_address(address, 3);
        self.transport.write(&header, &[])?;
        self.wait_idle(polls)
    }

    pub fn erase_sector(&mut self, sector: u32) -> Result<(), Error> {
        let size = self.device.sector_size;
        let address = sector.checked_mul(size)
            .ok_or(Error::InvalidParameter("sector number"))?;
        self.erase_region(opcode::SECTOR_ERASE, address, size, PROGRAM_POLLS)
    }

    pub fn erase_block_32k(&mut self, block: u32) -> Result<(), Error> {
        let address = block.checked_mul(BLOCK_32K_SIZE)
            .ok_or(Error::InvalidParameter("block number"))?;
        self.erase_region(opcode::BLOCK_ERASE_32K, address, BLOCK_32K_SIZE, BLOCK_ERASE_POLLS)
    }

    pub fn erase_block_64k(&mut self, block: u32) -> Result<(), Error> {
        let address = block.checked_mul(BLOCK_64K_SIZE)
            .ok_or(Error::InvalidParameter("block number"))?;
        self.erase_region(opcode::BLOCK_ERASE_64K, address, BLOCK_64K_SIZE, BLOCK_ERASE_POLLS)
    }

    /// Erases every sector touched by `start..=end` using the largest aligned region that
    /// fits.
    ///
    /// A 64K block is used when `start` is 64K-aligned and more than a 64K block less one
    /// sector remains; likewise for 32K blocks. Anything else erases the sector containing
    /// `start`.
    pub fn erase(&mut self, start: u32, end: u32) -> Result<(), Error> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        if end >= self.device.chip_size {
            return Err(Error::OutOfRange { address: start, length: (end - start) as usize + 1 });
        }

        let sector_size = self.device.sector_size;
        let mut address = start;
        let mut remaining = end - start + 1;
        while remaining != 0 {
            let next = if address % BLOCK_64K_SIZE == 0 && remaining > BLOCK_64K_SIZE - sector_size {
                self.erase_block_64k(address / BLOCK_64K_SIZE)?;
                address + BLOCK_64K_SIZE
            } else if address % BLOCK_32K_SIZE == 0 && remaining > BLOCK_32K_SIZE - sector_size {
                self.erase_block_32k(address / BLOCK_32K_SIZE)?;
                address + BLOCK_32K_SIZE
            } else {
                let sector_start = address - address % sector_size;
                self.erase_sector(sector_start / sector_size)?;
                sector_start + sector_size
            };
            remaining = remaining.saturating_sub(next - address);
            address = next;
        }
        Ok(())
    }

    /// Reads `buffer.len()` bytes starting at `address`. Quad modes set the quad-enable bit
    /// first.
    pub fn read(&mut self, mode: ReadMode, address: u32, buffer: &mut [u8]) -> Result<(), Error> {
        self.check_range(address, buffer.len())?;
        if buffer.is_empty() {
            return Ok(());
        }
        if mode.is_quad() {
            self.enable_quad()?;
        }
        self.transport.read(&mode.header(address), buffer)
    }

    pub fn read_word(&mut self, mode: ReadMode, address: u32) -> Result<u32, Error> {
        let mut word = [0u8; 4];
        self.read(mode, address, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    pub fn read_byte(&mut self, mode: ReadMode, address: u32) -> Result<u8, Error> {
        let mut byte = [0u8];
        self.read(mode, address, &mut byte)?;
        Ok(byte[0])
    }

    fn page_number(&self, address: u32) -> u32 {
        address / self.device.page_size
    }

    /// Programs bytes that all lie within one page.
    pub fn page_write(&mut self, mode: ProgramMode, address: u32, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Err(Error::InvalidParameter("empty page write"));
        }
        self.check_range(address, data.len())?;
        let last = address + (data.len() as u32 - 1);
        if self.page_number(last) > self.page_number(address) {
            return Err(Error::CrossesPageBoundary { address, length: data.len() });
        }

        if mode == ProgramMode::Quad {
            self.enable_quad()?;
        }
        self.set_write_enable(true)?;

        let header = match mode {
            ProgramMode::Normal
                => Header::command(opcode::PAGE_PROGRAM),
            ProgramMode::Quad if self.device.is_macronix()
                => Header::command(opcode::QUAD_PAGE_PROGRAM_MACRONIX)
                    .with_pins(DataPins::Quad, AddressPins::AsData),
            ProgramMode::Quad
                => Header::command(opcode::QUAD_PAGE_PROGRAM)
                    .with_pins(DataPins::Quad, AddressPins::Single),
        };
        self.transport.write(&header.with_address(address, 3), data)?;
        self.wait_idle(PROGRAM_POLLS)
    }

    /// Programs any number of bytes, splitting the data at page boundaries.
    pub fn write(&mut self, mode: ProgramMode, address: u32, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Err(Error::InvalidParameter("empty write"));
        }
        self.check_range(address, data.len())?;

        let page_size = self.device.page_size;
        let mut address = address;
        let mut rest = data;
        while !rest.is_empty() {
            let room = (page_size - address % page_size) as usize;
            let (chunk, tail) = rest.split_at(room.min(rest.len()));
            self.page_write(mode, address, chunk)?;
            address += chunk.len() as u32;
            rest = tail;
        }
        Ok(())
    }

    pub fn write_word(&mut self, mode: ProgramMode, address: u32, word: u32) -> Result<(), Error> {
        self.write(mode, address, &word.to_le_bytes())
    }

    pub fn write_byte(&mut self, mode: ProgramMode, address: u32, byte: u8) -> Result<(), Error> {
        self.write(mode, address, &[byte])
    }

    /// Manufacturer, memory type and capacity bytes, most significant first.
    pub fn jedec_id(&mut self) -> Result<u32, Error> {
        let mut id = [0u8; 3];
        self.transport.read(&Header::command(opcode::JEDEC_ID), &mut id)?;
        Ok(u32::from_be_bytes([0, id[0], id[1], id[2]]))
    }

    pub fn unique_id(&mut self) -> Result<u64, Error> {
        let mut id = [0u8; 8];
        let header = Header::command(opcode::READ_UNIQUE_ID)
            .with_address(0, 1)
            .with_dummy(3);
        self.transport.read(&header, &mut id)?;
        Ok(u64::from_be_bytes(id))
    }

    fn range_is_blank(&mut self, address: u32, length: u32) -> Result<bool, Error> {
        let mut chunk = [0u8; 256];
        let mut offset = 0;
        while offset < length {
            let step = (length - offset).min(chunk.len() as u32) as usize;
            self.read(ReadMode::Normal, address + offset, &mut chunk[..step])?;
            if chunk[..step].iter().any(|&b| b != 0xFF) {
                return Ok(false);
            }
            offset += step as u32;
        }
        Ok(true)
    }

    pub fn is_sector_blank(&mut self, sector: u32) -> Result<bool, Error> {
        if sector >= self.device.sector_count() {
            return Err(Error::OutOfRange {
                address: sector.saturating_mul(self.device.sector_size),
                length: self.device.sector_size as usize,
            });
        }
        let size = self.device.sector_size;
        self.range_is_blank(sector * size, size)
    }

    pub fn is_blank(&mut self) -> Result<bool, Error> {
        let size = self.device.chip_size;
        self.range_is_blank(0, size)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// A NOR flash that answers QSPI transactions the way a real part would.
    struct SimFlash {
        memory: Vec<u8>,
        jedec_id: u32,
        unique_id: u64,
        status: [u8; 2],
        write_enabled: bool,
        volatile_enabled: bool,
        busy_reads: u32,
        powered_down: bool,
        headers: Vec<Header>,
        erases: Vec<(u8, u32)>,
        status_writes: Vec<(u8, Vec<u8>)>,
    }
    impl SimFlash {
        fn new(device: &FlashDevice) -> Self {
            Self {
                memory: vec![0xFF; device.chip_size as usize],
                jedec_id: device.jedec_id,
                unique_id: 0x0123_4567_89AB_CDEF,
                status: [0, 0],
                write_enabled: false,
                volatile_enabled: false,
                busy_reads: 0,
                powered_down: false,
                headers: Vec::new(),
                erases: Vec::new(),
                status_writes: Vec::new(),
            }
        }

        fn erase(&mut self, instruction: u8, address: u32, size: u32) {
            assert!(self.write_enabled, "erase without write enable");
            assert_eq!(address % size, 0);
            let start = address as usize;
            self.memory[start..start + size as usize].fill(0xFF);
            self.erases.push((instruction, address));
            self.write_enabled = false;
        }

        fn instructions(&self) -> Vec<u16> {
            self.headers.iter().map(|h| h.instruction).collect()
        }
    }
    impl QspiTransport for SimFlash {
        fn write(&mut self, header: &Header, data: &[u8]) -> Result<(), Error> {
            header.validate()?;
            self.headers.push(*header);
            let address = header.address;
            match header.instruction as u8 {
                _ if header.instruction == opcode::FAST_READ_DUAL_RESET => {},
                opcode::FAST_READ_QUAD_RESET => {},
                opcode::WRITE_ENABLE => self.write_enabled = true,
                opcode::WRITE_DISABLE => self.write_enabled = false,
                opcode::WRITE_ENABLE_VOLATILE => self.volatile_enabled = true,
                opcode::POWER_DOWN => self.powered_down = true,
                opcode::RELEASE_POWER_DOWN => self.powered_down = false,
                opcode::WRITE_STATUS_1 | opcode::WRITE_STATUS_2 => {
                    assert!(self.write_enabled || self.volatile_enabled, "status write not enabled");
                    let first = if header.instruction as u8 == opcode::WRITE_STATUS_1 { 0 } else { 1 };
                    for (i, &byte) in data.iter().enumerate().take(2 - first) {
                        self.status[first + i] = byte;
                    }
                    self.status_writes.push((header.instruction as u8, data.to_vec()));
                    self.write_enabled = false;
                    self.volatile_enabled = false;
                },
                opcode::SECTOR_ERASE => self.erase(opcode::SECTOR_ERASE, address, 4 * KILO_BYTE),
                opcode::BLOCK_ERASE_32K => self.erase(opcode::BLOCK_ERASE_32K, address, BLOCK_32K_SIZE),
                opcode::BLOCK_ERASE_64K => self.erase(opcode::BLOCK_ERASE_64K, address, BLOCK_64K_SIZE),
                opcode::CHIP_ERASE => {
                    let size = self.memory.len() as u32;
                    self.erase(opcode::CHIP_ERASE, 0, size);
                },
                opcode::PAGE_PROGRAM | opcode::QUAD_PAGE_PROGRAM | opcode::QUAD_PAGE_PROGRAM_MACRONIX => {
                    assert!(self.write_enabled, "program without write enable");
                    assert_eq!(header.address_count, 3);
                    let page = address & !0xFF;
                    for (i, &byte) in data.iter().enumerate() {
                        let offset = (page | ((address + i as u32) & 0xFF)) as usize;
                        self.memory[offset] &= byte;
                    }
                    self.write_enabled = false;
                },
                other => panic!("unexpected write instruction {:#04X}", other),
            }
            Ok(())
        }

        fn read(&mut self, header: &Header, buffer: &mut [u8]) -> Result<(), Error> {
            header.validate()?;
            self.headers.push(*header);
            match header.instruction as u8 {
                opcode::READ_STATUS_1 => {
                    buffer[0] = self.status[0];
                    if self.busy_reads > 0 {
                        self.busy_reads -= 1;
                        buffer[0] |= 0x01;
                    }
                },
                opcode::READ_STATUS_2 => buffer[0] = self.status[1],
                opcode::JEDEC_ID => buffer.copy_from_slice(&self.jedec_id.to_be_bytes()[1..]),
                opcode::READ_UNIQUE_ID => buffer.copy_from_slice(&self.unique_id.to_be_bytes()),
                opcode::READ | opcode::FAST_READ | opcode::FAST_READ_DUAL_OUT | opcode::FAST_READ_DUAL_IO
                    | opcode::FAST_READ_QUAD_OUT | opcode::FAST_READ_QUAD_IO
                    | opcode::WORD_FAST_READ_QUAD_IO | opcode::OCTAL_WORD_FAST_READ_QUAD_IO => {
                    let start = header.address as usize;
                    buffer.copy_from_slice(&self.memory[start..start + buffer.len()]);
                },
                other => panic!("unexpected read instruction {:#04X}", other),
            }
            Ok(())
        }
    }

    fn flash(name: &str) -> Flash<SimFlash> {
        let device = DEVICES.iter().find(|d| d.name == name).unwrap();
        Flash::with_device(SimFlash::new(device), device)
    }

    #[test]
    fn device_table_lookup() {
        assert_eq!(DEFAULT_DEVICE.name, "W25Q32BV");
        assert_eq!(FlashDevice::from_jedec_id(0xC8_4015).unwrap().name, "GD25Q16B");
        assert_eq!(FlashDevice::from_jedec_id(0xC2_2810).unwrap().chip_size, 64 * KILO_BYTE);
        assert!(FlashDevice::from_jedec_id(0x12_3456).is_none());
    }

    #[test]
    fn detect_adopts_table_entry() {
        let device = FlashDevice::from_jedec_id(0xEF_4018).unwrap();
        let mut flash = Flash::new(SimFlash::new(device));
        assert_eq!(flash.device().name, "W25Q32BV");
        assert_eq!(flash.detect().unwrap().name, "W25Q128BV");
        assert_eq!(flash.device().chip_size, 16 * MEGA_BYTE);
    }

    #[test]
    fn detect_rejects_unknown_part() {
        let mut sim = SimFlash::new(DEFAULT_DEVICE);
        sim.jedec_id = 0x1F_8501;
        let mut flash = Flash::new(sim);
        assert_eq!(flash.detect(), Err(Error::UnknownFlash { jedec_id: 0x1F_8501 }));
        assert_eq!(flash.device(), DEFAULT_DEVICE);
    }

    #[test]
    fn ids() {
        let mut flash = flash("W25Q32BV");
        assert_eq!(flash.jedec_id(), Ok(0xEF_4016));
        assert_eq!(flash.unique_id(), Ok(0x0123_4567_89AB_CDEF));
        let header = flash.transport().headers.last().copied().unwrap();
        assert_eq!(header.address_count, 1);
        assert_eq!(header.dummy_count, 3);
    }

    #[test]
    fn write_then_read_across_pages() {
        let mut flash = flash("W25Q32BV");
        let data: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
        flash.write(ProgramMode::Normal, 0x1F0, &data).unwrap();

        let programs: Vec<(u32, u8)> = flash.transport().headers.iter()
            .filter(|h| h.instruction == u16::from(opcode::PAGE_PROGRAM))
            .map(|h| (h.address, h.address_count))
            .collect();
        assert_eq!(programs, vec![(0x1F0, 3), (0x200, 3), (0x300, 3), (0x400, 3)]);

        let mut back = vec![0u8; 600];
        flash.read(ReadMode::Fast, 0x1F0, &mut back).unwrap();
        assert_eq!(back, data);
        assert_eq!(flash.read_byte(ReadMode::Normal, 0x1EF), Ok(0xFF));
    }

    #[test]
    fn write_ending_on_page_boundary() {
        let mut flash = flash("W25Q32BV");
        flash.write(ProgramMode::Normal, 0xF0, &[0x11; 0x110]).unwrap();
        let sizes = flash.transport().headers.iter()
            .filter(|h| h.instruction == u16::from(opcode::PAGE_PROGRAM))
            .count();
        assert_eq!(sizes, 2);
        assert_eq!(flash.read_byte(ReadMode::Normal, 0x1FF), Ok(0x11));
        assert_eq!(flash.read_byte(ReadMode::Normal, 0x200), Ok(0xFF));
    }

    #[test]
    fn page_write_rejects_bad_input() {
        let mut flash = flash("W25Q32BV");
        assert_eq!(
            flash.page_write(ProgramMode::Normal, 0xFE, &[1, 2, 3]),
            Err(Error::CrossesPageBoundary { address: 0xFE, length: 3 }),
        );
        assert!(flash.page_write(ProgramMode::Normal, 0, &[]).is_err());
        assert!(flash.write(ProgramMode::Normal, 0, &[]).is_err());
        assert_eq!(
            flash.write(ProgramMode::Normal, 4 * MEGA_BYTE - 2, &[0; 4]),
            Err(Error::OutOfRange { address: 4 * MEGA_BYTE - 2, length: 4 }),
        );
        assert!(flash.transport().headers.is_empty());
    }

    #[test]
    fn word_and_byte_access() {
        let mut flash = flash("W25Q32BV");
        flash.write_word(ProgramMode::Normal, 0x100, 0xDEAD_BEEF).unwrap();
        flash.write_byte(ProgramMode::Normal, 0x104, 0x42).unwrap();
        assert_eq!(flash.read_word(ReadMode::Normal, 0x100), Ok(0xDEAD_BEEF));
        assert_eq!(flash.read_byte(ReadMode::FastDualOut, 0x100), Ok(0xEF));
        assert_eq!(flash.read_byte(ReadMode::FastDualIo, 0x104), Ok(0x42));
    }

    #[test]
    fn read_mode_headers() {
        let header = ReadMode::FastQuadIo.header(0x1234);
        assert_eq!(header.instruction, 0xEB);
        assert_eq!((header.read_mode_count, header.dummy_count), (1, 2));
        assert_eq!((header.data_pins, header.address_pins), (DataPins::Quad, AddressPins::AsData));

        let header = ReadMode::FastDualOut.header(0);
        assert_eq!((header.read_mode_count, header.dummy_count), (0, 1));
        assert_eq!((header.data_pins, header.address_pins), (DataPins::Dual, AddressPins::Single));

        let header = ReadMode::OctalWordFastQuadIo.header(0);
        assert_eq!((header.read_mode_count, header.dummy_count), (1, 0));
        assert_eq!(ReadMode::WordFastQuadIo.header(0).dummy_count, 1);
        assert_eq!(ReadMode::Normal.header(0x00AB_CDEF).address, 0x00AB_CDEF);
    }

    #[test]
    fn quad_read_sets_quad_enable_bit() {
        let mut flash = flash("W25Q32BV");
        flash.transport.status = [0x00, 0x00];
        flash.read_byte(ReadMode::FastQuadOut, 0).unwrap();
        assert_eq!(flash.transport().status, [0x00, 0x02]);
        assert_eq!(flash.transport().status_writes, vec![(opcode::WRITE_STATUS_1, vec![0x00, 0x02])]);
    }

    #[test]
    fn quad_enable_on_macronix() {
        let mut flash = flash("MX25L3233F");
        flash.page_write(ProgramMode::Quad, 0x10, &[0xA5]).unwrap();
        assert_eq!(flash.transport().status[0], 0x40);
        assert_eq!(flash.transport().status_writes, vec![(opcode::WRITE_STATUS_1, vec![0x40])]);

        let program = flash.transport().headers.iter()
            .find(|h| h.instruction == u16::from(opcode::QUAD_PAGE_PROGRAM_MACRONIX))
            .copied()
            .unwrap();
        assert_eq!(program.address_pins, AddressPins::AsData);

        // already set: no further status write
        flash.page_write(ProgramMode::Quad, 0x11, &[0x5A]).unwrap();
        assert_eq!(flash.transport().status_writes.len(), 1);
    }

    #[test]
    fn split_status_write_on_gigadevice() {
        let mut flash = flash("GD25Q32C");
        flash.write_status(0x0280).unwrap();
        assert_eq!(
            flash.transport().status_writes,
            vec![(opcode::WRITE_STATUS_1, vec![0x80]), (opcode::WRITE_STATUS_2, vec![0x02])],
        );
        assert_eq!(flash.transport().status, [0x80, 0x02]);
        let enables = flash.transport().instructions().iter()
            .filter(|&&i| i == u16::from(opcode::WRITE_ENABLE_VOLATILE))
            .count();
        assert_eq!(enables, 2);
    }

    #[test]
    fn status_write_waits_while_busy() {
        let mut flash = flash("W25Q32BV");
        flash.transport.busy_reads = 3;
        flash.write_status(0x1234).unwrap();
        assert_eq!(flash.transport().busy_reads, 0);
        assert_eq!(flash.transport().status, [0x34, 0x12]);
    }

    #[test]
    fn busy_timeout() {
        let mut flash = flash("W25Q32BV");
        flash.transport.busy_reads = u32::MAX;
        assert_eq!(flash.set_protection_mode(0x9C), Err(Error::Timeout(WaitFor::FlashIdle)));
        assert_eq!(flash.transport().status_writes, vec![(opcode::WRITE_STATUS_1, vec![0x1C, 0x40])]);
    }

    #[test]
    fn adaptive_erase_picks_largest_regions() {
        let mut flash = flash("W25Q32BV");
        // 4K at 0xF000, then 64K at 0x10000, 32K at 0x20000 and a final 4K sector
        flash.erase(0xF000, 0x28FFF).unwrap();
        assert_eq!(
            flash.transport().erases,
            vec![
                (opcode::SECTOR_ERASE, 0xF000),
                (opcode::BLOCK_ERASE_64K, 0x10000),
                (opcode::BLOCK_ERASE_32K, 0x20000),
                (opcode::SECTOR_ERASE, 0x28000),
            ],
        );
    }

    #[test]
    fn erase_unaligned_range_covers_touched_sectors() {
        let mut flash = flash("W25Q32BV");
        flash.write(ProgramMode::Normal, 0x2FFF, &[0, 0]).unwrap();
        flash.erase(0x2FFF, 0x3000).unwrap();
        assert_eq!(
            flash.transport().erases,
            vec![(opcode::SECTOR_ERASE, 0x2000), (opcode::SECTOR_ERASE, 0x3000)],
        );
        assert_eq!(flash.read_byte(ReadMode::Normal, 0x2FFF), Ok(0xFF));
        assert_eq!(flash.read_byte(ReadMode::Normal, 0x3000), Ok(0xFF));
    }

    #[test]
    fn erase_range_validation() {
        let mut flash = flash("W25Q32BV");
        assert_eq!(flash.erase(0x2000, 0x1000), Err(Error::InvalidRange { start: 0x2000, end: 0x1000 }));
        assert!(flash.erase(0, 4 * MEGA_BYTE).is_err());
        assert!(flash.erase_sector(1024).is_err());
        assert!(flash.erase_block_64k(64).is_err());
        flash.erase_block_64k(63).unwrap();
        flash.erase_block_32k(127).unwrap();
    }

    #[test]
    fn chip_erase_and_blank_checks() {
        let mut flash = flash("MX25R512F");
        assert_eq!(flash.is_blank(), Ok(true));
        flash.write_byte(ProgramMode::Normal, 0x5123, 0x00).unwrap();
        assert_eq!(flash.is_blank(), Ok(false));
        assert_eq!(flash.is_sector_blank(5), Ok(false));
        assert_eq!(flash.is_sector_blank(4), Ok(true));
        assert!(flash.is_sector_blank(16).is_err());

        flash.erase_all().unwrap();
        assert_eq!(flash.transport().erases, vec![(opcode::CHIP_ERASE, 0)]);
        assert_eq!(flash.is_sector_blank(5), Ok(true));
    }

    #[test]
    fn simple_commands() {
        let mut flash = flash("W25Q32BV");
        flash.power_down(true).unwrap();
        assert!(flash.transport().powered_down);
        flash.power_down(false).unwrap();
        assert!(!flash.transport().powered_down);

        flash.reset_fast_read_dual().unwrap();
        flash.reset_fast_read_quad().unwrap();
        let headers = &flash.transport().headers;
        let dual = headers[headers.len() - 2];
        assert_eq!((dual.instruction, dual.instruction_count, dual.read_mode_count), (0xFFFF, 2, 1));
        assert_eq!(dual.data_pins, DataPins::Dual);
        let quad = headers[headers.len() - 1];
        assert_eq!((quad.instruction, quad.instruction_count), (0xFF, 1));
        assert_eq!(quad.data_pins, DataPins::Quad);

        flash.set_write_enable(true).unwrap();
        assert!(flash.transport().write_enabled);
        flash.set_write_enable(false).unwrap();
        assert!(!flash.transport().write_enabled);
        assert_eq!(flash.is_busy(), Ok(false));
        assert_eq!(flash.status(StatusRegister::High), Ok(0));
    }
}
