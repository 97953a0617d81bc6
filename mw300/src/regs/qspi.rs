//! Quad SPI controller used to talk to the external serial flash.


use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const QSPI_BASE: StaticRef<QspiRegisters> =
    unsafe { StaticRef::new(0x4601_0000 as *const QspiRegisters) };


register_structs! {
    pub QspiRegisters {
        (0x00 => pub cntl: ReadWrite<u32, CNTL::Register>),
        (0x04 => pub conf: ReadWrite<u32, CONF::Register>),
        (0x08 => pub dout: ReadWrite<u32>),
        (0x0C => pub din: ReadOnly<u32>),
        (0x10 => pub instr: ReadWrite<u32, INSTR::Register>),
        (0x14 => pub addr: ReadWrite<u32>),
        (0x18 => pub rdmode: ReadWrite<u32, RDMODE::Register>),
        (0x1C => pub hdrcnt: ReadWrite<u32, HDRCNT::Register>),
        (0x20 => pub dincnt: ReadWrite<u32, DINCNT::Register>),
        (0x24 => pub timing: ReadWrite<u32, TIMING::Register>),
        (0x28 => @END),
    }
}


register_bitfields![u32,
    pub CNTL [
        SS_EN OFFSET(0) NUMBITS(1) [],
        XFER_RDY OFFSET(1) NUMBITS(1) [],
        RFIFO_EMPTY OFFSET(2) NUMBITS(1) [],
        RFIFO_FULL OFFSET(3) NUMBITS(1) [],
        WFIFO_EMPTY OFFSET(4) NUMBITS(1) [],
        WFIFO_FULL OFFSET(5) NUMBITS(1) [],
        RFIFO_UNDRFLW OFFSET(6) NUMBITS(1) [],
        RFIFO_OVRFLW OFFSET(7) NUMBITS(1) [],
        WFIFO_UNDRFLW OFFSET(8) NUMBITS(1) [],
        WFIFO_OVRFLW OFFSET(9) NUMBITS(1) []
    ],
    pub CONF [
        CLK_PRESCALE OFFSET(0) NUMBITS(5) [],
        CLK_PHA OFFSET(5) NUMBITS(1) [],
        CLK_POL OFFSET(6) NUMBITS(1) [],
        FIFO_FLUSH OFFSET(9) NUMBITS(1) [],
        DATA_PIN OFFSET(10) NUMBITS(2) [
            Single = 0,
            Dual = 1,
            Quad = 2
        ],
        ADDR_PIN OFFSET(12) NUMBITS(1) [
            Single = 0,
            AsData = 1
        ],
        RW_EN OFFSET(13) NUMBITS(1) [
            Read = 0,
            Write = 1
        ],
        XFER_STOP OFFSET(14) NUMBITS(1) [],
        XFER_START OFFSET(15) NUMBITS(1) [],
        BYTE_LEN OFFSET(16) NUMBITS(1) []
    ],
    pub INSTR [
        INSTR OFFSET(0) NUMBITS(16) []
    ],
    pub RDMODE [
        RMODE OFFSET(0) NUMBITS(16) []
    ],
    pub HDRCNT [
        INSTR_CNT OFFSET(0) NUMBITS(2) [],
        ADDR_CNT OFFSET(4) NUMBITS(3) [],
        RM_CNT OFFSET(8) NUMBITS(2) [],
        DUMMY_CNT OFFSET(12) NUMBITS(2) []
    ],
    pub DINCNT [
        DATA_IN_CNT OFFSET(0) NUMBITS(20) []
    ],
    pub TIMING [
        CLK_CAPT_EDGE OFFSET(7) NUMBITS(1) [
            Falling = 0,
            Rising = 1
        ]
    ]
];
