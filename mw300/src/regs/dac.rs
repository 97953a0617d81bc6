//! General purpose DAC with two channels.


use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const DAC_BASE: StaticRef<DacRegisters> =
    unsafe { StaticRef::new(0x4509_0000 as *const DacRegisters) };


register_structs! {
    pub DacRegisters {
        (0x00 => pub ctrl: ReadWrite<u32, CTRL::Register>),
        (0x04 => pub actrl: ReadWrite<u32, CHAN_CTRL::Register>),
        (0x08 => pub bctrl: ReadWrite<u32, CHAN_CTRL::Register>),
        (0x0C => pub adata: ReadWrite<u32, DATA::Register>),
        (0x10 => pub bdata: ReadWrite<u32, DATA::Register>),
        (0x14 => pub status: ReadOnly<u32, STATUS::Register>),
        (0x18 => pub isr: ReadOnly<u32, INT::Register>),
        (0x1C => pub imr: ReadWrite<u32, INT::Register>),
        (0x20 => pub irsr: ReadOnly<u32, INT::Register>),
        (0x24 => pub icr: WriteOnly<u32, INT::Register>),
        (0x28 => pub clk: ReadWrite<u32, CLK::Register>),
        (0x2C => pub rst: ReadWrite<u32, RST::Register>),
        (0x30 => @END),
    }
}


register_bitfields![u32,
    pub CTRL [
        REF_SEL OFFSET(0) NUMBITS(1) [
            Internal = 0,
            External = 1
        ],
        OUTPUT_MODE OFFSET(1) NUMBITS(1) [
            SingleEnded = 0,
            Differential = 1
        ]
    ],
    pub CHAN_CTRL [
        EN OFFSET(0) NUMBITS(1) [],
        IO_EN OFFSET(1) NUMBITS(1) [],
        TIME_MODE OFFSET(2) NUMBITS(1) [
            Correlated = 0,
            Immediate = 1
        ],
        WAVE OFFSET(3) NUMBITS(2) [
            Normal = 0,
            Triangle = 1,
            Sine = 2,
            Noise = 3
        ],
        RANGE OFFSET(5) NUMBITS(2) [],
        TRIA_HALF OFFSET(7) NUMBITS(1) [],
        TRIA_MAMP_SEL OFFSET(8) NUMBITS(4) [],
        TRIA_STEP_SEL OFFSET(12) NUMBITS(2) []
    ],
    pub DATA [
        DATA OFFSET(0) NUMBITS(10) []
    ],
    pub STATUS [
        A_DV OFFSET(0) NUMBITS(1) [],
        B_DV OFFSET(1) NUMBITS(1) []
    ],
    pub INT [
        A_RDY OFFSET(0) NUMBITS(1) [],
        B_RDY OFFSET(1) NUMBITS(1) [],
        A_TO OFFSET(2) NUMBITS(1) [],
        B_TO OFFSET(3) NUMBITS(1) [],
        TRIA_OVFL OFFSET(4) NUMBITS(1) []
    ],
    pub CLK [
        SOFT_CLK_RST OFFSET(0) NUMBITS(1) [],
        CLK_CTRL OFFSET(1) NUMBITS(2) []
    ],
    pub RST [
        A_SOFT_RST OFFSET(0) NUMBITS(1) [],
        B_SOFT_RST OFFSET(1) NUMBITS(1) []
    ]
];
