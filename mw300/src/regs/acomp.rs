//! Analog comparators 0 and 1.
//!
//! Every per-comparator register comes as a pair, indexed by comparator number.


use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const ACOMP_BASE: StaticRef<AcompRegisters> =
    unsafe { StaticRef::new(0x4508_0000 as *const AcompRegisters) };


register_structs! {
    pub AcompRegisters {
        (0x00 => pub ctrl: [ReadWrite<u32, CTRL::Register>; 2]),
        (0x08 => pub status: [ReadOnly<u32, STATUS::Register>; 2]),
        (0x10 => pub route: [ReadWrite<u32, ROUTE::Register>; 2]),
        (0x18 => pub isr: [ReadOnly<u32, INT::Register>; 2]),
        (0x20 => pub imr: [ReadWrite<u32, INT::Register>; 2]),
        (0x28 => pub irsr: [ReadOnly<u32, INT::Register>; 2]),
        (0x30 => pub icr: [WriteOnly<u32, INT::Register>; 2]),
        (0x38 => pub rst: [ReadWrite<u32, RST::Register>; 2]),
        (0x40 => pub clk: ReadWrite<u32, CLK::Register>),
        (0x44 => @END),
    }
}


register_bitfields![u32,
    pub CTRL [
        EN OFFSET(0) NUMBITS(1) [],
        GPIOINV OFFSET(1) NUMBITS(1) [],
        WARMTIME OFFSET(2) NUMBITS(2) [],
        HYST_SELN OFFSET(4) NUMBITS(3) [],
        HYST_SELP OFFSET(7) NUMBITS(3) [],
        BIAS_PROG OFFSET(10) NUMBITS(2) [],
        LEVEL_SEL OFFSET(12) NUMBITS(6) [],
        NEG_SEL OFFSET(18) NUMBITS(4) [],
        POS_SEL OFFSET(22) NUMBITS(4) [],
        MUXEN OFFSET(26) NUMBITS(1) [],
        INACT_VAL OFFSET(27) NUMBITS(1) [],
        RIE OFFSET(28) NUMBITS(1) [],
        FIE OFFSET(29) NUMBITS(1) [],
        INT_ACT_HI OFFSET(30) NUMBITS(1) [],
        EDGE_LEVL_SEL OFFSET(31) NUMBITS(1) [
            Level = 0,
            Edge = 1
        ]
    ],
    pub STATUS [
        OUT OFFSET(0) NUMBITS(1) [],
        ACT OFFSET(1) NUMBITS(1) []
    ],
    pub ROUTE [
        OUTSEL OFFSET(0) NUMBITS(1) [
            Synchronized = 0,
            Asynchronous = 1
        ],
        PE OFFSET(1) NUMBITS(1) []
    ],
    pub INT [
        OUT OFFSET(0) NUMBITS(1) [],
        OUTA OFFSET(1) NUMBITS(1) []
    ],
    pub RST [
        SOFT_RST OFFSET(0) NUMBITS(1) []
    ],
    pub CLK [
        SOFT_CLK_RST OFFSET(0) NUMBITS(1) []
    ]
];
