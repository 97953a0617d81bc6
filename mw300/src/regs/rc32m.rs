//! 32 MHz RC oscillator and its calibration engine.


use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const RC32M_BASE: StaticRef<Rc32mRegisters> =
    unsafe { StaticRef::new(0x480B_0000 as *const Rc32mRegisters) };


register_structs! {
    pub Rc32mRegisters {
        (0x00 => pub ctrl: ReadWrite<u32, CTRL::Register>),
        (0x04 => pub status: ReadOnly<u32, STATUS::Register>),
        (0x08 => pub isr: ReadOnly<u32, INT::Register>),
        (0x0C => pub imr: ReadWrite<u32, INT::Register>),
        (0x10 => pub irsr: ReadOnly<u32, INT::Register>),
        (0x14 => pub icr: WriteOnly<u32, INT::Register>),
        (0x18 => pub clk: ReadWrite<u32, CLK::Register>),
        (0x1C => pub rst: ReadWrite<u32, RST::Register>),
        (0x20 => @END),
    }
}


register_bitfields![u32,
    pub CTRL [
        EN OFFSET(0) NUMBITS(1) [],
        CAL_EN OFFSET(1) NUMBITS(1) [],
        EXT_CODE_EN OFFSET(2) NUMBITS(1) [],
        PD OFFSET(3) NUMBITS(1) [],
        CODE_FR_EXT OFFSET(4) NUMBITS(8) []
    ],
    pub STATUS [
        CLK_RDY OFFSET(0) NUMBITS(1) [],
        CAL_DONE OFFSET(1) NUMBITS(1) [],
        CODE_FR_CAL OFFSET(2) NUMBITS(8) []
    ],
    pub INT [
        CALDON OFFSET(0) NUMBITS(1) [],
        CKRDY OFFSET(1) NUMBITS(1) []
    ],
    pub CLK [
        SOFT_CLK_RST OFFSET(0) NUMBITS(1) [],
        REF_SEL OFFSET(1) NUMBITS(1) [
            Output16MHz = 0,
            Output32MHz = 1
        ]
    ],
    pub RST [
        SOFT_RST OFFSET(0) NUMBITS(1) []
    ]
];
