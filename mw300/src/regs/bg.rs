//! Bandgap voltage reference shared by the analog blocks.


use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const BG_BASE: StaticRef<BgRegisters> =
    unsafe { StaticRef::new(0x450A_0000 as *const BgRegisters) };


register_structs! {
    pub BgRegisters {
        (0x00 => pub ctrl: ReadWrite<u32, CTRL::Register>),
        (0x04 => pub status: ReadOnly<u32, STATUS::Register>),
        (0x08 => @END),
    }
}


register_bitfields![u32,
    pub CTRL [
        PD OFFSET(0) NUMBITS(1) []
    ],
    pub STATUS [
        RDY OFFSET(0) NUMBITS(1) []
    ]
];
