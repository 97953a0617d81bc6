//! Flash controller, the memory-mapped front end of the serial flash.


use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const FLASHC_BASE: StaticRef<FlashcRegisters> =
    unsafe { StaticRef::new(0x4400_3000 as *const FlashcRegisters) };


register_structs! {
    pub FlashcRegisters {
        (0x00 => pub fccr: ReadWrite<u32, FCCR::Register>),
        (0x04 => @END),
    }
}


register_bitfields![u32,
    pub FCCR [
        CMD_TYPE OFFSET(0) NUMBITS(4) [],
        CLK_PRESCALE OFFSET(8) NUMBITS(5) [],
        CACHE_LINE_FLUSH OFFSET(13) NUMBITS(1) [],
        FLASHC_PAD_EN OFFSET(31) NUMBITS(1) [
            Qspi = 0,
            Flashc = 1
        ]
    ]
];
