//! General purpose ADC.


use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const ADC_BASE: StaticRef<AdcRegisters> =
    unsafe { StaticRef::new(0x4500_0000 as *const AdcRegisters) };


register_structs! {
    pub AdcRegisters {
        (0x00 => pub pwr: ReadWrite<u32, PWR::Register>),
        (0x04 => pub clkrst: ReadWrite<u32, CLKRST::Register>),
        (0x08 => pub cmd: ReadWrite<u32, CMD::Register>),
        (0x0C => pub ana: ReadWrite<u32, ANA::Register>),
        (0x10 => pub config: ReadWrite<u32, CONFIG::Register>),
        (0x14 => pub chan: ReadWrite<u32, CHAN::Register>),
        (0x18 => pub status: ReadOnly<u32, STATUS::Register>),
        (0x1C => pub isr: ReadOnly<u32, INT::Register>),
        (0x20 => pub imr: ReadWrite<u32, INT::Register>),
        (0x24 => pub irsr: ReadOnly<u32, INT::Register>),
        (0x28 => pub icr: WriteOnly<u32, INT::Register>),
        (0x2C => pub result: ReadOnly<u32, RESULT::Register>),
        (0x30 => pub offset_cal: ReadWrite<u32, CAL::Register>),
        (0x34 => pub gain_cal: ReadWrite<u32, CAL::Register>),
        (0x38 => @END),
    }
}


register_bitfields![u32,
    pub PWR [
        GLOBAL_EN OFFSET(0) NUMBITS(1) []
    ],
    pub CLKRST [
        SOFT_CLK_RST OFFSET(0) NUMBITS(1) [],
        SOFT_RST OFFSET(1) NUMBITS(1) [],
        INT_CLK_DIV OFFSET(2) NUMBITS(6) []
    ],
    pub CMD [
        CONV_START OFFSET(0) NUMBITS(1) [],
        CAL_START OFFSET(1) NUMBITS(1) []
    ],
    pub ANA [
        RES_SEL OFFSET(0) NUMBITS(2) [
            Bits10 = 0,
            Bits12 = 1,
            Bits14 = 2,
            Bits16 = 3
        ],
        VREF_SEL OFFSET(2) NUMBITS(2) [
            Internal18 = 0,
            Internal12 = 1,
            External = 2
        ],
        INBUF_GAIN OFFSET(4) NUMBITS(2) [
            Half = 0,
            Unity = 1,
            Double = 2
        ],
        INBUF_EN OFFSET(6) NUMBITS(1) [],
        SINGLEDIFF OFFSET(7) NUMBITS(1) [
            SingleEnded = 0,
            Differential = 1
        ],
        BIAS_SEL OFFSET(8) NUMBITS(1) [
            Full = 0,
            Half = 1
        ]
    ],
    pub CONFIG [
        CAL_DATA_SEL OFFSET(0) NUMBITS(1) [
            User = 0,
            SelfCalibrated = 1
        ],
        CAL_VREF_SEL OFFSET(1) NUMBITS(1) [
            Internal = 0,
            External = 1
        ],
        CAL_DATA_RST OFFSET(2) NUMBITS(1) [],
        CONT_CONV OFFSET(3) NUMBITS(1) [],
        TRIGGER_EN OFFSET(4) NUMBITS(1) []
    ],
    pub CHAN [
        POS_SEL OFFSET(0) NUMBITS(4) [],
        NEG_SEL OFFSET(4) NUMBITS(4) []
    ],
    pub STATUS [
        ACT OFFSET(0) NUMBITS(1) []
    ],
    pub INT [
        RDY OFFSET(0) NUMBITS(1) [],
        GAINSAT OFFSET(1) NUMBITS(1) [],
        OFFSAT OFFSET(2) NUMBITS(1) [],
        DATASAT OFFSET(3) NUMBITS(1) [],
        FIFO_OVERRUN OFFSET(4) NUMBITS(1) [],
        FIFO_UNDERRUN OFFSET(5) NUMBITS(1) []
    ],
    pub RESULT [
        DATA OFFSET(0) NUMBITS(16) []
    ],
    pub CAL [
        SELF_CAL OFFSET(0) NUMBITS(16) [],
        USER_CAL OFFSET(16) NUMBITS(16) []
    ]
];
