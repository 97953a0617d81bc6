//! 16550-style UART with 4-byte register stride.
//!
//! The first two words are banked: with `LCR.DLAB` set they hold the divisor latch, otherwise
//! the data and interrupt-enable registers. The third word reads as IIR and writes as FCR.


use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const UART0_BASE: StaticRef<UartRegisters> =
    unsafe { StaticRef::new(0x4604_0000 as *const UartRegisters) };
pub const UART1_BASE: StaticRef<UartRegisters> =
    unsafe { StaticRef::new(0x4605_0000 as *const UartRegisters) };
pub const UART2_BASE: StaticRef<UartRegisters> =
    unsafe { StaticRef::new(0x4606_0000 as *const UartRegisters) };


register_structs! {
    pub UartRegisters {
        /// RBR on read, THR on write, DLL with DLAB set.
        (0x00 => pub rbr_thr_dll: ReadWrite<u32>),
        /// IER, or DLH with DLAB set.
        (0x04 => pub dlh_ier: ReadWrite<u32, IER::Register>),
        /// IIR on read, FCR on write.
        (0x08 => pub iir_fcr: ReadWrite<u32, FCR::Register>),
        (0x0C => pub lcr: ReadWrite<u32, LCR::Register>),
        (0x10 => pub mcr: ReadWrite<u32, MCR::Register>),
        (0x14 => pub lsr: ReadOnly<u32, LSR::Register>),
        (0x18 => pub msr: ReadOnly<u32, MSR::Register>),
        (0x1C => pub scr: ReadWrite<u32>),
        (0x20 => pub isr: ReadWrite<u32, ISR::Register>),
        (0x24 => pub rfor: ReadOnly<u32, RFOR::Register>),
        (0x28 => pub abr: ReadWrite<u32, ABR::Register>),
        (0x2C => pub acr: ReadOnly<u32, ACR::Register>),
        (0x30 => @END),
    }
}


register_bitfields![u32,
    pub IER [
        RAVIE OFFSET(0) NUMBITS(1) [],
        TIE OFFSET(1) NUMBITS(1) [],
        RLSE OFFSET(2) NUMBITS(1) [],
        MIE OFFSET(3) NUMBITS(1) [],
        RTOIE OFFSET(4) NUMBITS(1) [],
        NRZE OFFSET(5) NUMBITS(1) [],
        UUE OFFSET(6) NUMBITS(1) [],
        DMAE OFFSET(7) NUMBITS(1) [],
        HSE OFFSET(8) NUMBITS(1) []
    ],
    pub FCR [
        TRFIFOE OFFSET(0) NUMBITS(1) [],
        RESETRF OFFSET(1) NUMBITS(1) [],
        RESETTF OFFSET(2) NUMBITS(1) [],
        TIL OFFSET(3) NUMBITS(1) [
            HalfEmpty = 0,
            Empty = 1
        ],
        BUS OFFSET(5) NUMBITS(1) [
            Bits8 = 0,
            Bits32 = 1
        ],
        ITL OFFSET(6) NUMBITS(2) [
            Bytes1 = 0,
            Bytes8 = 1,
            Bytes16 = 2,
            Bytes32 = 3
        ]
    ],
    pub LCR [
        WLS OFFSET(0) NUMBITS(2) [
            Bits5 = 0,
            Bits6 = 1,
            Bits7 = 2,
            Bits8 = 3
        ],
        STB OFFSET(2) NUMBITS(1) [],
        PEN OFFSET(3) NUMBITS(1) [],
        EPS OFFSET(4) NUMBITS(1) [],
        STKYP OFFSET(5) NUMBITS(1) [],
        SB OFFSET(6) NUMBITS(1) [],
        DLAB OFFSET(7) NUMBITS(1) []
    ],
    pub MCR [
        DTR OFFSET(0) NUMBITS(1) [],
        RTS OFFSET(1) NUMBITS(1) [],
        OUT1 OFFSET(2) NUMBITS(1) [],
        OUT2 OFFSET(3) NUMBITS(1) [],
        LOOP OFFSET(4) NUMBITS(1) [],
        AFE OFFSET(5) NUMBITS(1) []
    ],
    pub LSR [
        DR OFFSET(0) NUMBITS(1) [],
        OE OFFSET(1) NUMBITS(1) [],
        PE OFFSET(2) NUMBITS(1) [],
        FE OFFSET(3) NUMBITS(1) [],
        BI OFFSET(4) NUMBITS(1) [],
        TDRQ OFFSET(5) NUMBITS(1) [],
        TEMT OFFSET(6) NUMBITS(1) [],
        FIFOE OFFSET(7) NUMBITS(1) []
    ],
    pub MSR [
        DCTS OFFSET(0) NUMBITS(1) [],
        DDSR OFFSET(1) NUMBITS(1) [],
        TERI OFFSET(2) NUMBITS(1) [],
        DDCD OFFSET(3) NUMBITS(1) [],
        CTS OFFSET(4) NUMBITS(1) [],
        DSR OFFSET(5) NUMBITS(1) [],
        RI OFFSET(6) NUMBITS(1) [],
        DCD OFFSET(7) NUMBITS(1) []
    ],
    pub ISR [
        XMITIR OFFSET(0) NUMBITS(1) [],
        RCVEIR OFFSET(1) NUMBITS(1) [],
        XMODE OFFSET(2) NUMBITS(1) [],
        TXPL OFFSET(3) NUMBITS(1) [],
        RXPL OFFSET(4) NUMBITS(1) []
    ],
    pub RFOR [
        BYTE_COUNT OFFSET(0) NUMBITS(6) []
    ],
    pub ABR [
        ABE OFFSET(0) NUMBITS(1) [],
        ABLIE OFFSET(1) NUMBITS(1) [],
        ABUP OFFSET(2) NUMBITS(1) [],
        ABT OFFSET(3) NUMBITS(1) []
    ],
    pub ACR [
        COUNT_VALUE OFFSET(0) NUMBITS(16) []
    ]
];
