//! Power management unit: clock sources, clock gates and dividers, reset cause.


use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::regs::StaticRef;


pub const PMU_BASE: StaticRef<PmuRegisters> =
    unsafe { StaticRef::new(0x480A_0000 as *const PmuRegisters) };


register_structs! {
    pub PmuRegisters {
        (0x000 => _reserved0),
        (0x008 => pub last_rst_cause: ReadOnly<u32, RESET_CAUSE::Register>),
        (0x00C => pub last_rst_clr: ReadWrite<u32, RESET_CAUSE::Register>),
        (0x010 => _reserved1),
        (0x018 => pub clk_src: ReadWrite<u32, CLK_SRC::Register>),
        (0x01C => _reserved2),
        (0x028 => pub clk_rdy: ReadOnly<u32, CLK_RDY::Register>),
        (0x02C => pub rc32m_ctrl: ReadWrite<u32, RC32M_CTRL::Register>),
        (0x030 => _reserved3),
        (0x034 => pub sfll_ctrl1: ReadWrite<u32, SFLL_CTRL1::Register>),
        (0x038 => _reserved4),
        (0x03C => pub sfll_ctrl0: ReadWrite<u32, SFLL_CTRL0::Register>),
        (0x040 => _reserved5),
        (0x05C => pub ana_grp_ctrl1: ReadWrite<u32, ANA_GRP_CTRL1::Register>),
        (0x060 => _reserved6),
        (0x078 => pub aupll_ctrl0: ReadWrite<u32, AUPLL_CTRL0::Register>),
        (0x07C => pub peri_clk_en: ReadWrite<u32, PERI_CLK_EN::Register>),
        (0x080 => pub uart_fast_clk_div: ReadWrite<u32, UART_CLK_DIV::Register>),
        (0x084 => pub uart_slow_clk_div: ReadWrite<u32, UART_CLK_DIV::Register>),
        (0x088 => pub uart_clk_sel: ReadWrite<u32, UART_CLK_SEL::Register>),
        (0x08C => pub mcu_core_clk_div: ReadWrite<u32, MCU_CORE_CLK_DIV::Register>),
        (0x090 => pub peri0_clk_div: ReadWrite<u32, PERI0_CLK_DIV::Register>),
        (0x094 => pub peri1_clk_div: ReadWrite<u32, PERI1_CLK_DIV::Register>),
        (0x098 => pub peri2_clk_div: ReadWrite<u32, PERI2_CLK_DIV::Register>),
        (0x09C => pub cau_clk_sel: ReadWrite<u32, CAU_CLK_SEL::Register>),
        (0x0A0 => _reserved7),
        (0x0B0 => pub aupll_ctrl1: ReadWrite<u32, AUPLL_CTRL1::Register>),
        (0x0B4 => pub cau_ctrl: ReadWrite<u32, CAU_CTRL::Register>),
        (0x0B8 => pub rc32k_ctrl0: ReadWrite<u32, RC32K_CTRL0::Register>),
        (0x0BC => pub rc32k_ctrl1: ReadWrite<u32, RC32K_CTRL1::Register>),
        (0x0C0 => pub xtal32k_ctrl: ReadWrite<u32, XTAL32K_CTRL::Register>),
        (0x0C4 => _reserved8),
        (0x0DC => pub peri_clk_src: ReadWrite<u32, PERI_CLK_SRC::Register>),
        (0x0E0 => _reserved9),
        (0x0E4 => pub gpt_ctrl: [ReadWrite<u32, GPT_CTRL::Register>; 4]),
        (0x0F4 => _reserved10),
        (0x0F8 => pub aon_clk_ctrl: ReadWrite<u32, AON_CLK_CTRL::Register>),
        (0x0FC => pub peri3_ctrl: ReadWrite<u32, PERI3_CTRL::Register>),
        (0x100 => _reserved11),
        (0x118 => pub wlan_ctrl: ReadWrite<u32, WLAN_CTRL::Register>),
        (0x11C => @END),
    }
}


register_bitfields![u32,
    pub RESET_CAUSE [
        BROWNOUT_VBAT OFFSET(0) NUMBITS(1) [],
        BROWNOUT_V12 OFFSET(1) NUMBITS(1) [],
        BROWNOUT_AV18 OFFSET(2) NUMBITS(1) [],
        CM3_SYSRESETREQ OFFSET(3) NUMBITS(1) [],
        CM3_LOCKUP OFFSET(4) NUMBITS(1) [],
        WDT_RST OFFSET(5) NUMBITS(1) []
    ],
    pub CLK_SRC [
        SYS_CLK_SEL OFFSET(0) NUMBITS(2) [
            Sfll = 0,
            Rc32m = 1,
            Xtal = 2,
            Rc32mFromXtal = 3
        ]
    ],
    pub CLK_RDY [
        PLL_CLK_RDY OFFSET(0) NUMBITS(1) [],
        RC32M_RDY OFFSET(2) NUMBITS(1) [],
        X32K_RDY OFFSET(3) NUMBITS(1) [],
        PLL_AUDIO_RDY OFFSET(4) NUMBITS(1) [],
        XTAL32M_CLK_RDY OFFSET(6) NUMBITS(1) []
    ],
    pub RC32M_CTRL [
        CAL_IN_PROGRESS OFFSET(0) NUMBITS(1) [],
        CAL_ALLOW OFFSET(1) NUMBITS(1) []
    ],
    pub SFLL_CTRL1 [
        SFLL_REFDIV OFFSET(0) NUMBITS(9) [],
        SFLL_DIV_SEL OFFSET(19) NUMBITS(2) []
    ],
    pub SFLL_CTRL0 [
        SFLL_PU OFFSET(0) NUMBITS(1) [],
        SFLL_FBDIV OFFSET(7) NUMBITS(9) [],
        SFLL_KVCO OFFSET(20) NUMBITS(2) [],
        SFLL_REFCLK_SEL OFFSET(25) NUMBITS(1) [
            Rc32m = 0,
            MainXtal = 1
        ],
        SFLL_LOCK OFFSET(26) NUMBITS(1) []
    ],
    pub ANA_GRP_CTRL1 [
        BG_CTRL OFFSET(0) NUMBITS(3) [],
        GAINX2 OFFSET(3) NUMBITS(1) [],
        R_ORIEN_SEL OFFSET(4) NUMBITS(1) [],
        BG_SEL OFFSET(5) NUMBITS(2) [],
        TEST OFFSET(7) NUMBITS(3) [],
        BYPASS OFFSET(10) NUMBITS(1) []
    ],
    pub AUPLL_CTRL0 [
        FRACT OFFSET(0) NUMBITS(20) [],
        PU OFFSET(20) NUMBITS(1) []
    ],
    pub PERI_CLK_EN [
        QSPI0_CLK_EN OFFSET(1) NUMBITS(1) [],
        PDM_CLK_EN OFFSET(3) NUMBITS(1) [],
        GPIO_CLK_EN OFFSET(4) NUMBITS(1) [],
        UART0_CLK_EN OFFSET(5) NUMBITS(1) [],
        UART1_CLK_EN OFFSET(6) NUMBITS(1) [],
        I2C0_CLK_EN OFFSET(7) NUMBITS(1) [],
        SSP0_CLK_EN OFFSET(8) NUMBITS(1) [],
        SSP1_CLK_EN OFFSET(9) NUMBITS(1) [],
        GPT0_CLK_EN OFFSET(10) NUMBITS(1) [],
        GPT1_CLK_EN OFFSET(11) NUMBITS(1) [],
        UART2_CLK_EN OFFSET(15) NUMBITS(1) [],
        SSP2_CLK_EN OFFSET(17) NUMBITS(1) [],
        I2C1_CLK_EN OFFSET(19) NUMBITS(1) [],
        I2C2_CLK_EN OFFSET(20) NUMBITS(1) [],
        GPT2_CLK_EN OFFSET(21) NUMBITS(1) [],
        GPT3_CLK_EN OFFSET(22) NUMBITS(1) [],
        WDT_CLK_EN OFFSET(23) NUMBITS(1) [],
        SDIO_CLK_EN OFFSET(25) NUMBITS(1) [],
        ADC_CLK_EN OFFSET(26) NUMBITS(1) [],
        USBC_CLK_EN OFFSET(27) NUMBITS(1) [],
        USBC_AHB_CLK_EN OFFSET(30) NUMBITS(1) [],
        SDIO_AHB_CLK_EN OFFSET(31) NUMBITS(1) []
    ],
    pub UART_CLK_DIV [
        DENOMINATOR OFFSET(0) NUMBITS(11) [],
        NOMINATOR OFFSET(11) NUMBITS(13) []
    ],
    pub UART_CLK_SEL [
        UART0_CLK_SEL OFFSET(0) NUMBITS(1) [],
        UART1_CLK_SEL OFFSET(1) NUMBITS(1) [],
        UART2_CLK_SEL OFFSET(2) NUMBITS(1) []
    ],
    pub MCU_CORE_CLK_DIV [
        FCLK_DIV OFFSET(0) NUMBITS(6) []
    ],
    pub PERI0_CLK_DIV [
        SSP0_CLK_DIV OFFSET(0) NUMBITS(5) [],
        SSP1_CLK_DIV OFFSET(5) NUMBITS(5) [],
        SSP2_CLK_DIV OFFSET(10) NUMBITS(5) [],
        SDIO_CLK_DIV OFFSET(16) NUMBITS(4) [],
        PDM_CLK_DIV OFFSET(26) NUMBITS(5) []
    ],
    pub PERI1_CLK_DIV [
        FLASH_CLK_DIV OFFSET(4) NUMBITS(3) [],
        QSPI0_CLK_DIV OFFSET(8) NUMBITS(3) []
    ],
    pub PERI2_CLK_DIV [
        GPT_SAMPLE_CLK_DIV OFFSET(0) NUMBITS(3) [],
        WDT_CLK_DIV_5_3 OFFSET(4) NUMBITS(3) [],
        GPT3_CLK_DIV_2_0 OFFSET(8) NUMBITS(3) [],
        GPT3_CLK_DIV_5_3 OFFSET(12) NUMBITS(3) [],
        I2C_CLK_DIV OFFSET(20) NUMBITS(2) [],
        WDT_CLK_DIV_1_0 OFFSET(24) NUMBITS(2) [],
        WDT_CLK_DIV_2_2 OFFSET(28) NUMBITS(1) []
    ],
    pub CAU_CLK_SEL [
        CAU_CLK_SEL OFFSET(0) NUMBITS(2) [
            Sfll = 0,
            Rc32m = 1,
            XtalRef = 2,
            Aupll = 3
        ],
        CAU_SW_GATE OFFSET(2) NUMBITS(1) []
    ],
    pub AUPLL_CTRL1 [
        REFCLK_SEL OFFSET(1) NUMBITS(1) [
            Rc32m = 0,
            RefClockAudio = 1
        ],
        ICP OFFSET(2) NUMBITS(2) [],
        ENA_DITHER OFFSET(4) NUMBITS(1) [],
        DIV_OCLK_PATTERN OFFSET(5) NUMBITS(2) [],
        DIV_OCLK_MODULO OFFSET(7) NUMBITS(3) [],
        DIV_MCLK OFFSET(10) NUMBITS(4) [],
        DIV_FBCCLK OFFSET(14) NUMBITS(6) [],
        EN_VCOX2 OFFSET(29) NUMBITS(1) []
    ],
    pub CAU_CTRL [
        CAU_ACOMP_MCLK_EN OFFSET(0) NUMBITS(1) [],
        CAU_GPDAC_MCLK_EN OFFSET(1) NUMBITS(1) [],
        CAU_GPADC0_MCLK_EN OFFSET(3) NUMBITS(1) [],
        CAU_BG_MCLK_EN OFFSET(4) NUMBITS(1) []
    ],
    pub RC32K_CTRL0 [
        RC32K_CODE_FR_EXT OFFSET(0) NUMBITS(14) [],
        RC32K_CAL_EN OFFSET(14) NUMBITS(1) [],
        RC32K_PD OFFSET(15) NUMBITS(1) []
    ],
    pub RC32K_CTRL1 [
        RC32K_CAL_DONE OFFSET(0) NUMBITS(1) [],
        RC32K_RDY OFFSET(1) NUMBITS(1) [],
        RC32K_CAL_INPROGRESS OFFSET(3) NUMBITS(1) [],
        RC32K_CODE_FR_CAL OFFSET(4) NUMBITS(14) [],
        RC32K_ALLOW_CAL OFFSET(18) NUMBITS(1) [],
        RC32K_EXT_CODE_EN OFFSET(23) NUMBITS(1) []
    ],
    pub XTAL32K_CTRL [
        X32K_RDY OFFSET(0) NUMBITS(1) [],
        X32K_EXT_OSC_EN OFFSET(11) NUMBITS(1) [],
        X32K_EN OFFSET(12) NUMBITS(1) []
    ],
    pub PERI_CLK_SRC [
        SSP0_AUDIO_SEL OFFSET(0) NUMBITS(1) [],
        SSP1_AUDIO_SEL OFFSET(1) NUMBITS(1) [],
        SSP2_AUDIO_SEL OFFSET(2) NUMBITS(1) [],
        PDM_AUDIO_SEL OFFSET(12) NUMBITS(1) []
    ],
    pub GPT_CTRL [
        GPT_CLK_DIV OFFSET(0) NUMBITS(6) [],
        GPT_FREQ_CHANGE OFFSET(6) NUMBITS(1) [],
        GPT_CLK_SEL1 OFFSET(7) NUMBITS(2) [],
        GPT_CLK_SEL0 OFFSET(9) NUMBITS(2) []
    ],
    pub AON_CLK_CTRL [
        PMU_CLK_DIV OFFSET(0) NUMBITS(4) [],
        RTC_CLK_EN OFFSET(4) NUMBITS(1) [],
        RTC_INT_SEL OFFSET(5) NUMBITS(1) [
            Rc32k = 0,
            Xtal32k = 1
        ],
        DMA_CLK_GATE_EN OFFSET(6) NUMBITS(1) [],
        APB0_CLK_DIV OFFSET(7) NUMBITS(2) [],
        APB1_CLK_DIV OFFSET(9) NUMBITS(2) []
    ],
    pub PERI3_CTRL [
        GAU_DIV OFFSET(8) NUMBITS(5) [],
        RC32M_DIV OFFSET(13) NUMBITS(5) [],
        RC32M_GATE OFFSET(18) NUMBITS(1) []
    ],
    pub WLAN_CTRL [
        REFCLK_SYS_REQ OFFSET(1) NUMBITS(1) [],
        REFCLK_AUD_REQ OFFSET(2) NUMBITS(1) [],
        REFCLK_USB_REQ OFFSET(3) NUMBITS(1) [],
        REFCLK_SYS_RDY OFFSET(4) NUMBITS(1) [],
        REFCLK_AUD_RDY OFFSET(5) NUMBITS(1) [],
        REFCLK_USB_RDY OFFSET(6) NUMBITS(1) []
    ]
];
