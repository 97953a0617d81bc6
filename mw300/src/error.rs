//! Errors reported by the peripheral drivers.


use core::fmt;


/// The hardware condition a bounded poll was waiting for.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WaitFor {
    /// The serial flash to clear its write-in-progress bit.
    FlashIdle,

    /// A QSPI controller status bit.
    QspiStatus,

    /// An oscillator or PLL to report ready.
    ClockReady,

    /// An RC oscillator calibration to finish.
    Calibration,

    /// The bandgap reference to settle.
    BandgapReady,

    /// The ADC to deliver a conversion result.
    AdcData,

    /// The DAC to accept a data word.
    DacDataValid,

    /// The UART transmitter to drain.
    UartTransmit,

    /// The UART receiver to hold a character.
    UartReceive,
}
impl fmt::Display for WaitFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Self::FlashIdle => "flash idle",
            Self::QspiStatus => "QSPI status",
            Self::ClockReady => "clock ready",
            Self::Calibration => "calibration done",
            Self::BandgapReady => "bandgap ready",
            Self::AdcData => "ADC data",
            Self::DacDataValid => "DAC data valid",
            Self::UartTransmit => "UART transmit",
            Self::UartReceive => "UART receive",
        };
        f.write_str(what)
    }
}


/// An error that may occur while driving a peripheral.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Error {
    /// A status poll ran out of iterations.
    Timeout(WaitFor),

    /// A parameter is outside the range the hardware accepts.
    InvalidParameter(&'static str),

    /// A flash access reaches beyond the end of the device.
    OutOfRange { address: u32, length: usize },

    /// A page program would wrap around inside the page buffer.
    CrossesPageBoundary { address: u32, length: usize },

    /// The end of a range lies before its start.
    InvalidRange { start: u32, end: u32 },

    /// The JEDEC ID does not match any known flash part.
    UnknownFlash { jedec_id: u32 },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(what)
                => write!(f, "timed out waiting for {}", what),
            Self::InvalidParameter(name)
                => write!(f, "invalid parameter: {}", name),
            Self::OutOfRange { address, length }
                => write!(f, "access of {} bytes at 0x{:08X} out of range", length, address),
            Self::CrossesPageBoundary { address, length }
                => write!(f, "{} bytes at 0x{:08X} cross a page boundary", length, address),
            Self::InvalidRange { start, end }
                => write!(f, "range 0x{:08X}..=0x{:08X} is empty", start, end),
            Self::UnknownFlash { jedec_id }
                => write!(f, "unknown flash with JEDEC ID 0x{:06X}", jedec_id),
        }
    }
}


/// Polls `done` up to `budget` times.
///
/// Returns [`Error::Timeout`] with `what` if the condition never becomes true.
pub(crate) fn poll_until<F: FnMut() -> bool>(budget: u32, what: WaitFor, mut done: F) -> Result<(), Error> {
    for _ in 0..budget {
        if done() {
            return Ok(());
        }
        core::hint::spin_loop();
    }
    if done() {
        return Ok(());
    }
    log::warn!("timed out waiting for {}", what);
    Err(Error::Timeout(what))
}
