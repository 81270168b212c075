//! Error types for peripheral bring-up and the fault handling contract.
//!
//! The only failure the hardware reports during bring-up is a clock domain that
//! refuses to start. DMA channel misuse is caught in software before the
//! registers are touched. Neither is recoverable at the call site, so the
//! routines return the error and the caller hands it to a [`FaultHandler`].

use core::fmt;

/// Clock domains whose ready flag the bring-up routines wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDomain {
    /// External high-speed oscillator
    Hse,
    /// Main PLL
    Pll,
    /// Secondary PLL feeding the LTDC kernel clock
    PllSai2,
}

/// Clock configuration rejected by the RCC layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// PLL factors outside the ranges the silicon supports
    InvalidPll,
    /// Ready flag never came up
    Timeout(ClockDomain),
}

/// DMA channel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Handle has no channel instance assigned
    NoInstance,
    /// Channel not ready (uninitialised or a transfer is in flight)
    Busy,
    /// Transfer length must fit the 16-bit item counter and be non-zero
    InvalidLength,
    /// Memory-to-memory transfers cannot run in circular mode
    CircularMemToMem,
    /// Bus error reported by the channel during a transfer
    Transfer,
    /// Transfer did not finish in time and was aborted
    Timeout,
}

/// Any bring-up failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Oscillator or PLL configuration failed
    Clock(ClockError),
    /// DMA channel configuration failed
    Dma(DmaError),
}

impl From<ClockError> for Error {
    fn from(error: ClockError) -> Self {
        Error::Clock(error)
    }
}

impl From<DmaError> for Error {
    fn from(error: DmaError) -> Self {
        Error::Dma(error)
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::InvalidPll => f.write_str("PLL factors out of range"),
            ClockError::Timeout(domain) => write!(f, "{domain:?} did not become ready"),
        }
    }
}

impl fmt::Display for DmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DmaError::NoInstance => "DMA handle has no channel",
            DmaError::Busy => "DMA channel busy",
            DmaError::InvalidLength => "DMA transfer length out of range",
            DmaError::CircularMemToMem => "memory-to-memory DMA cannot be circular",
            DmaError::Transfer => "DMA transfer error",
            DmaError::Timeout => "DMA transfer timed out",
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Clock(e) => write!(f, "clock configuration failed: {e}"),
            Error::Dma(e) => write!(f, "DMA configuration failed: {e}"),
        }
    }
}

/// Result type for bring-up operations
pub type Result<T> = core::result::Result<T, Error>;

/// Caller-supplied policy for unrecoverable bring-up errors.
///
/// Implementations decide whether to park the core, reset the chip, or
/// record the error somewhere first. They never return.
pub trait FaultHandler {
    /// Handle `error` and stop executing the failed bring-up path
    fn fault(&mut self, error: Error) -> !;
}

/// Route a failed bring-up step into a [`FaultHandler`]
pub trait OrFault<T> {
    /// Return the value, or diverge into `handler` on error
    fn or_fault<F: FaultHandler>(self, handler: &mut F) -> T;
}

impl<T, E: Into<Error>> OrFault<T> for core::result::Result<T, E> {
    fn or_fault<F: FaultHandler>(self, handler: &mut F) -> T {
        match self {
            Ok(value) => value,
            Err(e) => handler.fault(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanicOnFault;

    impl FaultHandler for PanicOnFault {
        fn fault(&mut self, error: Error) -> ! {
            panic!("fault: {error}");
        }
    }

    #[test]
    fn or_fault_passes_values_through() {
        let ok: core::result::Result<u8, ClockError> = Ok(7);
        assert_eq!(ok.or_fault(&mut PanicOnFault), 7);
    }

    #[test]
    #[should_panic(expected = "fault: clock configuration failed: Hse did not become ready")]
    fn or_fault_diverges_into_handler() {
        let failed: core::result::Result<(), ClockError> =
            Err(ClockError::Timeout(ClockDomain::Hse));
        failed.or_fault(&mut PanicOnFault);
    }

    #[test]
    fn conversions_keep_the_cause() {
        assert_eq!(
            Error::from(DmaError::Busy),
            Error::Dma(DmaError::Busy)
        );
        assert_eq!(
            Error::from(ClockError::InvalidPll),
            Error::Clock(ClockError::InvalidPll)
        );
    }
}
