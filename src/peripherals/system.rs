//! System initialization and clock configuration for STM32L4R9.
//!
//! The core runs from the main PLL fed by MSI at 4 MHz. The same MSI also feeds
//! PLLSAI2 for the LTDC pixel clock (see [`ltdc`](super::ltdc)), so the two PLLs
//! share their input as the RCC requires.

use cortex_m::peripheral::SCB;
use embassy_stm32::{rcc::*, Config, Peripherals};

use crate::error::{Error, FaultHandler};

/// Initialize the STM32L4R9 with its system clock configuration.
///
/// Configures the system for operation at:
/// - **120 MHz** system clock (maximum for STM32L4R9) using PLL from MSI
/// - **120 MHz** AHB and APB clocks
///
/// # Returns
///
/// The initialized [`Peripherals`] struct containing all STM32 peripheral instances.
///
/// # Panics
///
/// Panics if the clock configuration fails, which indicates a hardware fault.
pub fn init_system() -> Peripherals {
    let mut config = Config::default();

    // MSI at 4 MHz, the input of both the main PLL and PLLSAI2
    config.rcc.msi = Some(MSIRange::RANGE4M);

    // PLL = MSI(4MHz) / M(1) * N(60) / R(2) = 120MHz
    config.rcc.pll = Some(Pll {
        source: PllSource::MSI,
        prediv: PllPreDiv::DIV1,
        mul: PllMul::MUL60,
        divp: None,
        divq: None,
        divr: Some(PllRDiv::DIV2),
    });

    config.rcc.sys = Sysclk::PLL1_R;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV1;
    config.rcc.apb2_pre = APBPrescaler::DIV1;

    embassy_stm32::init(config)
}

/// Log the error and park the core for good.
///
/// Recovery is left to the watchdog or a debugger.
#[derive(Debug, Default)]
pub struct Halt;

impl FaultHandler for Halt {
    fn fault(&mut self, error: Error) -> ! {
        error!("bring-up failed: {}, halting", error);
        loop {
            cortex_m::asm::wfi();
        }
    }
}

/// Log the error and reset the chip
#[derive(Debug, Default)]
pub struct SystemReset;

impl FaultHandler for SystemReset {
    fn fault(&mut self, error: Error) -> ! {
        error!("bring-up failed: {}, resetting", error);
        SCB::sys_reset()
    }
}
