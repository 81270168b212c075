//! LTDC low-level bring-up: clock domain, pixel clock and interrupt lines.

use super::board::{Board, Irq, Peripheral};
use super::rcc::{LtdcDivider, PeriphClockConfig, PllRDiv, PllSai2Config, PllSource};
use crate::config::DISPLAY_IRQ_PRIORITY;
use crate::error::Result;

/// Pixel clock for the DSI panel.
///
/// MSI (4 MHz) / M1 * N60 = 240 MHz VCO, / R4 = 60 MHz, / 4 = 15 MHz.
pub const LTDC_CLOCK: PeriphClockConfig = PeriphClockConfig::ltdc(
    PllSai2Config {
        source: PllSource::Msi,
        m: 1,
        n: 60,
        r: PllRDiv::Div4,
    },
    LtdcDivider::Div4,
);

/// Enable and reset the LTDC, start its pixel clock, arm LTDC and LTDC_ER.
///
/// # Errors
///
/// Returns [`Error::Clock`](crate::error::Error::Clock) when PLLSAI2 rejects
/// the configuration. The interrupt lines are left untouched in that case.
pub fn msp_init<B: Board>(board: &mut B) -> Result<()> {
    board.enable_clock(Peripheral::Ltdc);

    board.force_reset(Peripheral::Ltdc);
    board.release_reset(Peripheral::Ltdc);

    start_pixel_clock(board, &LTDC_CLOCK)?;

    for irq in [Irq::Ltdc, Irq::LtdcError] {
        board.set_priority(irq, DISPLAY_IRQ_PRIORITY);
        board.enable_irq(irq);
    }

    Ok(())
}

/// Check the PLLSAI2 factors, then hand the clock to the board
fn start_pixel_clock<B: Board>(board: &mut B, clock: &PeriphClockConfig) -> Result<()> {
    clock.pllsai2.validate()?;
    board.configure_kernel_clock(clock)?;
    info!("LTDC pixel clock at {} Hz", clock.ltdc_clock_hz());
    Ok(())
}
