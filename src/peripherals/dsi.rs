//! DSI host low-level bring-up.
//!
//! The DSI PLL runs from HSE. If HSE is not running yet it gets started here,
//! with OSC_IN (PH0) first driven low: the crystal on this board otherwise takes
//! too long to start.

use super::board::{Board, Irq, Level, Peripheral, Pin, PinConfig, PinMode, Pull, Speed};
use super::rcc::{HseState, PllState};
use crate::config::DISPLAY_IRQ_PRIORITY;
use crate::error::Result;

const OSC_IN_DRIVE: PinConfig = PinConfig {
    mode: PinMode::OutputPushPull,
    pull: Pull::None,
    speed: Speed::VeryHigh,
};

/// Enable and reset the DSI host, make sure HSE runs, arm the DSI interrupt.
///
/// # Errors
///
/// Returns [`Error::Clock`](crate::error::Error::Clock) when HSE fails to start.
pub fn msp_init<B: Board>(board: &mut B) -> Result<()> {
    board.enable_clock(Peripheral::Dsi);

    board.force_reset(Peripheral::Dsi);
    board.release_reset(Peripheral::Dsi);

    let mut osc = board.oscillator_config();
    if osc.hse == HseState::Off {
        debug!("HSE off, starting it for the DSI PLL");

        board.enable_clock(Peripheral::GpioH);
        board.configure_pin(Pin::PH0, &OSC_IN_DRIVE);
        board.write_pin(Pin::PH0, Level::Low);

        osc.hse = HseState::On;
        osc.pll = PllState::None;
        board.configure_oscillators(&osc)?;
    }

    board.set_priority(Irq::Dsi, DISPLAY_IRQ_PRIORITY);
    board.enable_irq(Irq::Dsi);

    Ok(())
}
