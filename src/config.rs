//! Board constants for the STM32L4R9I-Discovery (MB1311).
//!
//! Everything here is fixed by the board wiring or by the timing requirements of
//! the round 1.2" DSI panel; nothing is configurable at runtime.

use crate::peripherals::dma::DmaChannel;
use crate::peripherals::nvic::Priority;

/// MSI range selected by the system clock setup
pub const MSI_FREQUENCY_HZ: u32 = 4_000_000;

/// HSI16 oscillator
pub const HSI_FREQUENCY_HZ: u32 = 16_000_000;

/// HSE crystal fitted on the board, feeds the DSI PLL
pub const HSE_FREQUENCY_HZ: u32 = 16_000_000;

/// LTDC pixel clock the panel timings were worked out for.
///
/// The DSI PHY runs at 500 Mbit/s on one lane, which at 24 bits per pixel
/// caps the pixel clock at ~20.8 MHz.
pub const LTDC_PIXEL_CLOCK_HZ: u32 = 15_000_000;

/// LTDC, LTDC error and DSI interrupt lines
pub const DISPLAY_IRQ_PRIORITY: Priority = Priority::new(3, 0);

/// Memory-to-memory DMA channel completing camera frame copies
pub const M2M_DMA_IRQ_PRIORITY: Priority = Priority::new(0, 0);

/// Channel carrying the memory-to-memory copy of captured frames
pub const M2M_DMA_CHANNEL: DmaChannel = DmaChannel::DMA1_CH5;

/// Camera frame size (QVGA RGB565) copied by the M2M channel, in 32-bit words
pub const FRAME_WORDS: usize = 320 * 240 * 2 / 4;
