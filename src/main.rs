//! Firmware entry point for the STM32L4R9I-Discovery capture board.
//!
//! Brings up the display path (LTDC, DSI, DMA2D) and the frame copy channel,
//! then hands the copy loop to its own task.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use l4r9_capture::apps::capture::{capture_task, BoardListener, CaptureListener, FRAME_BUFFERS};
use l4r9_capture::claim_leds;
use l4r9_capture::drivers::display::DsiRefresh;
use l4r9_capture::drivers::status_led::BoardLeds;
use l4r9_capture::peripherals::{dcmi, dma2d, dsi, init_system, ltdc, DcmiHandle, Halt, L4r9Board};
use l4r9_capture::OrFault;
use static_cell::StaticCell;

use defmt_rtt as _;
#[cfg(not(feature = "debug"))]
use panic_halt as _;
#[cfg(feature = "debug")]
use panic_probe as _;

/// Callbacks of the frame copy channel, shared with the capture task
static LISTENER: StaticCell<BoardListener> = StaticCell::new();

/// Main application entry point
///
/// Runs the peripheral bring-up in order and spawns the capture task. Any
/// bring-up failure halts the core.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting capture firmware v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = init_system();
    let Some(core) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };
    let mut board = L4r9Board::new(core.NVIC, core.SCB);
    let mut fault = Halt;

    ltdc::msp_init(&mut board).or_fault(&mut fault);
    dsi::msp_init(&mut board).or_fault(&mut fault);
    dma2d::msp_init(&mut board);

    let leds = BoardLeds::new(claim_leds!(peripherals));
    let listener = LISTENER.init(CaptureListener::new(DsiRefresh, leds));

    let mut dcmi = DcmiHandle::new();
    dcmi::msp_init(&mut board, &mut dcmi, listener).or_fault(&mut fault);

    info!("Bring-up complete, starting frame copy");

    spawner
        .spawn(capture_task(board, dcmi, FRAME_BUFFERS.take()))
        .unwrap();

    loop {
        embassy_time::Timer::after(embassy_time::Duration::from_secs(60)).await;
        info!("System heartbeat - capture running");
    }
}
