//! Captured frame copy.
//!
//! Frames land in the capture buffer and are copied to the display buffer by
//! the memory-to-memory DMA channel set up in [`dcmi`](crate::peripherals::dcmi).
//! A finished copy refreshes the display; a failed one lights both status LEDs.

use crate::drivers::display::DisplayRefresh;
use crate::drivers::status_led::{Led, StatusLeds};
use crate::peripherals::dma::{DmaChannel, TransferListener};

/// Callbacks attached to the frame copy channel
pub struct CaptureListener<D, L> {
    display: D,
    leds: L,
}

impl<D: DisplayRefresh, L: StatusLeds> CaptureListener<D, L> {
    pub const fn new(display: D, leds: L) -> Self {
        Self { display, leds }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn leds(&self) -> &L {
        &self.leds
    }
}

impl<D: DisplayRefresh, L: StatusLeds> TransferListener for CaptureListener<D, L> {
    fn transfer_complete(&self, _channel: DmaChannel) {
        self.display.refresh();
    }

    fn transfer_error(&self, channel: DmaChannel) {
        error!("frame copy failed on DMA channel {}", channel.number());
        self.leds.on(Led::Led1);
        self.leds.on(Led::Led2);
    }
}

#[cfg(feature = "firmware")]
pub use self::task::{capture_task, BoardListener, FrameBuffers, FRAME_BUFFERS};

#[cfg(feature = "firmware")]
mod task {
    use super::CaptureListener;
    use crate::config::FRAME_WORDS;
    use crate::drivers::display::DsiRefresh;
    use crate::drivers::status_led::BoardLeds;
    use crate::peripherals::dcmi::DcmiHandle;
    use crate::peripherals::dma::DmaState;
    use crate::peripherals::stm32l4r9::L4r9Board;
    use embassy_futures::yield_now;
    use embassy_time::{Duration, Instant, Timer};
    use static_cell::ConstStaticCell;

    /// Listener type used on the board
    pub type BoardListener = CaptureListener<DsiRefresh, BoardLeds<'static>>;

    /// Frame period of the copy loop (~30 fps)
    const FRAME_PERIOD: Duration = Duration::from_millis(33);

    /// Longest a frame copy may take before the channel is reset
    const COPY_TIMEOUT: Duration = Duration::from_millis(20);

    /// Source and destination of the frame copy
    #[repr(C, align(4))]
    pub struct FrameBuffers {
        /// Written by the camera capture
        pub capture: [u32; FRAME_WORDS],
        /// Scanned out by the LTDC
        pub display: [u32; FRAME_WORDS],
    }
    pub static FRAME_BUFFERS: ConstStaticCell<FrameBuffers> = ConstStaticCell::new(FrameBuffers::new());

    impl FrameBuffers {
        pub const fn new() -> Self {
            Self {
                capture: [0; FRAME_WORDS],
                display: [0; FRAME_WORDS],
            }
        }
    }

    impl Default for FrameBuffers {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Copy the capture buffer to the display buffer once per frame period.
    ///
    /// embassy-stm32 owns the DMA interrupt vectors, so the channel flags are
    /// polled here and fed to the handle's interrupt dispatch.
    #[embassy_executor::task]
    pub async fn capture_task(
        mut board: L4r9Board,
        mut dcmi: DcmiHandle<'static>,
        frames: &'static mut FrameBuffers,
    ) {
        let src = frames.capture.as_ptr() as u32;
        let dst = frames.display.as_mut_ptr() as u32;

        loop {
            match dcmi.m2m_dma.start(&mut board, src, dst, FRAME_WORDS) {
                Ok(()) => {
                    let deadline = Instant::now() + COPY_TIMEOUT;
                    while dcmi.m2m_dma.service(&mut board) == DmaState::Busy {
                        if Instant::now() > deadline {
                            if let Err(e) = dcmi.m2m_dma.abort(&mut board) {
                                error!("frame copy channel unrecoverable: {}", e);
                            }
                            break;
                        }
                        yield_now().await;
                    }
                }
                Err(e) => warn!("frame copy not started: {}", e),
            }

            Timer::after(FRAME_PERIOD).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::dcmi::{self, DcmiHandle};
    use crate::peripherals::dma::{ChannelFlags, DmaState};
    use crate::testing::{CountingDisplay, MockBoard, RecordingLeds};

    fn listener() -> CaptureListener<CountingDisplay, RecordingLeds> {
        CaptureListener::new(CountingDisplay::default(), RecordingLeds::default())
    }

    #[test]
    fn completion_refreshes_display_once() {
        let listener = listener();
        listener.transfer_complete(DmaChannel::DMA1_CH5);

        assert_eq!(listener.display().refreshes(), 1);
        assert!(listener.leds().lit().is_empty());
    }

    #[test]
    fn error_lights_each_led_once() {
        let listener = listener();
        listener.transfer_error(DmaChannel::DMA1_CH5);

        assert_eq!(listener.leds().lit(), [Led::Led1, Led::Led2]);
        assert_eq!(listener.display().refreshes(), 0);
    }

    #[test]
    fn one_refresh_per_completed_copy() {
        let mut board = MockBoard::new();
        let listener = listener();
        let mut dcmi = DcmiHandle::new();
        dcmi::msp_init(&mut board, &mut dcmi, &listener).unwrap();

        for _ in 0..3 {
            dcmi.m2m_dma.start(&mut board, 0x2000_0000, 0x2004_0000, 64).unwrap();
            board.pending_flags = ChannelFlags {
                transfer_complete: true,
                ..Default::default()
            };
            dcmi.m2m_dma.service(&mut board);
        }

        assert_eq!(listener.display().refreshes(), 3);
        assert!(listener.leds().lit().is_empty());
    }

    #[test]
    fn timed_out_copy_lights_the_leds_and_frees_the_channel() {
        let mut board = MockBoard::new();
        let listener = listener();
        let mut dcmi = DcmiHandle::new();
        dcmi::msp_init(&mut board, &mut dcmi, &listener).unwrap();

        dcmi.m2m_dma.start(&mut board, 0x2000_0000, 0x2004_0000, 64).unwrap();
        assert_eq!(dcmi.m2m_dma.service(&mut board), DmaState::Busy);
        dcmi.m2m_dma.abort(&mut board).unwrap();

        assert_eq!(listener.leds().lit(), [Led::Led1, Led::Led2]);
        assert_eq!(listener.display().refreshes(), 0);
        dcmi.m2m_dma.start(&mut board, 0x2000_0000, 0x2004_0000, 64).unwrap();
    }
}
